use std::{
    error::Error,
    fmt::{Display, Formatter, Result as FmtResult},
    io::{Error as IoError, ErrorKind},
};

use crate::types::FrameId;

/// Replacement policy misuse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplacerError {
    /// The frame is tracked but currently pinned; only evictable frames
    /// may be removed from the replacer.
    NotEvictable(FrameId),
}

impl Display for ReplacerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::NotEvictable(id) => {
                write!(f, "Cannot remove non-evictable frame {} from replacer", id)
            }
        }
    }
}

impl Error for ReplacerError {}

impl From<ReplacerError> for IoError {
    fn from(value: ReplacerError) -> Self {
        IoError::new(ErrorKind::InvalidInput, value.to_string())
    }
}

/// Engine-level errors.
#[derive(Debug)]
pub enum EngineError {
    /// I/O error from the disk layer.
    Io(IoError),
    /// Replacement policy misuse.
    Replacer(ReplacerError),
    /// The buffer pool has no free or evictable frame left.
    PoolExhausted,
    /// No record for the index name in the header page.
    IndexNotFound(String),
    /// A header page record operation was rejected.
    HeaderRecord(String),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::Replacer(e) => write!(f, "Replacer error: {}", e),
            Self::PoolExhausted => write!(f, "Buffer pool exhausted: every frame is pinned"),
            Self::IndexNotFound(name) => write!(f, "Index '{}' not found in header page", name),
            Self::HeaderRecord(msg) => write!(f, "Header page record error: {}", msg),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Replacer(e) => Some(e),
            _ => None,
        }
    }
}

impl From<IoError> for EngineError {
    fn from(value: IoError) -> Self {
        Self::Io(value)
    }
}

impl From<ReplacerError> for EngineError {
    fn from(value: ReplacerError) -> Self {
        Self::Replacer(value)
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
pub(crate) type ReplacerResult<T> = Result<T, ReplacerError>;
