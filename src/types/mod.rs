use std::fmt::{Display, Formatter, Result as FmtResult};

/// Stable on-disk identifier of a page.
pub type PageId = i32;

/// Index into the buffer pool's frame array.
pub type FrameId = i32;

/// Sentinel for a frame that holds no page.
pub const INVALID_PAGE_ID: PageId = -1;

/// Well-known page storing the `index name -> root page id` directory.
pub const HEADER_PAGE_ID: PageId = 0;

/// Opaque record identifier stored as the value of a leaf entry.
///
/// Packs the owning page and the slot within it into 64 bits, high half
/// first, so that `Rid` ordering follows physical placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Rid(u64);

impl Rid {
    pub fn new(page_id: PageId, slot: u32) -> Self {
        Self(((page_id as u32 as u64) << 32) | u64::from(slot))
    }

    pub fn page_id(&self) -> PageId {
        (self.0 >> 32) as u32 as PageId
    }

    pub fn slot(&self) -> u32 {
        self.0 as u32
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for Rid {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Rid> for u64 {
    fn from(value: Rid) -> Self {
        value.0
    }
}

impl Display for Rid {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "Page {}, slot {}", self.page_id(), self.slot())
    }
}

// Rid takes part in on-page entry layouts.
unsafe impl bytemuck::Zeroable for Rid {}
unsafe impl bytemuck::Pod for Rid {}
