//! Header page record directory.
//!
//! The well-known page 0 maps index names to root page ids. A zeroed page
//! is a valid empty directory; the magic is stamped on the first insert.

use crate::{
    common::{MAGIC, PAGE_SIZE},
    pod_struct,
    types::PageId,
};

use std::io::{self, Error as IoError, ErrorKind};

pub(crate) const RECORD_NAME_LEN: usize = 32;

#[derive(Debug, Clone, Copy)]
#[repr(C)]
struct DirectoryHeader {
    magic: u32,
    num_records: u32,
}

pod_struct!(DirectoryHeader);

#[derive(Debug, Clone, Copy)]
#[repr(C)]
struct IndexRecord {
    name: [u8; RECORD_NAME_LEN],
    root_page_id: PageId,
}

pod_struct!(IndexRecord);

/// How many records fit on the page.
pub(crate) const MAX_HEADER_RECORDS: usize =
    (PAGE_SIZE - DirectoryHeader::SIZE) / IndexRecord::SIZE;

fn record_offset(index: usize) -> usize {
    DirectoryHeader::SIZE + index * IndexRecord::SIZE
}

fn encode_name(name: &str) -> io::Result<[u8; RECORD_NAME_LEN]> {
    let bytes = name.as_bytes();
    if bytes.is_empty() || bytes.len() > RECORD_NAME_LEN {
        return Err(IoError::new(
            ErrorKind::InvalidInput,
            format!(
                "Index name must be 1..={} bytes, got {}",
                RECORD_NAME_LEN,
                bytes.len()
            ),
        ));
    }
    let mut out = [0u8; RECORD_NAME_LEN];
    out[..bytes.len()].copy_from_slice(bytes);
    Ok(out)
}

fn find_record(data: &[u8], name: &[u8; RECORD_NAME_LEN]) -> Option<usize> {
    let header = DirectoryHeader::read_from(data, 0);
    if header.magic != MAGIC {
        return None;
    }
    (0..header.num_records as usize)
        .find(|&i| IndexRecord::read_from(data, record_offset(i)).name == *name)
}

/// Read-only view over the header page.
#[derive(Debug, Clone, Copy)]
pub(crate) struct HeaderRef<'a> {
    data: &'a [u8],
}

impl<'a> HeaderRef<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        debug_assert!(data.len() >= PAGE_SIZE);
        Self { data }
    }

    pub(crate) fn record_count(&self) -> usize {
        let header = DirectoryHeader::read_from(self.data, 0);
        if header.magic != MAGIC {
            return 0;
        }
        header.num_records as usize
    }

    /// Root page id recorded for the named index.
    pub(crate) fn get_record(&self, name: &str) -> io::Result<Option<PageId>> {
        let name = encode_name(name)?;
        Ok(find_record(self.data, &name)
            .map(|i| IndexRecord::read_from(self.data, record_offset(i)).root_page_id))
    }
}

/// Mutable view over the header page.
#[derive(Debug)]
pub(crate) struct HeaderMut<'a> {
    data: &'a mut [u8],
}

impl<'a> HeaderMut<'a> {
    pub(crate) fn new(data: &'a mut [u8]) -> Self {
        debug_assert!(data.len() >= PAGE_SIZE);
        Self { data }
    }

    pub(crate) fn as_ref(&self) -> HeaderRef<'_> {
        HeaderRef::new(self.data)
    }

    /// Adds a record for a new index. Returns false when the name is
    /// already present or the page is full.
    pub(crate) fn insert_record(&mut self, name: &str, root_page_id: PageId) -> io::Result<bool> {
        let encoded = encode_name(name)?;
        if find_record(self.data, &encoded).is_some() {
            return Ok(false);
        }

        let mut header = DirectoryHeader::read_from(self.data, 0);
        if header.magic != MAGIC {
            header = DirectoryHeader {
                magic: MAGIC,
                num_records: 0,
            };
        }
        let index = header.num_records as usize;
        if index >= MAX_HEADER_RECORDS {
            return Ok(false);
        }

        IndexRecord {
            name: encoded,
            root_page_id,
        }
        .write_to(self.data, record_offset(index));
        header.num_records += 1;
        header.write_to(self.data, 0);
        Ok(true)
    }

    /// Rewrites the root of an existing index. Returns false when the
    /// name is unknown.
    pub(crate) fn update_record(&mut self, name: &str, root_page_id: PageId) -> io::Result<bool> {
        let encoded = encode_name(name)?;
        let Some(index) = find_record(self.data, &encoded) else {
            return Ok(false);
        };

        IndexRecord {
            name: encoded,
            root_page_id,
        }
        .write_to(self.data, record_offset(index));
        Ok(true)
    }
}
