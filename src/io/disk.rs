use crate::{common::PAGE_SIZE, types::PageId};

use std::{
    fs::{self, File, Metadata},
    io::{self, Error as IoError, ErrorKind, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use tracing::trace;

/// We need additional operations over the file than what Rust [fs::File]
/// provides us.
///
/// This trait includes operations for opening, creating, truncating and
/// syncing files to disk.
pub(crate) trait FileOperations: Seek + Read + Write {
    /// Create a new empty file
    fn create(path: impl AsRef<Path>) -> io::Result<Self>
    where
        Self: Sized;

    /// Open an existing file
    fn open(path: impl AsRef<Path>) -> io::Result<Self>
    where
        Self: Sized;

    /// Remove the file at the target path
    fn remove(path: impl AsRef<Path>) -> io::Result<()>;

    /// Truncate the file to 0 bytes
    fn truncate(&mut self) -> io::Result<()>;

    /// Sync the file content to disk.
    fn sync_all(&self) -> io::Result<()>;
}

/// Wrapper over file that contains also path information
#[derive(Debug)]
pub struct DBFile {
    f: File,
    p: PathBuf,
}

impl DBFile {
    pub fn path(&self) -> &Path {
        self.p.as_path()
    }

    pub fn metadata(&self) -> io::Result<Metadata> {
        self.f.metadata()
    }
}

impl Seek for DBFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.f.seek(pos)
    }
}

impl Read for DBFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.f.read(buf)
    }
}

impl Write for DBFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.f.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.f.flush()
    }
}

impl FileOperations for DBFile {
    fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let f = fs::OpenOptions::new()
            .create(true)
            .truncate(true)
            .read(true)
            .write(true)
            .open(&path)?;

        Ok(Self {
            f,
            p: path.as_ref().to_path_buf(),
        })
    }

    fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let f = fs::OpenOptions::new().read(true).write(true).open(&path)?;
        Ok(Self {
            f,
            p: path.as_ref().to_path_buf(),
        })
    }

    fn remove(path: impl AsRef<Path>) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn truncate(&mut self) -> io::Result<()> {
        self.f.set_len(0)
    }

    fn sync_all(&self) -> io::Result<()> {
        self.f.sync_all()
    }
}

/// Block-addressed reader/writer over the database file.
///
/// Pages are placed sequentially and all pages are equal size, so the
/// offset of a page is its id times the page size:
///
/// [PAGE 0 (header)    ] Offset 0
/// [PAGE 1             ] Offset 1 * Page size
/// [PAGE 2             ] Offset 2 * Page size
/// [....               ]
#[derive(Debug)]
pub struct DiskManager {
    file: DBFile,
    num_reads: u64,
    num_writes: u64,
}

impl DiskManager {
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self {
            file: DBFile::create(path)?,
            num_reads: 0,
            num_writes: 0,
        })
    }

    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self {
            file: DBFile::open(path)?,
            num_reads: 0,
            num_writes: 0,
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn num_reads(&self) -> u64 {
        self.num_reads
    }

    pub fn num_writes(&self) -> u64 {
        self.num_writes
    }

    fn page_offset(page_id: PageId) -> u64 {
        page_id as u64 * PAGE_SIZE as u64
    }

    fn check_page_id(page_id: PageId, buf_len: usize) -> io::Result<()> {
        if page_id < 0 {
            return Err(IoError::new(
                ErrorKind::InvalidInput,
                format!("Invalid page id {}", page_id),
            ));
        }
        if buf_len != PAGE_SIZE {
            return Err(IoError::new(
                ErrorKind::InvalidInput,
                format!("Page buffer must be {} bytes, got {}", PAGE_SIZE, buf_len),
            ));
        }
        Ok(())
    }

    /// Reads one page into the buffer.
    ///
    /// A page beyond the current end of file reads as zeroes, so a freshly
    /// created database exposes a valid empty header page.
    pub fn read_page(&mut self, page_id: PageId, buf: &mut [u8]) -> io::Result<()> {
        Self::check_page_id(page_id, buf.len())?;

        let offset = Self::page_offset(page_id);
        let file_len = self.file.metadata()?.len();
        if offset >= file_len {
            buf.fill(0);
            return Ok(());
        }

        self.file.seek(SeekFrom::Start(offset))?;
        let available = ((file_len - offset) as usize).min(PAGE_SIZE);
        self.file.read_exact(&mut buf[..available])?;
        buf[available..].fill(0);

        self.num_reads += 1;
        Ok(())
    }

    /// Writes one page from the buffer, extending the file if needed.
    pub fn write_page(&mut self, page_id: PageId, buf: &[u8]) -> io::Result<()> {
        Self::check_page_id(page_id, buf.len())?;

        self.file.seek(SeekFrom::Start(Self::page_offset(page_id)))?;
        self.file.write_all(buf)?;
        self.file.flush()?;

        self.num_writes += 1;
        Ok(())
    }

    /// Releases an on-disk page id.
    ///
    /// The file format has no free-page list; the id simply becomes dead
    /// space until the file is rebuilt.
    pub fn deallocate_page(&mut self, page_id: PageId) {
        trace!(page_id, "deallocate page");
    }

    pub fn sync_all(&self) -> io::Result<()> {
        self.file.sync_all()
    }
}
