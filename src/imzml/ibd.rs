//! Random-access reader for the `.ibd` payload file

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use log::debug;

use super::ImzMLError;

/// Payload file opened for positioned reads
///
/// A single handle is shared; each seek+read pair runs under a mutex, so reads
/// may be issued from several threads at once.
pub struct IbdFile {
    path: PathBuf,
    file: Mutex<File>,
    read_count: AtomicU64,
    bytes_read: AtomicU64,
}

impl IbdFile {
    /// Open the payload file at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ImzMLError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            read_count: AtomicU64::new(0),
            bytes_read: AtomicU64::new(0),
        })
    }

    /// Path of the payload file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read exactly `length` bytes starting at `offset`
    ///
    /// A range running past the end of the file is an error, checked before any
    /// buffer is allocated.
    pub fn read(&self, offset: u64, length: u64) -> Result<Vec<u8>, ImzMLError> {
        let to_error = |source| ImzMLError::PayloadRead {
            path: self.path.clone(),
            offset,
            length,
            source,
        };
        let out_of_range = |message: &str| {
            to_error(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, message.to_string()))
        };

        let buffer = {
            let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
            let file_size = file.metadata().map_err(to_error)?.len();
            let end = offset
                .checked_add(length)
                .ok_or_else(|| out_of_range("range overflows a 64-bit offset"))?;
            if end > file_size {
                return Err(out_of_range(&format!(
                    "range ends at byte {} but the file has {}",
                    end, file_size
                )));
            }
            let size = usize::try_from(length)
                .map_err(|_| out_of_range("length does not fit in memory"))?;

            let mut buffer = vec![0u8; size];
            file.seek(SeekFrom::Start(offset)).map_err(to_error)?;
            file.read_exact(&mut buffer).map_err(to_error)?;
            buffer
        };

        self.read_count.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(length, Ordering::Relaxed);
        debug!("Read {} bytes at offset {} from {}", length, offset, self.path.display());
        Ok(buffer)
    }

    /// Number of completed reads
    pub fn read_count(&self) -> u64 {
        self.read_count.load(Ordering::Relaxed)
    }

    /// Total bytes returned by completed reads
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read.load(Ordering::Relaxed)
    }

    /// Size of the payload file in bytes
    pub fn len(&self) -> Result<u64, ImzMLError> {
        let file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(file.metadata()?.len())
    }

    /// Whether the payload file is empty
    pub fn is_empty(&self) -> Result<bool, ImzMLError> {
        Ok(self.len()? == 0)
    }
}

impl std::fmt::Debug for IbdFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IbdFile")
            .field("path", &self.path)
            .field("read_count", &self.read_count())
            .field("bytes_read", &self.bytes_read())
            .finish()
    }
}
