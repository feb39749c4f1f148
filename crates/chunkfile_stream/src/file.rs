//! File-based stream backend.

use crate::error::{StreamError, StreamResult};
use crate::stream::Stream;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// How a [`FileStream`] opens its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAccess {
    /// Open an existing file for reading.
    Read,
    /// Create the file, truncating any existing content.
    Write,
    /// Open for reading and writing, creating the file if missing.
    ///
    /// Existing content is preserved, which is what append mode needs.
    ReadWrite,
}

impl FileAccess {
    fn options(self) -> OpenOptions {
        let mut options = OpenOptions::new();
        match self {
            Self::Read => {
                options.read(true);
            }
            Self::Write => {
                options.write(true).create(true).truncate(true);
            }
            Self::ReadWrite => {
                options.read(true).write(true).create(true).truncate(false);
            }
        }
        options
    }
}

/// A stream backed by a file on disk.
///
/// # Durability
///
/// - `close()` flushes and calls `File::sync_all()` before releasing the handle
///
/// # Example
///
/// ```no_run
/// use chunkfile_stream::{FileAccess, FileStream, Stream};
/// use std::path::Path;
///
/// let mut stream = FileStream::open(Path::new("data.chunks"), FileAccess::Write).unwrap();
/// stream.write_all(b"persistent data").unwrap();
/// stream.close().unwrap();
/// ```
#[derive(Debug)]
pub struct FileStream {
    path: PathBuf,
    access: FileAccess,
    file: Option<File>,
}

impl FileStream {
    /// Opens a file stream at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created.
    pub fn open(path: &Path, access: FileAccess) -> StreamResult<Self> {
        let file = access.options().open(path)?;
        tracing::debug!(path = %path.display(), ?access, "opened file stream");

        Ok(Self {
            path: path.to_path_buf(),
            access,
            file: Some(file),
        })
    }

    /// Opens a file stream, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file cannot be opened.
    pub fn open_with_create_dirs(path: &Path, access: FileAccess) -> StreamResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::open(path, access)
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the access mode the file was opened with.
    #[must_use]
    pub fn access(&self) -> FileAccess {
        self.access
    }

    fn file(&mut self) -> StreamResult<&mut File> {
        self.file.as_mut().ok_or(StreamError::Closed)
    }
}

impl Stream for FileStream {
    fn read(&mut self, buf: &mut [u8]) -> StreamResult<usize> {
        if !self.can_read() {
            return Err(StreamError::NotReadable);
        }
        let file = self.file()?;
        loop {
            match file.read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn write(&mut self, buf: &[u8]) -> StreamResult<usize> {
        if !self.can_write() {
            return Err(StreamError::NotWritable);
        }
        let file = self.file()?;
        loop {
            match file.write(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn seek(&mut self, position: u64) -> StreamResult<()> {
        self.file()?.seek(SeekFrom::Start(position))?;
        Ok(())
    }

    fn tell(&mut self) -> StreamResult<u64> {
        Ok(self.file()?.stream_position()?)
    }

    fn size(&mut self) -> StreamResult<u64> {
        Ok(self.file()?.metadata()?.len())
    }

    fn close(&mut self) -> StreamResult<()> {
        let Some(file) = self.file.as_mut() else {
            return Ok(());
        };

        if self.access != FileAccess::Read {
            file.flush()?;
            file.sync_all()?;
        }

        self.file = None;
        tracing::debug!(path = %self.path.display(), "closed file stream");
        Ok(())
    }

    fn truncate(&mut self, new_size: u64) -> StreamResult<()> {
        if !self.can_write() {
            return Err(StreamError::NotWritable);
        }
        let file = self.file()?;
        let current = file.metadata()?.len();
        if new_size > current {
            return Err(StreamError::invalid_argument(format!(
                "cannot truncate to {new_size} bytes, file holds {current}"
            )));
        }
        file.set_len(new_size)?;
        Ok(())
    }

    fn can_truncate(&self) -> bool {
        self.can_write()
    }

    fn can_read(&self) -> bool {
        self.access != FileAccess::Write
    }

    fn can_write(&self) -> bool {
        self.access != FileAccess::Read
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_create_new() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.chunks");

        let mut stream = FileStream::open(&path, FileAccess::Write).unwrap();
        assert_eq!(stream.size().unwrap(), 0);
        assert!(path.exists());
    }

    #[test]
    fn file_read_missing_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.chunks");

        let result = FileStream::open(&path, FileAccess::Read);
        assert!(matches!(result, Err(StreamError::Io(_))));
    }

    #[test]
    fn file_write_and_read_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.chunks");

        let mut stream = FileStream::open(&path, FileAccess::ReadWrite).unwrap();
        stream.write_all(b"hello world").unwrap();
        assert_eq!(stream.tell().unwrap(), 11);
        assert_eq!(stream.size().unwrap(), 11);

        stream.seek(6).unwrap();
        let mut buf = [0u8; 5];
        stream.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"world");
    }

    #[test]
    fn file_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.chunks");

        {
            let mut stream = FileStream::open(&path, FileAccess::Write).unwrap();
            stream.write_all(b"persistent data").unwrap();
            stream.close().unwrap();
        }

        {
            let mut stream = FileStream::open(&path, FileAccess::Read).unwrap();
            assert_eq!(stream.size().unwrap(), 15);

            let mut buf = vec![0u8; 15];
            stream.read_exact(&mut buf).unwrap();
            assert_eq!(&buf, b"persistent data");
        }
    }

    #[test]
    fn file_write_truncates_read_write_preserves() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.chunks");
        std::fs::write(&path, b"existing").unwrap();

        let mut stream = FileStream::open(&path, FileAccess::ReadWrite).unwrap();
        assert_eq!(stream.size().unwrap(), 8);
        stream.close().unwrap();

        let mut stream = FileStream::open(&path, FileAccess::Write).unwrap();
        assert_eq!(stream.size().unwrap(), 0);
    }

    #[test]
    fn file_access_is_enforced() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.chunks");

        let mut stream = FileStream::open(&path, FileAccess::Write).unwrap();
        let mut buf = [0u8; 1];
        assert!(matches!(stream.read(&mut buf), Err(StreamError::NotReadable)));
        stream.close().unwrap();

        let mut stream = FileStream::open(&path, FileAccess::Read).unwrap();
        assert!(matches!(stream.write(b"x"), Err(StreamError::NotWritable)));
    }

    #[test]
    fn file_truncate_shortens_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.chunks");

        let mut stream = FileStream::open(&path, FileAccess::Write).unwrap();
        stream.write_all(b"0123456789").unwrap();
        assert!(stream.can_truncate());
        stream.truncate(4).unwrap();
        assert_eq!(stream.size().unwrap(), 4);
        assert!(stream.truncate(5).unwrap_err().is_invalid_argument());
        stream.close().unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"0123");

        let mut stream = FileStream::open(&path, FileAccess::Read).unwrap();
        assert!(!stream.can_truncate());
        assert!(matches!(stream.truncate(0), Err(StreamError::NotWritable)));
    }

    #[test]
    fn file_close_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.chunks");

        let mut stream = FileStream::open(&path, FileAccess::Write).unwrap();
        stream.close().unwrap();
        stream.close().unwrap();
        assert!(matches!(stream.tell(), Err(StreamError::Closed)));
    }

    #[test]
    fn file_create_with_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("path").join("test.chunks");

        let stream = FileStream::open_with_create_dirs(&path, FileAccess::Write).unwrap();
        assert!(path.exists());
        assert_eq!(stream.path(), path);
        assert_eq!(stream.access(), FileAccess::Write);
    }
}
