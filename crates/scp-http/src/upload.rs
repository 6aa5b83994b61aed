//! HTTP upload backend: one request body sent to the peer as a file.

use std::path::{Path, PathBuf};

use skiff_scp::error::ScpError;
use skiff_scp::fs::{FileInfo, FileReader, FileSystem, FileWriter};

/// Permission bits advertised for uploaded files: owner read/write,
/// group and world read/execute.
pub const UPLOAD_FILE_MODE: u32 = 0o655;

/// [`FileSystem`] over a captive HTTP request body.
///
/// Single-use and single-file: the body reader can be taken exactly once,
/// and directory operations are refused. The body length must be the
/// Content-Length the HTTP layer negotiated; it is what the peer sees in
/// the file header.
pub struct HttpUploadFs {
    filename: String,
    length: u64,
    body: Option<FileReader>,
}

impl HttpUploadFs {
    pub fn new(filename: impl Into<String>, body: FileReader, length: u64) -> Self {
        Self {
            filename: filename.into(),
            length,
            body: Some(body),
        }
    }
}

impl FileSystem for HttpUploadFs {
    fn is_dir(&self, _path: &Path) -> bool {
        false
    }

    fn file_info(&self, _path: &Path) -> Result<Box<dyn FileInfo>, ScpError> {
        Ok(Box::new(UploadFileInfo {
            path: PathBuf::from(&self.filename),
            length: self.length,
        }))
    }

    fn mkdir(&mut self, _path: &Path, _mode: u32) -> Result<(), ScpError> {
        Err(ScpError::NotSupported(
            "copying directories over an HTTP upload".into(),
        ))
    }

    fn open_file(&mut self, _path: &Path) -> Result<FileReader, ScpError> {
        self.body
            .take()
            .ok_or_else(|| ScpError::Backend("upload body already consumed".into()))
    }

    fn create_file(&mut self, _path: &Path, _length: u64) -> Result<FileWriter, ScpError> {
        Err(ScpError::NotSupported(
            "receiving files over an HTTP upload".into(),
        ))
    }

    fn set_chmod(&mut self, _path: &Path, _mode: u32) -> Result<(), ScpError> {
        Ok(())
    }
}

/// Synthesized metadata for the single uploaded file.
struct UploadFileInfo {
    path: PathBuf,
    length: u64,
}

impl FileInfo for UploadFileInfo {
    fn is_dir(&self) -> bool {
        false
    }

    fn read_dir(&self) -> Result<Vec<Box<dyn FileInfo>>, ScpError> {
        Err(ScpError::NotSupported(
            "listing directories over an HTTP upload".into(),
        ))
    }

    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn mode_perm(&self) -> u32 {
        UPLOAD_FILE_MODE
    }

    fn size(&self) -> u64 {
        self.length
    }
}
