//! Local-disk backend.

use std::fs::Metadata;
use std::path::{Path, PathBuf};

use crate::error::ScpError;
use crate::fs::{FileInfo, FileReader, FileSystem, FileWriter};

/// Permission bits recognized by the filesystem.
const PERM_MASK: u32 = 0o777;

/// [`FileSystem`] over the local disk.
///
/// Streams are `tokio::fs::File` handles; metadata operations go through
/// `std::fs` directly.
#[derive(Debug, Default)]
pub struct LocalFs;

impl FileSystem for LocalFs {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn file_info(&self, path: &Path) -> Result<Box<dyn FileInfo>, ScpError> {
        Ok(Box::new(LocalFileInfo::stat(path)?))
    }

    #[cfg(unix)]
    fn mkdir(&mut self, path: &Path, mode: u32) -> Result<(), ScpError> {
        use std::os::unix::fs::DirBuilderExt;
        std::fs::DirBuilder::new()
            .recursive(true)
            .mode(mode & PERM_MASK)
            .create(path)?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn mkdir(&mut self, path: &Path, _mode: u32) -> Result<(), ScpError> {
        std::fs::create_dir_all(path)?;
        Ok(())
    }

    fn open_file(&mut self, path: &Path) -> Result<FileReader, ScpError> {
        let file = std::fs::File::open(path)?;
        Ok(Box::new(tokio::fs::File::from_std(file)))
    }

    fn create_file(&mut self, path: &Path, _length: u64) -> Result<FileWriter, ScpError> {
        let file = std::fs::File::create(path)?;
        Ok(Box::new(tokio::fs::File::from_std(file)))
    }

    #[cfg(unix)]
    fn set_chmod(&mut self, path: &Path, mode: u32) -> Result<(), ScpError> {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode & PERM_MASK))?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn set_chmod(&mut self, _path: &Path, _mode: u32) -> Result<(), ScpError> {
        Ok(())
    }
}

/// Metadata snapshot of one local file or directory.
pub struct LocalFileInfo {
    path: PathBuf,
    meta: Metadata,
}

impl LocalFileInfo {
    fn stat(path: &Path) -> Result<Self, ScpError> {
        let meta = std::fs::metadata(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            meta,
        })
    }
}

impl FileInfo for LocalFileInfo {
    fn is_dir(&self) -> bool {
        self.meta.is_dir()
    }

    fn read_dir(&self) -> Result<Vec<Box<dyn FileInfo>>, ScpError> {
        let mut children = Vec::new();
        for entry in std::fs::read_dir(&self.path)? {
            let entry = entry?;
            children.push(LocalFileInfo::stat(&self.path.join(entry.file_name()))?);
        }
        // Directory order is filesystem-dependent; sort for determinism.
        children.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(children
            .into_iter()
            .map(|info| Box::new(info) as Box<dyn FileInfo>)
            .collect())
    }

    fn name(&self) -> String {
        match self.path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => self.path.display().to_string(),
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(unix)]
    fn mode_perm(&self) -> u32 {
        use std::os::unix::fs::PermissionsExt;
        self.meta.permissions().mode() & PERM_MASK
    }

    #[cfg(not(unix))]
    fn mode_perm(&self) -> u32 {
        if self.meta.is_dir() { 0o755 } else { 0o644 }
    }

    fn size(&self) -> u64 {
        if self.meta.is_dir() { 0 } else { self.meta.len() }
    }
}
