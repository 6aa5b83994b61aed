//! Storage backend traits.
//!
//! The protocol engine never touches storage directly: every read, write and
//! metadata lookup goes through [`FileSystem`] and [`FileInfo`]. Three
//! backends implement the pair: local disk ([`crate::local::LocalFs`]) and
//! the HTTP upload/download adapters in the companion `skiff_scp_http`
//! crate.

use std::path::Path;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::ScpError;

/// Boxed byte stream a backend hands out for reading one file.
pub type FileReader = Box<dyn AsyncRead + Send + Unpin>;

/// Boxed byte stream a backend hands out for writing one file.
pub type FileWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Storage operations the engine drives a transfer through.
///
/// Implementations are single-transfer values; the engine holds at most one
/// open stream at a time and releases it before the next frame.
pub trait FileSystem: Send {
    /// Whether `path` names an existing directory. Missing paths are `false`.
    fn is_dir(&self, path: &Path) -> bool;

    /// Returns a metadata snapshot for `path`.
    fn file_info(&self, path: &Path) -> Result<Box<dyn FileInfo>, ScpError>;

    /// Creates `path` (and missing parents) with the given permission bits.
    /// An already existing directory is success.
    fn mkdir(&mut self, path: &Path, mode: u32) -> Result<(), ScpError>;

    /// Opens `path` for reading.
    fn open_file(&mut self, path: &Path) -> Result<FileReader, ScpError>;

    /// Creates `path` for writing. `length` is an advisory byte count the
    /// caller will write, known before the first byte.
    fn create_file(&mut self, path: &Path, length: u64) -> Result<FileWriter, ScpError>;

    /// Applies permission bits to `path`. Backends without a permission
    /// model treat this as a no-op.
    fn set_chmod(&mut self, path: &Path, mode: u32) -> Result<(), ScpError>;
}

/// An immutable metadata snapshot of one file or directory.
///
/// Snapshots do not track the underlying file after creation.
pub trait FileInfo: Send + Sync {
    /// Whether this entry is a directory.
    fn is_dir(&self) -> bool;

    /// Child entries, with absolute paths, in a deterministic order.
    fn read_dir(&self) -> Result<Vec<Box<dyn FileInfo>>, ScpError>;

    /// The entry's base name, as sent on the wire.
    fn name(&self) -> String;

    /// The path this snapshot was taken from.
    fn path(&self) -> &Path;

    /// Permission bits.
    fn mode_perm(&self) -> u32;

    /// Size in bytes; zero for directories.
    fn size(&self) -> u64;
}
