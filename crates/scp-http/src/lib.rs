//! HTTP backends for the skiff SCP engine.
//!
//! Bridges one-shot HTTP transfers onto an scp peer: an uploaded request
//! body becomes the single file sent to a remote `scp -t`, and a file
//! fetched from a remote `scp -f` is streamed into an HTTP response with
//! download headers. Both run as client-side commands over the session
//! channel the host provides.

use std::io::Write;
use std::path::Path;

use http::header::HeaderMap;
use tokio::sync::oneshot;

use skiff_scp::error::ScpError;
use skiff_scp::fs::{FileReader, FileWriter};
use skiff_scp::{Command, Flags, Parameters, Side};

mod download;
mod upload;

pub use download::HttpDownloadFs;
pub use upload::{HttpUploadFs, UPLOAD_FILE_MODE};

/// A command that sends an HTTP request body to the peer as one file.
///
/// `content_length` is the body length the HTTP layer negotiated; the peer
/// sees it in the file header, so it must be exact.
pub fn upload_command(
    remote_location: &str,
    body: FileReader,
    content_length: u64,
    progress: Option<Box<dyn Write + Send>>,
) -> Result<Command, ScpError> {
    let filename = basename(remote_location)?;
    Command::upload(Parameters {
        flags: Flags {
            targets: vec![filename.into()],
            ..Flags::default()
        },
        progress,
        side: Side::Client,
        fs: Box::new(HttpUploadFs::new(filename, body, content_length)),
        remote_location: remote_location.to_string(),
        ..Parameters::default()
    })
}

/// A command that receives one file from the peer into an HTTP response
/// body.
///
/// The returned receiver resolves with the response headers before the
/// first body byte reaches `body`.
pub fn download_command(
    remote_location: &str,
    body: FileWriter,
    progress: Option<Box<dyn Write + Send>>,
) -> Result<(Command, oneshot::Receiver<HeaderMap>), ScpError> {
    let filename = basename(remote_location)?;
    let (fs, headers_rx) = HttpDownloadFs::new(body);
    let command = Command::download(Parameters {
        flags: Flags {
            targets: vec![filename.into()],
            ..Flags::default()
        },
        progress,
        side: Side::Client,
        fs: Box::new(fs),
        remote_location: remote_location.to_string(),
        ..Parameters::default()
    })?;
    Ok((command, headers_rx))
}

fn basename(remote_location: &str) -> Result<&str, ScpError> {
    Path::new(remote_location)
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            ScpError::BadParameter(format!("missing file name in {remote_location:?}"))
        })
}
