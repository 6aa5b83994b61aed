//! HTTP download backend: one file received from the peer, streamed into
//! an HTTP response.

use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use http::header::{
    CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE, EXPIRES, HeaderMap,
    HeaderValue, PRAGMA, X_CONTENT_TYPE_OPTIONS,
};
use tokio::io::AsyncWrite;
use tokio::sync::oneshot;

use skiff_scp::error::ScpError;
use skiff_scp::fs::{FileInfo, FileReader, FileSystem, FileWriter};

/// [`FileSystem`] over a captive HTTP response.
///
/// Single-use and single-file: `create_file` may be called exactly once.
/// It delivers the response headers through the oneshot handed out by
/// [`new`](Self::new) before the first body byte, then yields the body
/// writer. Shutting that writer down is a no-op; the HTTP layer owns the
/// body lifetime.
pub struct HttpDownloadFs {
    headers_tx: Option<oneshot::Sender<HeaderMap>>,
    body: Option<FileWriter>,
}

impl HttpDownloadFs {
    /// Wraps a response body writer. The returned receiver resolves with
    /// the response headers once the transfer reaches `create_file`.
    pub fn new(body: FileWriter) -> (Self, oneshot::Receiver<HeaderMap>) {
        let (headers_tx, headers_rx) = oneshot::channel();
        (
            Self {
                headers_tx: Some(headers_tx),
                body: Some(body),
            },
            headers_rx,
        )
    }
}

impl FileSystem for HttpDownloadFs {
    fn is_dir(&self, _path: &Path) -> bool {
        false
    }

    fn file_info(&self, _path: &Path) -> Result<Box<dyn FileInfo>, ScpError> {
        Err(ScpError::NotSupported(
            "reading files over an HTTP download".into(),
        ))
    }

    fn mkdir(&mut self, _path: &Path, _mode: u32) -> Result<(), ScpError> {
        Err(ScpError::NotSupported(
            "copying directories over an HTTP download".into(),
        ))
    }

    fn open_file(&mut self, _path: &Path) -> Result<FileReader, ScpError> {
        Err(ScpError::NotSupported(
            "reading files over an HTTP download".into(),
        ))
    }

    fn create_file(&mut self, path: &Path, length: u64) -> Result<FileWriter, ScpError> {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                ScpError::BadParameter(format!("missing file name in {}", path.display()))
            })?;

        let headers_tx = self
            .headers_tx
            .take()
            .ok_or_else(|| ScpError::Backend("response body already created".into()))?;
        let body = self
            .body
            .take()
            .ok_or_else(|| ScpError::Backend("response body already created".into()))?;

        let headers = response_headers(&filename, length)?;
        // The HTTP layer may have gone away; the transfer still runs.
        let _ = headers_tx.send(headers);

        Ok(Box::new(ResponseBody { inner: body }))
    }

    fn set_chmod(&mut self, _path: &Path, _mode: u32) -> Result<(), ScpError> {
        Ok(())
    }
}

fn response_headers(filename: &str, length: u64) -> Result<HeaderMap, ScpError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(EXPIRES, HeaderValue::from_static("0"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(
        CONTENT_LENGTH,
        HeaderValue::from_str(&length.to_string())
            .map_err(|err| ScpError::Backend(format!("invalid content length: {err}")))?,
    );
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(
        CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment;filename=\"{filename}\""))
            .map_err(|err| ScpError::Backend(format!("invalid file name for response: {err}")))?,
    );
    Ok(headers)
}

/// Body writer whose shutdown only flushes.
struct ResponseBody {
    inner: FileWriter,
}

impl AsyncWrite for ResponseBody {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }
}
