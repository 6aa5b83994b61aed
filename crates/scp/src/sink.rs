//! Sink half of the protocol engine: receives files and directories from
//! the peer and writes them through the backend.

use std::io::Write;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::audit::AuditEvent;
use crate::command::Parameters;
use crate::error::ScpError;
use crate::wire::{self, Frame, NewFileCmd, OK_BYTE};

/// Directory traversal state for one receive.
///
/// The stack starts at `["."]`; the path being written is the target joined
/// with every segment after the root and the entry name. Popping past the
/// bottom is tolerated once, for the closing `E` some senders emit at the
/// end of a transfer.
#[derive(Debug)]
struct ReceiverState {
    path: Vec<String>,
    finished: bool,
}

impl ReceiverState {
    fn new() -> Self {
        Self {
            path: vec![".".to_string()],
            finished: false,
        }
    }

    fn push(&mut self, dir: &str) {
        self.path.push(dir.to_string());
    }

    fn pop(&mut self) -> Result<(), ScpError> {
        if self.finished {
            return Err(ScpError::MalformedFrame(
                "directory close past the end of the transfer".into(),
            ));
        }
        if self.path.is_empty() {
            self.finished = true;
            return Ok(());
        }
        self.path.pop();
        Ok(())
    }

    fn make_path(&self, target: &Path, name: &str) -> PathBuf {
        let mut path = target.to_path_buf();
        for dir in self.path.iter().skip(1) {
            path.push(dir);
        }
        path.push(name);
        path
    }
}

/// Receives frames from the peer until a clean end of stream.
pub(crate) async fn serve_sink<C>(
    params: &mut Parameters,
    channel: &mut C,
) -> Result<(), ScpError>
where
    C: AsyncRead + AsyncWrite + Send + Unpin,
{
    wire::send_ok(channel).await?;

    let mut state = ReceiverState::new();
    loop {
        let control = match wire::read_control_byte(channel).await? {
            None => return Ok(()),
            Some(byte) => byte,
        };
        if control == OK_BYTE {
            // The terminator of the previous file body.
            continue;
        }

        let line = wire::read_line(channel).await?;
        let frame = Frame::parse(control, &line)?;
        debug!(?frame, "sink frame");
        process_frame(params, &mut state, frame, channel).await?;
        wire::send_ok(channel).await?;
    }
}

async fn process_frame<C>(
    params: &mut Parameters,
    state: &mut ReceiverState,
    frame: Frame,
    channel: &mut C,
) -> Result<(), ScpError>
where
    C: AsyncRead + AsyncWrite + Send + Unpin,
{
    match frame {
        Frame::Warning(text) | Frame::Error(text) => Err(ScpError::Peer(text)),
        Frame::File(fc) => receive_file(params, state, &fc, channel).await,
        Frame::Dir(fc) => receive_dir(params, state, &fc),
        Frame::EndDir => state.pop(),
        // Time hints are validated by the parser and not applied.
        Frame::Times(_) => Ok(()),
    }
}

async fn receive_file<C>(
    params: &mut Parameters,
    state: &ReceiverState,
    fc: &NewFileCmd,
    channel: &mut C,
) -> Result<(), ScpError>
where
    C: AsyncRead + AsyncWrite + Send + Unpin,
{
    // A directory target (or a recursive transfer) nests the file under it;
    // any other target is overwritten in place.
    let target = params.flags.targets[0].clone();
    let path = if params.flags.recursive || params.fs.is_dir(&target) {
        state.make_path(&target, &fc.name)
    } else {
        target
    };

    let mut writer = params.fs.create_file(&path, fc.length)?;

    if let Some(audit) = &params.audit {
        audit.emit(AuditEvent::write(
            &path,
            fc.length,
            &params.flags.local_addr,
            &params.flags.remote_addr,
            &params.login,
        ));
    }

    wire::send_ok(channel).await?;

    let mut body = (&mut *channel).take(fc.length);
    let copied = tokio::io::copy(&mut body, &mut writer).await?;
    if copied != fc.length {
        return Err(ScpError::ShortRead {
            read: copied,
            expected: fc.length,
        });
    }
    writer.shutdown().await?;
    drop(writer);

    params.fs.set_chmod(&path, fc.mode)?;

    debug!(path = %path.display(), length = fc.length, "file received");
    if let Some(progress) = params.progress.as_mut() {
        let _ = writeln!(progress, "<- {} ({})", path.display(), fc.length);
    }
    Ok(())
}

fn receive_dir(
    params: &mut Parameters,
    state: &mut ReceiverState,
    fc: &NewFileCmd,
) -> Result<(), ScpError> {
    let mut target = params.flags.targets[0].clone();

    // Copying into an existing directory nests under it.
    if params.fs.is_dir(&target) {
        target = state.make_path(&target, &fc.name);
        state.push(&fc.name);
    }

    params.fs.mkdir(&target, fc.mode)
}
