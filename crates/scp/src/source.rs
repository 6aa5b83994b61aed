//! Source half of the protocol engine: reads files and directories from the
//! backend and sends them to the peer.

use std::future::Future;
use std::io::Write;
use std::pin::Pin;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tracing::debug;

use crate::audit::AuditEvent;
use crate::command::Parameters;
use crate::error::ScpError;
use crate::fs::FileInfo;
use crate::wire;

/// Sends every target to the peer.
pub(crate) async fn serve_source<C>(
    params: &mut Parameters,
    channel: &mut C,
) -> Result<(), ScpError>
where
    C: AsyncRead + AsyncWrite + Send + Unpin,
{
    // Resolve everything up front so a bad target fails before any I/O
    // reaches the channel.
    let mut entries = Vec::with_capacity(params.flags.targets.len());
    for target in &params.flags.targets {
        let info = params.fs.file_info(target)?;
        if info.is_dir() && !params.flags.recursive {
            return Err(ScpError::BadParameter(format!(
                "{} is a directory (use the recursive flag)",
                info.name()
            )));
        }
        entries.push(info);
    }

    wire::read_ack(channel).await?;

    for info in &entries {
        send_entry(params, channel, info.as_ref()).await?;
    }

    debug!("send completed");
    Ok(())
}

fn send_entry<'a, C>(
    params: &'a mut Parameters,
    channel: &'a mut C,
    info: &'a dyn FileInfo,
) -> Pin<Box<dyn Future<Output = Result<(), ScpError>> + Send + 'a>>
where
    C: AsyncRead + AsyncWrite + Send + Unpin,
{
    Box::pin(async move {
        if info.is_dir() {
            // Directory descent recurses through this function; box the cycle.
            send_dir(params, channel, info).await
        } else {
            send_file(params, channel, info).await
        }
    })
}

fn send_dir<'a, C>(
    params: &'a mut Parameters,
    channel: &'a mut C,
    info: &'a dyn FileInfo,
) -> Pin<Box<dyn Future<Output = Result<(), ScpError>> + Send + 'a>>
where
    C: AsyncRead + AsyncWrite + Send + Unpin,
{
    Box::pin(async move {
        debug!(path = %info.path().display(), "sending directory");
        wire::write_dir_open(channel, info.mode_perm(), &info.name()).await?;
        wire::read_ack(channel).await?;

        for child in info.read_dir()? {
            send_entry(params, channel, child.as_ref()).await?;
        }

        wire::write_dir_close(channel).await?;
        wire::read_ack(channel).await
    })
}

async fn send_file<C>(
    params: &mut Parameters,
    channel: &mut C,
    info: &dyn FileInfo,
) -> Result<(), ScpError>
where
    C: AsyncRead + AsyncWrite + Send + Unpin,
{
    if let Some(audit) = &params.audit {
        audit.emit(AuditEvent::read(
            info.path(),
            info.size(),
            &params.flags.local_addr,
            &params.flags.remote_addr,
            &params.login,
        ));
    }

    let reader = params.fs.open_file(info.path())?;
    let size = info.size();

    wire::write_file_header(channel, info.mode_perm(), size, &info.name()).await?;
    wire::read_ack(channel).await?;

    // Cap the body at the advertised size; a reader that yields more must
    // not spill past the header's promise.
    let mut body = reader.take(size);
    let written = tokio::io::copy(&mut body, channel).await?;
    if written != size {
        return Err(ScpError::ShortWrite {
            written,
            expected: size,
        });
    }

    wire::send_ok(channel).await?;
    wire::read_ack(channel).await?;

    debug!(path = %info.path().display(), size, "file sent");
    if let Some(progress) = params.progress.as_mut() {
        let _ = writeln!(progress, "-> {} ({})", info.path().display(), size);
    }
    Ok(())
}
