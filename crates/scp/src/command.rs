//! Transfer configuration and the command façade.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::warn;

use crate::audit::AuditSink;
use crate::error::ScpError;
use crate::fs::FileSystem;
use crate::local::LocalFs;
use crate::sink::serve_sink;
use crate::source::serve_source;
use crate::wire;

/// Transfer direction and targets, as an `scp` invocation expresses them.
#[derive(Debug, Clone, Default)]
pub struct Flags {
    /// Produce data: send `targets` to the peer.
    pub source: bool,
    /// Consume data: receive into `targets[0]`.
    pub sink: bool,
    /// Descend into directories (`-r`).
    pub recursive: bool,
    /// Verbose mode (`-v`).
    pub verbose: bool,
    /// Paths to send, or the single destination to receive into.
    pub targets: Vec<PathBuf>,
    /// Local address of the session, for audit records.
    pub local_addr: String,
    /// Remote address of the session, for audit records.
    pub remote_addr: String,
}

/// Which end of the session the engine runs on.
///
/// Decides where failures go: a client surfaces them to its caller, a
/// server serializes them onto the channel for the peer scp to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Client,
    Server,
}

/// Configuration for one transfer. Built once, consumed by [`Command`].
pub struct Parameters {
    pub flags: Flags,
    /// Login attached to audit records.
    pub login: String,
    /// Optional audit destination.
    pub audit: Option<Arc<dyn AuditSink>>,
    /// Optional per-file progress text sink, written on the client side.
    pub progress: Option<Box<dyn Write + Send>>,
    pub side: Side,
    /// Storage backend; local disk unless replaced.
    pub fs: Box<dyn FileSystem>,
    /// The transfer path as the remote peer expresses it.
    pub remote_location: String,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            flags: Flags::default(),
            login: String::new(),
            audit: None,
            progress: None,
            side: Side::Client,
            fs: Box::new(LocalFs),
            remote_location: String::new(),
        }
    }
}

/// One SCP transfer, either half of the protocol.
///
/// Mimics the scp command-line tool closely enough that the peer believes a
/// real scp runs behind the channel.
pub struct Command {
    params: Parameters,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command").finish_non_exhaustive()
    }
}

impl Command {
    /// Validates `params` and builds the command.
    pub fn new(params: Parameters) -> Result<Self, ScpError> {
        if params.remote_location.is_empty() {
            return Err(ScpError::BadParameter("missing remote file location".into()));
        }
        if params.flags.source == params.flags.sink {
            return Err(ScpError::BadParameter(
                "exactly one of source and sink must be requested".into(),
            ));
        }
        if params.flags.targets.is_empty() {
            return Err(ScpError::BadParameter("no transfer targets".into()));
        }
        Ok(Self { params })
    }

    /// A command that sends `targets` to the peer.
    pub fn upload(mut params: Parameters) -> Result<Self, ScpError> {
        params.flags.source = true;
        params.flags.sink = false;
        Self::new(params)
    }

    /// A command that receives from the peer into `targets[0]`.
    pub fn download(mut params: Parameters) -> Result<Self, ScpError> {
        params.flags.sink = true;
        params.flags.source = false;
        Self::new(params)
    }

    /// The exact command line the host runs on the peer: `-t` tells the
    /// peer to receive what we send, `-f` to send what we receive.
    pub fn shell_command_string(&self) -> String {
        let mut cmd = String::from(if self.params.flags.source {
            "/usr/bin/scp -t"
        } else {
            "/usr/bin/scp -f"
        });
        if self.params.flags.recursive {
            cmd.push_str(" -r");
        }
        cmd.push(' ');
        cmd.push_str(&self.params.remote_location);
        cmd
    }

    /// Runs the transfer over `channel`.
    ///
    /// On [`Side::Server`] a failure is reported to the peer as an in-band
    /// error line and this call returns success; I/O errors on that
    /// reporting write are logged and swallowed, there being no channel
    /// left to report them on. On [`Side::Client`] failures are returned.
    pub async fn execute<C>(&mut self, channel: &mut C) -> Result<(), ScpError>
    where
        C: AsyncRead + AsyncWrite + Send + Unpin,
    {
        let result = if self.params.flags.source {
            serve_source(&mut self.params, channel).await
        } else {
            serve_sink(&mut self.params, channel).await
        };

        match result {
            Ok(()) => Ok(()),
            Err(err) => match self.params.side {
                Side::Client => Err(err),
                Side::Server => {
                    warn!(error = %err, "transfer failed, reporting to the peer in-band");
                    if let Err(write_err) = wire::send_error(channel, &err.to_string()).await {
                        warn!(error = %write_err, "failed to report the error to the peer");
                    }
                    Ok(())
                }
            },
        }
    }
}
