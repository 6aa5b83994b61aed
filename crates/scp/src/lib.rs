//! SCP protocol engine for skiff session channels.
//!
//! Implements both halves of the scp wire protocol, the source (sending
//! files and directories to a peer scp) and the sink (receiving them),
//! over any bidirectional byte channel supplied by the host. Storage
//! is pluggable: the engine drives a [`FileSystem`] backend and ships with
//! the local-disk implementation; the companion `skiff_scp_http` crate adds
//! HTTP upload/download adapters.
//!
//! A transfer is configured by [`Parameters`], wrapped in a [`Command`],
//! and run with [`Command::execute`] on the channel. The command also
//! renders the `/usr/bin/scp {-t|-f} [-r] <path>` line the host invokes on
//! the peer. See [`wire`] for the frame format.

pub mod audit;
pub mod command;
pub mod destination;
pub mod error;
pub mod fs;
pub mod local;
mod sink;
mod source;
pub mod wire;

pub use command::{Command, Flags, Parameters, Side};
pub use destination::Destination;
pub use error::ScpError;
pub use fs::{FileInfo, FileReader, FileSystem, FileWriter};
pub use local::LocalFs;
