//! Error types for the SCP engine.

/// Errors produced by the SCP protocol engine and its backends.
#[derive(Debug, thiserror::Error)]
pub enum ScpError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid parameter: {0}")]
    BadParameter(String),

    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    #[error("malformed acknowledgement byte {0:#04x}")]
    MalformedAck(u8),

    #[error("remote peer error: {0}")]
    Peer(String),

    #[error("short write: {written} of {expected} bytes")]
    ShortWrite { written: u64, expected: u64 },

    #[error("short read: {read} of {expected} bytes")]
    ShortRead { read: u64, expected: u64 },

    #[error("backend error: {0}")]
    Backend(String),

    #[error("not supported: {0}")]
    NotSupported(String),
}
