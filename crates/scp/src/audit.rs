//! Audit records emitted for each transferred file.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Record kind attached to every SCP audit event.
pub const EVENT_KIND: &str = "scp";

/// Direction of the storage access being audited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    /// A file was read from the backend and sent to the peer.
    Read,
    /// A file received from the peer was written to the backend.
    Write,
}

/// One transferred file, as reported to the audit sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub kind: String,
    pub path: String,
    pub len: u64,
    pub local_addr: String,
    pub remote_addr: String,
    pub login: String,
    pub action: AuditAction,
}

impl AuditEvent {
    /// Event for a file sent to the peer.
    pub fn read(path: &Path, len: u64, local_addr: &str, remote_addr: &str, login: &str) -> Self {
        Self::new(path, len, local_addr, remote_addr, login, AuditAction::Read)
    }

    /// Event for a file received from the peer.
    pub fn write(path: &Path, len: u64, local_addr: &str, remote_addr: &str, login: &str) -> Self {
        Self::new(path, len, local_addr, remote_addr, login, AuditAction::Write)
    }

    fn new(
        path: &Path,
        len: u64,
        local_addr: &str,
        remote_addr: &str,
        login: &str,
        action: AuditAction,
    ) -> Self {
        Self {
            kind: EVENT_KIND.to_string(),
            path: path.display().to_string(),
            len,
            local_addr: local_addr.to_string(),
            remote_addr: remote_addr.to_string(),
            login: login.to_string(),
            action,
        }
    }
}

/// Destination for audit events.
///
/// The engine calls this from its own task; storage and fan-out are the
/// sink's concern.
pub trait AuditSink: Send + Sync {
    fn emit(&self, event: AuditEvent);
}
