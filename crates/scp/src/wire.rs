//! SCP wire format.
//!
//! # Wire format
//!
//! ```text
//! ACK:           [1 byte: 0x00=OK, 0x01=warning + text line, 0x02=error + text line]
//!
//! FILE:          C<mode:04 octal> <size decimal> <name>\n
//!                [size bytes: raw file data]
//!                [1 byte: 0x00]
//!
//! DIRECTORY:     D<mode:04 octal> 0 <name>\n
//!                ... nested FILE / DIRECTORY frames ...
//!                E\n
//!
//! TIME HINT:     T<mtime sec> <mtime nsec> <atime sec> <atime nsec>\n
//! ```
//!
//! Every control line ends with exactly one `\n`. The receiver acknowledges
//! each frame with a single OK byte before the peer proceeds. File names may
//! contain spaces; header parsers split only on the first two spaces.
//!
//! Line scanning is byte-at-a-time: exactly one byte is consumed per OK and
//! exactly the line through its `\n` for warnings and errors, so no file
//! body bytes are ever buffered away from the caller.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::ScpError;

/// Acknowledgement: OK.
pub const OK_BYTE: u8 = 0x00;

/// Acknowledgement: a warning text line follows.
pub const WARN_BYTE: u8 = 0x01;

/// Acknowledgement: an error text line follows.
pub const ERR_BYTE: u8 = 0x02;

/// Maximum accepted control-line length in bytes.
pub const MAX_LINE_LEN: usize = 8 * 1024;

/// Largest mode value a file or directory header may carry.
pub const MAX_MODE: u32 = 0o7777;

/// A parsed `C` (file) or `D` (directory) header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFileCmd {
    /// Permission bits, at most [`MAX_MODE`].
    pub mode: u32,
    /// Body length in bytes; zero for directories.
    pub length: u64,
    /// Entry name; may contain spaces, never a newline.
    pub name: String,
}

impl NewFileCmd {
    /// Parses the line following a `C` or `D` control byte.
    pub fn parse(line: &str) -> Result<Self, ScpError> {
        let mut parts = line.splitn(3, ' ');
        let (mode_str, length_str, name) = match (parts.next(), parts.next(), parts.next()) {
            (Some(m), Some(l), Some(n)) => (m, l, n),
            _ => {
                return Err(ScpError::MalformedFrame(format!(
                    "file header needs mode, size and name: {line:?}"
                )));
            }
        };

        let mode = u32::from_str_radix(mode_str, 8).map_err(|_| {
            ScpError::MalformedFrame(format!("invalid octal mode: {mode_str:?}"))
        })?;
        if mode > MAX_MODE {
            return Err(ScpError::MalformedFrame(format!(
                "mode {mode:o} exceeds {MAX_MODE:o}"
            )));
        }

        let length = length_str.parse::<u64>().map_err(|_| {
            ScpError::MalformedFrame(format!("invalid size: {length_str:?}"))
        })?;

        if name.is_empty() {
            return Err(ScpError::MalformedFrame("empty file name".into()));
        }

        Ok(Self {
            mode,
            length,
            name: name.to_string(),
        })
    }
}

/// Seconds and nanoseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpec {
    pub secs: i64,
    pub nanos: i64,
}

/// A parsed `T` (time hint) line. Validated, never applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MtimeCmd {
    pub mtime: TimeSpec,
    pub atime: TimeSpec,
}

impl MtimeCmd {
    /// Parses the line following a `T` control byte.
    pub fn parse(line: &str) -> Result<Self, ScpError> {
        let mut fields = [0i64; 4];
        let mut parts = line.splitn(4, ' ');
        for field in &mut fields {
            let token = parts.next().ok_or_else(|| {
                ScpError::MalformedFrame(format!("time hint needs four fields: {line:?}"))
            })?;
            *field = token.parse::<i64>().map_err(|_| {
                ScpError::MalformedFrame(format!("invalid time value: {token:?}"))
            })?;
        }
        Ok(Self {
            mtime: TimeSpec {
                secs: fields[0],
                nanos: fields[1],
            },
            atime: TimeSpec {
                secs: fields[2],
                nanos: fields[3],
            },
        })
    }
}

/// A control frame, dispatched on the byte that leads it.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// `C`: a file header; a body of `length` bytes plus a terminating OK
    /// byte follows on the channel.
    File(NewFileCmd),
    /// `D`: open a directory; closed by a matching `EndDir`.
    Dir(NewFileCmd),
    /// `E`: close the most recently opened directory.
    EndDir,
    /// `T`: time hints for the next entry.
    Times(MtimeCmd),
    /// `0x01`: the peer reports a warning.
    Warning(String),
    /// `0x02`: the peer reports an error.
    Error(String),
}

impl Frame {
    /// Builds a frame from its control byte and the rest of the line.
    pub fn parse(control: u8, line: &str) -> Result<Self, ScpError> {
        match control {
            b'C' => Ok(Frame::File(NewFileCmd::parse(line)?)),
            b'D' => Ok(Frame::Dir(NewFileCmd::parse(line)?)),
            b'E' => Ok(Frame::EndDir),
            b'T' => Ok(Frame::Times(MtimeCmd::parse(line)?)),
            WARN_BYTE => Ok(Frame::Warning(line.to_string())),
            ERR_BYTE => Ok(Frame::Error(line.to_string())),
            other => Err(ScpError::MalformedFrame(format!(
                "unrecognized command byte {other:#04x}"
            ))),
        }
    }
}

/// Reads one byte from the channel.
///
/// Returns `None` on a clean end of stream, which is only legal at a frame
/// boundary.
pub async fn read_control_byte<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> Result<Option<u8>, ScpError> {
    let mut b = [0u8; 1];
    match reader.read(&mut b).await? {
        0 => Ok(None),
        _ => Ok(Some(b[0])),
    }
}

/// Reads a control line up to and including its `\n`, one byte at a time.
///
/// The returned string excludes the newline. Running out of stream mid-line
/// or exceeding [`MAX_LINE_LEN`] is a malformed-frame error.
pub async fn read_line<R: AsyncRead + Unpin>(reader: &mut R) -> Result<String, ScpError> {
    let mut line = Vec::new();
    let mut b = [0u8; 1];
    loop {
        if reader.read(&mut b).await? == 0 {
            return Err(ScpError::MalformedFrame(
                "unexpected end of stream inside a control line".into(),
            ));
        }
        if b[0] == b'\n' {
            break;
        }
        line.push(b[0]);
        if line.len() > MAX_LINE_LEN {
            return Err(ScpError::MalformedFrame("control line too long".into()));
        }
    }
    String::from_utf8(line)
        .map_err(|_| ScpError::MalformedFrame("control line is not valid UTF-8".into()))
}

/// Consumes the peer's response to the previous frame.
///
/// One OK byte succeeds; a warning or error byte consumes the attached text
/// line and fails with it; anything else is a malformed acknowledgement.
pub async fn read_ack<R: AsyncRead + Unpin>(reader: &mut R) -> Result<(), ScpError> {
    let mut b = [0u8; 1];
    if reader.read(&mut b).await? == 0 {
        return Err(ScpError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "channel closed while waiting for acknowledgement",
        )));
    }
    match b[0] {
        OK_BYTE => Ok(()),
        WARN_BYTE | ERR_BYTE => Err(ScpError::Peer(read_line(reader).await?)),
        other => Err(ScpError::MalformedAck(other)),
    }
}

/// Writes a single OK byte.
pub async fn send_ok<W: AsyncWrite + Unpin>(writer: &mut W) -> Result<(), ScpError> {
    writer.write_all(&[OK_BYTE]).await?;
    writer.flush().await?;
    Ok(())
}

/// Writes an in-band error line for the peer to print.
///
/// Embedded newlines in the message would terminate the line early, so they
/// are replaced with spaces.
pub async fn send_error<W: AsyncWrite + Unpin>(
    writer: &mut W,
    message: &str,
) -> Result<(), ScpError> {
    let text = message.replace('\n', " ");
    let mut frame = Vec::with_capacity(text.len() + 2);
    frame.push(ERR_BYTE);
    frame.extend_from_slice(text.as_bytes());
    frame.push(b'\n');
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

fn check_name(name: &str) -> Result<(), ScpError> {
    if name.is_empty() || name.contains('\n') {
        return Err(ScpError::BadParameter(format!(
            "invalid entry name for transfer: {name:?}"
        )));
    }
    Ok(())
}

/// Writes a `C` file header.
pub async fn write_file_header<W: AsyncWrite + Unpin>(
    writer: &mut W,
    mode: u32,
    size: u64,
    name: &str,
) -> Result<(), ScpError> {
    check_name(name)?;
    let line = format!("C{:04o} {} {}\n", mode & MAX_MODE, size, name);
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Writes a `D` directory-open header.
pub async fn write_dir_open<W: AsyncWrite + Unpin>(
    writer: &mut W,
    mode: u32,
    name: &str,
) -> Result<(), ScpError> {
    check_name(name)?;
    let line = format!("D{:04o} 0 {}\n", mode & MAX_MODE, name);
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Writes an `E` directory-close frame.
pub async fn write_dir_close<W: AsyncWrite + Unpin>(writer: &mut W) -> Result<(), ScpError> {
    writer.write_all(b"E\n").await?;
    writer.flush().await?;
    Ok(())
}
