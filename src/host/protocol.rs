use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{self, BufRead, Read, Write};

/// Largest body a client may announce in one frame.
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

const CONTENT_LENGTH: &str = "Content-Length:";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostMessage {
    pub seq: u64,
    #[serde(flatten)]
    pub content: HostMessageContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HostMessageContent {
    Request {
        command: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        arguments: Option<Value>,
    },
    Response {
        request_seq: u64,
        success: bool,
        command: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        body: Option<Value>,
    },
    Event {
        event: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        body: Option<Value>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("frame header has no Content-Length")]
    MissingContentLength,

    #[error("frame of {0} bytes exceeds the {} byte limit", MAX_FRAME_LEN)]
    FrameTooLarge(usize),

    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read one `Content-Length` framed message. `Ok(None)` means end of input.
///
/// The header is also recognised at the tail of a line, so after a frame
/// without a length the stream picks up again at the next real header.
/// Oversized bodies are discarded without being buffered.
pub fn read_message<R: BufRead>(reader: &mut R) -> Result<Option<HostMessage>, ProtocolError> {
    let mut content_length: Option<usize> = None;
    let mut saw_header = false;

    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            if saw_header {
                return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
            }
            return Ok(None);
        }

        let line = line.trim_end_matches(&['\r', '\n'][..]);
        if line.is_empty() {
            if saw_header {
                break;
            }
            continue;
        }
        saw_header = true;

        if let Some(at) = line.find(CONTENT_LENGTH) {
            content_length = line[at + CONTENT_LENGTH.len()..].trim().parse().ok();
        }
    }

    let len = content_length.ok_or(ProtocolError::MissingContentLength)?;
    if len > MAX_FRAME_LEN {
        io::copy(&mut (&mut *reader).take(len as u64), &mut io::sink())?;
        return Err(ProtocolError::FrameTooLarge(len));
    }
    let mut buffer = vec![0u8; len];
    reader.read_exact(&mut buffer)?;
    Ok(Some(serde_json::from_slice(&buffer)?))
}

pub fn write_message<W: Write>(writer: &mut W, msg: &HostMessage) -> Result<(), ProtocolError> {
    let json = serde_json::to_string(msg)?;
    write!(writer, "Content-Length: {}\r\n\r\n{}", json.len(), json)?;
    writer.flush()?;
    Ok(())
}
