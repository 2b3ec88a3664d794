//! Frame header helpers for carrying relay messages over a TCP stream.
//!
//! Wire format:
//! ```text
//! [payload_len:4][payload:N]
//! ```
//! The length is a big-endian `u32`. TCP is a byte stream with no message
//! boundaries of its own, so the transport adapter prefixes every message
//! with its length and the receiving side reads exactly that many bytes
//! before handing the payload to the codec. The payload itself is the
//! line-oriented UTF-8 text described in [`crate::protocol::command`].

use thiserror::Error;

/// Size of the frame header in bytes.
pub const HEADER_LEN: usize = 4;

/// Upper bound on a single frame payload.
///
/// The largest legitimate message is a `list` response, one line per
/// registered server; 64 KiB covers thousands of entries. Anything larger is
/// treated as a corrupt or hostile header so a single bad peer cannot make
/// the relay allocate unbounded memory.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Errors produced when validating a frame header.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// The header declares a zero-length payload.
    #[error("frame declares an empty payload")]
    EmptyPayload,

    /// The header declares a payload larger than [`MAX_FRAME_LEN`].
    #[error("frame payload of {declared} bytes exceeds the {max} byte limit")]
    Oversized { declared: usize, max: usize },
}

/// Wraps `payload` in a frame: 4-byte big-endian length header + payload.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Validates a frame header and returns the declared payload length.
///
/// # Errors
///
/// Returns [`FrameError::EmptyPayload`] for a zero length and
/// [`FrameError::Oversized`] when the declared length exceeds
/// [`MAX_FRAME_LEN`].
pub fn payload_len(header: [u8; HEADER_LEN]) -> Result<usize, FrameError> {
    let declared = u32::from_be_bytes(header) as usize;
    if declared == 0 {
        return Err(FrameError::EmptyPayload);
    }
    if declared > MAX_FRAME_LEN {
        return Err(FrameError::Oversized {
            declared,
            max: MAX_FRAME_LEN,
        });
    }
    Ok(declared)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
