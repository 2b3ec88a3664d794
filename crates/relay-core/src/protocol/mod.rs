//! Protocol module containing the command grammar, response encoding, and
//! frame header helpers.

pub mod command;
pub mod framing;
pub mod response;

pub use command::{decode_command, Command, DecodeError};
pub use framing::{encode_frame, payload_len, FrameError, HEADER_LEN, MAX_FRAME_LEN};
pub use response::{Notification, Response};
