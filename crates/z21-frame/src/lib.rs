//! Length-prefixed framing for the Z21 LAN protocol.
//!
//! Every frame on the wire carries:
//! - A 2-byte little-endian total length (envelope included)
//! - A 2-byte little-endian header selecting the message family
//! - `length - 4` payload bytes
//!
//! One UDP datagram may hold several frames back-to-back; [`split_datagram`]
//! walks them by their own length fields.

pub mod codec;
pub mod error;
pub mod header;

pub use codec::{decode_frame, encode_frame, split_datagram, Frame, HEADER_SIZE, MAX_PAYLOAD};
pub use error::{FrameError, Result};
pub use header::frame_name;
