use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame envelope: length (2) + header (2) = 4 bytes.
pub const HEADER_SIZE: usize = 4;

/// Largest payload the 16-bit length field can describe.
pub const MAX_PAYLOAD: usize = u16::MAX as usize - HEADER_SIZE;

/// One length-prefixed protocol envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Message family selector (e.g. `0x0040` for X-Bus).
    pub header: u16,
    /// Payload following the envelope.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(header: u16, payload: impl Into<Bytes>) -> Self {
        Self {
            header,
            payload: payload.into(),
        }
    }

    /// Value of the length field: envelope plus payload.
    pub fn wire_len(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// Encode this frame into a fresh buffer.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut dst = BytesMut::with_capacity(self.wire_len());
        encode_frame(self.header, &self.payload, &mut dst)?;
        Ok(dst.freeze())
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────────┬──────────────────────┐
/// │ Length (2B)  │ Header (2B)  │ Payload              │
/// │ LE, = 4 + N  │ LE           │ (N bytes)            │
/// └──────────────┴──────────────┴──────────────────────┘
/// ```
pub fn encode_frame(header: u16, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u16_le((HEADER_SIZE + payload.len()) as u16);
    dst.put_u16_le(header);
    dst.put_slice(payload);
    Ok(())
}

/// Decode one frame from the front of `src`.
///
/// On success the frame's bytes are consumed and `src` holds the rest of the
/// datagram. On failure `src` is left untouched.
pub fn decode_frame(src: &mut Bytes) -> Result<Frame> {
    if src.len() < HEADER_SIZE {
        return Err(FrameError::Truncated { len: src.len() });
    }

    let declared = u16::from_le_bytes([src[0], src[1]]) as usize;
    if declared > src.len() {
        return Err(FrameError::LengthExceedsAvailable {
            declared,
            available: src.len(),
        });
    }
    if declared < HEADER_SIZE {
        return Err(FrameError::LengthBelowHeader { declared });
    }

    let mut frame = src.split_to(declared);
    frame.advance(2);
    let header = frame.get_u16_le();

    Ok(Frame {
        header,
        payload: frame,
    })
}

/// Split one datagram into the frames it carries.
///
/// Frames are decoded sequentially, each consuming exactly its declared
/// length. Any malformed frame fails the whole datagram.
pub fn split_datagram(datagram: impl Into<Bytes>) -> Result<Vec<Frame>> {
    let mut rest: Bytes = datagram.into();
    let mut frames = Vec::new();
    while !rest.is_empty() {
        frames.push(decode_frame(&mut rest)?);
    }
    Ok(frames)
}
