use z21_frame::FrameError;

/// Errors that can occur while decoding a frame into a message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The envelope itself was malformed.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Level 0: the frame header is not in the decode table.
    #[error("unknown frame header 0x{0:04x}")]
    UnknownHeader(u16),

    /// Level 1: the X-Bus header is not in the decode table.
    #[error("unknown x-bus header 0x{0:02x}")]
    UnknownXHeader(u8),

    /// Level 2: the DB0 byte is not valid below its X-Bus header.
    #[error("unknown x-bus db0 0x{db0:02x} (x-header 0x{x_header:02x})")]
    UnknownDb0 { x_header: u8, db0: u8 },

    /// The payload ended before the discriminator byte.
    #[error("payload too short to select a message variant")]
    Truncated,

    /// The payload is shorter than the variant's field layout.
    #[error("short payload: need {needed} bytes, have {available}")]
    ShortPayload { needed: usize, available: usize },
}

pub type Result<T> = std::result::Result<T, DecodeError>;
