/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// Fewer bytes than the 4-byte envelope.
    #[error("truncated frame ({len} bytes, need at least 4)")]
    Truncated { len: usize },

    /// The declared length runs past the end of the datagram.
    #[error("declared frame length {declared} exceeds {available} available bytes")]
    LengthExceedsAvailable { declared: usize, available: usize },

    /// The declared length cannot even cover the envelope.
    #[error("declared frame length {declared} is shorter than the 4-byte envelope")]
    LengthBelowHeader { declared: usize },

    /// The payload does not fit the 16-bit length field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
