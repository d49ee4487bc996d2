use std::time::Duration;

/// Errors that can occur on a Z21 connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnError {
    /// Dialing or socket setup failed.
    #[error("transport error: {0}")]
    Transport(#[from] z21_transport::TransportError),

    /// The outgoing message could not be framed.
    #[error("frame error: {0}")]
    Frame(#[from] z21_frame::FrameError),

    /// The connection was closed or never opened.
    #[error("not connected")]
    NotConnected,

    /// Writing the datagram failed.
    #[error("bad packet: {0}")]
    BadPacket(#[source] std::io::Error),

    /// No reply arrived within the per-request timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The caller's own deadline elapsed first.
    #[error("deadline elapsed after {0:?}")]
    DeadlineElapsed(Duration),

    /// The connection was closed while the request was waiting.
    #[error("connection closed")]
    Closed,

    /// The station answered with a different message kind.
    #[error("unexpected reply: expected {expected}, got {got}")]
    UnexpectedReply {
        expected: &'static str,
        got: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, ConnError>;
