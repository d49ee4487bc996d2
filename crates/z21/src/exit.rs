use std::fmt;
use std::io;

use z21_conn::ConnError;
use z21_transport::TransportError;

// Process exit codes. TIMEOUT matches timeout(1).
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Bind(source) | TransportError::Connect { source, .. } => {
            io_error(context, source)
        }
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn conn_error(context: &str, err: ConnError) -> CliError {
    match err {
        ConnError::Transport(err) => transport_error(context, err),
        ConnError::BadPacket(source) => io_error(context, source),
        ConnError::Timeout(_) | ConnError::DeadlineElapsed(_) => {
            CliError::new(TIMEOUT, format!("{context}: {err}"))
        }
        ConnError::Frame(_) | ConnError::UnexpectedReply { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        ConnError::NotConnected | ConnError::Closed => {
            CliError::new(FAILURE, format!("{context}: {err}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn timeouts_map_to_124() {
        let err = conn_error("hwinfo", ConnError::Timeout(Duration::from_secs(1)));
        assert_eq!(err.code, TIMEOUT);
        assert!(err.message.starts_with("hwinfo: "));
    }

    #[test]
    fn resolve_failure_is_transport_error() {
        let err = conn_error(
            "connect failed",
            ConnError::Transport(TransportError::Resolve {
                addr: "nowhere:21105".into(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such host"),
            }),
        );
        assert_eq!(err.code, TRANSPORT_ERROR);
    }

    #[test]
    fn write_failure_uses_io_kind() {
        let err = conn_error(
            "send failed",
            ConnError::BadPacket(io::Error::new(io::ErrorKind::PermissionDenied, "denied")),
        );
        assert_eq!(err.code, PERMISSION_DENIED);
    }

    #[test]
    fn wrong_reply_is_data_invalid() {
        let err = conn_error(
            "status",
            ConnError::UnexpectedReply {
                expected: "status",
                got: "stop",
            },
        );
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn unframeable_message_is_data_invalid() {
        let err = conn_error(
            "send failed",
            ConnError::Frame(z21_frame::FrameError::PayloadTooLarge {
                size: 70_000,
                max: 65_531,
            }),
        );
        assert_eq!(err.code, DATA_INVALID);
    }
}
