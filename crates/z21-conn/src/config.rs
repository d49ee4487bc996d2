use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use z21_transport::Dialer;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default number of unsolicited messages buffered for the event stream.
pub const DEFAULT_EVENT_CAPACITY: usize = 500;
/// Default receive buffer, one Ethernet MTU worth of UDP payload.
pub const DEFAULT_RECV_BUFFER_SIZE: usize = 1472;

/// Configuration for a [`Connection`](crate::Connection).
#[derive(Clone)]
pub struct ConnOptions {
    /// How long a request waits for its reply before failing with
    /// [`ConnError::Timeout`](crate::ConnError::Timeout).
    pub timeout: Duration,
    /// Capacity of the event stream. Messages arriving while it is full are
    /// dropped and counted.
    pub event_capacity: usize,
    /// Size of the datagram receive buffer in bytes.
    pub recv_buffer_size: usize,
    /// Dialer used by [`Connection::open`](crate::Connection::open).
    /// `None` dials UDP.
    pub dialer: Option<Arc<dyn Dialer>>,
}

impl Default for ConnOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
            dialer: None,
        }
    }
}

impl ConnOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    pub fn with_recv_buffer_size(mut self, size: usize) -> Self {
        self.recv_buffer_size = size;
        self
    }

    pub fn with_dialer(mut self, dialer: Arc<dyn Dialer>) -> Self {
        self.dialer = Some(dialer);
        self
    }
}

impl fmt::Debug for ConnOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnOptions")
            .field("timeout", &self.timeout)
            .field("event_capacity", &self.event_capacity)
            .field("recv_buffer_size", &self.recv_buffer_size)
            .field("dialer", &self.dialer.as_ref().map(|_| "<custom>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = ConnOptions::default();
        assert_eq!(opts.timeout, Duration::from_secs(5));
        assert_eq!(opts.event_capacity, 500);
        assert_eq!(opts.recv_buffer_size, 1472);
        assert!(opts.dialer.is_none());
    }

    #[test]
    fn builder_overrides() {
        let opts = ConnOptions::default()
            .with_timeout(Duration::from_millis(250))
            .with_event_capacity(8)
            .with_recv_buffer_size(64);
        assert_eq!(opts.timeout, Duration::from_millis(250));
        assert_eq!(opts.event_capacity, 8);
        assert_eq!(opts.recv_buffer_size, 64);
        assert!(format!("{opts:?}").contains("dialer: None"));
    }
}
