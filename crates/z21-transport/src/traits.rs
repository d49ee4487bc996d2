use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

/// A connected, message-oriented channel to one command station.
///
/// Every `send` writes exactly one datagram and every `recv` yields exactly
/// one datagram. Implementations must be shareable: a single background task
/// calls `recv` while any number of foreground tasks call `send`.
#[async_trait]
pub trait DatagramTransport: Send + Sync + fmt::Debug + 'static {
    /// Write one datagram. Returns the number of bytes written.
    async fn send(&self, buf: &[u8]) -> std::io::Result<usize>;

    /// Read one datagram into `buf`. Returns the number of bytes read.
    ///
    /// Datagrams larger than `buf` are truncated, as with UDP.
    async fn recv(&self, buf: &mut [u8]) -> std::io::Result<usize>;

    /// Local address of the transport, if it has one.
    fn local_addr(&self) -> Option<SocketAddr> {
        None
    }

    /// Remote address of the transport, if it has one.
    fn peer_addr(&self) -> Option<SocketAddr> {
        None
    }

    /// Transport name for diagnostics.
    fn transport_name(&self) -> &'static str;
}

/// Opens a [`DatagramTransport`] to an address.
///
/// The default dialer is [`crate::UdpDialer`]. Tests substitute their own to
/// keep the connection engine off the network.
#[async_trait]
pub trait Dialer: Send + Sync + fmt::Debug {
    /// Dial `addr` and return a connected transport.
    async fn dial(&self, addr: &str) -> Result<Arc<dyn DatagramTransport>>;
}
