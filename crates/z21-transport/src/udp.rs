use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::{DatagramTransport, Dialer};

/// UDP port the command station listens on.
pub const DEFAULT_PORT: u16 = 21105;

/// Default command station address.
pub const DEFAULT_ADDR: &str = "127.0.0.1:21105";

/// Append the default port to `addr` when none is given.
///
/// Accepts `host`, `host:port`, `[v6]`, `[v6]:port` and bare IPv6 literals.
pub fn normalize_addr(addr: &str) -> String {
    let addr = addr.trim();
    if addr.parse::<SocketAddr>().is_ok() {
        return addr.to_string();
    }
    if let Ok(ip) = addr.parse::<std::net::IpAddr>() {
        return SocketAddr::new(ip, DEFAULT_PORT).to_string();
    }
    if let Some(host) = addr.strip_prefix('[').and_then(|a| a.strip_suffix(']')) {
        return format!("[{host}]:{DEFAULT_PORT}");
    }
    match addr.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => addr.to_string(),
        _ => format!("{addr}:{DEFAULT_PORT}"),
    }
}

/// UDP transport connected to a single command station.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    peer: SocketAddr,
}

impl UdpTransport {
    /// Resolve `addr`, bind an ephemeral local port and connect to it.
    pub async fn connect(addr: &str) -> Result<Self> {
        let addr = normalize_addr(addr);
        let peer = tokio::net::lookup_host(&addr)
            .await
            .map_err(|source| TransportError::Resolve {
                addr: addr.clone(),
                source,
            })?
            .next()
            .ok_or_else(|| TransportError::Resolve {
                addr: addr.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no addresses returned for host",
                ),
            })?;

        let local: SocketAddr = if peer.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).await.map_err(TransportError::Bind)?;
        socket
            .connect(peer)
            .await
            .map_err(|source| TransportError::Connect {
                addr: addr.clone(),
                source,
            })?;

        debug!(
            from = ?socket.local_addr().ok(),
            to = %peer,
            "udp socket connected"
        );
        Ok(Self { socket, peer })
    }
}

#[async_trait]
impl DatagramTransport for UdpTransport {
    async fn send(&self, buf: &[u8]) -> std::io::Result<usize> {
        self.socket.send(buf).await
    }

    async fn recv(&self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.socket.recv(buf).await
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.local_addr().ok()
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        Some(self.peer)
    }

    fn transport_name(&self) -> &'static str {
        "udp"
    }
}

/// Dials command stations over UDP.
#[derive(Debug, Default, Clone, Copy)]
pub struct UdpDialer;

#[async_trait]
impl Dialer for UdpDialer {
    async fn dial(&self, addr: &str) -> Result<Arc<dyn DatagramTransport>> {
        let transport = UdpTransport::connect(addr).await?;
        Ok(Arc::new(transport))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_appends_default_port() {
        assert_eq!(normalize_addr("192.168.0.111"), "192.168.0.111:21105");
        assert_eq!(normalize_addr("z21.local"), "z21.local:21105");
        assert_eq!(normalize_addr("::1"), "[::1]:21105");
        assert_eq!(normalize_addr("[fe80::1]"), "[fe80::1]:21105");
    }

    #[test]
    fn normalize_keeps_explicit_port() {
        assert_eq!(normalize_addr("192.168.0.111:4000"), "192.168.0.111:4000");
        assert_eq!(normalize_addr("z21.local:21106"), "z21.local:21106");
        assert_eq!(normalize_addr("[::1]:9"), "[::1]:9");
    }

    #[tokio::test]
    async fn udp_roundtrip_on_loopback() {
        let station = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let station_addr = station.local_addr().unwrap();

        let transport = UdpTransport::connect(&station_addr.to_string())
            .await
            .unwrap();
        assert_eq!(transport.peer_addr(), Some(station_addr));
        assert_eq!(transport.transport_name(), "udp");

        transport.send(&[0x04, 0x00, 0x10, 0x00]).await.unwrap();

        let mut buf = [0u8; 64];
        let (n, from) = station.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], &[0x04, 0x00, 0x10, 0x00]);

        station
            .send_to(&[0x08, 0x00, 0x10, 0x00, 1, 2, 3, 4], from)
            .await
            .unwrap();
        let n = transport.recv(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], &[0x08, 0x00, 0x10, 0x00, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn unresolvable_host_is_resolve_error() {
        let result = UdpTransport::connect("host.invalid.").await;
        assert!(matches!(result, Err(TransportError::Resolve { .. })));
    }
}
