//! Datagram transport abstraction for the Z21 LAN protocol.
//!
//! The command station speaks a connectionless, message-oriented protocol:
//! - UDP sockets in production ([`UdpTransport`])
//! - In-memory channels for deterministic tests ([`MemoryTransport`])
//!
//! This is the lowest layer of the workspace. Everything else builds on top
//! of the [`DatagramTransport`] trait provided here.

pub mod error;
pub mod memory;
pub mod traits;
pub mod udp;

pub use error::{Result, TransportError};
pub use memory::{MemoryDialer, MemoryTransport};
pub use traits::{DatagramTransport, Dialer};
pub use udp::{normalize_addr, UdpDialer, UdpTransport, DEFAULT_ADDR, DEFAULT_PORT};
