use std::io::ErrorKind;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{Result, TransportError};
use crate::traits::{DatagramTransport, Dialer};

/// In-memory datagram channel.
///
/// [`MemoryTransport::pair`] returns two connected ends; whatever one end
/// sends the other receives, one datagram at a time. Used to drive the
/// connection engine against a scripted station without touching the network.
#[derive(Debug)]
pub struct MemoryTransport {
    tx: mpsc::UnboundedSender<Vec<u8>>,
    rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
}

impl MemoryTransport {
    /// Create two connected ends.
    pub fn pair() -> (Self, Self) {
        let (left_tx, right_rx) = mpsc::unbounded_channel();
        let (right_tx, left_rx) = mpsc::unbounded_channel();
        (
            Self {
                tx: left_tx,
                rx: tokio::sync::Mutex::new(left_rx),
            },
            Self {
                tx: right_tx,
                rx: tokio::sync::Mutex::new(right_rx),
            },
        )
    }
}

#[async_trait]
impl DatagramTransport for MemoryTransport {
    async fn send(&self, buf: &[u8]) -> std::io::Result<usize> {
        self.tx
            .send(buf.to_vec())
            .map_err(|_| std::io::Error::new(ErrorKind::BrokenPipe, "memory peer dropped"))?;
        Ok(buf.len())
    }

    async fn recv(&self, buf: &mut [u8]) -> std::io::Result<usize> {
        let datagram = self.rx.lock().await.recv().await.ok_or_else(|| {
            std::io::Error::new(ErrorKind::ConnectionAborted, "memory peer dropped")
        })?;
        let n = datagram.len().min(buf.len());
        buf[..n].copy_from_slice(&datagram[..n]);
        Ok(n)
    }

    fn transport_name(&self) -> &'static str {
        "memory"
    }
}

/// Dialer that hands out one pre-built [`MemoryTransport`] end.
///
/// The first `dial` succeeds regardless of address; later calls fail with
/// [`TransportError::Closed`].
#[derive(Debug)]
pub struct MemoryDialer {
    transport: Mutex<Option<MemoryTransport>>,
}

impl MemoryDialer {
    pub fn new(transport: MemoryTransport) -> Self {
        Self {
            transport: Mutex::new(Some(transport)),
        }
    }
}

#[async_trait]
impl Dialer for MemoryDialer {
    async fn dial(&self, _addr: &str) -> Result<Arc<dyn DatagramTransport>> {
        let transport = self
            .transport
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(TransportError::Closed)?;
        Ok(Arc::new(transport))
    }
}
