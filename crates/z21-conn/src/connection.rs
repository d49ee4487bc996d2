use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};
use z21_frame::{frame_name, split_datagram};
use z21_message::{
    decode, BroadcastFlags, BroadcastMask, CanDetector, CorrelationKey, HwInfo, Kind, LocoInfo,
    LockCode, Logoff, Message, SerialNumber, SetBroadcastFlags, Status, Stop, SystemState,
    TrackPower, Version,
};
use z21_transport::{normalize_addr, DatagramTransport, Dialer, UdpDialer};

use crate::config::ConnOptions;
use crate::correlation::{CorrelationTable, Delivery, Ticket};
use crate::error::{ConnError, Result};
use crate::events::{event_channel, EventSink, EventStream};

/// Pause after a failed socket read before trying again.
pub const READ_ERROR_PAUSE: Duration = Duration::from_millis(50);

#[derive(Debug)]
struct Inner {
    /// Taken by `close()`; the socket is released once the receive loop and
    /// any in-flight write drop their clones.
    transport: Mutex<Option<Arc<dyn DatagramTransport>>>,
    local_addr: Option<SocketAddr>,
    peer_addr: Option<SocketAddr>,
    table: Arc<CorrelationTable>,
    sink: Arc<EventSink>,
    events: EventStream,
    shutdown: CancellationToken,
    closed: AtomicBool,
    options: ConnOptions,
}

impl Inner {
    fn transport(&self) -> Result<Arc<dyn DatagramTransport>> {
        self.transport
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(ConnError::NotConnected)
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.shutdown.cancel();
        let transport = self
            .transport
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let failed = self.table.drain(|| ConnError::Closed);
        debug!(
            transport = transport.as_ref().map(|t| t.transport_name()),
            peer = ?self.peer_addr,
            failed,
            "connection closed"
        );
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.close();
    }
}

/// A connection to one Z21 command station.
///
/// Cheap to clone; all clones share the socket, the pending requests and the
/// event stream. Any number of tasks may issue requests concurrently. The
/// connection closes on [`close`](Self::close) or when the last clone is
/// dropped.
#[derive(Debug, Clone)]
pub struct Connection {
    inner: Arc<Inner>,
}

impl Connection {
    /// Dial `addr` and start receiving.
    ///
    /// `addr` may omit the port; `21105` is assumed.
    pub async fn open(addr: &str, options: ConnOptions) -> Result<Self> {
        let addr = normalize_addr(addr);
        let dialer = options
            .dialer
            .clone()
            .unwrap_or_else(|| Arc::new(UdpDialer) as Arc<dyn Dialer>);
        let transport = dialer.dial(&addr).await?;
        debug!(
            from = ?transport.local_addr(),
            to = %addr,
            transport = transport.transport_name(),
            "connected"
        );
        Ok(Self::with_transport(transport, options))
    }

    /// Run a connection over an already-connected transport.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_transport(transport: Arc<dyn DatagramTransport>, options: ConnOptions) -> Self {
        let shutdown = CancellationToken::new();
        let (sink, events) = event_channel(options.event_capacity, shutdown.clone());
        let table = Arc::new(CorrelationTable::new());
        let sink = Arc::new(sink);

        tokio::spawn(receive_loop(
            Arc::clone(&transport),
            Arc::clone(&table),
            Arc::clone(&sink),
            shutdown.clone(),
            options.recv_buffer_size,
        ));

        Self {
            inner: Arc::new(Inner {
                local_addr: transport.local_addr(),
                peer_addr: transport.peer_addr(),
                transport: Mutex::new(Some(transport)),
                table,
                sink,
                events,
                shutdown,
                closed: AtomicBool::new(false),
                options,
            }),
        }
    }

    /// Send `message` and wait up to `deadline` for its reply.
    ///
    /// Returns `Ok(None)` right after sending when the message has no reply
    /// to wait for. If `deadline` elapses first, or the returned future is
    /// dropped, the pending request is withdrawn and a reply arriving later
    /// goes to the event stream.
    pub async fn send_and_wait(
        &self,
        message: &Message,
        deadline: Duration,
    ) -> Result<Option<Message>> {
        self.exchange(message, Some(deadline)).await
    }

    /// Send `message` and wait for its reply, bounded by the request timeout.
    pub async fn request(&self, message: &Message) -> Result<Option<Message>> {
        self.exchange(message, None).await
    }

    /// Send `message` without waiting for anything.
    pub async fn send(&self, message: &Message) -> Result<()> {
        let transport = self.inner.transport()?;
        let bytes = encode(message)?;
        write(transport.as_ref(), message, &bytes, None).await
    }

    /// The stream of unsolicited messages.
    pub fn events(&self) -> EventStream {
        self.inner.events.clone()
    }

    /// Close the connection. The receive loop stops and the socket is
    /// released. Outstanding requests fail with [`ConnError::Closed`]; later
    /// sends fail with [`ConnError::NotConnected`]. Idempotent.
    pub fn close(&self) {
        self.inner.close();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Local address the transport had when the connection was opened.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.inner.local_addr
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.inner.peer_addr
    }

    /// Number of requests currently waiting for a reply.
    pub fn pending_requests(&self) -> usize {
        self.inner.table.len()
    }

    /// Whether a request with `key` is waiting for a reply.
    pub fn is_pending(&self, key: &CorrelationKey) -> bool {
        self.inner.table.contains(key)
    }

    /// Unsolicited messages dropped because the event stream was full.
    pub fn dropped_events(&self) -> u64 {
        self.inner.sink.dropped()
    }

    pub fn options(&self) -> &ConnOptions {
        &self.inner.options
    }

    async fn exchange(
        &self,
        message: &Message,
        deadline: Option<Duration>,
    ) -> Result<Option<Message>> {
        let transport = self.inner.transport()?;
        let bytes = encode(message)?;

        let Some(key) = message.key() else {
            debug!(kind = message.name(), "fire and forget: response tracking disabled");
            write(transport.as_ref(), message, &bytes, None).await?;
            return Ok(None);
        };

        let (ticket, rx) = self
            .inner
            .table
            .register(key.clone(), self.inner.options.timeout);
        let _guard = CancelOnDrop {
            table: &self.inner.table,
            key: &key,
            ticket,
        };
        // close() may have drained the table between the check and register.
        self.ensure_open()?;
        write(transport.as_ref(), message, &bytes, Some(&key)).await?;
        drop(transport);

        let reply = match deadline {
            Some(deadline) => match tokio::time::timeout(deadline, rx).await {
                Ok(reply) => reply,
                Err(_) => {
                    debug!(key = %key, ?deadline, "caller deadline elapsed");
                    return Err(ConnError::DeadlineElapsed(deadline));
                }
            },
            None => rx.await,
        };

        match reply {
            Ok(result) => result.map(Some),
            Err(_) => Err(ConnError::Closed),
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(ConnError::NotConnected);
        }
        Ok(())
    }
}

async fn write(
    transport: &dyn DatagramTransport,
    message: &Message,
    bytes: &[u8],
    key: Option<&CorrelationKey>,
) -> Result<()> {
    debug!(
        direction = "TX",
        frame = %frame_name(&message.to_frame()),
        fingerprint = key.map(CorrelationKey::as_str).unwrap_or("-"),
        bytes = %hex::encode(bytes),
        "frame"
    );
    transport.send(bytes).await.map_err(ConnError::BadPacket)?;
    Ok(())
}

macro_rules! expect_reply {
    ($reply:expr, $variant:ident) => {
        match $reply {
            Some(Message::$variant(v)) => Ok(v),
            Some(other) => Err(ConnError::UnexpectedReply {
                expected: Kind::$variant.name(),
                got: other.name(),
            }),
            None => Err(ConnError::UnexpectedReply {
                expected: Kind::$variant.name(),
                got: "nothing",
            }),
        }
    };
}

impl Connection {
    pub async fn serial_number(&self) -> Result<SerialNumber> {
        let reply = self.request(&SerialNumber::default().into()).await?;
        expect_reply!(reply, SerialNumber)
    }

    pub async fn hardware_info(&self) -> Result<HwInfo> {
        let reply = self.request(&HwInfo::default().into()).await?;
        expect_reply!(reply, HwInfo)
    }

    pub async fn lock_code(&self) -> Result<LockCode> {
        let reply = self.request(&LockCode::default().into()).await?;
        expect_reply!(reply, LockCode)
    }

    pub async fn xbus_version(&self) -> Result<Version> {
        let reply = self.request(&Version::default().into()).await?;
        expect_reply!(reply, Version)
    }

    pub async fn status(&self) -> Result<Status> {
        let reply = self.request(&Status::default().into()).await?;
        expect_reply!(reply, Status)
    }

    pub async fn system_state(&self) -> Result<SystemState> {
        let reply = self.request(&SystemState::default().into()).await?;
        expect_reply!(reply, SystemState)
    }

    pub async fn broadcast_flags(&self) -> Result<BroadcastFlags> {
        let reply = self.request(&BroadcastFlags::default().into()).await?;
        expect_reply!(reply, BroadcastFlags)
    }

    pub async fn set_broadcast_flags(&self, flags: BroadcastMask) -> Result<()> {
        self.send(&SetBroadcastFlags { flags }.into()).await
    }

    /// Switch track power and wait for the station's broadcast confirming it.
    pub async fn track_power(&self, on: bool) -> Result<TrackPower> {
        let reply = self.request(&TrackPower { on }.into()).await?;
        expect_reply!(reply, TrackPower)
    }

    /// Emergency stop all locos and wait for the stopped broadcast.
    pub async fn stop(&self) -> Result<Stop> {
        let reply = self.request(&Stop.into()).await?;
        expect_reply!(reply, Stop)
    }

    pub async fn loco_info(&self, address: u16) -> Result<LocoInfo> {
        let reply = self.request(&LocoInfo::query(address).into()).await?;
        expect_reply!(reply, LocoInfo)
    }

    pub async fn can_detector(&self, network_id: u16) -> Result<CanDetector> {
        let reply = self.request(&CanDetector::query(network_id).into()).await?;
        expect_reply!(reply, CanDetector)
    }

    /// End the session with the station. The connection stays open.
    pub async fn logoff(&self) -> Result<()> {
        self.send(&Logoff.into()).await
    }
}

/// Withdraws a pending request when the waiting caller goes away.
struct CancelOnDrop<'a> {
    table: &'a CorrelationTable,
    key: &'a CorrelationKey,
    ticket: Ticket,
}

impl Drop for CancelOnDrop<'_> {
    fn drop(&mut self) {
        // No-op when the reply, the timer or close() got there first.
        self.table.cancel(self.key, self.ticket);
    }
}

fn encode(message: &Message) -> Result<Bytes> {
    let mut dst = BytesMut::new();
    message.encode_frame(&mut dst)?;
    Ok(dst.freeze())
}

async fn receive_loop(
    transport: Arc<dyn DatagramTransport>,
    table: Arc<CorrelationTable>,
    sink: Arc<EventSink>,
    shutdown: CancellationToken,
    buffer_size: usize,
) {
    let mut buf = vec![0u8; buffer_size.max(1)];
    loop {
        let read = tokio::select! {
            _ = shutdown.cancelled() => break,
            res = transport.recv(&mut buf) => res,
        };
        match read {
            Ok(n) => handle_datagram(&buf[..n], &table, &sink),
            Err(err) => {
                error!(error = %err, transport = transport.transport_name(), "read failed");
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(READ_ERROR_PAUSE) => {}
                }
            }
        }
    }
    debug!(transport = transport.transport_name(), "receive loop stopped");
}

fn handle_datagram(datagram: &[u8], table: &CorrelationTable, sink: &EventSink) {
    let frames = match split_datagram(Bytes::copy_from_slice(datagram)) {
        Ok(frames) => frames,
        Err(err) => {
            error!(error = %err, bytes = %hex::encode(datagram), "malformed datagram");
            return;
        }
    };

    for frame in frames {
        let message = match decode(&frame) {
            Ok(message) => message,
            Err(err) => {
                error!(
                    error = %err,
                    frame = %frame_name(&frame),
                    payload = %hex::encode(&frame.payload),
                    "decode failed"
                );
                continue;
            }
        };
        let key = message.key();
        debug!(
            direction = "RX",
            frame = %frame_name(&frame),
            fingerprint = key.as_ref().map(CorrelationKey::as_str).unwrap_or("-"),
            payload = %hex::encode(&frame.payload),
            "frame"
        );

        let unmatched = match key {
            Some(key) => match table.deliver(&key, message) {
                Delivery::Matched => None,
                Delivery::Unmatched(message) => Some(message),
            },
            None => Some(message),
        };
        if let Some(message) = unmatched {
            sink.push(message);
        }
    }
}
