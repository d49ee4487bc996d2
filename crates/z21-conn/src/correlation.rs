//! Pending-request bookkeeping.
//!
//! The protocol carries no sequence numbers, so a reply is paired with the
//! oldest pending request of the same [`CorrelationKey`]. Each record carries
//! a process-local ticket that identifies it to its timer and its caller; the
//! ticket never leaves this process.
//!
//! Exactly one of [`deliver`](CorrelationTable::deliver),
//! [`expire`](CorrelationTable::expire) and
//! [`cancel`](CorrelationTable::cancel) removes a record. The others find
//! nothing and do nothing.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;
use z21_message::{CorrelationKey, Message};

use crate::error::{ConnError, Result};

/// Identifies one pending request within this process.
pub type Ticket = u64;

/// Receiving half handed to the waiting caller.
pub type ReplyReceiver = oneshot::Receiver<Result<Message>>;

#[derive(Debug)]
struct PendingRequest {
    ticket: Ticket,
    timeout: Duration,
    reply: oneshot::Sender<Result<Message>>,
    timer: JoinHandle<()>,
}

/// Outcome of [`CorrelationTable::deliver`].
#[derive(Debug, PartialEq, Eq)]
pub enum Delivery {
    /// A waiting request received the message.
    Matched,
    /// Nobody was waiting; the message is handed back.
    Unmatched(Message),
}

/// Pending requests keyed by correlation key, oldest first per key.
#[derive(Debug, Default)]
pub struct CorrelationTable {
    pending: Mutex<HashMap<CorrelationKey, VecDeque<PendingRequest>>>,
    next_ticket: AtomicU64,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CorrelationKey, VecDeque<PendingRequest>>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a pending request for `key` that expires after `timeout`.
    ///
    /// Must be called from within a tokio runtime; the expiry timer is a
    /// spawned task.
    pub fn register(
        self: &Arc<Self>,
        key: CorrelationKey,
        timeout: Duration,
    ) -> (Ticket, ReplyReceiver) {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let (reply, rx) = oneshot::channel();

        // The timer is spawned under the lock so it cannot observe the table
        // before its record is in place.
        let mut pending = self.lock();
        let table = Arc::clone(self);
        let timer_key = key.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            table.expire(&timer_key, ticket);
        });
        pending.entry(key).or_default().push_back(PendingRequest {
            ticket,
            timeout,
            reply,
            timer,
        });

        (ticket, rx)
    }

    /// Hand `message` to the oldest live request for `key`.
    pub fn deliver(&self, key: &CorrelationKey, message: Message) -> Delivery {
        let live = {
            let mut pending = self.lock();
            let Some(queue) = pending.get_mut(key) else {
                return Delivery::Unmatched(message);
            };
            // Skip waiters that went away without cancelling.
            let live = loop {
                match queue.pop_front() {
                    Some(request) if request.reply.is_closed() => request.timer.abort(),
                    other => break other,
                }
            };
            if queue.is_empty() {
                pending.remove(key);
            }
            live
        };

        match live {
            Some(request) => {
                request.timer.abort();
                let _ = request.reply.send(Ok(message));
                Delivery::Matched
            }
            None => Delivery::Unmatched(message),
        }
    }

    /// Fail the request `ticket` with [`ConnError::Timeout`]. Called by the
    /// request's timer.
    pub fn expire(&self, key: &CorrelationKey, ticket: Ticket) -> bool {
        let Some(request) = self.remove(key, ticket) else {
            return false;
        };
        debug!(key = %key, ticket, timeout = ?request.timeout, "request timed out");
        let _ = request.reply.send(Err(ConnError::Timeout(request.timeout)));
        true
    }

    /// Drop the request `ticket` without replying. Used when the caller
    /// stops waiting.
    pub fn cancel(&self, key: &CorrelationKey, ticket: Ticket) -> bool {
        let Some(request) = self.remove(key, ticket) else {
            return false;
        };
        request.timer.abort();
        debug!(key = %key, ticket, "request cancelled");
        true
    }

    fn remove(&self, key: &CorrelationKey, ticket: Ticket) -> Option<PendingRequest> {
        let mut pending = self.lock();
        let queue = pending.get_mut(key)?;
        let index = queue.iter().position(|r| r.ticket == ticket)?;
        let request = queue.remove(index);
        if queue.is_empty() {
            pending.remove(key);
        }
        request
    }

    /// Number of pending requests across all keys.
    pub fn len(&self) -> usize {
        self.lock().values().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Whether any request is pending for `key`.
    pub fn contains(&self, key: &CorrelationKey) -> bool {
        self.lock().contains_key(key)
    }

    /// Fail every pending request with the error built by `err`.
    pub fn drain(&self, err: impl Fn() -> ConnError) -> usize {
        let drained = std::mem::take(&mut *self.lock());
        let mut count = 0;
        for request in drained.into_values().flatten() {
            request.timer.abort();
            let _ = request.reply.send(Err(err()));
            count += 1;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use z21_message::{HwInfo, SerialNumber, TrackPower};

    fn key_of(msg: impl Into<Message>) -> CorrelationKey {
        msg.into().key().unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn deliver_matches_waiting_request() {
        let table = Arc::new(CorrelationTable::new());
        let key = key_of(HwInfo::default());
        let (_ticket, rx) = table.register(key.clone(), Duration::from_secs(5));
        assert!(table.contains(&key));

        let reply = Message::from(HwInfo::default());
        assert_eq!(table.deliver(&key, reply.clone()), Delivery::Matched);
        assert_eq!(rx.await.unwrap().unwrap(), reply);
        assert!(table.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn deliver_without_waiter_hands_message_back() {
        let table = CorrelationTable::new();
        let msg = Message::from(TrackPower { on: true });
        let key = msg.key().unwrap();
        assert_eq!(table.deliver(&key, msg.clone()), Delivery::Unmatched(msg));
    }

    #[tokio::test(start_paused = true)]
    async fn same_key_is_served_fifo() {
        let table = Arc::new(CorrelationTable::new());
        let key = key_of(SerialNumber::default());
        let (_, first) = table.register(key.clone(), Duration::from_secs(5));
        let (_, second) = table.register(key.clone(), Duration::from_secs(5));
        assert_eq!(table.len(), 2);

        let a = Message::from(SerialNumber { serial: 1 });
        let b = Message::from(SerialNumber { serial: 2 });
        assert_eq!(table.deliver(&key, a.clone()), Delivery::Matched);
        assert_eq!(table.deliver(&key, b.clone()), Delivery::Matched);
        assert_eq!(first.await.unwrap().unwrap(), a);
        assert_eq!(second.await.unwrap().unwrap(), b);
    }

    #[tokio::test(start_paused = true)]
    async fn timer_expires_request_and_removes_key() {
        let table = Arc::new(CorrelationTable::new());
        let key = key_of(HwInfo::default());
        let (_, rx) = table.register(key.clone(), Duration::from_millis(100));

        let err = rx.await.unwrap().unwrap_err();
        assert!(matches!(err, ConnError::Timeout(d) if d == Duration::from_millis(100)));
        assert!(!table.contains(&key));

        let late = Message::from(HwInfo::default());
        assert_eq!(table.deliver(&key, late.clone()), Delivery::Unmatched(late));
    }

    #[tokio::test(start_paused = true)]
    async fn exactly_one_remover_wins() {
        let table = Arc::new(CorrelationTable::new());
        let key = key_of(HwInfo::default());
        let (ticket, _rx) = table.register(key.clone(), Duration::from_secs(5));

        assert!(table.cancel(&key, ticket));
        assert!(!table.expire(&key, ticket));
        assert!(!table.cancel(&key, ticket));
        assert!(table.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_leaves_other_requests_of_the_key() {
        let table = Arc::new(CorrelationTable::new());
        let key = key_of(HwInfo::default());
        let (first, _rx1) = table.register(key.clone(), Duration::from_secs(5));
        let (_, rx2) = table.register(key.clone(), Duration::from_secs(5));

        assert!(table.cancel(&key, first));
        let reply = Message::from(HwInfo::default());
        assert_eq!(table.deliver(&key, reply.clone()), Delivery::Matched);
        assert_eq!(rx2.await.unwrap().unwrap(), reply);
    }

    #[tokio::test(start_paused = true)]
    async fn deliver_skips_abandoned_waiters() {
        let table = Arc::new(CorrelationTable::new());
        let key = key_of(HwInfo::default());
        let (_, abandoned) = table.register(key.clone(), Duration::from_secs(5));
        let (_, live) = table.register(key.clone(), Duration::from_secs(5));
        drop(abandoned);

        let reply = Message::from(HwInfo::default());
        assert_eq!(table.deliver(&key, reply.clone()), Delivery::Matched);
        assert_eq!(live.await.unwrap().unwrap(), reply);
    }

    #[tokio::test(start_paused = true)]
    async fn drain_fails_everything() {
        let table = Arc::new(CorrelationTable::new());
        let (_, a) = table.register(key_of(HwInfo::default()), Duration::from_secs(5));
        let (_, b) = table.register(key_of(SerialNumber::default()), Duration::from_secs(5));

        assert_eq!(table.drain(|| ConnError::Closed), 2);
        assert!(matches!(a.await.unwrap(), Err(ConnError::Closed)));
        assert!(matches!(b.await.unwrap(), Err(ConnError::Closed)));
        assert_eq!(table.len(), 0);
    }
}
