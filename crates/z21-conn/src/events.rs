//! Unsolicited messages: broadcasts and replies nobody is waiting for.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use z21_message::Message;

/// Queue shared by the sink and every stream handle. The lock is never held
/// across an await.
#[derive(Debug)]
struct Queue {
    messages: Mutex<VecDeque<Message>>,
    capacity: usize,
    ready: Notify,
}

impl Queue {
    fn lock(&self) -> MutexGuard<'_, VecDeque<Message>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn pop(&self) -> Option<Message> {
        self.lock().pop_front()
    }
}

/// Producer side, owned by the receive loop. Never blocks.
#[derive(Debug)]
pub(crate) struct EventSink {
    queue: Arc<Queue>,
    dropped: AtomicU64,
}

impl EventSink {
    /// Queue `message`, or drop it if the stream is full.
    pub(crate) fn push(&self, message: Message) -> bool {
        {
            let mut messages = self.queue.lock();
            if messages.len() >= self.queue.capacity {
                drop(messages);
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(kind = message.name(), dropped, "event stream full, dropping message");
                return false;
            }
            messages.push_back(message);
        }
        self.queue.ready.notify_one();
        true
    }

    pub(crate) fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Consumer side of the event stream.
///
/// Cloning yields another handle on the same queue; each message is seen by
/// exactly one consumer. Once the connection closes, [`recv`](Self::recv)
/// returns what is still queued and then `None`.
#[derive(Debug, Clone)]
pub struct EventStream {
    queue: Arc<Queue>,
    closed: CancellationToken,
}

impl EventStream {
    /// Wait for the next unsolicited message.
    pub async fn recv(&self) -> Option<Message> {
        loop {
            let notified = self.queue.ready.notified();
            tokio::pin!(notified);
            // Register before checking so a push in between is not missed.
            notified.as_mut().enable();

            if let Some(message) = self.queue.pop() {
                return Some(message);
            }
            if self.closed.is_cancelled() {
                return None;
            }

            tokio::select! {
                _ = &mut notified => {}
                _ = self.closed.cancelled() => {}
            }
        }
    }

    /// Take the next message if one is queued.
    pub fn try_recv(&self) -> Option<Message> {
        self.queue.pop()
    }
}

/// Build a bounded event queue that ends when `closed` is cancelled.
pub(crate) fn event_channel(capacity: usize, closed: CancellationToken) -> (EventSink, EventStream) {
    let capacity = capacity.max(1);
    let queue = Arc::new(Queue {
        messages: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
        capacity,
        ready: Notify::new(),
    });
    let sink = EventSink {
        queue: Arc::clone(&queue),
        dropped: AtomicU64::new(0),
    };
    let stream = EventStream { queue, closed };
    (sink, stream)
}
