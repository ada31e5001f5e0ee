//! Inbound event relay
//!
//! Notifications from the client arrive as opaque strings and are buffered in
//! a bounded, insertion-ordered queue until the caller reads them. What
//! happens when the queue is full is an explicit [`OverflowPolicy`].
//!
//! The queue is single-producer (the bus dispatcher, through the listener)
//! and single-consumer (the [`Connection`](crate::Connection) owner).

use futures::Stream;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::Notify;

/// Default number of buffered events
pub const DEFAULT_CAPACITY: usize = 10;

/// One notification from the client
///
/// No structure is imposed; consumers parse the text themselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event(String);

impl Event {
    /// Create an event from its payload
    pub fn new(payload: impl Into<String>) -> Self {
        Self(payload.into())
    }

    /// The raw payload
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the event, returning the payload
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for Event {
    fn from(payload: String) -> Self {
        Self(payload)
    }
}

impl From<&str> for Event {
    fn from(payload: &str) -> Self {
        Self(payload.to_string())
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a producer does when the queue is full
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverflowPolicy {
    /// Wait for the consumer to free a slot; nothing is lost
    #[default]
    Block,

    /// Evict the oldest buffered event to make room
    DropOldest,

    /// Refuse the new event
    Reject,
}

/// Queue sizing and overflow behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    /// Maximum number of buffered events (at least 1)
    pub capacity: usize,

    /// Behavior when `capacity` is reached
    pub overflow: OverflowPolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            overflow: OverflowPolicy::Block,
        }
    }
}

impl QueueConfig {
    /// Create a queue config with the given capacity and blocking overflow
    pub fn new(capacity: usize) -> Self {
        Self::default().with_capacity(capacity)
    }

    /// Set the capacity (clamped to at least 1)
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Set the overflow policy
    pub fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }
}

/// Why an event could not be queued
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    /// Queue full under [`OverflowPolicy::Reject`]
    #[error("event queue full, rejected event")]
    Full(Event),

    /// The consumer is gone
    #[error("event queue closed")]
    Closed(Event),
}

struct Shared {
    buffer: Mutex<VecDeque<Event>>,
    capacity: usize,
    overflow: OverflowPolicy,
    readable: Notify,
    writable: Notify,
    sender_closed: AtomicBool,
    receiver_closed: AtomicBool,
    dropped: AtomicU64,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, VecDeque<Event>> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Create a bounded event queue
pub fn channel(config: &QueueConfig) -> (EventSender, EventReceiver) {
    let capacity = config.capacity.max(1);
    let shared = Arc::new(Shared {
        buffer: Mutex::new(VecDeque::with_capacity(capacity)),
        capacity,
        overflow: config.overflow,
        readable: Notify::new(),
        writable: Notify::new(),
        sender_closed: AtomicBool::new(false),
        receiver_closed: AtomicBool::new(false),
        dropped: AtomicU64::new(0),
    });

    (
        EventSender {
            shared: Arc::clone(&shared),
        },
        EventReceiver { shared },
    )
}

/// Producer half of the event queue
pub struct EventSender {
    shared: Arc<Shared>,
}

impl EventSender {
    /// Queue an event, applying the overflow policy when full
    ///
    /// Under [`OverflowPolicy::Block`] this waits until the consumer frees a
    /// slot, with no timeout.
    pub async fn send(&self, event: Event) -> Result<(), QueueError> {
        loop {
            {
                let mut buffer = self.shared.lock();
                if self.shared.receiver_closed.load(Ordering::Acquire) {
                    return Err(QueueError::Closed(event));
                }

                if buffer.len() < self.shared.capacity {
                    buffer.push_back(event);
                    drop(buffer);
                    self.shared.readable.notify_one();
                    return Ok(());
                }

                match self.shared.overflow {
                    OverflowPolicy::Block => {}
                    OverflowPolicy::DropOldest => {
                        buffer.pop_front();
                        buffer.push_back(event);
                        drop(buffer);
                        self.shared.dropped.fetch_add(1, Ordering::Relaxed);
                        self.shared.readable.notify_one();
                        return Ok(());
                    }
                    OverflowPolicy::Reject => return Err(QueueError::Full(event)),
                }
            }

            self.shared.writable.notified().await;
        }
    }

    /// Whether the consumer has been dropped
    pub fn is_closed(&self) -> bool {
        self.shared.receiver_closed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for EventSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSender")
            .field("capacity", &self.shared.capacity)
            .field("overflow", &self.shared.overflow)
            .finish()
    }
}

impl Drop for EventSender {
    fn drop(&mut self) {
        self.shared.sender_closed.store(true, Ordering::Release);
        self.shared.readable.notify_one();
    }
}

/// Consumer half of the event queue
pub struct EventReceiver {
    shared: Arc<Shared>,
}

impl EventReceiver {
    /// Wait for the next event
    ///
    /// Returns `None` once the producer is gone and the buffer is drained.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            if let Some(event) = self.try_recv() {
                return Some(event);
            }
            if self.shared.sender_closed.load(Ordering::Acquire) {
                // The producer may have pushed right before closing.
                return self.try_recv();
            }
            self.shared.readable.notified().await;
        }
    }

    /// Take the next event if one is buffered
    pub fn try_recv(&mut self) -> Option<Event> {
        let event = self.shared.lock().pop_front();
        if event.is_some() {
            self.shared.writable.notify_one();
        }
        event
    }

    /// Number of buffered events
    pub fn len(&self) -> usize {
        self.shared.lock().len()
    }

    /// Whether no events are buffered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Queue capacity
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Events evicted under [`OverflowPolicy::DropOldest`]
    pub fn dropped(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    /// Turn the receiver into a [`Stream`] of events
    pub fn into_stream(self) -> impl Stream<Item = Event> + Send {
        futures::stream::unfold(self, |mut receiver| async move {
            receiver.recv().await.map(|event| (event, receiver))
        })
    }
}

impl fmt::Debug for EventReceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventReceiver")
            .field("capacity", &self.shared.capacity)
            .field("buffered", &self.len())
            .finish()
    }
}

impl Drop for EventReceiver {
    fn drop(&mut self) {
        self.shared.receiver_closed.store(true, Ordering::Release);
        self.shared.writable.notify_one();
    }
}
