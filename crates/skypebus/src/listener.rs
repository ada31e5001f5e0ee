//! Callback target for inbound notifications

use crate::events::{Event, EventSender, QueueError};
use async_trait::async_trait;
use skypebus_transport::NotifyHandler;
use tracing::{debug, warn};

/// Relays `Notify` calls from the client into a connection's event queue
///
/// Holds only the producer half of the queue; the connection does not keep a
/// reference to its listener once it is registered.
#[derive(Debug)]
pub struct Listener {
    events: EventSender,
}

impl Listener {
    /// Bind a listener to the producer half of an event queue
    pub fn new(events: EventSender) -> Self {
        Self { events }
    }
}

#[async_trait]
impl NotifyHandler for Listener {
    /// Queue the payload and reply with an empty string
    ///
    /// Under the blocking overflow policy this waits, holding up the bus
    /// dispatch, until the consumer frees a slot.
    async fn notify(&self, event: String) -> String {
        match self.events.send(Event::from(event)).await {
            Ok(()) => {}
            Err(QueueError::Full(event)) => {
                warn!(event = %event, "event queue full, dropping notification");
            }
            Err(QueueError::Closed(event)) => {
                debug!(event = %event, "connection gone, discarding notification");
            }
        }
        String::new()
    }
}
