//! Attached session with the client
//!
//! A [`Connection`] is the handle returned by attach. It owns the bus session
//! and the consumer half of the event queue; there is no process-wide
//! registry, so independent connections never share state.

use crate::error::{Result, SkypeError};
use crate::events::{Event, EventReceiver};
use skypebus_transport::{ProcessControl, ProcessExit, SkypeBus};
use std::fmt;
use tokio::sync::watch;
use tracing::{debug, info};
use uuid::Uuid;

/// Command side of a session: the bus handle and the launched process, if any
pub struct CommandHandle {
    id: Uuid,
    bus: Box<dyn SkypeBus>,
    process: Option<Box<dyn ProcessControl>>,
}

impl CommandHandle {
    /// Identifier of this session, used in log fields
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Send a raw command to the client and return its reply
    ///
    /// The reply is logged but not parsed.
    pub async fn invoke(&self, command: &str) -> Result<String> {
        debug!(session = %self.id, command, "invoking");
        let reply = self.bus.invoke(command).await.map_err(SkypeError::Invoke)?;
        info!(target: "skypebus::invoke", session = %self.id, reply = %reply, "invoke reply");
        Ok(reply)
    }

    /// Announce the client name (`NAME <name>`)
    pub async fn set_name(&self, name: &str) -> Result<()> {
        self.invoke(&format!("NAME {}", name)).await?;
        Ok(())
    }

    /// Select the protocol version (`PROTOCOL <id>`); the id is not validated
    pub async fn set_protocol(&self, id: i64) -> Result<()> {
        self.invoke(&format!("PROTOCOL {}", id)).await?;
        Ok(())
    }

    /// Exit notifications for a client launched by this adapter
    ///
    /// `None` when the session attached to an already-running client.
    pub fn process_exit(&self) -> Option<watch::Receiver<Option<ProcessExit>>> {
        self.process.as_ref().map(|process| process.exit_watch())
    }

    /// OS process id of a client launched by this adapter
    pub fn process_id(&self) -> Option<u32> {
        self.process.as_ref().and_then(|process| process.id())
    }
}

impl fmt::Debug for CommandHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandHandle")
            .field("id", &self.id)
            .field("process_id", &self.process_id())
            .finish()
    }
}

/// An attached, configured session with the client
#[derive(Debug)]
pub struct Connection {
    commands: CommandHandle,
    events: EventReceiver,
}

impl Connection {
    pub(crate) fn new(bus: Box<dyn SkypeBus>, events: EventReceiver) -> Self {
        Self {
            commands: CommandHandle {
                id: Uuid::new_v4(),
                bus,
                process: None,
            },
            events,
        }
    }

    pub(crate) fn attach_process(&mut self, process: Box<dyn ProcessControl>) {
        self.commands.process = Some(process);
    }

    /// Identifier of this session, used in log fields
    pub fn id(&self) -> Uuid {
        self.commands.id()
    }

    /// Send a raw command to the client and return its reply
    pub async fn invoke(&self, command: &str) -> Result<String> {
        self.commands.invoke(command).await
    }

    /// Announce the client name (`NAME <name>`)
    pub async fn set_name(&self, name: &str) -> Result<()> {
        self.commands.set_name(name).await
    }

    /// Select the protocol version (`PROTOCOL <id>`)
    pub async fn set_protocol(&self, id: i64) -> Result<()> {
        self.commands.set_protocol(id).await
    }

    /// Wait for the next event from the client
    pub async fn next_event(&mut self) -> Option<Event> {
        self.events.recv().await
    }

    /// Take the next event if one is buffered
    pub fn try_next_event(&mut self) -> Option<Event> {
        self.events.try_recv()
    }

    /// Direct access to the event queue
    pub fn events(&mut self) -> &mut EventReceiver {
        &mut self.events
    }

    /// Events evicted by the drop-oldest overflow policy
    pub fn dropped_events(&self) -> u64 {
        self.events.dropped()
    }

    /// Exit notifications for a client launched by this adapter
    pub fn process_exit(&self) -> Option<watch::Receiver<Option<ProcessExit>>> {
        self.commands.process_exit()
    }

    /// OS process id of a client launched by this adapter
    pub fn process_id(&self) -> Option<u32> {
        self.commands.process_id()
    }

    /// Split into commands and events, e.g. to consume events on another task
    pub fn into_parts(self) -> (CommandHandle, EventReceiver) {
        (self.commands, self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{QueueConfig, channel};
    use crate::testing::MockBus;
    use skypebus_transport::TransportError;

    fn connection(bus: &MockBus) -> Connection {
        let (_tx, rx) = channel(&QueueConfig::default());
        Connection::new(Box::new(bus.clone()), rx)
    }

    #[tokio::test]
    async fn test_set_name_sends_name_command() {
        let bus = MockBus::new();
        let conn = connection(&bus);

        conn.set_name("x").await.unwrap();
        assert_eq!(bus.commands(), vec!["NAME x".to_string()]);
    }

    #[tokio::test]
    async fn test_set_protocol_passes_id_through() {
        let bus = MockBus::new();
        let conn = connection(&bus);

        conn.set_protocol(7).await.unwrap();
        conn.set_protocol(-1).await.unwrap();
        assert_eq!(bus.commands(), vec!["PROTOCOL 7", "PROTOCOL -1"]);
    }

    #[tokio::test]
    async fn test_invoke_returns_reply() {
        let bus = MockBus::new();
        let conn = connection(&bus);

        assert_eq!(conn.invoke("GET USERSTATUS").await.unwrap(), "GET USERSTATUS");
    }

    #[tokio::test]
    async fn test_invoke_error_is_wrapped() {
        let bus = MockBus::new();
        bus.fail_invoke("PROTOCOL", "org.freedesktop.DBus.Error.ServiceUnknown");
        let conn = connection(&bus);

        match conn.set_protocol(7).await {
            Err(SkypeError::Invoke(TransportError::Call(msg))) => {
                assert!(msg.contains("ServiceUnknown"));
            }
            other => panic!("expected Invoke error, got {other:?}"),
        }
    }

    #[test]
    fn test_attached_session_has_no_process() {
        let bus = MockBus::new();
        let conn = connection(&bus);
        assert!(conn.process_exit().is_none());
        assert!(conn.process_id().is_none());
    }

    #[test]
    fn test_connections_are_independent() {
        let bus = MockBus::new();
        let first = connection(&bus);
        let second = connection(&bus);
        assert_ne!(first.id(), second.id());
    }
}
