//! Transport traits
//!
//! Defines the seams between the client adapter and its two external
//! collaborators: the session bus and the launched client process.

use crate::error::Result;
use crate::subprocess::{Credentials, ProcessExit};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;

/// Receiver of inbound `Notify` calls from the client service
///
/// Implementations are exported on the bus as the callback object. The
/// returned string is sent back verbatim as the method reply.
#[async_trait]
pub trait NotifyHandler: Send + Sync + 'static {
    /// Handle one notification payload
    async fn notify(&self, event: String) -> String;
}

/// An open session on the bus, bound to the client's control object
#[async_trait]
pub trait SkypeBus: Send + Sync {
    /// Call the remote `Invoke` method with a single command string
    async fn invoke(&self, command: &str) -> Result<String>;

    /// Export `handler` as the callback object for inbound notifications
    ///
    /// Fails with [`TransportError::Registration`](crate::TransportError::Registration)
    /// if the callback path already serves the callback interface.
    async fn register_callback(&self, handler: Arc<dyn NotifyHandler>) -> Result<()>;
}

/// Opens bus sessions
#[async_trait]
pub trait BusConnector: Send + Sync {
    /// Open a session bound to the client service
    ///
    /// Fails with [`TransportError::BusUnavailable`](crate::TransportError::BusUnavailable)
    /// when there is no session bus or the client service is not on it.
    async fn connect(&self) -> Result<Box<dyn SkypeBus>>;
}

/// Control over a launched client process
#[async_trait]
pub trait ProcessControl: Send + Sync {
    /// OS process id, if the process was started
    fn id(&self) -> Option<u32>;

    /// Watch that becomes `Some` once the process has terminated
    fn exit_watch(&self) -> watch::Receiver<Option<ProcessExit>>;

    /// Kill the process (best-effort; a process that already exited is not an error)
    async fn kill(&self) -> Result<()>;
}

/// Starts client processes
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Launch the client and pipe `credentials` to it
    async fn launch(&self, credentials: &Credentials) -> Result<Box<dyn ProcessControl>>;
}
