//! Callback object exported for inbound notifications

use crate::traits::NotifyHandler;
use std::sync::Arc;
use zbus::interface;

/// Bus-side wrapper that forwards `Notify` calls to a [`NotifyHandler`]
pub struct CallbackObject {
    handler: Arc<dyn NotifyHandler>,
}

impl CallbackObject {
    /// Wrap a handler for export
    pub fn new(handler: Arc<dyn NotifyHandler>) -> Self {
        Self { handler }
    }
}

impl std::fmt::Debug for CallbackObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackObject").finish_non_exhaustive()
    }
}

#[interface(name = "com.Skype.API.Client")]
impl CallbackObject {
    /// Receive one notification from the client; never fails at the bus level
    #[zbus(name = "Notify")]
    async fn notify(&self, event: String) -> String {
        self.handler.notify(event).await
    }
}
