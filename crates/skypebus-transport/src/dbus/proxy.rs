//! Proxy for the client's control object

use zbus::proxy;

/// `com.Skype.API` control interface
///
/// Every control operation is a text command sent through `Invoke`.
#[proxy(
    interface = "com.Skype.API",
    default_service = "com.Skype.API",
    default_path = "/com/Skype",
    gen_blocking = false
)]
pub trait SkypeApi {
    /// Send a command and return the client's reply
    #[zbus(name = "Invoke")]
    fn invoke(&self, command: &str) -> zbus::Result<String>;
}
