//! D-Bus transport implementation
//!
//! Talks to the client's `com.Skype.API` service on the session bus and
//! exports the `com.Skype.API.Client` callback object it notifies.

pub mod callback;
pub mod proxy;
pub mod session;

pub use callback::CallbackObject;
pub use proxy::SkypeApiProxy;
pub use session::{DbusConnector, DbusSession};

use crate::error::{Result, TransportError};
use zbus::names::{BusName, InterfaceName};
use zbus::zvariant::ObjectPath;

/// Well-known name of the client's API service
pub const SERVICE_NAME: &str = "com.Skype.API";

/// Object path of the client's control object
pub const OBJECT_PATH: &str = "/com/Skype";

/// Interface of the control object
pub const API_INTERFACE: &str = "com.Skype.API";

/// Object path the callback object is exported at
pub const CALLBACK_PATH: &str = "/com/Skype/Client";

/// Interface the callback object implements
pub const CALLBACK_INTERFACE: &str = "com.Skype.API.Client";

/// Addressing of the client service on the session bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusConfig {
    /// Well-known service name
    pub service: String,

    /// Control object path
    pub object_path: String,

    /// Control object interface
    pub interface: String,

    /// Path to export the callback object at
    pub callback_path: String,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
            object_path: OBJECT_PATH.to_string(),
            interface: API_INTERFACE.to_string(),
            callback_path: CALLBACK_PATH.to_string(),
        }
    }
}

impl BusConfig {
    /// Set the service name
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    /// Set the control object path
    pub fn with_object_path(mut self, path: impl Into<String>) -> Self {
        self.object_path = path.into();
        self
    }

    /// Set the control object interface
    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = interface.into();
        self
    }

    /// Set the callback object path
    pub fn with_callback_path(mut self, path: impl Into<String>) -> Self {
        self.callback_path = path.into();
        self
    }

    /// Check that every name and path is well-formed D-Bus syntax
    pub fn validate(&self) -> Result<()> {
        BusName::try_from(self.service.as_str())
            .map_err(|e| invalid("service name", &self.service, e))?;
        ObjectPath::try_from(self.object_path.as_str())
            .map_err(|e| invalid("object path", &self.object_path, e))?;
        InterfaceName::try_from(self.interface.as_str())
            .map_err(|e| invalid("interface", &self.interface, e))?;
        ObjectPath::try_from(self.callback_path.as_str())
            .map_err(|e| invalid("callback path", &self.callback_path, e))?;
        Ok(())
    }
}

fn invalid(what: &str, value: &str, err: impl std::fmt::Display) -> TransportError {
    TransportError::Config(format!("invalid {} {:?}: {}", what, value, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bus_config_default_addresses_skype() {
        let config = BusConfig::default();
        assert_eq!(config.service, "com.Skype.API");
        assert_eq!(config.object_path, "/com/Skype");
        assert_eq!(config.interface, "com.Skype.API");
        assert_eq!(config.callback_path, "/com/Skype/Client");
    }

    #[test]
    fn test_bus_config_builder() {
        let config = BusConfig::default()
            .with_service("com.Skype.API.Test")
            .with_callback_path("/com/Skype/Client2");

        assert_eq!(config.service, "com.Skype.API.Test");
        assert_eq!(config.object_path, "/com/Skype");
        assert_eq!(config.callback_path, "/com/Skype/Client2");
    }

    #[test]
    fn test_default_bus_config_is_valid() {
        assert!(BusConfig::default().validate().is_ok());
        assert!(
            BusConfig::default()
                .with_interface("com.Skype.API.Test")
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_invalid_bus_config_is_config_error() {
        let cases = [
            BusConfig::default().with_service("not a bus name"),
            BusConfig::default().with_object_path("com/Skype"),
            BusConfig::default().with_interface("Skype"),
            BusConfig::default().with_callback_path("/com/Skype/"),
        ];

        for config in cases {
            match config.validate() {
                Err(TransportError::Config(msg)) => assert!(msg.starts_with("invalid ")),
                other => panic!("expected Config error for {config:?}, got {other:?}"),
            }
        }
    }
}
