//! Session bus connection to the client service

use super::callback::CallbackObject;
use super::proxy::SkypeApiProxy;
use super::{BusConfig, CALLBACK_INTERFACE};
use crate::error::{Result, TransportError};
use crate::traits::{BusConnector, NotifyHandler, SkypeBus};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use zbus::fdo::DBusProxy;
use zbus::names::BusName;
use zbus::proxy::CacheProperties;

/// Opens session-bus connections to the client service
#[derive(Debug, Clone, Default)]
pub struct DbusConnector {
    config: BusConfig,
}

impl DbusConnector {
    /// Create a connector for the given bus addressing
    pub fn new(config: BusConfig) -> Self {
        Self { config }
    }

    /// Get the bus configuration
    pub fn config(&self) -> &BusConfig {
        &self.config
    }
}

#[async_trait]
impl BusConnector for DbusConnector {
    async fn connect(&self) -> Result<Box<dyn SkypeBus>> {
        self.config.validate()?;

        let connection = zbus::Connection::session()
            .await
            .map_err(|e| TransportError::BusUnavailable(format!("no session bus: {}", e)))?;

        // The client registers its service only once it is logged in; an
        // unowned name means there is nothing to attach to yet.
        let service = BusName::try_from(self.config.service.as_str())
            .map_err(|e| TransportError::Config(format!("invalid service name: {}", e)))?;
        let has_owner = DBusProxy::new(&connection)
            .await
            .map_err(|e| TransportError::BusUnavailable(e.to_string()))?
            .name_has_owner(service)
            .await
            .map_err(|e| TransportError::BusUnavailable(e.to_string()))?;
        if !has_owner {
            return Err(TransportError::BusUnavailable(format!(
                "{} is not on the session bus",
                self.config.service
            )));
        }

        let proxy = SkypeApiProxy::builder(&connection)
            .destination(self.config.service.clone())?
            .path(self.config.object_path.clone())?
            .interface(self.config.interface.clone())?
            .cache_properties(CacheProperties::No)
            .build()
            .await?;

        debug!(
            service = %self.config.service,
            path = %self.config.object_path,
            "opened bus session"
        );

        Ok(Box::new(DbusSession {
            connection,
            proxy,
            callback_path: self.config.callback_path.clone(),
        }))
    }
}

/// Open session bound to the client's control object
pub struct DbusSession {
    connection: zbus::Connection,
    proxy: SkypeApiProxy<'static>,
    callback_path: String,
}

impl DbusSession {
    /// Underlying zbus connection
    pub fn connection(&self) -> &zbus::Connection {
        &self.connection
    }
}

impl std::fmt::Debug for DbusSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbusSession")
            .field("unique_name", &self.connection.unique_name())
            .field("callback_path", &self.callback_path)
            .finish()
    }
}

#[async_trait]
impl SkypeBus for DbusSession {
    async fn invoke(&self, command: &str) -> Result<String> {
        Ok(self.proxy.invoke(command).await?)
    }

    async fn register_callback(&self, handler: Arc<dyn NotifyHandler>) -> Result<()> {
        let exported = self
            .connection
            .object_server()
            .at(self.callback_path.as_str(), CallbackObject::new(handler))
            .await
            .map_err(|e| TransportError::Registration(e.to_string()))?;

        if !exported {
            return Err(TransportError::Registration(format!(
                "{} already exports {}",
                self.callback_path, CALLBACK_INTERFACE
            )));
        }

        debug!(path = %self.callback_path, "exported callback object");
        Ok(())
    }
}
