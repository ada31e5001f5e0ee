//! Main entry point for attaching to the client

use crate::attach::{attach_with, run_and_attach_with};
use crate::config::AttachConfig;
use crate::connection::Connection;
use crate::error::Result;
use skypebus_transport::{BusConnector, Credentials, DbusConnector, Launcher, ProcessLauncher};
use std::sync::Arc;

/// Attaches to the desktop client, launching it if asked to
///
/// Holds the configuration plus the bus connector and process launcher to
/// use. [`SkypeClient::new`] wires the real D-Bus and subprocess transports;
/// [`SkypeClient::with_transports`] accepts any implementation.
#[derive(Clone)]
pub struct SkypeClient {
    config: AttachConfig,
    connector: Arc<dyn BusConnector>,
    launcher: Arc<dyn Launcher>,
}

impl SkypeClient {
    /// Create a client using the session bus and the configured client binary
    pub fn new(config: AttachConfig) -> Self {
        let connector = DbusConnector::new(config.bus.clone());
        let launcher = ProcessLauncher::new(config.launch.clone());
        Self::with_transports(config, Arc::new(connector), Arc::new(launcher))
    }

    /// Create a client with explicit transports
    pub fn with_transports(
        config: AttachConfig,
        connector: Arc<dyn BusConnector>,
        launcher: Arc<dyn Launcher>,
    ) -> Self {
        Self {
            config,
            connector,
            launcher,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &AttachConfig {
        &self.config
    }

    /// Attach to a client that is already running and logged in
    ///
    /// More than one running client is unsupported.
    pub async fn attach(&self) -> Result<Connection> {
        attach_with(self.connector.as_ref(), &self.config).await
    }

    /// Launch a new client, log it in, and attach to it
    pub async fn run_and_attach(&self, credentials: &Credentials) -> Result<Connection> {
        run_and_attach_with(
            self.launcher.as_ref(),
            self.connector.as_ref(),
            credentials,
            &self.config,
        )
        .await
    }
}

impl Default for SkypeClient {
    fn default() -> Self {
        Self::new(AttachConfig::default())
    }
}

impl std::fmt::Debug for SkypeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkypeClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Attach to the running client with the default configuration
pub async fn attach() -> Result<Connection> {
    SkypeClient::default().attach().await
}

/// Launch the client with `username`/`password` and attach to it, using the
/// default configuration
///
/// The `skype` binary must be on `PATH`.
pub async fn run_and_attach(username: &str, password: &str) -> Result<Connection> {
    SkypeClient::default()
        .run_and_attach(&Credentials::new(username, password))
        .await
}
