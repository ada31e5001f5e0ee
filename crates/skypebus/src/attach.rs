//! Attaching to the client, with or without launching it first
//!
//! [`attach_with`] expects a client that is already running and logged in.
//! [`run_and_attach_with`] launches one and keeps trying to attach while it
//! comes up: before every attempt it sleeps for the configured delay, and only
//! [`SkypeError::BusUnavailable`] leads to another attempt. Any other attach
//! failure is returned right away and leaves the launched client running.

use crate::config::AttachConfig;
use crate::connection::Connection;
use crate::error::{ErrorRecovery, Result, SkypeError};
use crate::events;
use crate::listener::Listener;
use skypebus_transport::{BusConnector, Credentials, Launcher};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Attach to a running, logged-in client
///
/// Steps, stopping at the first failure:
/// 1. open a bus session ([`SkypeError::BusUnavailable`])
/// 2. allocate the event queue and register the listener ([`SkypeError::Registration`])
/// 3. send `NAME` and `PROTOCOL` ([`SkypeError::Invoke`])
pub async fn attach_with(
    connector: &dyn BusConnector,
    config: &AttachConfig,
) -> Result<Connection> {
    let bus = connector.connect().await?;

    let (sender, receiver) = events::channel(&config.queue);
    bus.register_callback(Arc::new(Listener::new(sender))).await?;

    let connection = Connection::new(bus, receiver);
    connection.set_name(&config.client_name).await?;
    connection.set_protocol(config.protocol).await?;

    debug!(session = %connection.id(), "attached to client");
    Ok(connection)
}

/// Launch the client, then attach to it once it shows up on the bus
///
/// On success the client name and protocol are sent a second time (they were
/// already sent while attaching); both commands are idempotent. When every
/// attempt finds the bus unavailable the client is killed (best-effort) and
/// [`SkypeError::AttachExhausted`] is returned.
pub async fn run_and_attach_with(
    launcher: &dyn Launcher,
    connector: &dyn BusConnector,
    credentials: &Credentials,
    config: &AttachConfig,
) -> Result<Connection> {
    config.validate()?;

    let process = launcher.launch(credentials).await?;
    info!(pid = ?process.id(), user = %credentials.username, "launched client, waiting to attach");

    for attempt in 1..=config.max_attempts {
        tokio::time::sleep(config.retry_delay).await;

        match attach_with(connector, config).await {
            Ok(mut connection) => {
                connection.set_name(&config.client_name).await?;
                connection.set_protocol(config.protocol).await?;
                connection.attach_process(process);
                info!(session = %connection.id(), attempt, "attached to launched client");
                return Ok(connection);
            }
            Err(err) if err.is_retriable() => {
                debug!(
                    attempt,
                    max_attempts = config.max_attempts,
                    error = %err,
                    "client not attachable yet"
                );
            }
            Err(err) => return Err(err),
        }
    }

    if let Err(err) = process.kill().await {
        warn!(
            pid = ?process.id(),
            error = %err,
            "failed to kill client after attach attempts ran out"
        );
    }

    Err(SkypeError::AttachExhausted {
        attempts: config.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ConnectOutcome, MockBus, MockConnector, MockLauncher};
    use skypebus_transport::BusConfig;
    use std::time::Duration;

    fn fast_config() -> AttachConfig {
        AttachConfig::default().with_retry_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_attach_configures_session() {
        let bus = MockBus::new();
        let connector = MockConnector::new(bus.clone());

        attach_with(&connector, &AttachConfig::default()).await.unwrap();

        assert_eq!(bus.commands(), vec!["NAME skype4go", "PROTOCOL 7"]);
        assert!(bus.has_listener());
    }

    #[tokio::test]
    async fn test_attach_stops_at_registration_failure() {
        let bus = MockBus::new();
        bus.fail_registration("object path already in use");
        let connector = MockConnector::new(bus.clone());

        let err = attach_with(&connector, &AttachConfig::default())
            .await
            .unwrap_err();

        assert!(matches!(err, SkypeError::Registration(_)));
        assert!(bus.commands().is_empty());
    }

    #[tokio::test]
    async fn test_run_and_attach_rejects_zero_attempts() {
        let launcher = MockLauncher::new();
        let connector = MockConnector::new(MockBus::new());
        let config = fast_config().with_max_attempts(0);

        let err = run_and_attach_with(&launcher, &connector, &Credentials::new("a", "b"), &config)
            .await
            .unwrap_err();

        assert!(matches!(err, SkypeError::Config(_)));
        assert_eq!(launcher.launch_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_bus_addressing_fails_before_launch() {
        let launcher = MockLauncher::new();
        let connector = MockConnector::new(MockBus::new());
        let config = fast_config().with_bus(BusConfig::default().with_service("com..Skype"));

        let err = run_and_attach_with(&launcher, &connector, &Credentials::new("a", "b"), &config)
            .await
            .unwrap_err();

        assert!(matches!(err, SkypeError::Config(_)));
        assert!(!err.is_retriable());
        assert_eq!(launcher.launch_count(), 0);
        assert_eq!(connector.attempts(), 0);
    }

    #[tokio::test]
    async fn test_run_and_attach_retries_only_unavailable() {
        let bus = MockBus::new();
        let connector = MockConnector::new(bus.clone()).with_script([
            ConnectOutcome::Unavailable,
            ConnectOutcome::Unavailable,
            ConnectOutcome::Ready,
        ]);
        let launcher = MockLauncher::new();

        let credentials = Credentials::new("a", "b");
        let conn = run_and_attach_with(&launcher, &connector, &credentials, &fast_config())
            .await
            .unwrap();

        assert_eq!(connector.attempts(), 3);
        assert_eq!(launcher.kill_count(), 0);
        assert!(conn.process_exit().is_some());
    }
}
