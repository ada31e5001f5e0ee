//! Attach configuration

use crate::error::{Result, SkypeError};
use std::time::Duration;

pub use crate::events::{OverflowPolicy, QueueConfig};
pub use skypebus_transport::{BusConfig, LaunchConfig};

/// Name the adapter announces to the client with `NAME`
pub const DEFAULT_CLIENT_NAME: &str = "skype4go";

/// API protocol version negotiated with `PROTOCOL`
pub const DEFAULT_PROTOCOL: i64 = 7;

/// Attach attempts made after launching the client
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Delay before each attach attempt after launching the client
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Configuration for attaching to (and optionally launching) the client
///
/// Controls how the adapter finds the client on the bus, how it identifies
/// itself, how patiently it waits for a freshly launched client, and how
/// inbound events are buffered.
#[derive(Debug, Clone)]
pub struct AttachConfig {
    /// Bus addressing of the client service
    pub bus: BusConfig,

    /// How to launch the client binary
    pub launch: LaunchConfig,

    /// Name sent with `NAME`
    pub client_name: String,

    /// Protocol version sent with `PROTOCOL` (passed through unchecked)
    pub protocol: i64,

    /// Attach attempts after launch
    pub max_attempts: u32,

    /// Sleep before each attach attempt after launch
    pub retry_delay: Duration,

    /// Event queue sizing and overflow policy
    pub queue: QueueConfig,
}

impl Default for AttachConfig {
    fn default() -> Self {
        Self {
            bus: BusConfig::default(),
            launch: LaunchConfig::default(),
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            protocol: DEFAULT_PROTOCOL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            queue: QueueConfig::default(),
        }
    }
}

impl AttachConfig {
    /// Create a new attach config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bus addressing
    pub fn with_bus(mut self, bus: BusConfig) -> Self {
        self.bus = bus;
        self
    }

    /// Set the launch configuration
    pub fn with_launch(mut self, launch: LaunchConfig) -> Self {
        self.launch = launch;
        self
    }

    /// Set the client name
    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    /// Set the protocol version
    pub fn with_protocol(mut self, protocol: i64) -> Self {
        self.protocol = protocol;
        self
    }

    /// Set the number of attach attempts after launch
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the delay before each attach attempt after launch
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set the event queue configuration
    pub fn with_queue(mut self, queue: QueueConfig) -> Self {
        self.queue = queue;
        self
    }

    /// Check the configuration before launching anything
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(SkypeError::Config(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        self.bus.validate()?;
        Ok(())
    }
}
