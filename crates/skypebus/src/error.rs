//! Error types for skypebus
//!
//! Errors implement [`ErrorRecovery`], which tells the attach loop whether a
//! failure means "the client is not on the bus yet" (worth another attempt)
//! or something the caller has to deal with.

use skypebus_transport::TransportError;
use thiserror::Error;

/// Result type for skypebus operations
pub type Result<T> = std::result::Result<T, SkypeError>;

/// Errors that can occur while launching, attaching to, or driving the client
#[derive(Debug, Error)]
pub enum SkypeError {
    /// Client binary not found, or the process failed to start
    #[error("Launch error: {0}")]
    Launch(String),

    /// No session bus reachable, or the client service is not on it
    #[error("Bus unavailable: {0}")]
    BusUnavailable(String),

    /// The callback object could not be registered
    #[error("Callback registration failed: {0}")]
    Registration(String),

    /// A remote `Invoke` call failed
    #[error("Invoke failed: {0}")]
    Invoke(#[source] TransportError),

    /// Every attach attempt found the client unreachable
    #[error("Failed to attach to skype after {attempts} attempts")]
    AttachExhausted {
        /// Number of attempts made
        attempts: u32,
    },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<TransportError> for SkypeError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Launch(msg) => Self::Launch(msg),
            TransportError::BusUnavailable(msg) => Self::BusUnavailable(msg),
            TransportError::Registration(msg) => Self::Registration(msg),
            TransportError::Config(msg) => Self::Config(msg),
            TransportError::Process(msg) => Self::Launch(msg),
            TransportError::Io(err) => Self::Launch(err.to_string()),
            err @ TransportError::Call(_) => Self::Invoke(err),
        }
    }
}

/// Error recovery guidance trait
pub trait ErrorRecovery {
    /// Whether a later attempt could succeed without caller intervention
    fn is_retriable(&self) -> bool;

    /// User-facing action to take
    fn suggested_action(&self) -> &str;
}

impl ErrorRecovery for SkypeError {
    fn is_retriable(&self) -> bool {
        // Only "client not on the bus yet" clears up by itself.
        matches!(self, Self::BusUnavailable(_))
    }

    fn suggested_action(&self) -> &str {
        match self {
            Self::Launch(_) => "Make sure the skype binary is installed and on PATH.",
            Self::BusUnavailable(_) => {
                "Start a D-Bus session and log the client in, or wait for it to finish starting."
            }
            Self::Registration(_) => {
                "Another adapter already owns the callback object. \
                Only one attached session per client is supported."
            }
            Self::Invoke(_) => "The client rejected the command or left the bus. Check its state.",
            Self::AttachExhausted { .. } => {
                "The client never came up on the bus. Check the credentials \
                and that the client can log in interactively."
            }
            Self::Config(_) => "Fix the configuration and retry.",
        }
    }
}
