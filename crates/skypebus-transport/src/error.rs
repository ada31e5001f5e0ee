//! Transport error types

use thiserror::Error;

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors that can occur in transport operations
#[derive(Debug, Error)]
pub enum TransportError {
    /// Client binary could not be located or started
    #[error("Launch error: {0}")]
    Launch(String),

    /// No session bus, or the client service is not on it
    #[error("Bus unavailable: {0}")]
    BusUnavailable(String),

    /// Callback object could not be exported on the bus
    #[error("Registration error: {0}")]
    Registration(String),

    /// A remote method call failed (transport fault or service-side error)
    #[error("Call error: {0}")]
    Call(String),

    /// Malformed bus addressing (service name, object path or interface)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Process supervision error (for subprocess transport)
    #[error("Process error: {0}")]
    Process(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<zbus::Error> for TransportError {
    fn from(err: zbus::Error) -> Self {
        Self::Call(err.to_string())
    }
}

impl From<zbus::fdo::Error> for TransportError {
    fn from(err: zbus::fdo::Error) -> Self {
        Self::Call(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_context() {
        let err = TransportError::BusUnavailable("no session bus".to_string());
        assert_eq!(err.to_string(), "Bus unavailable: no session bus");

        let err = TransportError::Launch("skype not found".to_string());
        assert!(err.to_string().contains("skype not found"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: TransportError = io.into();
        assert!(matches!(err, TransportError::Io(_)));
    }

    #[test]
    fn test_zbus_error_maps_to_call() {
        let err: TransportError = zbus::Error::Failure("service went away".to_string()).into();
        match err {
            TransportError::Call(msg) => assert!(msg.contains("service went away")),
            other => panic!("expected Call, got {other:?}"),
        }
    }
}
