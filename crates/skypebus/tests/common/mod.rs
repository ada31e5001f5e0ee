//! Common test utilities and helpers

use skypebus::Credentials;

/// Install a test-friendly tracing subscriber (honours `RUST_LOG`)
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Credentials used by launch tests
#[allow(dead_code)]
pub fn test_credentials() -> Credentials {
    Credentials::new("echo123", "s3cret")
}
