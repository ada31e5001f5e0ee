//! Transport layer for skypebus
//!
//! Provides the two collaborators the client adapter talks to: the external
//! chat client process and the D-Bus session bus it publishes its API on.
//! The SDK crate (`skypebus`) only sees the traits defined here, so both
//! sides can be swapped for mocks in tests.
//!
//! # Architecture
//!
//! - **Bus traits**: [`BusConnector`], [`SkypeBus`] and [`NotifyHandler`]
//! - **D-Bus transport**: `com.Skype.API` proxy and callback object via zbus

#![deny(unsafe_code)]
#![warn(missing_docs)]
//! - **Subprocess transport**: launching the client with piped credentials
//! - **Error handling**: one error type for both transports
//!
//! # Usage
//!
//! ```ignore
//! use skypebus_transport::{BusConnector, DbusConnector, BusConfig};
//!
//! let connector = DbusConnector::new(BusConfig::default());
//! let bus = connector.connect().await?;
//! let reply = bus.invoke("PROTOCOL 7").await?;
//! ```

pub mod dbus;
pub mod error;
pub mod subprocess;
pub mod traits;

// Re-export commonly used types
pub use dbus::{BusConfig, DbusConnector, DbusSession};
pub use error::{Result, TransportError};
pub use subprocess::{ClientProcess, Credentials, LaunchConfig, ProcessExit, ProcessLauncher};
pub use traits::{BusConnector, Launcher, NotifyHandler, ProcessControl, SkypeBus};
