//! Drive a desktop Skype client over its D-Bus API
//!
//! Launches (or finds) a running client, attaches to its `com.Skype.API`
//! service on the session bus, and exposes the two things the API offers:
//! text commands sent through `Invoke`, and notifications the client pushes
//! back through a callback object.
//!
//! # Key Features
//!
//! - **Attach**: connect to a client that is already running and logged in
//! - **Launch and attach**: start the client with piped credentials and wait
//!   for it to appear on the bus
//! - **Commands**: raw `invoke` plus the `NAME` / `PROTOCOL` handshake
//! - **Events**: bounded, ordered event queue with a configurable overflow policy
//! - **Process exit**: launched clients report termination on a watch channel
//!
//! # Architecture
//!
//! 1. **Transport Layer** (`skypebus-transport`): D-Bus session and subprocess

#![deny(unsafe_code)]
//! 2. **Session Layer** (this crate): attach orchestration, connection, events
//!
//! # Usage Example
//!
//! ```no_run
//! use skypebus::{run_and_attach, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut conn = run_and_attach("alice", "hunter2").await?;
//!
//!     conn.invoke("GET USERSTATUS").await?;
//!     while let Some(event) = conn.next_event().await {
//!         println!("{}", event);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Single client
//!
//! The bus resolves one well-known service name, so exactly one running
//! client is assumed. Each attach still returns an independent
//! [`Connection`]; nothing is shared between them.

#![warn(missing_docs)]

pub mod attach;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod events;
pub mod listener;

pub mod testing;

// Re-export commonly used types
pub use attach::{attach_with, run_and_attach_with};
pub use client::{SkypeClient, attach, run_and_attach};
pub use config::{AttachConfig, BusConfig, LaunchConfig, OverflowPolicy, QueueConfig};
pub use connection::{CommandHandle, Connection};
pub use error::{ErrorRecovery, Result, SkypeError};
pub use events::{Event, EventReceiver, EventSender, QueueError};
pub use listener::Listener;

pub use skypebus_transport::{Credentials, ProcessExit};
