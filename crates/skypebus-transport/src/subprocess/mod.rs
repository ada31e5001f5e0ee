//! Subprocess transport for the chat client
//!
//! Launches the client binary in pipe-login mode, hands it the credentials
//! over stdin and supervises it until exit.

pub mod launcher;
pub mod process;

pub use launcher::ProcessLauncher;
pub use process::{ClientProcess, Credentials, LaunchConfig, ProcessExit};
