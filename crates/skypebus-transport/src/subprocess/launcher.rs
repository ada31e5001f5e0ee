//! Launcher implementation
//!
//! Spawns the real client binary for the attach-with-launch flow.

use crate::error::Result;
use crate::traits::{Launcher, ProcessControl};
use async_trait::async_trait;

pub use super::process::{ClientProcess, Credentials, LaunchConfig};

/// Launches the chat client as a subprocess
#[derive(Debug, Clone, Default)]
pub struct ProcessLauncher {
    config: LaunchConfig,
}

impl ProcessLauncher {
    /// Create a launcher for the given configuration
    pub fn new(config: LaunchConfig) -> Self {
        Self { config }
    }

    /// Get the launch configuration
    pub fn config(&self) -> &LaunchConfig {
        &self.config
    }
}

#[async_trait]
impl Launcher for ProcessLauncher {
    async fn launch(&self, credentials: &Credentials) -> Result<Box<dyn ProcessControl>> {
        let process = ClientProcess::spawn(&self.config, credentials).await?;
        Ok(Box::new(process))
    }
}
