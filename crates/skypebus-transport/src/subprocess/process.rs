//! Process management for the client subprocess

use crate::error::{Result, TransportError};
use crate::traits::ProcessControl;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Mutex;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child as TokioChild, Command};
use tokio::sync::{oneshot, watch};
use tracing::{debug, error, info, warn};

/// Name of the client binary looked up on `PATH`
pub const DEFAULT_BINARY: &str = "skype";

/// Flag that makes the client read `<username> <password>` from stdin
pub const PIPE_LOGIN_FLAG: &str = "--pipelogin";

/// Configuration for launching the client process
#[derive(Clone, Debug)]
pub struct LaunchConfig {
    /// Binary name (resolved on `PATH`) or path to the client executable
    pub binary: String,

    /// Arguments to pass to the client
    pub args: Vec<String>,

    /// Extra environment variables, on top of the inherited environment
    pub env: HashMap<String, String>,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            binary: DEFAULT_BINARY.to_string(),
            args: vec![PIPE_LOGIN_FLAG.to_string()],
            env: HashMap::new(),
        }
    }
}

impl LaunchConfig {
    /// Create a new launch configuration for `binary`
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            ..Self::default()
        }
    }

    /// Add an argument
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Set an environment variable
    ///
    /// The client needs the caller's display and session bus address, so the
    /// parent environment is inherited and these values are layered on top.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Locate the client binary on `PATH`
    pub fn resolve_binary(&self) -> Result<PathBuf> {
        which::which(&self.binary).map_err(|e| {
            TransportError::Launch(format!(
                "could not find {} bin in path: {}",
                self.binary, e
            ))
        })
    }
}

/// Login credentials handed to the client over stdin
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account name
    pub username: String,
    password: String,
}

impl Credentials {
    /// Create a credential pair
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// The stdin payload: `<username> <password>`, unescaped
    pub fn login_line(&self) -> String {
        format!("{} {}", self.username, self.password)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// How the client process terminated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessExit {
    /// Exited with status 0
    Success,

    /// Exited with a non-zero status, or was terminated by a signal (`code` is `None`)
    Failed {
        /// Exit code, when the process exited normally
        code: Option<i32>,
    },

    /// Killed on request
    Killed,

    /// Waiting on the process failed
    WaitFailed(String),
}

impl ProcessExit {
    fn from_wait(status: std::io::Result<ExitStatus>) -> Self {
        match status {
            Ok(status) if status.success() => Self::Success,
            Ok(status) => Self::Failed {
                code: status.code(),
            },
            Err(err) => Self::WaitFailed(err.to_string()),
        }
    }

    /// Whether the process ended without being asked to and without success
    pub fn is_abnormal(&self) -> bool {
        matches!(self, Self::Failed { .. } | Self::WaitFailed(_))
    }
}

impl fmt::Display for ProcessExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "exited successfully"),
            Self::Failed { code: Some(code) } => write!(f, "exited with code {}", code),
            Self::Failed { code: None } => write!(f, "terminated by signal"),
            Self::Killed => write!(f, "killed"),
            Self::WaitFailed(msg) => write!(f, "wait failed: {}", msg),
        }
    }
}

/// Handle to a running client process
///
/// The child itself is owned by a detached monitor task; this handle can only
/// observe its exit and ask for it to be killed.
#[derive(Debug)]
pub struct ClientProcess {
    pid: Option<u32>,
    kill_tx: Mutex<Option<oneshot::Sender<()>>>,
    exit_rx: watch::Receiver<Option<ProcessExit>>,
}

impl ClientProcess {
    /// Spawn the client and write the login line to its stdin
    ///
    /// Stdin is closed after the credentials are written; stdout and stderr
    /// are discarded.
    pub async fn spawn(config: &LaunchConfig, credentials: &Credentials) -> Result<Self> {
        let binary = config.resolve_binary()?;

        let mut cmd = Command::new(&binary);
        cmd.args(&config.args);
        cmd.envs(&config.env);

        // Configure stdio
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());

        let mut child = cmd.spawn().map_err(|e| {
            TransportError::Launch(format!("failed to launch {}: {}", binary.display(), e))
        })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| TransportError::Launch("failed to get stdin".to_string()))?;

        if let Err(e) = write_login(&mut stdin, credentials).await {
            let _ = child.start_kill();
            return Err(TransportError::Launch(format!(
                "failed to pass credentials to {}: {}",
                binary.display(),
                e
            )));
        }
        drop(stdin);

        let pid = child.id();
        info!(pid = ?pid, binary = %binary.display(), "launched client");

        let (kill_tx, kill_rx) = oneshot::channel();
        let (exit_tx, exit_rx) = watch::channel(None);
        tokio::spawn(monitor(child, pid, kill_rx, exit_tx));

        Ok(Self {
            pid,
            kill_tx: Mutex::new(Some(kill_tx)),
            exit_rx,
        })
    }

    /// Check if the process is still alive
    pub fn is_alive(&self) -> bool {
        self.exit_rx.borrow().is_none()
    }
}

async fn write_login(
    stdin: &mut tokio::process::ChildStdin,
    credentials: &Credentials,
) -> std::io::Result<()> {
    stdin.write_all(credentials.login_line().as_bytes()).await?;
    stdin.flush().await
}

/// Waits for the child to exit (or for a kill request) and publishes the outcome
async fn monitor(
    mut child: TokioChild,
    pid: Option<u32>,
    kill_rx: oneshot::Receiver<()>,
    exit_tx: watch::Sender<Option<ProcessExit>>,
) {
    let exit = tokio::select! {
        status = child.wait() => ProcessExit::from_wait(status),
        Ok(()) = kill_rx => match child.kill().await {
            Ok(()) => ProcessExit::Killed,
            Err(e) => ProcessExit::WaitFailed(e.to_string()),
        },
    };

    match &exit {
        ProcessExit::Success => debug!(pid = ?pid, "client exited"),
        ProcessExit::Killed => info!(pid = ?pid, "client killed"),
        ProcessExit::Failed { code } => warn!(pid = ?pid, code = ?code, "client bin exited"),
        ProcessExit::WaitFailed(msg) => {
            error!(pid = ?pid, error = %msg, "waiting on client failed")
        }
    }

    exit_tx.send_replace(Some(exit));
}

#[async_trait]
impl ProcessControl for ClientProcess {
    fn id(&self) -> Option<u32> {
        self.pid
    }

    fn exit_watch(&self) -> watch::Receiver<Option<ProcessExit>> {
        self.exit_rx.clone()
    }

    async fn kill(&self) -> Result<()> {
        let kill_tx = self
            .kill_tx
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();

        let Some(kill_tx) = kill_tx else {
            debug!(pid = ?self.pid, "kill already requested");
            return Ok(());
        };

        if kill_tx.send(()).is_err() {
            debug!(pid = ?self.pid, "client already exited, nothing to kill");
            return Ok(());
        }

        let mut exit_rx = self.exit_rx.clone();
        exit_rx
            .wait_for(Option::is_some)
            .await
            .map_err(|e| TransportError::Process(format!("monitor went away: {}", e)))?;
        Ok(())
    }
}
