//! Testing utilities
//!
//! Mock transports for exercising attach, commands and event relay without a
//! session bus or a real client process.

use async_trait::async_trait;
use skypebus_transport::{
    BusConnector, Credentials, Launcher, NotifyHandler, ProcessControl, ProcessExit, SkypeBus,
    TransportError,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct MockBusState {
    commands: Mutex<Vec<String>>,
    invoke_failures: Mutex<Vec<(String, String)>>,
    registration_failure: Mutex<Option<String>>,
    listener: Mutex<Option<Arc<dyn NotifyHandler>>>,
}

/// Mock bus session
///
/// Records every invoked command and replies by echoing it back. Clones share
/// state, so a test can keep one clone while the connection owns another.
#[derive(Clone, Default)]
pub struct MockBus {
    state: Arc<MockBusState>,
}

impl MockBus {
    /// Create a new mock bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands received via `Invoke`, in call order
    pub fn commands(&self) -> Vec<String> {
        lock(&self.state.commands).clone()
    }

    /// Fail every command starting with `prefix` with a call error
    pub fn fail_invoke(&self, prefix: impl Into<String>, message: impl Into<String>) {
        lock(&self.state.invoke_failures).push((prefix.into(), message.into()));
    }

    /// Fail callback registration
    pub fn fail_registration(&self, message: impl Into<String>) {
        *lock(&self.state.registration_failure) = Some(message.into());
    }

    /// Whether a listener has been registered
    pub fn has_listener(&self) -> bool {
        lock(&self.state.listener).is_some()
    }

    /// Deliver a notification as the client would, returning the reply
    ///
    /// `None` if no listener is registered.
    pub async fn notify(&self, event: impl Into<String>) -> Option<String> {
        let listener = lock(&self.state.listener).clone()?;
        Some(listener.notify(event.into()).await)
    }
}

impl std::fmt::Debug for MockBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBus")
            .field("commands", &self.commands())
            .field("has_listener", &self.has_listener())
            .finish()
    }
}

#[async_trait]
impl SkypeBus for MockBus {
    async fn invoke(&self, command: &str) -> skypebus_transport::Result<String> {
        lock(&self.state.commands).push(command.to_string());

        let failure = lock(&self.state.invoke_failures)
            .iter()
            .find(|(prefix, _)| command.starts_with(prefix.as_str()))
            .map(|(_, message)| message.clone());
        match failure {
            Some(message) => Err(TransportError::Call(message)),
            None => Ok(command.to_string()),
        }
    }

    async fn register_callback(
        &self,
        handler: Arc<dyn NotifyHandler>,
    ) -> skypebus_transport::Result<()> {
        if let Some(message) = lock(&self.state.registration_failure).clone() {
            return Err(TransportError::Registration(message));
        }

        let mut listener = lock(&self.state.listener);
        if listener.is_some() {
            return Err(TransportError::Registration(
                "callback object already registered".to_string(),
            ));
        }
        *listener = Some(handler);
        Ok(())
    }
}

/// Outcome of one mock connect attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// Hand out the mock bus
    Ready,

    /// Fail with `BusUnavailable`
    Unavailable,
}

/// Mock bus connector with scripted outcomes
///
/// Scripted outcomes are used in order; once they run out every attempt
/// gets the fallback outcome.
#[derive(Debug)]
pub struct MockConnector {
    bus: MockBus,
    script: Mutex<VecDeque<ConnectOutcome>>,
    fallback: ConnectOutcome,
    attempts: AtomicU32,
}

impl MockConnector {
    /// Connector that always hands out `bus`
    pub fn new(bus: MockBus) -> Self {
        Self {
            bus,
            script: Mutex::new(VecDeque::new()),
            fallback: ConnectOutcome::Ready,
            attempts: AtomicU32::new(0),
        }
    }

    /// Connector for which the bus is never reachable
    pub fn unavailable() -> Self {
        Self {
            fallback: ConnectOutcome::Unavailable,
            ..Self::new(MockBus::new())
        }
    }

    /// Script the first outcomes
    pub fn with_script(self, outcomes: impl IntoIterator<Item = ConnectOutcome>) -> Self {
        lock(&self.script).extend(outcomes);
        self
    }

    /// Number of connect attempts so far
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// The bus handed out on success
    pub fn bus(&self) -> &MockBus {
        &self.bus
    }
}

#[async_trait]
impl BusConnector for MockConnector {
    async fn connect(&self) -> skypebus_transport::Result<Box<dyn SkypeBus>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let outcome = lock(&self.script).pop_front().unwrap_or(self.fallback);
        match outcome {
            ConnectOutcome::Ready => Ok(Box::new(self.bus.clone())),
            ConnectOutcome::Unavailable => Err(TransportError::BusUnavailable(
                "mock session bus not reachable".to_string(),
            )),
        }
    }
}

#[derive(Debug)]
struct MockLauncherState {
    launches: AtomicU32,
    kills: AtomicU32,
    exit_tx: watch::Sender<Option<ProcessExit>>,
    credentials: Mutex<Vec<Credentials>>,
    failure: Mutex<Option<String>>,
}

/// Mock launcher handing out [`MockProcess`]es
///
/// Clones share state; all launched processes share one exit watch.
#[derive(Debug, Clone)]
pub struct MockLauncher {
    state: Arc<MockLauncherState>,
}

impl MockLauncher {
    /// Create a launcher whose launches succeed
    pub fn new() -> Self {
        let (exit_tx, _) = watch::channel(None);
        Self {
            state: Arc::new(MockLauncherState {
                launches: AtomicU32::new(0),
                kills: AtomicU32::new(0),
                exit_tx,
                credentials: Mutex::new(Vec::new()),
                failure: Mutex::new(None),
            }),
        }
    }

    /// Create a launcher whose launches fail with a launch error
    pub fn failing(message: impl Into<String>) -> Self {
        let launcher = Self::new();
        *lock(&launcher.state.failure) = Some(message.into());
        launcher
    }

    /// Number of launches
    pub fn launch_count(&self) -> u32 {
        self.state.launches.load(Ordering::SeqCst)
    }

    /// Number of kill requests
    pub fn kill_count(&self) -> u32 {
        self.state.kills.load(Ordering::SeqCst)
    }

    /// Credentials passed to each launch
    pub fn launched_credentials(&self) -> Vec<Credentials> {
        lock(&self.state.credentials).clone()
    }

    /// Simulate the launched client terminating
    pub fn exit(&self, exit: ProcessExit) {
        self.state.exit_tx.send_replace(Some(exit));
    }
}

impl Default for MockLauncher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Launcher for MockLauncher {
    async fn launch(
        &self,
        credentials: &Credentials,
    ) -> skypebus_transport::Result<Box<dyn ProcessControl>> {
        if let Some(message) = lock(&self.state.failure).clone() {
            return Err(TransportError::Launch(message));
        }

        let launches = self.state.launches.fetch_add(1, Ordering::SeqCst) + 1;
        lock(&self.state.credentials).push(credentials.clone());
        Ok(Box::new(MockProcess {
            pid: 10_000 + launches,
            state: Arc::clone(&self.state),
        }))
    }
}

/// Mock client process
#[derive(Debug)]
pub struct MockProcess {
    pid: u32,
    state: Arc<MockLauncherState>,
}

#[async_trait]
impl ProcessControl for MockProcess {
    fn id(&self) -> Option<u32> {
        Some(self.pid)
    }

    fn exit_watch(&self) -> watch::Receiver<Option<ProcessExit>> {
        self.state.exit_tx.subscribe()
    }

    async fn kill(&self) -> skypebus_transport::Result<()> {
        self.state.kills.fetch_add(1, Ordering::SeqCst);
        self.state.exit_tx.send_if_modified(|exit| {
            if exit.is_none() {
                *exit = Some(ProcessExit::Killed);
                true
            } else {
                false
            }
        });
        Ok(())
    }
}
