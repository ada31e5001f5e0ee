//! Integration tests for attaching over a real session bus
//!
//! Needs `DBUS_SESSION_BUS_ADDRESS` (e.g. run under `dbus-run-session`);
//! skipped otherwise. A fake client service is exported under a per-test
//! well-known name so tests do not collide with each other or a real client.

mod common;

use common::init_tracing;
use skypebus::{AttachConfig, BusConfig, Connection, Event, SkypeClient, SkypeError};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use zbus::interface;
use zbus::message::Header;

fn session_bus_available() -> bool {
    if std::env::var_os("DBUS_SESSION_BUS_ADDRESS").is_some() {
        return true;
    }
    eprintln!("DBUS_SESSION_BUS_ADDRESS not set, skipping session bus test");
    false
}

fn client_for(tag: &str) -> (SkypeClient, String) {
    let service = format!("com.Skype.API.Attach.p{}.{}", std::process::id(), tag);
    let config = AttachConfig::default().with_bus(BusConfig::default().with_service(&service));
    (SkypeClient::new(config), service)
}

#[derive(Clone, Default)]
struct FakeSkype {
    commands: Arc<Mutex<Vec<String>>>,
    callers: Arc<Mutex<Vec<String>>>,
}

#[interface(name = "com.Skype.API")]
impl FakeSkype {
    #[zbus(name = "Invoke")]
    fn invoke(&self, command: String, #[zbus(header)] header: Header<'_>) -> String {
        if let Some(sender) = header.sender() {
            self.callers.lock().unwrap().push(sender.to_string());
        }
        self.commands.lock().unwrap().push(command.clone());
        format!("OK {}", command)
    }
}

struct FakeService {
    connection: zbus::Connection,
    fake: FakeSkype,
}

impl FakeService {
    async fn start(service: &str) -> Self {
        let fake = FakeSkype::default();
        let connection = zbus::connection::Builder::session()
            .unwrap()
            .name(service.to_string())
            .unwrap()
            .serve_at("/com/Skype", fake.clone())
            .unwrap()
            .build()
            .await
            .unwrap();
        Self { connection, fake }
    }

    fn commands(&self) -> Vec<String> {
        self.fake.commands.lock().unwrap().clone()
    }

    /// Unique bus name of the adapter that last invoked a command
    fn adapter(&self) -> String {
        self.fake.callers.lock().unwrap().last().cloned().expect("no caller yet")
    }
}

async fn notify(from: zbus::Connection, destination: String, event: String) -> String {
    let reply = from
        .call_method(
            Some(destination.as_str()),
            "/com/Skype/Client",
            Some("com.Skype.API.Client"),
            "Notify",
            &(event.as_str(),),
        )
        .await
        .unwrap();
    reply.body().deserialize::<String>().unwrap()
}

async fn attached(tag: &str) -> (FakeService, Connection) {
    let (client, service) = client_for(tag);
    let fake = FakeService::start(&service).await;
    let conn = client.attach().await.unwrap();
    (fake, conn)
}

#[tokio::test]
async fn test_attach_without_service_owner_is_bus_unavailable() {
    init_tracing();
    if !session_bus_available() {
        return;
    }
    let (client, service) = client_for("missing");

    let err = client.attach().await.unwrap_err();

    match err {
        SkypeError::BusUnavailable(msg) => assert!(msg.contains(&service)),
        other => panic!("expected BusUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn test_attach_sends_name_and_protocol_to_service() {
    init_tracing();
    if !session_bus_available() {
        return;
    }
    let (fake, conn) = attached("handshake").await;

    assert_eq!(fake.commands(), vec!["NAME skype4go", "PROTOCOL 7"]);
    assert_eq!(conn.invoke("PING").await.unwrap(), "OK PING");
}

#[tokio::test]
async fn test_notify_over_bus_becomes_event() {
    if !session_bus_available() {
        return;
    }
    let (fake, mut conn) = attached("events").await;
    let adapter = fake.adapter();

    for payload in ["a", "b", "c"] {
        let reply = notify(fake.connection.clone(), adapter.clone(), payload.to_string()).await;
        assert_eq!(reply, "");
    }

    assert_eq!(conn.next_event().await, Some(Event::from("a")));
    assert_eq!(conn.next_event().await, Some(Event::from("b")));
    assert_eq!(conn.next_event().await, Some(Event::from("c")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_eleventh_notify_over_bus_waits_for_consumer() {
    if !session_bus_available() {
        return;
    }
    let (fake, mut conn) = attached("backpressure").await;
    let adapter = fake.adapter();

    for i in 0..10 {
        let reply = notify(fake.connection.clone(), adapter.clone(), format!("e{}", i)).await;
        assert_eq!(reply, "");
    }

    let eleventh = tokio::spawn(notify(
        fake.connection.clone(),
        adapter.clone(),
        "e10".to_string(),
    ));
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!eleventh.is_finished());

    assert_eq!(conn.try_next_event(), Some(Event::from("e0")));
    assert_eq!(eleventh.await.unwrap(), "");

    let rest: Vec<String> = std::iter::from_fn(|| conn.try_next_event())
        .map(Event::into_inner)
        .collect();
    let expected: Vec<String> = (1..=10).map(|i| format!("e{}", i)).collect();
    assert_eq!(rest, expected);
}
