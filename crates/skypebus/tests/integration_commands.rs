//! Integration tests for outbound commands

use rstest::rstest;
use skypebus::testing::{MockBus, MockConnector};
use skypebus::{AttachConfig, Connection, SkypeError, attach_with};

async fn attached() -> (MockBus, Connection) {
    let bus = MockBus::new();
    let conn = attach_with(&MockConnector::new(bus.clone()), &AttachConfig::default())
        .await
        .unwrap();
    (bus, conn)
}

fn commands_after_handshake(bus: &MockBus) -> Vec<String> {
    bus.commands().into_iter().skip(2).collect()
}

#[tokio::test]
async fn test_set_name_sends_literal_command() {
    let (bus, conn) = attached().await;

    conn.set_name("x").await.unwrap();
    assert_eq!(commands_after_handshake(&bus), vec!["NAME x"]);
}

#[rstest]
#[case(7, "PROTOCOL 7")]
#[case(8, "PROTOCOL 8")]
#[case(-1, "PROTOCOL -1")]
#[tokio::test]
async fn test_set_protocol_sends_literal_command(#[case] id: i64, #[case] expected: &str) {
    let (bus, conn) = attached().await;

    conn.set_protocol(id).await.unwrap();
    assert_eq!(commands_after_handshake(&bus), vec![expected]);
}

#[tokio::test]
async fn test_repeated_handshake_is_idempotent() {
    let (bus, conn) = attached().await;

    conn.set_name("skype4go").await.unwrap();
    conn.set_protocol(7).await.unwrap();

    let commands = bus.commands();
    assert_eq!(commands[..2], commands[2..]);
}

#[tokio::test]
async fn test_invoke_returns_reply_text() {
    let (_bus, conn) = attached().await;

    let reply = conn.invoke("SEARCH FRIENDS").await.unwrap();
    assert_eq!(reply, "SEARCH FRIENDS");
}

#[tokio::test]
async fn test_service_error_surfaces_as_invoke_error() {
    let (bus, conn) = attached().await;
    bus.fail_invoke("SET", "ERROR 2 Unknown command");

    let err = conn.invoke("SET USERSTATUS FOO").await.unwrap_err();
    assert!(matches!(err, SkypeError::Invoke(_)));
    assert!(err.to_string().contains("ERROR 2"));
}
