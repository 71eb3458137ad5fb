//! Integration tests for the peer client against live sync servers.

use notepeer_client::{
    ClientConfig, ClientError, ConflictSession, ConnectionState, Decision, OfferView, PeerClient,
    PeerConnection,
};
use notepeer_protocol::{Message, ServerAddress, INVALID_FORMAT, NOTE_NOT_FOUND};
use notepeer_testkit::{RawPeer, SilentPeer, TestServer};
use std::time::Duration;

fn unreachable_address() -> ServerAddress {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    ServerAddress::new("127.0.0.1", port)
}

#[tokio::test]
async fn request_note_returns_registered_content() {
    let server = TestServer::start().await;
    server.registry().register("test", "hello");

    let client = PeerClient::default();
    let content = client.request_note(&server.address(), "test").await.unwrap();
    assert_eq!(content, "hello");
}

#[tokio::test]
async fn request_note_missing_returns_sentinel() {
    let server = TestServer::start().await;

    let client = PeerClient::default();
    let content = client
        .request_note(&server.address(), "never registered")
        .await
        .unwrap();
    assert_eq!(content, NOTE_NOT_FOUND);
}

#[tokio::test]
async fn request_note_unreachable_is_connection_error() {
    let client = PeerClient::new(ClientConfig::new().with_timeout(Duration::from_secs(5)));
    let err = client
        .request_note(&unreachable_address(), "test")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Connection(_)), "got {:?}", err);
}

#[tokio::test]
async fn secure_address_attempts_tls_handshake() {
    let server = TestServer::start().await;
    let addr = ServerAddress::parse(&format!("wss://{}", server.socket_addr())).unwrap();
    assert!(addr.secure);

    // A plain server cannot complete the TLS handshake, but the client must
    // get as far as trying.
    let err = PeerConnection::connect(&addr).await.unwrap_err();
    match err {
        ClientError::Connection(message) => {
            assert!(!message.contains("not compiled in"), "got {}", message)
        }
        other => panic!("expected a connection error, got {:?}", other),
    }
}

#[tokio::test]
async fn silent_peer_times_out() {
    let peer = SilentPeer::start().await;
    let client = PeerClient::new(ClientConfig::new().with_timeout(Duration::from_millis(200)));

    let err = client.request_note(&peer.address(), "test").await.unwrap_err();
    assert!(matches!(err, ClientError::Timeout(_)), "got {:?}", err);
}

#[tokio::test]
async fn register_list_delete_roundtrip() {
    let server = TestServer::start().await;
    let client = PeerClient::default();
    let addr = server.address();

    let ack = client.register_note(&addr, "Road trip", "- tent").await.unwrap();
    assert_eq!(ack, "Note 'Road trip' registered");
    client.register_note(&addr, "Groceries", "- milk").await.unwrap();

    let keys = client.list_keys(&addr).await.unwrap();
    assert_eq!(keys, vec!["Road trip", "Groceries"]);

    let ack = client.delete_note(&addr, "Road trip").await.unwrap();
    assert_eq!(ack, "Note 'Road trip' deleted");
    // Deleting again is still acknowledged.
    client.delete_note(&addr, "Road trip").await.unwrap();

    assert_eq!(client.list_keys(&addr).await.unwrap(), vec!["Groceries"]);
    assert_eq!(server.registry().get("Road trip"), None);
}

#[tokio::test]
async fn spawned_register_completes() {
    let server = TestServer::start().await;
    let client = PeerClient::default();

    let handle = client.spawn_register_note(server.address(), "bg".into(), "body".into());
    handle.await.unwrap().unwrap();
    assert_eq!(server.registry().get("bg"), Some("body".to_string()));
}

#[tokio::test]
async fn malformed_frame_keeps_connection_usable() {
    let server = TestServer::start().await;
    server.registry().register("test", "hello");
    let mut raw = RawPeer::connect(&server.address()).await;

    raw.send_text("this is not json").await;
    assert_eq!(raw.recv().await, Message::error(INVALID_FORMAT));

    raw.send_text(r#"{"type":"mystery","payload":{}}"#).await;
    assert_eq!(raw.recv().await, Message::error(INVALID_FORMAT));

    raw.send_binary(vec![0xde, 0xad]).await;
    assert_eq!(raw.recv().await, Message::error(INVALID_FORMAT));

    let reply = raw.request(&Message::note_request("test")).await;
    assert_eq!(reply, Message::note_content("hello"));
    raw.close().await;
}

#[tokio::test]
async fn server_answers_close_frame() {
    let server = TestServer::start().await;
    let mut raw = RawPeer::connect(&server.address()).await;
    assert_eq!(raw.request(&Message::ListKeys).await, Message::key_list(vec![]));

    assert!(raw.close_handshake().await);
}

#[tokio::test]
async fn list_keys_with_empty_payload_is_answered() {
    let server = TestServer::start().await;
    server.registry().register("a", "1");
    let mut raw = RawPeer::connect(&server.address()).await;

    raw.send_text(r#"{"type":"list-keys","payload":{}}"#).await;
    assert_eq!(raw.recv().await, Message::key_list(vec!["a".to_string()]));
    raw.close().await;
}

#[tokio::test]
async fn one_connection_serves_requests_in_order() {
    let server = TestServer::start().await;
    let mut connection = PeerConnection::connect(&server.address()).await.unwrap();
    assert_eq!(connection.state(), ConnectionState::Open);

    let ack = connection
        .request(&Message::register_note("k", "v1"))
        .await
        .unwrap();
    assert!(matches!(ack, Message::Ack(_)));
    connection
        .request(&Message::register_note("k", "v2"))
        .await
        .unwrap();
    let note = connection.request(&Message::note_request("k")).await.unwrap();
    assert_eq!(note, Message::note_content("v2"));

    connection.close().await;
    assert_eq!(connection.state(), ConnectionState::Closed);
    let err = connection.request(&Message::ListKeys).await.unwrap_err();
    assert!(matches!(err, ClientError::NotConnected));
}

#[tokio::test]
async fn server_shutdown_rejects_pending_connection() {
    let server = TestServer::start().await;
    let mut connection = PeerConnection::connect(&server.address()).await.unwrap();

    server.stop().await;

    let err = connection.request(&Message::ListKeys).await.unwrap_err();
    assert!(matches!(err, ClientError::Connection(_)), "got {:?}", err);
    assert_eq!(connection.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn push_overwrites_existing_sanitized_file() {
    let server = TestServer::start().await;
    std::fs::write(server.vault_dir().join("Weekly_Plan.md"), "old plan").unwrap();

    let client = PeerClient::default();
    let path = client
        .push_note(&server.address(), "Weekly Plan", "new plan")
        .await
        .unwrap();

    let expected = server.vault_dir().join("Weekly_Plan.md");
    assert_eq!(path, expected.display().to_string());
    assert_eq!(std::fs::read_to_string(&expected).unwrap(), "new plan");
    assert_eq!(server.vault_files(), vec!["Weekly_Plan.md"]);
    assert_eq!(
        server.registry().get("Weekly Plan"),
        Some("new plan".to_string())
    );
}

#[tokio::test]
async fn push_creates_first_candidate() {
    let server = TestServer::start().await;

    let client = PeerClient::default();
    client
        .push_note(&server.address(), "Fresh idea", "body")
        .await
        .unwrap();

    assert_eq!(server.vault_files(), vec!["Fresh idea.md"]);
}

#[tokio::test]
async fn push_failure_is_request_failed() {
    let server = TestServer::start().await;
    let client = PeerClient::default();

    // A key whose only candidate lives in a folder that does not exist.
    let err = client
        .push_note(&server.address(), "missing/folder", "body")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::RequestFailed(_)), "got {:?}", err);
    assert_eq!(
        server.registry().get("missing/folder"),
        Some("body".to_string())
    );
}

#[tokio::test]
async fn concurrent_registers_leave_one_winner() {
    let server = TestServer::start().await;
    let client = PeerClient::default();
    let addr = server.address();

    let (a, b) = tokio::join!(
        client.register_note(&addr, "race", "from a"),
        client.register_note(&addr, "race", "from b"),
    );
    a.unwrap();
    b.unwrap();

    // Whichever handler ran last wins; send order is not guaranteed.
    let value = server.registry().get("race").unwrap();
    assert!(value == "from a" || value == "from b", "got {:?}", value);
    assert_eq!(server.registry().len(), 1);
}

#[tokio::test]
async fn independent_servers_do_not_share_registries() {
    let first = TestServer::start().await;
    let second = TestServer::start().await;
    let client = PeerClient::default();

    client
        .register_note(&first.address(), "only here", "x")
        .await
        .unwrap();

    assert_eq!(
        client.request_note(&second.address(), "only here").await.unwrap(),
        NOTE_NOT_FOUND
    );
}

#[tokio::test]
async fn conflict_session_gathers_and_commits() {
    let local = TestServer::start().await;
    let peer_b = TestServer::start().await;
    let peer_c = TestServer::start().await;
    let peer_same = TestServer::start().await;
    let peer_empty = TestServer::start().await;

    local.registry().register("plan", "A");
    peer_b.registry().register("plan", "B");
    peer_c.registry().register("plan", "C");
    peer_same.registry().register("plan", "A");

    let client = PeerClient::new(ClientConfig::new().with_timeout(Duration::from_secs(5)));
    let peers = vec![
        peer_b.address(),
        peer_empty.address(),
        peer_same.address(),
        unreachable_address(),
        peer_c.address(),
    ];

    let session = ConflictSession::gather(&client, &local.address(), &peers, "plan")
        .await
        .unwrap();

    let offers: Vec<_> = session
        .offers()
        .offers()
        .iter()
        .map(|o| o.content.as_str())
        .collect();
    assert_eq!(offers, vec!["B", "C"]);
    assert_eq!(session.skipped_peers().len(), 2);

    let resolution = session.resolve(&mut |view: &OfferView<'_>| {
        if view.offer.content == "B" {
            Decision::Accept
        } else {
            Decision::Skip
        }
    });
    assert_eq!(resolution.content, "B");

    let written = ConflictSession::commit(&client, &local.address(), &resolution)
        .await
        .unwrap();
    assert!(written);
    assert_eq!(local.registry().get("plan"), Some("B".to_string()));
}

#[tokio::test]
async fn conflict_session_unchanged_is_not_committed() {
    let local = TestServer::start().await;
    let peer = TestServer::start().await;
    local.registry().register("plan", "A");
    peer.registry().register("plan", "B");

    let client = PeerClient::default();
    let session = ConflictSession::gather(&client, &local.address(), &[peer.address()], "plan")
        .await
        .unwrap();
    let resolution = session.offers().resolve_with(&[Decision::Skip]);

    let written = ConflictSession::commit(&client, &local.address(), &resolution)
        .await
        .unwrap();
    assert!(!written);
    assert_eq!(local.registry().get("plan"), Some("A".to_string()));
}

#[tokio::test]
async fn conflict_session_starts_empty_when_local_lacks_note() {
    let local = TestServer::start().await;
    let peer = TestServer::start().await;
    peer.registry().register("new note", "from peer");

    let client = PeerClient::default();
    let session =
        ConflictSession::gather(&client, &local.address(), &[peer.address()], "new note")
            .await
            .unwrap();

    assert_eq!(session.offers().current(), "");
    let resolution = session.offers().resolve_with(&[Decision::Accept]);
    assert_eq!(resolution.content, "from peer");
}
