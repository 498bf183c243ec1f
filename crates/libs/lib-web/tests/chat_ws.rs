//! End-to-end chat over a real WebSocket connection.

use futures_util::{SinkExt, StreamExt};
use lib_core::Config;
use lib_web::chat::ChatHub;
use lib_web::{create_router, AppState, ServerConfig};
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const REPLY_DELAY_MS: u64 = 50;
const WAIT: Duration = Duration::from_secs(5);

async fn spawn_server() -> (SocketAddr, Arc<ChatHub>) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let config = Config {
        responder_delay_ms: REPLY_DELAY_MS,
        ..Config::default()
    };
    let state = AppState::new(pool, config);
    let hub = Arc::clone(&state.chat);
    let app = create_router(state, &ServerConfig::default().allowed_origins);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .unwrap();
    });

    (addr, hub)
}

async fn connect(addr: SocketAddr) -> Client {
    let (client, _) = connect_async(format!("ws://{addr}/api/ws/chat")).await.unwrap();
    client
}

async fn send(client: &mut Client, content: &str) {
    let frame = serde_json::json!({ "content": content }).to_string();
    client.send(Message::text(frame)).await.unwrap();
}

/// Next chat message, skipping control frames.
async fn recv(client: &mut Client) -> Value {
    let next = async {
        loop {
            match client.next().await {
                Some(Ok(Message::Text(text))) => return serde_json::from_str(text.as_str()).unwrap(),
                Some(Ok(_)) => continue,
                other => panic!("connection ended: {other:?}"),
            }
        }
    };
    tokio::time::timeout(WAIT, next).await.expect("timed out waiting for a message")
}

#[tokio::test]
async fn test_hello_round_trip() {
    let (addr, _hub) = spawn_server().await;
    let mut client = connect(addr).await;

    let welcome = recv(&mut client).await;
    assert_eq!(welcome["sender"], "AI Assistant");
    assert_eq!(welcome["isSynthetic"], true);

    send(&mut client, "Hello").await;

    let echoed = recv(&mut client).await;
    assert_eq!(echoed["content"], "Hello");
    assert_eq!(echoed["isSynthetic"], false);
    assert!(echoed["sender"].as_str().unwrap().starts_with("Guest"));

    let reply = recv(&mut client).await;
    assert_eq!(reply["isSynthetic"], true);
    assert!(reply["content"].as_str().unwrap().contains("\"Hello\""));
    assert!(reply["id"].as_u64() > echoed["id"].as_u64());
}

#[tokio::test]
async fn test_invalid_frames_are_skipped() {
    let (addr, _hub) = spawn_server().await;
    let mut client = connect(addr).await;
    recv(&mut client).await;

    client.send(Message::text("not json")).await.unwrap();
    send(&mut client, "   ").await;
    send(&mut client, "").await;
    send(&mut client, "still here").await;

    let echoed = recv(&mut client).await;
    assert_eq!(echoed["content"], "still here");
}

#[tokio::test]
async fn test_reply_only_reaches_the_sender() {
    let (addr, _hub) = spawn_server().await;
    let mut alice = connect(addr).await;
    recv(&mut alice).await;
    let mut bob = connect(addr).await;
    recv(&mut bob).await;

    send(&mut alice, "hi").await;

    assert_eq!(recv(&mut alice).await["content"], "hi");
    assert_eq!(recv(&mut bob).await["content"], "hi");
    assert_eq!(recv(&mut alice).await["isSynthetic"], true);

    let extra = tokio::time::timeout(Duration::from_millis(REPLY_DELAY_MS * 6), bob.next()).await;
    assert!(extra.is_err(), "bob should not receive alice's reply");
}

#[tokio::test]
async fn test_disconnect_deregisters_participant() {
    let (addr, hub) = spawn_server().await;
    let mut client = connect(addr).await;
    recv(&mut client).await;
    assert_eq!(hub.registry().len().await, 1);

    client.close(None).await.unwrap();

    tokio::time::timeout(WAIT, async {
        while !hub.registry().is_empty().await {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("participant should be removed after disconnect");
}

#[tokio::test]
async fn test_shutdown_closes_connections() {
    let (addr, hub) = spawn_server().await;
    let mut client = connect(addr).await;
    recv(&mut client).await;

    hub.shutdown();

    let closed = tokio::time::timeout(WAIT, async {
        loop {
            match client.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok());
    assert!(hub.registry().is_empty().await);
}
