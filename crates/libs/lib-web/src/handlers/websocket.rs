//! # WebSocket Handlers
//!
//! Real-time chat transport.
//!
//! ## Endpoints
//!
//! - `GET /api/ws/chat` - WebSocket connection for the chat room
//!
//! Each connection becomes one chat [`Session`]. Text frames from the client
//! are `{"content": "..."}`; every frame sent back is a serialized
//! [`ChatMessage`](lib_core::dto::ChatMessage).

use crate::chat::{ChatHub, InboundStream, MessageChannel, Outbox, QueuedChannel, Session};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::response::Response;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use lib_core::dto::{InboundMessage, ParticipantId};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// WebSocket handler for the chat room.
///
/// **Route**: `GET /api/ws/chat`
///
/// # Example
///
/// ```javascript
/// const ws = new WebSocket('ws://localhost:3001/api/ws/chat');
/// ws.onmessage = (event) => {
///   const msg = JSON.parse(event.data);
///   console.log(`${msg.sender}: ${msg.content}`);
/// };
/// ws.send(JSON.stringify({ content: 'Hello' }));
/// ```
pub async fn chat_websocket(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(hub): State<Arc<ChatHub>>,
) -> Response {
    let client_ip = headers
        .get("x-forwarded-for")
        .or_else(|| headers.get("x-real-ip"))
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| addr.ip().to_string());

    debug!(client_ip = %client_ip, path = "/api/ws/chat", "[WS] CONNECT_ATTEMPT");

    ws.on_upgrade(move |socket| handle_chat_socket(socket, hub, client_ip))
}

async fn handle_chat_socket(socket: WebSocket, hub: Arc<ChatHub>, client_ip: String) {
    let connection_start = Instant::now();
    let (mut sink, stream) = socket.split();
    let (channel, outbox) = QueuedChannel::new();

    let session = match Session::connect(hub, Arc::clone(&channel) as Arc<dyn MessageChannel>).await {
        Ok(session) => session,
        Err(e) => {
            warn!(client_ip = %client_ip, error = %e, "[WS] SESSION_REJECTED");
            let _ = sink.send(Message::Close(None)).await;
            return;
        }
    };

    let participant_id = session.id();
    info!(
        participant_id = %participant_id,
        display_name = %session.participant().display_name,
        client_ip = %client_ip,
        "[WS] CONNECTED"
    );

    let (writer_done_tx, writer_done_rx) = oneshot::channel::<()>();
    let send_task = tokio::spawn(async move {
        let sent = write_outbox(sink, outbox, participant_id).await;
        drop(writer_done_tx);
        sent
    });

    // A dead writer ends the session as well.
    let inbound = inbound_messages(stream, participant_id).take_until(writer_done_rx);
    let stats = match tokio::spawn(session.run(inbound)).await {
        Ok(stats) => stats,
        Err(e) => {
            error!(participant_id = %participant_id, error = ?e, "[WS] SESSION_TASK_ERROR");
            channel.close();
            Default::default()
        }
    };

    let frames_sent = send_task.await.unwrap_or_else(|e| {
        error!(participant_id = %participant_id, error = ?e, "[WS] SEND_TASK_ERROR");
        0
    });

    let duration = connection_start.elapsed();
    info!(
        participant_id = %participant_id,
        client_ip = %client_ip,
        duration_ms = duration.as_millis() as u64,
        frames_sent,
        messages_received = stats.messages_received,
        messages_rejected = stats.messages_rejected,
        replies_delivered = stats.replies_delivered,
        "[WS] DISCONNECTED"
    );
}

/// Drain the session's outbox into the socket. Returns the number of frames sent.
async fn write_outbox(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbox: Outbox,
    participant_id: ParticipantId,
) -> u64 {
    let mut sent = 0;

    while let Some(message) = outbox.recv().await {
        let json = match serde_json::to_string(&message) {
            Ok(json) => json,
            Err(e) => {
                error!(participant_id = %participant_id, error = %e, "[WS] SERIALIZE_ERROR");
                continue;
            }
        };

        if let Err(e) = sink.send(Message::Text(json.into())).await {
            warn!(participant_id = %participant_id, error = %e, messages_sent = sent, "[WS] SEND_ERROR");
            return sent;
        }
        sent += 1;
    }

    // Outbox ended: the session closed the channel.
    let _ = sink.send(Message::Close(None)).await;
    sent
}

/// Parse client frames into inbound messages.
///
/// Malformed text and binary frames are logged and skipped. The stream ends on
/// a close frame or a transport error.
fn inbound_messages(stream: SplitStream<WebSocket>, participant_id: ParticipantId) -> impl InboundStream {
    Box::pin(futures_util::stream::unfold(stream, move |mut stream| async move {
        loop {
            match stream.next().await? {
                Ok(Message::Text(text)) => match serde_json::from_str::<InboundMessage>(text.as_str()) {
                    Ok(message) => return Some((message, stream)),
                    Err(e) => {
                        warn!(
                            participant_id = %participant_id,
                            error = %e,
                            size = text.len(),
                            "[WS] MALFORMED_FRAME"
                        );
                    }
                },
                Ok(Message::Binary(data)) => {
                    warn!(participant_id = %participant_id, size = data.len(), "[WS] BINARY_IGNORED");
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                    debug!(participant_id = %participant_id, "[WS] PING_PONG");
                }
                Ok(Message::Close(frame)) => {
                    let code = frame.as_ref().map(|f| f.code);
                    info!(participant_id = %participant_id, code = ?code, "[WS] CLOSE_RECEIVED");
                    return None;
                }
                Err(e) => {
                    warn!(participant_id = %participant_id, error = %e, "[WS] RECV_ERROR");
                    return None;
                }
            }
        }
    }))
}
