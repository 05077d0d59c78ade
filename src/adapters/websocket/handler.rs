//! WebSocket upgrade handler for realtime subscriptions.
//!
//! Connection lifecycle:
//! 1. Upgrade to WebSocket and announce the client id
//! 2. Join/leave channel rooms on `subscribe`/`unsubscribe`
//! 3. Forward room deliveries until disconnect
//! 4. Leave every room on disconnect

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::realtime::Channel;

use super::{
    messages::{
        ChannelDeliveryMessage, ClientMessage, ConnectedMessage, ErrorMessage, PongMessage,
        ServerMessage, SubscriptionMessage,
    },
    rooms::{ClientId, Delivery, RoomManager},
};

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    /// Room manager for channel-based routing.
    pub room_manager: Arc<RoomManager>,

    /// Per-connection outbound queue size.
    pub outbound_capacity: usize,
}

impl WebSocketState {
    /// Create a new WebSocket state.
    pub fn new(room_manager: Arc<RoomManager>, outbound_capacity: usize) -> Self {
        Self {
            room_manager,
            outbound_capacity: outbound_capacity.max(1),
        }
    }
}

/// Router exposing the realtime socket at `GET /realtime`.
pub fn websocket_router(state: WebSocketState) -> Router {
    Router::new()
        .route("/realtime", get(ws_handler))
        .with_state(state)
}

/// Handle WebSocket upgrade requests.
///
/// Authentication and channel access checks belong to the identity layer
/// in front of this handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<WebSocketState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an established WebSocket connection.
async fn handle_socket(socket: WebSocket, state: WebSocketState) {
    let (sink, mut receiver) = socket.split();
    let client_id = ClientId::new();
    let (outbound, outbound_rx) = mpsc::channel::<ServerMessage>(state.outbound_capacity);

    let mut send_task = tokio::spawn(write_outbound(sink, outbound_rx, client_id.clone()));

    let connected = ServerMessage::Connected(ConnectedMessage {
        client_id: client_id.to_string(),
        timestamp: Timestamp::now().to_rfc3339(),
    });
    if outbound.send(connected).await.is_err() {
        return;
    }
    tracing::debug!(client_id = %client_id, "Realtime client connected");

    let mut forwarders: HashMap<Channel, JoinHandle<()>> = HashMap::new();

    loop {
        tokio::select! {
            _ = &mut send_task => break,
            next = receiver.next() => {
                let text = match next {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        tracing::debug!(client_id = %client_id, "Receive error: {}", e);
                        break;
                    }
                };

                let reply = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Subscribe { channel }) => {
                        subscribe(&state, &client_id, &channel, &outbound, &mut forwarders).await
                    }
                    Ok(ClientMessage::Unsubscribe { channel }) => {
                        unsubscribe(&state, &client_id, &channel, &mut forwarders).await
                    }
                    Ok(ClientMessage::Ping) => ServerMessage::Pong(PongMessage {
                        timestamp: Timestamp::now().to_rfc3339(),
                    }),
                    Err(e) => error_message("INVALID_MESSAGE", e.to_string()),
                };

                if outbound.send(reply).await.is_err() {
                    break;
                }
            }
        }
    }

    for (_, forwarder) in forwarders.drain() {
        forwarder.abort();
        // Wait for the receiver to drop so the room can be released.
        let _ = forwarder.await;
    }
    state.room_manager.leave_all(&client_id).await;
    send_task.abort();
    tracing::debug!(client_id = %client_id, "Realtime client disconnected");
}

async fn subscribe(
    state: &WebSocketState,
    client_id: &ClientId,
    raw: &str,
    outbound: &mpsc::Sender<ServerMessage>,
    forwarders: &mut HashMap<Channel, JoinHandle<()>>,
) -> ServerMessage {
    let channel: Channel = match raw.parse() {
        Ok(channel) => channel,
        Err(e) => return domain_error(e),
    };

    if !forwarders.contains_key(&channel) {
        let room_rx = state.room_manager.join(&channel, client_id.clone()).await;
        let forwarder = tokio::spawn(forward_room(room_rx, outbound.clone(), client_id.clone()));
        forwarders.insert(channel.clone(), forwarder);
        tracing::debug!(client_id = %client_id, channel = %channel, "Subscribed");
    }

    ServerMessage::Subscribed(SubscriptionMessage { channel })
}

async fn unsubscribe(
    state: &WebSocketState,
    client_id: &ClientId,
    raw: &str,
    forwarders: &mut HashMap<Channel, JoinHandle<()>>,
) -> ServerMessage {
    let channel: Channel = match raw.parse() {
        Ok(channel) => channel,
        Err(e) => return domain_error(e),
    };

    if let Some(forwarder) = forwarders.remove(&channel) {
        forwarder.abort();
        let _ = forwarder.await;
        state.room_manager.leave(&channel, client_id).await;
        tracing::debug!(client_id = %client_id, channel = %channel, "Unsubscribed");
    }

    ServerMessage::Unsubscribed(SubscriptionMessage { channel })
}

/// Copies room deliveries into the connection's outbound queue.
async fn forward_room(
    mut room_rx: broadcast::Receiver<Delivery>,
    outbound: mpsc::Sender<ServerMessage>,
    client_id: ClientId,
) {
    loop {
        match room_rx.recv().await {
            Ok(delivery) => {
                let msg = ServerMessage::Message(ChannelDeliveryMessage {
                    channel: delivery.channel,
                    data: delivery.message,
                });
                if outbound.send(msg).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(client_id = %client_id, skipped, "Client lagging, messages dropped");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn write_outbound(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbound_rx: mpsc::Receiver<ServerMessage>,
    client_id: ClientId,
) {
    while let Some(msg) = outbound_rx.recv().await {
        let text = match serde_json::to_string(&msg) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(client_id = %client_id, "Failed to encode server message: {}", e);
                continue;
            }
        };
        if let Err(e) = sink.send(Message::Text(text)).await {
            tracing::debug!(client_id = %client_id, "Send error, closing connection: {}", e);
            break;
        }
    }
}

fn domain_error(e: DomainError) -> ServerMessage {
    error_message(&e.code.to_string(), e.message)
}

fn error_message(code: &str, message: String) -> ServerMessage {
    ServerMessage::Error(ErrorMessage {
        code: code.to_string(),
        message,
        timestamp: Timestamp::now().to_rfc3339(),
    })
}
