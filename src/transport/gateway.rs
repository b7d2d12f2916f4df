use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::chat::ChatTransport;
use super::types::{Channel, ControlSurface, MessageHandle};
use crate::shared::{AppError, AppState};

/// Frames pushed to the chat gateway over the websocket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatewayFrame {
    Send {
        handle: MessageHandle,
        channel: Channel,
        content: String,
    },
    RenderInteractive {
        handle: MessageHandle,
        channel: Channel,
        content: String,
        control: ControlSurface,
    },
    UpdateRendered {
        handle: MessageHandle,
        content: String,
    },
}

/// Transport that hands every outbound message to connected gateways
///
/// The chat gateway (the process holding the platform connection) subscribes
/// via `GET /gateway` and performs the actual platform calls. Handles are
/// assigned here so the core can refer to rendered messages before the
/// platform has acknowledged them.
#[derive(Debug, Clone)]
pub struct GatewayTransport {
    sender: broadcast::Sender<GatewayFrame>,
}

impl Default for GatewayTransport {
    fn default() -> Self {
        Self::new(256)
    }
}

impl GatewayTransport {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GatewayFrame> {
        self.sender.subscribe()
    }

    fn publish(&self, frame: GatewayFrame) {
        match self.sender.send(frame) {
            Ok(receivers) => debug!(receivers = receivers, "Gateway frame published"),
            Err(_) => warn!("Gateway frame dropped, no gateway connected"),
        }
    }
}

#[async_trait]
impl ChatTransport for GatewayTransport {
    async fn send(&self, channel: &Channel, content: &str) -> Result<MessageHandle, AppError> {
        let handle = MessageHandle::generate();
        self.publish(GatewayFrame::Send {
            handle: handle.clone(),
            channel: channel.clone(),
            content: content.to_string(),
        });
        Ok(handle)
    }

    async fn render_interactive(
        &self,
        channel: &Channel,
        content: &str,
        control: &ControlSurface,
    ) -> Result<MessageHandle, AppError> {
        let handle = MessageHandle::generate();
        self.publish(GatewayFrame::RenderInteractive {
            handle: handle.clone(),
            channel: channel.clone(),
            content: content.to_string(),
            control: control.clone(),
        });
        Ok(handle)
    }

    async fn update_rendered(&self, handle: &MessageHandle, content: &str) -> Result<(), AppError> {
        self.publish(GatewayFrame::UpdateRendered {
            handle: handle.clone(),
            content: content.to_string(),
        });
        Ok(())
    }
}

/// WebSocket endpoint the chat gateway connects to
/// GET /gateway
pub async fn gateway_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    info!("Chat gateway connection requested");
    let frames = state.gateway.subscribe();
    ws.on_upgrade(move |socket| forward_frames(socket, frames))
}

async fn forward_frames(mut socket: WebSocket, mut frames: broadcast::Receiver<GatewayFrame>) {
    loop {
        tokio::select! {
            frame = frames.recv() => {
                match frame {
                    Ok(frame) => {
                        let text = match serde_json::to_string(&frame) {
                            Ok(text) => text,
                            Err(e) => {
                                warn!(error = %e, "Failed to serialize gateway frame");
                                continue;
                            }
                        };
                        if socket.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped = skipped, "Chat gateway lagging, frames skipped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        warn!(error = %e, "Chat gateway socket error");
                        break;
                    }
                    Some(Ok(_)) => {} // inbound traffic arrives over HTTP
                }
            }
        }
    }

    let _ = socket.send(Message::Close(None)).await;
    info!("Chat gateway disconnected");
}
