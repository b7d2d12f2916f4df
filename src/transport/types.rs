use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where an outbound message goes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Channel {
    /// Direct message to a single user
    Direct(String),
    /// A shared channel, e.g. the public events channel
    Public(String),
}

/// Opaque reference to a message the transport has delivered
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageHandle(pub String);

impl MessageHandle {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlAction {
    Join,
    Leave,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlButton {
    pub action: ControlAction,
    pub label: String,
}

/// Interactive controls rendered underneath a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSurface {
    pub control_id: String,
    pub buttons: Vec<ControlButton>,
}

impl ControlSurface {
    /// The join/leave pair attached to a published event
    pub fn rsvp(control_id: impl Into<String>) -> Self {
        Self {
            control_id: control_id.into(),
            buttons: vec![
                ControlButton {
                    action: ControlAction::Join,
                    label: "Join event".to_string(),
                },
                ControlButton {
                    action: ControlAction::Leave,
                    label: "Leave event".to_string(),
                },
            ],
        }
    }
}

/// The message a reply points at, as resolved by the transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorMessage {
    pub text: String,
    /// Whether the bot itself authored the message being replied to
    pub authored_by_self: bool,
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
}

/// An inbound chat message handed over by the transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub text: String,
    pub sender_id: String,
    /// Set when the platform marks this message as a reply to another one
    #[serde(default)]
    pub reply_to: Option<AnchorMessage>,
}

impl InboundMessage {
    /// The message this one structurally replies to, if any
    pub fn anchor(&self) -> Option<&AnchorMessage> {
        self.reply_to.as_ref()
    }
}
