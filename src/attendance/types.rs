use serde::{Deserialize, Serialize};

use super::tracker::RsvpOutcome;

/// Request payload for a join or leave press
#[derive(Debug, Deserialize)]
pub struct RsvpRequest {
    pub member_id: String,
}

/// Response for a join or leave press
#[derive(Debug, Serialize, Deserialize)]
pub struct RsvpResponse {
    pub control_id: String,
    pub status: String,
    pub attendees: usize,
    /// Text to show the member, ephemerally where the platform supports it
    pub notice: String,
}

impl RsvpResponse {
    pub fn new(control_id: impl Into<String>, outcome: &RsvpOutcome) -> Self {
        let status = match outcome {
            RsvpOutcome::Joined { .. } => "joined",
            RsvpOutcome::AlreadyJoined { .. } => "already_joined",
            RsvpOutcome::Left { .. } => "left",
            RsvpOutcome::NotSignedUp { .. } => "not_signed_up",
        };
        Self {
            control_id: control_id.into(),
            status: status.to_string(),
            attendees: outcome.attendees(),
            notice: outcome.notice().to_string(),
        }
    }
}
