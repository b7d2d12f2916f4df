use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::shared::AppError;
use crate::transport::{ChatTransport, MessageHandle};

/// Result of a join or leave press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsvpOutcome {
    Joined { attendees: usize },
    AlreadyJoined { attendees: usize },
    Left { attendees: usize },
    NotSignedUp { attendees: usize },
}

impl RsvpOutcome {
    /// Text shown to the member who pressed the button
    pub fn notice(&self) -> &'static str {
        match self {
            RsvpOutcome::Joined { .. } => "You joined the event!",
            RsvpOutcome::AlreadyJoined { .. } => "You have already joined this event.",
            RsvpOutcome::Left { .. } => "You left the event.",
            RsvpOutcome::NotSignedUp { .. } => "You are not signed up for this event.",
        }
    }

    pub fn attendees(&self) -> usize {
        match self {
            RsvpOutcome::Joined { attendees }
            | RsvpOutcome::AlreadyJoined { attendees }
            | RsvpOutcome::Left { attendees }
            | RsvpOutcome::NotSignedUp { attendees } => *attendees,
        }
    }
}

/// Attendee list behind one published event post
///
/// Join and leave are check-then-mutate under the tracker's own lock, and the
/// post is re-rendered before the lock is released, so the last rendered count
/// always matches the list.
pub struct AttendanceTracker {
    control_id: String,
    event_name: String,
    handle: MessageHandle,
    base_content: String,
    opened_at: DateTime<Utc>,
    attendees: Mutex<Vec<String>>,
    transport: Arc<dyn ChatTransport>,
}

impl AttendanceTracker {
    pub fn new(
        control_id: impl Into<String>,
        event_name: impl Into<String>,
        handle: MessageHandle,
        base_content: impl Into<String>,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        Self {
            control_id: control_id.into(),
            event_name: event_name.into(),
            handle,
            base_content: base_content.into(),
            opened_at: Utc::now(),
            attendees: Mutex::new(Vec::new()),
            transport,
        }
    }

    pub fn control_id(&self) -> &str {
        &self.control_id
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    pub fn handle(&self) -> &MessageHandle {
        &self.handle
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// Snapshot of the attendee list in join order
    pub async fn attendees(&self) -> Vec<String> {
        self.attendees.lock().await.clone()
    }

    #[instrument(skip(self), fields(control_id = %self.control_id))]
    pub async fn join(&self, member_id: &str) -> Result<RsvpOutcome, AppError> {
        let mut attendees = self.attendees.lock().await;

        if attendees.iter().any(|m| m == member_id) {
            debug!(member_id = %member_id, "Member already joined");
            return Ok(RsvpOutcome::AlreadyJoined {
                attendees: attendees.len(),
            });
        }

        attendees.push(member_id.to_string());
        self.rerender(&attendees).await;

        debug!(member_id = %member_id, attendees = attendees.len(), "Member joined");
        Ok(RsvpOutcome::Joined {
            attendees: attendees.len(),
        })
    }

    #[instrument(skip(self), fields(control_id = %self.control_id))]
    pub async fn leave(&self, member_id: &str) -> Result<RsvpOutcome, AppError> {
        let mut attendees = self.attendees.lock().await;

        let Some(position) = attendees.iter().position(|m| m == member_id) else {
            debug!(member_id = %member_id, "Member was not signed up");
            return Ok(RsvpOutcome::NotSignedUp {
                attendees: attendees.len(),
            });
        };

        attendees.remove(position);
        self.rerender(&attendees).await;

        debug!(member_id = %member_id, attendees = attendees.len(), "Member left");
        Ok(RsvpOutcome::Left {
            attendees: attendees.len(),
        })
    }

    /// A failed re-render leaves the list as updated; the next change repaints it
    async fn rerender(&self, attendees: &[String]) {
        let content = render(&self.base_content, attendees);
        if let Err(e) = self.transport.update_rendered(&self.handle, &content).await {
            warn!(
                control_id = %self.control_id,
                error = %e,
                "Failed to re-render attendance"
            );
        }
    }
}

/// Event post body followed by the attendee count and list
pub fn render(base_content: &str, attendees: &[String]) -> String {
    if attendees.is_empty() {
        return format!("{base_content}\n\nAttending: 0");
    }
    format!(
        "{base_content}\n\nAttending: {}\n{}",
        attendees.len(),
        attendees.join(", ")
    )
}
