use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Lifecycle of an event; only ever moves forward
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventState {
    InProgress,
    Submitted,
}

/// Identity of an event within the store: names are unique per organizer
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventKey {
    pub organizer_id: String,
    pub name: String,
}

/// Persisted event record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub link: String,
    pub organizer_id: String,
    pub state: EventState,
    pub description: Option<String>,
    pub image_link: Option<String>,
}

impl Event {
    /// Creates a fresh in-progress event with a generated ID
    pub fn new(
        organizer_id: impl Into<String>,
        name: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            link: link.into(),
            organizer_id: organizer_id.into(),
            state: EventState::InProgress,
            description: None,
            image_link: None,
        }
    }

    pub fn key(&self) -> EventKey {
        EventKey {
            organizer_id: self.organizer_id.clone(),
            name: self.name.clone(),
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.state == EventState::Submitted
    }
}

/// Public rendering of an event. The first line is always the bold-italic name.
impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "***{}***", self.name)?;
        if let Some(description) = self.description.as_deref().filter(|d| !d.is_empty()) {
            writeln!(f, "{}", description)?;
        }
        writeln!(f)?;
        if let Some(image_link) = self.image_link.as_deref().filter(|l| !l.is_empty()) {
            writeln!(f, "Image: {}", image_link)?;
        }
        write!(f, "Link: {}", self.link)
    }
}
