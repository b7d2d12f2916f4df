use serde::{Deserialize, Serialize};

use crate::events::Event;

/// Request payload for creating (or re-creating) an event
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub organizer_id: String,
    pub name: String,
    pub link: String,
}

/// Request payload for deleting an event
#[derive(Debug, Deserialize)]
pub struct DeleteEventRequest {
    pub organizer_id: String,
    pub name: String,
}

/// Event information returned by the HTTP surface
#[derive(Debug, Serialize, Deserialize)]
pub struct EventResponse {
    pub id: String,
    pub name: String,
    pub link: String,
    pub organizer_id: String,
    pub state: String,
    pub description: Option<String>,
    pub image_link: Option<String>,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        Self {
            id: event.id.to_string(),
            state: event.state.to_string(),
            name: event.name,
            link: event.link,
            organizer_id: event.organizer_id,
            description: event.description,
            image_link: event.image_link,
        }
    }
}
