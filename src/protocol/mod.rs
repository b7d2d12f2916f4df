// Public API - what other modules can use
pub use handlers::{create_event, delete_event, inbound_reply, list_events, recreate_event};
pub use service::{ReplyOutcome, SubmissionService, SubmissionSettings};
pub use types::{CreateEventRequest, DeleteEventRequest, EventResponse};

// Internal modules
pub mod anchor;
mod handlers;
mod service;
mod types;
