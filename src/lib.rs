// Library crate for the event bot
// This file exposes the public API for the binary and integration tests

pub mod attendance;
pub mod config;
pub mod events;
pub mod protocol;
pub mod shared;
pub mod transport;

use axum::{
    routing::{get, post},
    Router,
};

// Re-export commonly used types for easier access in tests
pub use attendance::{AttendanceRegistry, AttendanceTracker, RsvpOutcome};
pub use config::{BotConfig, ConfigError};
pub use events::{Event, EventManager, EventState, EventStore, JsonFileEventStore};
pub use protocol::{ReplyOutcome, SubmissionService};
pub use shared::{AppError, AppState};
pub use transport::{ChatTransport, GatewayTransport, InboundMessage};

/// Every HTTP and websocket route the bot serves
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/events",
            post(protocol::create_event)
                .put(protocol::recreate_event)
                .delete(protocol::delete_event),
        )
        .route(
            "/organizers/:organizer_id/events",
            get(protocol::list_events),
        )
        .route("/replies", post(protocol::inbound_reply))
        .route("/controls/:control_id/join", post(attendance::join_event))
        .route("/controls/:control_id/leave", post(attendance::leave_event))
        .route("/gateway", get(transport::gateway_handler))
        .with_state(state)
}
