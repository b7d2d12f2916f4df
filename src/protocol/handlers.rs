use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{info, instrument};

use super::{
    service::ReplyOutcome,
    types::{CreateEventRequest, DeleteEventRequest, EventResponse},
};
use crate::shared::{AppError, AppState};
use crate::transport::InboundMessage;

/// HTTP handler for creating a new event draft
///
/// POST /events
/// The organizer receives the new-event anchor as a direct message
#[instrument(name = "create_event", skip(state))]
pub async fn create_event(
    State(state): State<AppState>,
    Json(request): Json<CreateEventRequest>,
) -> Result<Json<EventResponse>, AppError> {
    let event = state
        .submissions
        .on_create(&request.organizer_id, &request.name, &request.link)
        .await?;

    Ok(Json(event.into()))
}

/// HTTP handler for re-creating an event with a new link
///
/// PUT /events
#[instrument(name = "recreate_event", skip(state))]
pub async fn recreate_event(
    State(state): State<AppState>,
    Json(request): Json<CreateEventRequest>,
) -> Result<Json<EventResponse>, AppError> {
    let event = state
        .submissions
        .on_recreate(&request.organizer_id, &request.name, &request.link)
        .await?;

    Ok(Json(event.into()))
}

/// DELETE /events
#[instrument(name = "delete_event", skip(state))]
pub async fn delete_event(
    State(state): State<AppState>,
    Json(request): Json<DeleteEventRequest>,
) -> Result<Json<EventResponse>, AppError> {
    let event = state
        .submissions
        .on_delete(&request.organizer_id, &request.name)
        .await?;

    Ok(Json(event.into()))
}

/// HTTP handler for listing an organizer's events
///
/// GET /organizers/:organizer_id/events
#[instrument(name = "list_events", skip(state))]
pub async fn list_events(
    State(state): State<AppState>,
    Path(organizer_id): Path<String>,
) -> Result<Json<Vec<EventResponse>>, AppError> {
    let events = state.submissions.list_events(&organizer_id).await?;

    info!(event_count = events.len(), "Events listed");

    Ok(Json(events.into_iter().map(EventResponse::from).collect()))
}

/// HTTP handler for messages forwarded by the chat gateway
///
/// POST /replies
/// Messages that are not replies to a bot anchor come back as `ignored`
#[instrument(name = "inbound_reply", skip(state, message))]
pub async fn inbound_reply(
    State(state): State<AppState>,
    Json(message): Json<InboundMessage>,
) -> Result<Json<ReplyOutcome>, AppError> {
    let outcome = state.submissions.on_inbound_reply(&message).await?;
    Ok(Json(outcome))
}
