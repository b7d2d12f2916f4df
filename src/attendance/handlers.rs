use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{info, instrument};

use super::types::{RsvpRequest, RsvpResponse};
use crate::shared::{AppError, AppState};

/// HTTP handler for a join button press
///
/// POST /controls/:control_id/join
#[instrument(name = "join_event", skip(state))]
pub async fn join_event(
    State(state): State<AppState>,
    Path(control_id): Path<String>,
    Json(request): Json<RsvpRequest>,
) -> Result<Json<RsvpResponse>, AppError> {
    let outcome = state
        .attendance
        .join(&control_id, &request.member_id)
        .await?;

    info!(
        control_id = %control_id,
        member_id = %request.member_id,
        attendees = outcome.attendees(),
        "Join handled"
    );

    Ok(Json(RsvpResponse::new(control_id, &outcome)))
}

/// HTTP handler for a leave button press
///
/// POST /controls/:control_id/leave
#[instrument(name = "leave_event", skip(state))]
pub async fn leave_event(
    State(state): State<AppState>,
    Path(control_id): Path<String>,
    Json(request): Json<RsvpRequest>,
) -> Result<Json<RsvpResponse>, AppError> {
    let outcome = state
        .attendance
        .leave(&control_id, &request.member_id)
        .await?;

    info!(
        control_id = %control_id,
        member_id = %request.member_id,
        attendees = outcome.attendees(),
        "Leave handled"
    );

    Ok(Json(RsvpResponse::new(control_id, &outcome)))
}
