use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::attendance::AttendanceRegistry;
use crate::config::BotConfig;
use crate::events::{EventManager, EventStore};
use crate::protocol::{SubmissionService, SubmissionSettings};
use crate::transport::{ChatTransport, GatewayTransport};

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub submissions: Arc<SubmissionService>,
    pub attendance: Arc<AttendanceRegistry>,
    pub gateway: GatewayTransport,
}

impl AppState {
    pub fn new(
        submissions: Arc<SubmissionService>,
        attendance: Arc<AttendanceRegistry>,
        gateway: GatewayTransport,
    ) -> Self {
        Self {
            submissions,
            attendance,
            gateway,
        }
    }

    /// Wires the service graph around one store and one outbound transport
    pub fn wire(
        config: &BotConfig,
        store: Arc<dyn EventStore + Send + Sync>,
        transport: Arc<dyn ChatTransport>,
        gateway: GatewayTransport,
    ) -> Self {
        let events = Arc::new(EventManager::new(store));
        let attendance = Arc::new(AttendanceRegistry::new(Arc::clone(&transport)));
        let submissions = Arc::new(SubmissionService::new(
            events,
            transport,
            Arc::clone(&attendance),
            SubmissionSettings::from(config),
        ));
        Self::new(submissions, attendance, gateway)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("Duplicate event: {0}")]
    DuplicateEvent(String),

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Malformed reply: {0}")]
    MalformedReply(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::DuplicateEvent(_) => StatusCode::CONFLICT,
            AppError::EventNotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidTransition(_) => StatusCode::CONFLICT,
            AppError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::MalformedReply(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Transport(_) => StatusCode::BAD_GATEWAY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
