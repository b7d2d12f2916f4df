use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::tracker::{AttendanceTracker, RsvpOutcome};
use crate::events::Event;
use crate::shared::AppError;
use crate::transport::{Channel, ChatTransport, ControlSurface};

/// Live RSVP controls keyed by control-instance id
pub struct AttendanceRegistry {
    transport: Arc<dyn ChatTransport>,
    trackers: RwLock<HashMap<String, Arc<AttendanceTracker>>>,
}

impl AttendanceRegistry {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            transport,
            trackers: RwLock::new(HashMap::new()),
        }
    }

    /// Posts the event with join/leave controls and starts tracking it
    #[instrument(skip(self, event), fields(event_name = %event.name))]
    pub async fn open(
        &self,
        channel: &Channel,
        event: &Event,
    ) -> Result<Arc<AttendanceTracker>, AppError> {
        let control_id = Uuid::new_v4().to_string();
        let content = event.to_string();

        let handle = self
            .transport
            .render_interactive(channel, &content, &ControlSurface::rsvp(&control_id))
            .await?;

        let tracker = Arc::new(AttendanceTracker::new(
            control_id,
            event.name.clone(),
            handle,
            content,
            Arc::clone(&self.transport),
        ));
        self.register(Arc::clone(&tracker)).await;
        Ok(tracker)
    }

    pub async fn register(&self, tracker: Arc<AttendanceTracker>) {
        debug!(control_id = %tracker.control_id(), "Registering attendance tracker");
        self.trackers
            .write()
            .await
            .insert(tracker.control_id().to_string(), tracker);
    }

    pub async fn get(&self, control_id: &str) -> Option<Arc<AttendanceTracker>> {
        self.trackers.read().await.get(control_id).cloned()
    }

    pub async fn join(&self, control_id: &str, member_id: &str) -> Result<RsvpOutcome, AppError> {
        self.tracker(control_id).await?.join(member_id).await
    }

    pub async fn leave(&self, control_id: &str, member_id: &str) -> Result<RsvpOutcome, AppError> {
        self.tracker(control_id).await?.leave(member_id).await
    }

    /// Stops accepting presses for a control; returns whether it was live
    pub async fn retire(&self, control_id: &str) -> bool {
        self.trackers.write().await.remove(control_id).is_some()
    }

    /// Retires every control opened longer than `ttl` ago
    #[instrument(skip(self))]
    pub async fn retire_older_than(&self, ttl: Duration) -> usize {
        let Ok(ttl) = chrono::Duration::from_std(ttl) else {
            return 0;
        };
        let cutoff = Utc::now() - ttl;

        let mut trackers = self.trackers.write().await;
        let before = trackers.len();
        trackers.retain(|_, tracker| tracker.opened_at() > cutoff);
        let retired = before - trackers.len();

        if retired > 0 {
            info!(retired = retired, "Retired expired attendance controls");
        }
        retired
    }

    pub async fn len(&self) -> usize {
        self.trackers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.trackers.read().await.is_empty()
    }

    async fn tracker(&self, control_id: &str) -> Result<Arc<AttendanceTracker>, AppError> {
        self.get(control_id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("control {control_id}")))
    }
}
