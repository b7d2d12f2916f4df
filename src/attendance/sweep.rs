use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{debug, info, instrument};

use super::registry::AttendanceRegistry;

/// Configuration for the control sweep
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// How often to look for expired controls
    pub sweep_interval: Duration,
    /// How long a control accepts presses after it was posted
    pub control_ttl: Duration,
}

/// Starts the background task that retires expired RSVP controls
#[instrument(skip(registry))]
pub async fn start_control_sweep(registry: Arc<AttendanceRegistry>, config: SweepConfig) {
    info!(
        sweep_interval_secs = config.sweep_interval.as_secs(),
        control_ttl_secs = config.control_ttl.as_secs(),
        "Starting attendance control sweep"
    );

    let mut sweep_interval = interval(config.sweep_interval);

    loop {
        sweep_interval.tick().await;

        let retired = registry.retire_older_than(config.control_ttl).await;
        let remaining = registry.len().await;
        debug!(retired = retired, remaining = remaining, "Control sweep completed");
    }
}
