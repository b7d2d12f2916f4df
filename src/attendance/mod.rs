// Public API - what other modules can use
pub use handlers::{join_event, leave_event};
pub use registry::AttendanceRegistry;
pub use sweep::{start_control_sweep, SweepConfig};
pub use tracker::{AttendanceTracker, RsvpOutcome};
pub use types::{RsvpRequest, RsvpResponse};

// Internal modules
mod handlers;
mod registry;
mod sweep;
mod tracker;
mod types;
