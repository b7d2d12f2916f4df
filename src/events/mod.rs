// Public API - what other modules can use
pub use manager::EventManager;
pub use models::{Event, EventKey, EventState};
pub use set::EventSet;
pub use store::{EventStore, InMemoryEventStore, JsonFileEventStore};

// Internal modules
mod manager;
pub mod models;
mod set;
pub mod store;
