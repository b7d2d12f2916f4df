use async_trait::async_trait;

use super::types::{Channel, ControlSurface, MessageHandle};
use crate::shared::AppError;

/// Outbound side of the chat platform
///
/// The core never talks to the platform directly; everything it wants shown
/// to a user goes through one of these calls.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a plain text message
    async fn send(&self, channel: &Channel, content: &str) -> Result<MessageHandle, AppError>;

    /// Send a message with interactive controls attached
    async fn render_interactive(
        &self,
        channel: &Channel,
        content: &str,
        control: &ControlSurface,
    ) -> Result<MessageHandle, AppError>;

    /// Replace the content of a previously rendered message
    async fn update_rendered(&self, handle: &MessageHandle, content: &str) -> Result<(), AppError>;
}
