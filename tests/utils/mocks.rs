use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use eventbot::{
    transport::{Channel, ControlSurface, MessageHandle},
    AppError, ChatTransport,
};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// A post carrying interactive controls, plus every later repaint of it
#[derive(Debug, Clone)]
pub struct RenderedPost {
    pub channel: Channel,
    pub content: String,
    pub control: ControlSurface,
    pub updates: Vec<String>,
}

impl RenderedPost {
    /// What the post currently shows
    pub fn current(&self) -> &str {
        self.updates.last().unwrap_or(&self.content)
    }
}

#[derive(Clone, Default)]
pub struct MockTransport {
    sent_messages: Arc<RwLock<HashMap<Channel, Vec<String>>>>,
    posts: Arc<RwLock<HashMap<MessageHandle, RenderedPost>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_direct_messages(&self, user_id: &str) -> Vec<String> {
        self.sent_messages
            .read()
            .await
            .get(&Channel::Direct(user_id.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    pub async fn last_direct_message(&self, user_id: &str) -> String {
        self.get_direct_messages(user_id)
            .await
            .pop()
            .unwrap_or_else(|| panic!("no direct message sent to {user_id}"))
    }

    pub async fn posts(&self) -> Vec<RenderedPost> {
        self.posts.read().await.values().cloned().collect()
    }

    pub async fn post_for_control(&self, control_id: &str) -> RenderedPost {
        self.posts()
            .await
            .into_iter()
            .find(|post| post.control.control_id == control_id)
            .unwrap_or_else(|| panic!("no post rendered for control {control_id}"))
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn send(&self, channel: &Channel, content: &str) -> Result<MessageHandle, AppError> {
        self.sent_messages
            .write()
            .await
            .entry(channel.clone())
            .or_default()
            .push(content.to_string());
        Ok(MessageHandle::generate())
    }

    async fn render_interactive(
        &self,
        channel: &Channel,
        content: &str,
        control: &ControlSurface,
    ) -> Result<MessageHandle, AppError> {
        let handle = MessageHandle::generate();
        self.posts.write().await.insert(
            handle.clone(),
            RenderedPost {
                channel: channel.clone(),
                content: content.to_string(),
                control: control.clone(),
                updates: Vec::new(),
            },
        );
        Ok(handle)
    }

    async fn update_rendered(&self, handle: &MessageHandle, content: &str) -> Result<(), AppError> {
        match self.posts.write().await.get_mut(handle) {
            Some(post) => {
                post.updates.push(content.to_string());
                Ok(())
            }
            None => Err(AppError::Transport(format!("unknown message {}", handle.0))),
        }
    }
}
