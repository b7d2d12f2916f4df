use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

use eventbot::{
    transport::AnchorMessage, AppError, AppState, BotConfig, Event, EventStore, GatewayTransport,
    InboundMessage, JsonFileEventStore, ReplyOutcome,
};

use super::mocks::MockTransport;

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub state: AppState,
    pub transport: MockTransport,
    pub store: Arc<JsonFileEventStore>,
    pub config: BotConfig,
    _state_dir: TempDir,
}

pub struct TestSetupBuilder {
    config: BotConfig,
    seed: Vec<Event>,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            config: BotConfig {
                event_channel_id: "events".to_string(),
                ..BotConfig::default()
            },
            seed: Vec::new(),
        }
    }

    pub fn with_anchor_ttl_secs(mut self, secs: u64) -> Self {
        self.config.anchor_ttl_secs = Some(secs);
        self
    }

    /// Events already in the snapshot file when the bot starts
    pub fn with_events(mut self, events: Vec<Event>) -> Self {
        self.seed = events;
        self
    }

    pub async fn build(mut self) -> TestSetup {
        let state_dir = tempfile::tempdir().unwrap();
        self.config.state_file = state_dir.path().join("statefiles").join("events.json");

        let store = Arc::new(JsonFileEventStore::new(self.config.state_file.clone()));
        if !self.seed.is_empty() {
            store.save(&self.seed).await.unwrap();
        }

        let transport = MockTransport::new();
        let state = AppState::wire(
            &self.config,
            store.clone(),
            Arc::new(transport.clone()),
            GatewayTransport::default(),
        );

        TestSetup {
            state,
            transport,
            store,
            config: self.config,
            _state_dir: state_dir,
        }
    }
}

impl TestSetup {
    pub fn state_file(&self) -> PathBuf {
        self.config.state_file.clone()
    }

    /// Events as currently persisted on disk
    pub async fn stored_events(&self) -> Vec<Event> {
        self.store.load().await.unwrap()
    }

    pub async fn stored_event(&self, organizer_id: &str, name: &str) -> Event {
        self.stored_events()
            .await
            .into_iter()
            .find(|e| e.organizer_id == organizer_id && e.name == name)
            .unwrap_or_else(|| panic!("event {name} not stored for {organizer_id}"))
    }

    pub async fn create(&self, organizer_id: &str, name: &str, link: &str) -> Result<Event, AppError> {
        self.state
            .submissions
            .on_create(organizer_id, name, link)
            .await
    }

    /// Replies to the last direct message the organizer received
    pub async fn reply_to_last(&self, sender_id: &str, text: &str) -> Result<ReplyOutcome, AppError> {
        let anchor = self.transport.last_direct_message(sender_id).await;
        self.reply_to(sender_id, text, &anchor).await
    }

    pub async fn reply_to(
        &self,
        sender_id: &str,
        text: &str,
        anchor_text: &str,
    ) -> Result<ReplyOutcome, AppError> {
        let message = InboundMessage {
            text: text.to_string(),
            sender_id: sender_id.to_string(),
            reply_to: Some(AnchorMessage {
                text: anchor_text.to_string(),
                authored_by_self: true,
                sent_at: None,
            }),
        };
        self.state.submissions.on_inbound_reply(&message).await
    }

    /// Creates, describes and publishes an event; returns the control id
    pub async fn publish(&self, organizer_id: &str, name: &str) -> String {
        self.create(organizer_id, name, "http://example.com").await.unwrap();
        self.reply_to_last(organizer_id, "img.png\nCome join us")
            .await
            .unwrap();
        match self.reply_to_last(organizer_id, "publish").await.unwrap() {
            ReplyOutcome::Published { control_id, .. } => control_id,
            other => panic!("expected event to be published, got {other:?}"),
        }
    }
}
