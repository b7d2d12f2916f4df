use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use super::anchor::{new_event_anchor, parse_anchor, publish_ready_anchor, strip_markers, AnchorKind};
use crate::{
    attendance::AttendanceRegistry,
    config::BotConfig,
    events::{Event, EventManager},
    shared::AppError,
    transport::{AnchorMessage, Channel, ChatTransport, InboundMessage},
};

/// Protocol knobs taken from the bot configuration
#[derive(Debug, Clone)]
pub struct SubmissionSettings {
    pub bot_name: String,
    pub event_channel: Channel,
    pub anchor_ttl: Option<Duration>,
}

impl From<&BotConfig> for SubmissionSettings {
    fn from(config: &BotConfig) -> Self {
        Self {
            bot_name: config.bot_name.clone(),
            event_channel: Channel::Public(config.event_channel_id.clone()),
            anchor_ttl: config.anchor_ttl(),
        }
    }
}

/// What happened to an inbound reply
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReplyOutcome {
    /// Not addressed to the bot; nothing was sent back
    Ignored,
    DescriptionUpdated { event: Event },
    Published { event: Event, control_id: String },
}

/// Drives an event from creation to publication over chat messages
///
/// Which step a reply belongs to is derived from the anchor it replies to,
/// never from stored session state.
pub struct SubmissionService {
    events: Arc<EventManager>,
    transport: Arc<dyn ChatTransport>,
    attendance: Arc<AttendanceRegistry>,
    settings: SubmissionSettings,
    publish_lock: Mutex<()>,
}

impl SubmissionService {
    pub fn new(
        events: Arc<EventManager>,
        transport: Arc<dyn ChatTransport>,
        attendance: Arc<AttendanceRegistry>,
        settings: SubmissionSettings,
    ) -> Self {
        Self {
            events,
            transport,
            attendance,
            settings,
            publish_lock: Mutex::new(()),
        }
    }

    /// Creates an in-progress event and sends the organizer its new-event anchor
    #[instrument(skip(self))]
    pub async fn on_create(
        &self,
        organizer_id: &str,
        name: &str,
        link: &str,
    ) -> Result<Event, AppError> {
        validate_new_event(name, link)?;

        let draft = Event::new(organizer_id, name.trim(), link.trim());
        let created = self
            .events
            .transaction(|events| events.add(draft).cloned())
            .await;
        let event = match created {
            Ok(event) => event,
            Err(e) => return Err(self.report(organizer_id, e).await),
        };

        info!(event_id = %event.id, event_name = %event.name, "Event draft created");

        self.send_to(organizer_id, &new_event_anchor(&self.settings.bot_name, &event))
            .await?;
        Ok(event)
    }

    /// Edits an event's link by creating it again from scratch
    #[instrument(skip(self))]
    pub async fn on_recreate(
        &self,
        organizer_id: &str,
        name: &str,
        link: &str,
    ) -> Result<Event, AppError> {
        validate_new_event(name, link)?;

        let draft = Event::new(organizer_id, name.trim(), link.trim());
        let event = match self
            .events
            .transaction(|events| events.replace(draft).cloned())
            .await
        {
            Ok(event) => event,
            Err(e) => return Err(self.report(organizer_id, e).await),
        };

        info!(event_id = %event.id, event_name = %event.name, "Event draft re-created");

        self.send_to(organizer_id, &new_event_anchor(&self.settings.bot_name, &event))
            .await?;
        Ok(event)
    }

    #[instrument(skip(self))]
    pub async fn on_delete(&self, organizer_id: &str, name: &str) -> Result<Event, AppError> {
        let removed = match self
            .events
            .transaction(|events| events.remove(name, Some(organizer_id)))
            .await
        {
            Ok(event) => event,
            Err(e) => return Err(self.report(organizer_id, e).await),
        };

        info!(event_id = %removed.id, event_name = %removed.name, "Event deleted");

        self.send_to(organizer_id, &format!("Your event \"{}\" has been deleted.", removed.name))
            .await?;
        Ok(removed)
    }

    /// All events belonging to one organizer
    #[instrument(skip(self))]
    pub async fn list_events(&self, organizer_id: &str) -> Result<Vec<Event>, AppError> {
        self.events
            .read(|events| events.by_organizer(organizer_id).cloned().collect())
            .await
    }

    /// Interprets a message that may be a reply to one of our anchors
    ///
    /// Unrelated traffic comes back as `Ignored` without anything being sent.
    /// Once a qualifier matches, failures are reported to the sender and
    /// returned as errors.
    #[instrument(skip(self, message), fields(sender_id = %message.sender_id))]
    pub async fn on_inbound_reply(&self, message: &InboundMessage) -> Result<ReplyOutcome, AppError> {
        let Some(anchor_message) = message.anchor() else {
            debug!("Message is not a reply, ignoring");
            return Ok(ReplyOutcome::Ignored);
        };

        if !anchor_message.authored_by_self {
            debug!("Reply target was not sent by the bot, ignoring");
            return Ok(ReplyOutcome::Ignored);
        }

        let anchor = match parse_anchor(&anchor_message.text) {
            Ok(Some(anchor)) => anchor,
            Ok(None) => {
                debug!("Reply target carries no qualifier, ignoring");
                return Ok(ReplyOutcome::Ignored);
            }
            Err(e) => return Err(self.report(&message.sender_id, e).await),
        };

        if self.is_expired(anchor_message) {
            debug!(event_name = %anchor.name, "Anchor has expired");
            let e = AppError::EventNotFound(anchor.name);
            return Err(self.report(&message.sender_id, e).await);
        }

        match anchor.kind {
            AnchorKind::NewEvent => self.apply_description(message, &anchor.name).await,
            AnchorKind::PublishReady => self.publish(&message.sender_id, &anchor.name).await,
        }
    }

    async fn apply_description(
        &self,
        message: &InboundMessage,
        name: &str,
    ) -> Result<ReplyOutcome, AppError> {
        let sender_id = message.sender_id.as_str();
        let (image_link, description) = split_description_reply(&message.text);

        let updated = self
            .events
            .transaction(|events| {
                if events.lookup(name, Some(sender_id))?.is_submitted() {
                    return Err(AppError::EventNotFound(name.to_string()));
                }
                events.set_image_link(name, Some(sender_id), image_link)?;
                events
                    .set_description(name, Some(sender_id), description)
                    .cloned()
            })
            .await;
        let event = match updated {
            Ok(event) => event,
            Err(e) => return Err(self.report(sender_id, e).await),
        };

        info!(event_name = %event.name, "Event description updated");

        self.send_to(sender_id, &publish_ready_anchor(&event)).await?;
        Ok(ReplyOutcome::DescriptionUpdated { event })
    }

    /// Posts the event, then commits the submission
    ///
    /// A failed post leaves the event in progress so the same anchor can be
    /// replied to again. Publishes are serialized so two replies racing on one
    /// anchor cannot both post.
    async fn publish(&self, sender_id: &str, name: &str) -> Result<ReplyOutcome, AppError> {
        let _guard = self.publish_lock.lock().await;

        let draft = self
            .events
            .read(|events| match events.lookup(name, Some(sender_id)) {
                Ok(event) if event.is_submitted() => Err(AppError::InvalidTransition(format!(
                    "event '{}' is already submitted",
                    name
                ))),
                found => found.cloned(),
            })
            .await
            .and_then(|found| found);
        let draft = match draft {
            Ok(event) => event,
            Err(e) => return Err(self.report(sender_id, e).await),
        };

        let tracker = match self
            .attendance
            .open(&self.settings.event_channel, &draft)
            .await
        {
            Ok(tracker) => tracker,
            Err(e) => return Err(self.report(sender_id, e).await),
        };

        let submitted = self
            .events
            .transaction(|events| events.submit(name, Some(sender_id)).cloned())
            .await;
        let event = match submitted {
            Ok(event) => event,
            Err(e) => {
                // the post is out but the event never moved on; stop taking RSVPs on it
                self.attendance.retire(tracker.control_id()).await;
                return Err(self.report(sender_id, e).await);
            }
        };

        info!(
            event_id = %event.id,
            event_name = %event.name,
            control_id = %tracker.control_id(),
            "Event published"
        );

        self.send_to(sender_id, "Your event has been posted!").await?;
        Ok(ReplyOutcome::Published {
            event,
            control_id: tracker.control_id().to_string(),
        })
    }

    fn is_expired(&self, anchor: &AnchorMessage) -> bool {
        let (Some(ttl), Some(sent_at)) = (self.settings.anchor_ttl, anchor.sent_at) else {
            return false;
        };
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => Utc::now() - sent_at > ttl,
            Err(_) => false,
        }
    }

    async fn send_to(&self, user_id: &str, content: &str) -> Result<(), AppError> {
        self.transport
            .send(&Channel::Direct(user_id.to_string()), content)
            .await
            .map(|_| ())
    }

    /// Tells the user what went wrong, logs per error class, and hands the
    /// error back for the caller to return
    async fn report(&self, user_id: &str, e: AppError) -> AppError {
        let notice = match &e {
            AppError::DuplicateEvent(name) => {
                debug!(event_name = %name, "Duplicate event rejected");
                format!(
                    "You already have an event named \"{name}\". Delete it first, or create it \
                     again to replace it."
                )
            }
            AppError::EventNotFound(name) => {
                debug!(event_name = %name, "Event not found");
                format!("Sorry, I couldn't find an event named \"{name}\".")
            }
            AppError::MalformedReply(reason) => {
                debug!(reason = %reason, "Could not extract event name");
                "Sorry, I couldn't extract the name of the event.".to_string()
            }
            AppError::InvalidTransition(reason) => {
                warn!(reason = %reason, "Rejected lifecycle transition");
                "That event has already been published.".to_string()
            }
            AppError::BadRequest(reason) => format!("Sorry, {reason}."),
            other => {
                error!(error = %other, "Event action failed");
                "Sorry, that action could not be completed right now. Please try again later."
                    .to_string()
            }
        };

        if let Err(send_error) = self.send_to(user_id, &notice).await {
            warn!(error = %send_error, "Failed to notify user about error");
        }
        e
    }
}

fn validate_new_event(name: &str, link: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::BadRequest("event name cannot be empty".to_string()));
    }
    if name.contains('\n') {
        return Err(AppError::BadRequest(
            "event name must be a single line".to_string(),
        ));
    }
    if strip_markers(name) != name.trim() {
        return Err(AppError::BadRequest(
            "event name cannot start or end with formatting characters".to_string(),
        ));
    }
    if link.trim().is_empty() {
        return Err(AppError::BadRequest("event link cannot be empty".to_string()));
    }
    Ok(())
}

/// First line is the image link, everything after it the description
fn split_description_reply(text: &str) -> (&str, &str) {
    match text.split_once('\n') {
        Some((image_link, description)) => (image_link.trim(), description.trim()),
        None => (text.trim(), ""),
    }
}
