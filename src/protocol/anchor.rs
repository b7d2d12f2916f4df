//! Reply correlation through tagged bot messages.
//!
//! Every bot message that expects an answer starts with a qualifier. When the
//! organizer replies to it, the qualifier tells which step they are on and the
//! message body tells which event it is about, so no session table is needed.
//!
//! A new-event anchor carries the event name on its second line:
//!
//! ```text
//! [new event] Thank you for using "Event Bot"! Reply to this message ...
//! **IT Day**
//! http://x
//! ```
//!
//! A publish-ready anchor carries it on its first line, right after the
//! qualifier:
//!
//! ```text
//! [ready to publish] ***IT Day***
//! Come join us
//! ...
//! ```

use crate::events::Event;
use crate::shared::AppError;

pub const NEW_EVENT_QUALIFIER: &str = "[new event]";
pub const PUBLISH_READY_QUALIFIER: &str = "[ready to publish]";

const DECORATIVE_MARKERS: &[char] = &['*', '_', '~', '`'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorKind {
    NewEvent,
    PublishReady,
}

/// What a bot-authored message being replied to refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub kind: AnchorKind,
    pub name: String,
}

/// Parses an anchor out of message text
///
/// Returns `Ok(None)` for text without a qualifier, and `MalformedReply` when
/// the qualifier is there but the name line is missing or empty.
pub fn parse_anchor(text: &str) -> Result<Option<Anchor>, AppError> {
    let (kind, rest) = if let Some(rest) = text.strip_prefix(NEW_EVENT_QUALIFIER) {
        (AnchorKind::NewEvent, rest)
    } else if let Some(rest) = text.strip_prefix(PUBLISH_READY_QUALIFIER) {
        (AnchorKind::PublishReady, rest)
    } else {
        return Ok(None);
    };

    let name_line = match kind {
        AnchorKind::NewEvent => rest.lines().nth(1),
        AnchorKind::PublishReady => rest.lines().next(),
    };

    let name = name_line.map(strip_markers).unwrap_or_default();
    if name.is_empty() {
        return Err(AppError::MalformedReply(format!(
            "{:?} anchor carries no event name",
            kind
        )));
    }

    Ok(Some(Anchor {
        kind,
        name: name.to_string(),
    }))
}

/// Strips surrounding whitespace and formatting markers from a line
pub fn strip_markers(line: &str) -> &str {
    line.trim().trim_matches(DECORATIVE_MARKERS).trim()
}

/// Anchor sent to the organizer right after an event is created
pub fn new_event_anchor(bot_name: &str, event: &Event) -> String {
    format!(
        "{NEW_EVENT_QUALIFIER} Thank you for using \"{bot_name}\"! Reply to this message with an \
         image link on the first line and the event description below it.\n**{}**\n{}",
        event.name, event.link
    )
}

/// Anchor sent to the organizer once the event has a description
pub fn publish_ready_anchor(event: &Event) -> String {
    format!(
        "{PUBLISH_READY_QUALIFIER} {event}\n\nReply to this message to publish the event. \
         To change the description, reply to the earlier draft message again."
    )
}
