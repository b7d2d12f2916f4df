use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use super::models::{Event, EventKey, EventState};
use crate::shared::AppError;

/// In-memory view of the whole store for the duration of one transaction
///
/// Name-addressed operations take an optional organizer: with one, the match
/// is exact; without, the first event carrying that name wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventSet {
    events: BTreeMap<EventKey, Event>,
}

impl EventSet {
    pub fn from_events(events: Vec<Event>) -> Self {
        let events = events.into_iter().map(|e| (e.key(), e)).collect();
        Self { events }
    }

    /// All records in key order, ready to be written back
    pub fn to_events(&self) -> Vec<Event> {
        self.events.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.values()
    }

    /// Inserts a new event as in-progress
    pub fn add(&mut self, mut event: Event) -> Result<&Event, AppError> {
        event.state = EventState::InProgress;
        match self.events.entry(event.key()) {
            Entry::Occupied(_) => Err(AppError::DuplicateEvent(event.name)),
            Entry::Vacant(slot) => Ok(&*slot.insert(event)),
        }
    }

    /// Drops any event with the same organizer and name, then adds this one
    pub fn replace(&mut self, event: Event) -> Result<&Event, AppError> {
        self.events.remove(&event.key());
        self.add(event)
    }

    pub fn lookup(&self, name: &str, organizer_id: Option<&str>) -> Result<&Event, AppError> {
        let key = self.find_key(name, organizer_id)?;
        self.events
            .get(&key)
            .ok_or_else(|| AppError::EventNotFound(name.to_string()))
    }

    pub fn set_description(
        &mut self,
        name: &str,
        organizer_id: Option<&str>,
        description: impl Into<String>,
    ) -> Result<&Event, AppError> {
        let event = self.lookup_mut(name, organizer_id)?;
        event.description = Some(description.into());
        Ok(&*event)
    }

    pub fn set_image_link(
        &mut self,
        name: &str,
        organizer_id: Option<&str>,
        image_link: impl Into<String>,
    ) -> Result<&Event, AppError> {
        let event = self.lookup_mut(name, organizer_id)?;
        event.image_link = Some(image_link.into());
        Ok(&*event)
    }

    /// Moves an event to submitted. Submitting twice is an error.
    pub fn submit(&mut self, name: &str, organizer_id: Option<&str>) -> Result<&Event, AppError> {
        let event = self.lookup_mut(name, organizer_id)?;
        if event.is_submitted() {
            return Err(AppError::InvalidTransition(format!(
                "event '{}' is already submitted",
                name
            )));
        }
        event.state = EventState::Submitted;
        Ok(&*event)
    }

    pub fn remove(&mut self, name: &str, organizer_id: Option<&str>) -> Result<Event, AppError> {
        let key = self.find_key(name, organizer_id)?;
        self.events
            .remove(&key)
            .ok_or_else(|| AppError::EventNotFound(name.to_string()))
    }

    pub fn by_organizer<'a>(&'a self, organizer_id: &'a str) -> impl Iterator<Item = &'a Event> {
        self.events
            .values()
            .filter(move |e| e.organizer_id == organizer_id)
    }

    fn lookup_mut(&mut self, name: &str, organizer_id: Option<&str>) -> Result<&mut Event, AppError> {
        let key = self.find_key(name, organizer_id)?;
        self.events
            .get_mut(&key)
            .ok_or_else(|| AppError::EventNotFound(name.to_string()))
    }

    fn find_key(&self, name: &str, organizer_id: Option<&str>) -> Result<EventKey, AppError> {
        let key = match organizer_id {
            Some(organizer_id) => {
                let key = EventKey {
                    organizer_id: organizer_id.to_string(),
                    name: name.to_string(),
                };
                self.events.contains_key(&key).then_some(key)
            }
            None => self.events.keys().find(|k| k.name == name).cloned(),
        };
        key.ok_or_else(|| AppError::EventNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_with(events: Vec<Event>) -> EventSet {
        EventSet::from_events(events)
    }

    #[test]
    fn test_add_then_duplicate_is_rejected() {
        let mut events = EventSet::default();

        events.add(Event::new("u1", "IT Day", "http://x")).unwrap();
        let result = events.add(Event::new("u1", "IT Day", "http://y"));

        assert!(matches!(result, Err(AppError::DuplicateEvent(name)) if name == "IT Day"));
        assert_eq!(events.len(), 1);
        assert_eq!(events.lookup("IT Day", Some("u1")).unwrap().link, "http://x");
    }

    #[test]
    fn test_same_name_for_different_organizers_is_allowed() {
        let mut events = EventSet::default();

        events.add(Event::new("u1", "IT Day", "http://x")).unwrap();
        events.add(Event::new("u2", "IT Day", "http://y")).unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events.lookup("IT Day", Some("u2")).unwrap().link, "http://y");
    }

    #[test]
    fn test_add_forces_in_progress() {
        let mut submitted = Event::new("u1", "Demo", "http://x");
        submitted.state = EventState::Submitted;
        let mut events = EventSet::default();

        let added = events.add(submitted).unwrap();

        assert_eq!(added.state, EventState::InProgress);
    }

    #[test]
    fn test_lookup_missing_event() {
        let events = EventSet::default();

        let result = events.lookup("Ghost", None);

        assert!(matches!(result, Err(AppError::EventNotFound(name)) if name == "Ghost"));
    }

    #[test]
    fn test_lookup_scoped_to_wrong_organizer() {
        let events = set_with(vec![Event::new("u1", "Demo", "http://x")]);

        assert!(events.lookup("Demo", Some("u1")).is_ok());
        assert!(matches!(
            events.lookup("Demo", Some("u2")),
            Err(AppError::EventNotFound(_))
        ));
        assert!(events.lookup("Demo", None).is_ok());
    }

    #[test]
    fn test_description_and_image_overwrite() {
        let mut events = set_with(vec![Event::new("u1", "Demo", "http://x")]);

        events.set_description("Demo", None, "first").unwrap();
        events.set_image_link("Demo", None, "a.png").unwrap();
        events.set_description("Demo", None, "second").unwrap();
        events.set_image_link("Demo", None, "b.png").unwrap();

        let event = events.lookup("Demo", None).unwrap();
        assert_eq!(event.description.as_deref(), Some("second"));
        assert_eq!(event.image_link.as_deref(), Some("b.png"));
    }

    #[test]
    fn test_description_allowed_after_submit() {
        let mut events = set_with(vec![Event::new("u1", "Demo", "http://x")]);
        events.submit("Demo", None).unwrap();

        let event = events.set_description("Demo", None, "late edit").unwrap();

        assert_eq!(event.description.as_deref(), Some("late edit"));
        assert!(event.is_submitted());
    }

    #[test]
    fn test_mutating_missing_event_fails() {
        let mut events = EventSet::default();

        assert!(matches!(
            events.set_description("Ghost", None, "x"),
            Err(AppError::EventNotFound(_))
        ));
        assert!(matches!(
            events.set_image_link("Ghost", None, "x"),
            Err(AppError::EventNotFound(_))
        ));
        assert!(matches!(
            events.submit("Ghost", None),
            Err(AppError::EventNotFound(_))
        ));
        assert!(matches!(
            events.remove("Ghost", None),
            Err(AppError::EventNotFound(_))
        ));
    }

    #[test]
    fn test_submit_twice_is_invalid_transition() {
        let mut events = set_with(vec![Event::new("u1", "Demo", "http://x")]);

        events.submit("Demo", Some("u1")).unwrap();
        let result = events.submit("Demo", Some("u1"));

        assert!(matches!(result, Err(AppError::InvalidTransition(_))));
        assert!(events.lookup("Demo", None).unwrap().is_submitted());
    }

    #[test]
    fn test_remove_frees_the_name() {
        let mut events = set_with(vec![Event::new("u1", "Demo", "http://x")]);

        let removed = events.remove("Demo", Some("u1")).unwrap();
        assert_eq!(removed.name, "Demo");
        assert!(events.is_empty());

        events.add(Event::new("u1", "Demo", "http://y")).unwrap();
        assert_eq!(events.lookup("Demo", None).unwrap().link, "http://y");
    }

    #[test]
    fn test_replace_resets_the_draft() {
        let mut events = set_with(vec![Event::new("u1", "Demo", "http://x")]);
        events.set_description("Demo", None, "old").unwrap();
        let old_id = events.lookup("Demo", None).unwrap().id;

        let replaced = events.replace(Event::new("u1", "Demo", "http://y")).unwrap();

        assert_eq!(replaced.link, "http://y");
        assert_eq!(replaced.description, None);
        assert_ne!(replaced.id, old_id);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_by_organizer() {
        let events = set_with(vec![
            Event::new("u1", "A", "http://a"),
            Event::new("u2", "B", "http://b"),
            Event::new("u1", "C", "http://c"),
        ]);

        let names: Vec<&str> = events.by_organizer("u1").map(|e| e.name.as_str()).collect();

        assert_eq!(names, vec!["A", "C"]);
    }

    #[test]
    fn test_round_trip_through_events_preserves_records() {
        let mut events = set_with(vec![
            Event::new("u2", "B", "http://b"),
            Event::new("u1", "A", "http://a"),
        ]);
        events.submit("B", None).unwrap();

        let again = EventSet::from_events(events.to_events());

        assert_eq!(again, events);
    }
}
