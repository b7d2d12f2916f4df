use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, instrument};

use super::models::Event;
use super::set::EventSet;
use super::store::EventStore;
use crate::shared::AppError;

/// Owns the event store and the lock every transaction goes through
///
/// At most one load-mutate-save cycle is in flight at a time. This is the
/// only write path into the store.
pub struct EventManager {
    store: Arc<dyn EventStore + Send + Sync>,
    lock: Mutex<()>,
}

impl EventManager {
    pub fn new(store: Arc<dyn EventStore + Send + Sync>) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    /// Runs `mutate` against a freshly loaded view of the store
    ///
    /// The resulting state is saved exactly once whether `mutate` succeeds or
    /// not; operations on [`EventSet`] check before they change anything, so a
    /// failed operation leaves nothing half-applied. If loading fails nothing
    /// runs and nothing is saved. If saving fails the previous snapshot stays
    /// in place and the storage error wins over the closure's result.
    #[instrument(skip(self, mutate))]
    pub async fn transaction<T, F>(&self, mutate: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut EventSet) -> Result<T, AppError>,
    {
        let _guard = self.lock.lock().await;

        let loaded = self.store.load().await.map_err(|e| {
            error!(error = %e, "Event transaction aborted, store could not be loaded");
            e
        })?;
        let mut events = EventSet::from_events(loaded);

        let outcome = mutate(&mut events);

        self.store.save(&events.to_events()).await.map_err(|e| {
            error!(error = %e, "Event transaction aborted, store could not be saved");
            e
        })?;

        debug!(
            event_count = events.len(),
            succeeded = outcome.is_ok(),
            "Event transaction committed"
        );
        outcome
    }

    /// Reads the store under the same lock without writing it back
    #[instrument(skip(self, view))]
    pub async fn read<T, F>(&self, view: F) -> Result<T, AppError>
    where
        F: FnOnce(&EventSet) -> T,
    {
        let _guard = self.lock.lock().await;
        let events = EventSet::from_events(self.store.load().await?);
        Ok(view(&events))
    }

    /// Current records in key order
    pub async fn snapshot(&self) -> Result<Vec<Event>, AppError> {
        self.read(EventSet::to_events).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::models::EventState;
    use crate::events::store::InMemoryEventStore;
    use async_trait::async_trait;

    /// Store that can be switched into failing loads or saves
    struct FlakyStore {
        inner: InMemoryEventStore,
        fail_load: bool,
        fail_save: bool,
    }

    #[async_trait]
    impl EventStore for FlakyStore {
        async fn load(&self) -> Result<Vec<Event>, AppError> {
            if self.fail_load {
                return Err(AppError::StorageUnavailable("disk gone".to_string()));
            }
            self.inner.load().await
        }

        async fn save(&self, events: &[Event]) -> Result<(), AppError> {
            if self.fail_save {
                return Err(AppError::StorageUnavailable("disk full".to_string()));
            }
            self.inner.save(events).await
        }
    }

    fn manager_with(store: Arc<InMemoryEventStore>) -> EventManager {
        EventManager::new(store)
    }

    #[tokio::test]
    async fn test_duplicate_add_across_transactions() {
        let store = Arc::new(InMemoryEventStore::new());
        let manager = manager_with(store.clone());

        manager
            .transaction(|events| events.add(Event::new("u1", "IT Day", "http://x")).map(|_| ()))
            .await
            .unwrap();
        let result = manager
            .transaction(|events| events.add(Event::new("u1", "IT Day", "http://y")).map(|_| ()))
            .await;

        assert!(matches!(result, Err(AppError::DuplicateEvent(_))));
        let links = manager
            .read(|events| events.iter().map(|e| e.link.clone()).collect::<Vec<_>>())
            .await
            .unwrap();
        assert_eq!(links, vec!["http://x".to_string()]);
    }

    #[tokio::test]
    async fn test_transaction_saves_exactly_once_on_success_and_failure() {
        let store = Arc::new(InMemoryEventStore::new());
        let manager = manager_with(store.clone());

        manager
            .transaction(|events| {
                events.add(Event::new("u1", "Demo", "http://x"))?;
                events.set_description("Demo", Some("u1"), "hello")?;
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(store.save_count(), 1);

        let result = manager
            .transaction(|events| events.lookup("Ghost", None).cloned())
            .await;
        assert!(matches!(result, Err(AppError::EventNotFound(_))));
        assert_eq!(store.save_count(), 2);
    }

    #[tokio::test]
    async fn test_mutations_before_an_error_are_kept() {
        let store = Arc::new(InMemoryEventStore::new());
        let manager = manager_with(store.clone());

        let result: Result<(), AppError> = manager
            .transaction(|events| {
                events.add(Event::new("u1", "Demo", "http://x"))?;
                events.submit("Ghost", None)?;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(AppError::EventNotFound(_))));
        assert_eq!(store.load().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_load_failure_aborts_without_running_or_saving() {
        let store = Arc::new(FlakyStore {
            inner: InMemoryEventStore::new(),
            fail_load: true,
            fail_save: false,
        });
        let manager = EventManager::new(store.clone());
        let mut ran = false;

        let result = manager
            .transaction(|_| {
                ran = true;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(AppError::StorageUnavailable(_))));
        assert!(!ran);
        assert_eq!(store.inner.save_count(), 0);
    }

    #[tokio::test]
    async fn test_save_failure_leaves_previous_snapshot() {
        let existing = Event::new("u1", "Demo", "http://x");
        let store = Arc::new(FlakyStore {
            inner: InMemoryEventStore::with_events(vec![existing.clone()]),
            fail_load: false,
            fail_save: true,
        });
        let manager = EventManager::new(store.clone());

        let result = manager
            .transaction(|events| events.submit("Demo", None).cloned())
            .await;

        assert!(matches!(result, Err(AppError::StorageUnavailable(_))));
        let persisted = store.inner.load().await.unwrap();
        assert_eq!(persisted, vec![existing]);
        assert_eq!(persisted[0].state, EventState::InProgress);
    }

    #[tokio::test]
    async fn test_read_does_not_save() {
        let store = Arc::new(InMemoryEventStore::with_events(vec![Event::new(
            "u1", "Demo", "http://x",
        )]));
        let manager = manager_with(store.clone());

        let count = manager.read(|events| events.len()).await.unwrap();
        let snapshot = manager.snapshot().await.unwrap();

        assert_eq!(count, 1);
        assert_eq!(snapshot[0].name, "Demo");
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_transactions_do_not_lose_updates() {
        let store = Arc::new(InMemoryEventStore::new());
        let manager = Arc::new(manager_with(store.clone()));

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let manager = manager.clone();
                tokio::spawn(async move {
                    manager
                        .transaction(move |events| {
                            events
                                .add(Event::new(format!("u{}", i % 4), format!("event-{}", i), "http://x"))
                                .map(|_| ())
                        })
                        .await
                })
            })
            .collect();

        for result in futures::future::join_all(handles).await {
            result.unwrap().unwrap();
        }

        assert_eq!(store.load().await.unwrap().len(), 20);
        assert_eq!(store.save_count(), 20);
    }
}
