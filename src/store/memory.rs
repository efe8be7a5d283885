use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use async_trait::async_trait;
use serde_json::{Map, Value};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use super::{Direction, Document, Listener, OrderBy, RecordStore, Snapshot, StoreError, Subscription};

/// In-process record store. Used when no database is configured and by the
/// test suite, which can inject failures into any operation.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, Vec<Entry>>,
    listeners: HashMap<u64, Registration>,
    next_seq: u64,
    next_listener: u64,
    fail_inserts: bool,
    fail_removes: bool,
    fail_subscribe: bool,
}

struct Entry {
    seq: u64,
    doc: Document,
}

struct Registration {
    collection: String,
    order: OrderBy,
    listener: Listener,
}

impl Inner {
    fn snapshot(&self, collection: &str, order: &OrderBy) -> Snapshot {
        let Some(entries) = self.collections.get(collection) else {
            return Vec::new();
        };
        let mut sorted: Vec<&Entry> = entries.iter().collect();
        sorted.sort_by(|a, b| {
            let ord = order.compare(&a.doc, &b.doc).then(a.seq.cmp(&b.seq));
            match order.direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            }
        });
        sorted.into_iter().map(|e| e.doc.clone()).collect()
    }

    // Called with the lock held so listeners see snapshots in the order they
    // were taken.
    fn notify(&self, collection: &str) {
        for registration in self.listeners.values().filter(|r| r.collection == collection) {
            (registration.listener)(Ok(self.snapshot(collection, &registration.order)));
        }
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_inserts(&self, fail: bool) {
        lock(&self.inner).fail_inserts = fail;
    }

    pub fn fail_removes(&self, fail: bool) {
        lock(&self.inner).fail_removes = fail;
    }

    pub fn fail_subscribe(&self, fail: bool) {
        lock(&self.inner).fail_subscribe = fail;
    }

    /// Deliver an error to every listener of `collection` and end their feeds.
    pub fn interrupt(&self, collection: &str, reason: &str) {
        let dropped: Vec<Listener> = {
            let mut inner = lock(&self.inner);
            let ids: Vec<u64> = inner
                .listeners
                .iter()
                .filter(|(_, r)| r.collection == collection)
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter()
                .filter_map(|id| inner.listeners.remove(&id))
                .map(|r| r.listener)
                .collect()
        };
        for listener in dropped {
            listener(Err(StoreError::Subscription(reason.to_string())));
        }
    }

    pub fn listener_count(&self, collection: &str) -> usize {
        lock(&self.inner)
            .listeners
            .values()
            .filter(|r| r.collection == collection)
            .count()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn subscribe(
        &self,
        collection: &str,
        order: OrderBy,
        listener: Listener,
    ) -> Result<Subscription, StoreError> {
        let id = {
            let mut inner = lock(&self.inner);
            if inner.fail_subscribe {
                return Err(StoreError::Subscription("listener rejected".into()));
            }
            let id = inner.next_listener;
            inner.next_listener += 1;
            let initial = inner.snapshot(collection, &order);
            inner.listeners.insert(
                id,
                Registration {
                    collection: collection.to_string(),
                    order,
                    listener: listener.clone(),
                },
            );
            listener(Ok(initial));
            id
        };
        debug!(collection, listener = id, "memory subscription registered");

        let weak: Weak<Mutex<Inner>> = Arc::downgrade(&self.inner);
        Ok(Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                lock(&inner).listeners.remove(&id);
            }
        }))
    }

    async fn query(&self, collection: &str, order: &OrderBy) -> Result<Snapshot, StoreError> {
        Ok(lock(&self.inner).snapshot(collection, order))
    }

    async fn insert(&self, collection: &str, data: Map<String, Value>) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        {
            let mut inner = lock(&self.inner);
            if inner.fail_inserts {
                return Err(StoreError::Unavailable("insert rejected".into()));
            }
            let now = OffsetDateTime::now_utc();
            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner
                .collections
                .entry(collection.to_string())
                .or_default()
                .push(Entry {
                    seq,
                    doc: Document {
                        id,
                        data,
                        created_at: now,
                        updated_at: now,
                    },
                });
            inner.notify(collection);
        }
        Ok(id)
    }

    async fn remove(&self, collection: &str, id: Uuid) -> Result<(), StoreError> {
        {
            let mut inner = lock(&self.inner);
            if inner.fail_removes {
                return Err(StoreError::Unavailable("remove rejected".into()));
            }
            let entries = inner.collections.entry(collection.to_string()).or_default();
            let before = entries.len();
            entries.retain(|e| e.doc.id != id);
            if entries.len() == before {
                return Err(StoreError::NotFound {
                    collection: collection.to_string(),
                    id,
                });
            }
            inner.notify(collection);
        }
        Ok(())
    }
}
