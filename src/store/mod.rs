use std::cmp::Ordering;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use serde_json::{Map, Value};
use time::OffsetDateTime;
use tokio::sync::mpsc;
use tokio_stream::Stream;
use uuid::Uuid;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("document {id} not found in `{collection}`")]
    NotFound { collection: String, id: Uuid },
    #[error("malformed document {id}: {reason}")]
    Malformed { id: Uuid, reason: String },
    #[error("subscription failed: {0}")]
    Subscription(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A stored document: the body written by the caller plus the fields the
/// store assigns on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: Uuid,
    pub data: Map<String, Value>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Complete view of a collection, already ordered.
pub type Snapshot = Vec<Document>;

pub type SnapshotEvent = Result<Snapshot, StoreError>;

pub type Listener = Arc<dyn Fn(SnapshotEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub(crate) fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

pub(crate) enum OrderKey<'a> {
    CreatedAt,
    UpdatedAt,
    Field(&'a str),
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
        }
    }

    pub(crate) fn key(&self) -> OrderKey<'_> {
        match self.field.as_str() {
            "createdAt" => OrderKey::CreatedAt,
            "updatedAt" => OrderKey::UpdatedAt,
            other => OrderKey::Field(other),
        }
    }

    /// Ascending comparison on the order key; callers apply the direction.
    pub(crate) fn compare(&self, a: &Document, b: &Document) -> Ordering {
        match self.key() {
            OrderKey::CreatedAt => a.created_at.cmp(&b.created_at),
            OrderKey::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            OrderKey::Field(field) => field_text(a, field).cmp(&field_text(b, field)),
        }
    }
}

// Mirrors `data->>'field'`: strings unquoted, missing fields sort first.
fn field_text(doc: &Document, field: &str) -> String {
    match doc.data.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Releases a store subscription exactly once, on `unsubscribe` or drop.
pub struct Subscription {
    disposer: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(disposer: impl FnOnce() + Send + 'static) -> Self {
        Self {
            disposer: Some(Box::new(disposer)),
        }
    }

    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(dispose) = self.disposer.take() {
            dispose();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.disposer.is_some())
            .finish()
    }
}

/// Managed document store holding named collections of JSON documents.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Register `listener` for full snapshots of `collection`. The current
    /// snapshot is delivered first; an error event ends the feed.
    ///
    /// Listeners may run while the store holds internal locks and must not
    /// call back into it.
    async fn subscribe(
        &self,
        collection: &str,
        order: OrderBy,
        listener: Listener,
    ) -> Result<Subscription, StoreError>;

    async fn query(&self, collection: &str, order: &OrderBy) -> Result<Snapshot, StoreError>;

    async fn insert(&self, collection: &str, data: Map<String, Value>) -> Result<Uuid, StoreError>;

    async fn remove(&self, collection: &str, id: Uuid) -> Result<(), StoreError>;
}

/// Snapshot events of one subscription, buffered in a channel. Dropping the
/// feed unsubscribes.
#[derive(Debug)]
pub struct Feed {
    events: mpsc::UnboundedReceiver<SnapshotEvent>,
    _subscription: Subscription,
}

impl Feed {
    pub async fn next(&mut self) -> Option<SnapshotEvent> {
        self.events.recv().await
    }

    pub fn try_next(&mut self) -> Option<SnapshotEvent> {
        self.events.try_recv().ok()
    }
}

impl Stream for Feed {
    type Item = SnapshotEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.poll_recv(cx)
    }
}

pub async fn watch(
    store: &dyn RecordStore,
    collection: &str,
    order: OrderBy,
) -> Result<Feed, StoreError> {
    let (tx, rx) = mpsc::unbounded_channel();
    let listener: Listener = Arc::new(move |event| {
        // Receiver gone means the feed was dropped; its disposer runs next.
        let _ = tx.send(event);
    });
    let subscription = store.subscribe(collection, order, listener).await?;
    Ok(Feed {
        events: rx,
        _subscription: subscription,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    #[test]
    fn subscription_disposes_once_on_drop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let sub = Subscription::new(move || {
            counter.fetch_add(1, AtomicOrdering::SeqCst);
        });
        drop(sub);
        assert_eq!(calls.load(AtomicOrdering::SeqCst), 1);
    }

    #[test]
    fn explicit_unsubscribe_does_not_dispose_twice() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let sub = Subscription::new(move || {
            counter.fetch_add(1, AtomicOrdering::SeqCst);
        });
        sub.unsubscribe();
        assert_eq!(calls.load(AtomicOrdering::SeqCst), 1);
    }

    #[test]
    fn order_key_recognises_store_timestamps() {
        assert!(matches!(OrderBy::desc("createdAt").key(), OrderKey::CreatedAt));
        assert!(matches!(OrderBy::asc("updatedAt").key(), OrderKey::UpdatedAt));
        assert!(matches!(OrderBy::asc("name").key(), OrderKey::Field("name")));
    }

    #[test]
    fn field_order_compares_text_values() {
        let now = OffsetDateTime::now_utc();
        let doc = |name: &str| Document {
            id: Uuid::new_v4(),
            data: serde_json::json!({ "name": name })
                .as_object()
                .cloned()
                .unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };
        let order = OrderBy::asc("name");
        assert_eq!(order.compare(&doc("Ada"), &doc("Bola")), Ordering::Less);
        assert_eq!(order.compare(&doc("Bola"), &doc("Bola")), Ordering::Equal);
    }
}
