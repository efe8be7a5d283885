use std::sync::Arc;

use tracing::{debug, error, info};
use uuid::Uuid;

use super::delete::{DeleteDialog, DeleteOutcome, DELETE_FAILED};
use super::dto::{employees_from_snapshot, registry_order, Employee};
use crate::store::{watch, Feed, RecordStore, SnapshotEvent};

pub const LOAD_FAILED: &str = "Failed to load employees. Please try again later.";

/// Live employee listing. Holds the store subscription for as long as it
/// is mounted; dropping the list releases it.
pub struct RegistryList {
    store: Arc<dyn RecordStore>,
    collection: String,
    feed: Option<Feed>,
    loading: bool,
    records: Vec<Employee>,
    error: Option<String>,
    dialog: DeleteDialog,
}

impl RegistryList {
    pub async fn mount(store: Arc<dyn RecordStore>, collection: impl Into<String>) -> Self {
        let collection = collection.into();
        let mut list = Self {
            store,
            collection,
            feed: None,
            loading: true,
            records: Vec::new(),
            error: None,
            dialog: DeleteDialog::default(),
        };
        match watch(list.store.as_ref(), &list.collection, registry_order()).await {
            Ok(feed) => list.feed = Some(feed),
            Err(e) => {
                error!(error = %e, collection = %list.collection, "subscribe to employees failed");
                list.fail_loading();
            }
        }
        list
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn records(&self) -> &[Employee] {
        &self.records
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dialog(&self) -> &DeleteDialog {
        &self.dialog
    }

    pub fn is_subscribed(&self) -> bool {
        self.feed.is_some()
    }

    /// Wait for the next snapshot or error and apply it. Returns `false`
    /// once the subscription has ended.
    pub async fn next_update(&mut self) -> bool {
        let Some(feed) = self.feed.as_mut() else {
            return false;
        };
        match feed.next().await {
            Some(event) => {
                self.apply(event);
                self.feed.is_some()
            }
            None => {
                self.feed = None;
                false
            }
        }
    }

    /// Apply every event already delivered, without waiting.
    pub fn apply_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.feed.as_mut().and_then(Feed::try_next) {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    fn apply(&mut self, event: SnapshotEvent) {
        match event {
            Ok(snapshot) => {
                self.records = employees_from_snapshot(snapshot);
                self.loading = false;
                debug!(count = self.records.len(), "employee snapshot applied");
            }
            Err(e) => {
                error!(error = %e, collection = %self.collection, "employee subscription failed");
                self.feed = None;
                self.fail_loading();
            }
        }
    }

    fn fail_loading(&mut self) {
        self.error = Some(LOAD_FAILED.to_string());
        self.loading = false;
    }

    /// Editing is not implemented; the action is accepted and ignored.
    pub fn edit(&self, id: Uuid) {
        debug!(%id, "edit employee requested");
    }

    pub fn request_delete(&mut self, id: Uuid) {
        self.dialog.request(id);
    }

    pub fn cancel_delete(&mut self) {
        self.dialog.cancel();
    }

    pub async fn confirm_delete(&mut self) -> DeleteOutcome {
        let outcome = self.dialog.confirm(self.store.as_ref(), &self.collection).await;
        if let DeleteOutcome::Failed(_) = outcome {
            self.error = Some(DELETE_FAILED.to_string());
        }
        outcome
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }
}

impl Drop for RegistryList {
    fn drop(&mut self) {
        if self.feed.is_some() {
            info!(collection = %self.collection, "employee list unmounted");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::employees::dto::{EmployeeDraft, Field};
    use crate::employees::form::{RegistrationForm, SubmitOutcome};
    use crate::store::MemoryStore;
    use time::macros::date;

    const COLLECTION: &str = "employees";

    fn draft(nin: &str, name: &str) -> EmployeeDraft {
        EmployeeDraft {
            nin: nin.into(),
            name: name.into(),
            phone: "+234-8012345678".into(),
            address: "12 Marina Road, Lagos".into(),
            dob: "1990-01-01".into(),
            lga: "Ikeja".into(),
            state: "Lagos".into(),
            guarantor: "Chinedu Okafor".into(),
            designation: "Clerk".into(),
            dofa: "2015-06-01".into(),
        }
    }

    async fn create(store: &MemoryStore, d: EmployeeDraft) -> Uuid {
        let mut form = RegistrationForm::with_draft(d);
        match form.submit(store, COLLECTION, date!(2026 - 10 - 17)).await {
            SubmitOutcome::Created(id) => id,
            other => panic!("expected Created, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn mount_loads_initial_snapshot() {
        let store = MemoryStore::new();
        let mut list = RegistryList::mount(Arc::new(store.clone()), COLLECTION).await;
        assert!(list.is_loading());

        assert!(list.next_update().await);
        assert!(!list.is_loading());
        assert!(list.records().is_empty());
        assert!(list.error().is_none());
    }

    #[tokio::test]
    async fn inserted_record_round_trips_through_subscription() {
        let store = MemoryStore::new();
        let mut list = RegistryList::mount(Arc::new(store.clone()), COLLECTION).await;
        list.apply_pending();

        let entered = draft("12345678901", "Amina Bello");
        let id = create(&store, entered.clone()).await;
        assert_eq!(list.apply_pending(), 1);

        let records = list.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, id);
        assert_eq!(records[0].fields, entered);
        assert_eq!(records[0].created_at, records[0].updated_at);
    }

    #[tokio::test]
    async fn records_are_newest_first() {
        let store = MemoryStore::new();
        let mut list = RegistryList::mount(Arc::new(store.clone()), COLLECTION).await;
        let older = create(&store, draft("11111111111", "First")).await;
        let newer = create(&store, draft("22222222222", "Second")).await;
        list.apply_pending();

        let ids: Vec<Uuid> = list.records().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![newer, older]);
    }

    #[tokio::test]
    async fn unmount_releases_subscription() {
        let store = MemoryStore::new();
        let list = RegistryList::mount(Arc::new(store.clone()), COLLECTION).await;
        assert_eq!(store.listener_count(COLLECTION), 1);
        drop(list);
        assert_eq!(store.listener_count(COLLECTION), 0);
    }

    #[tokio::test]
    async fn subscription_error_stops_loading_and_keeps_stale_records() {
        let store = MemoryStore::new();
        create(&store, draft("12345678901", "Amina Bello")).await;
        let mut list = RegistryList::mount(Arc::new(store.clone()), COLLECTION).await;
        list.apply_pending();

        store.interrupt(COLLECTION, "connection reset");
        list.apply_pending();

        assert_eq!(list.error(), Some(LOAD_FAILED));
        assert!(!list.is_loading());
        assert!(!list.is_subscribed());
        assert_eq!(list.records().len(), 1);
        assert!(!list.next_update().await);

        create(&store, draft("22222222222", "Bola")).await;
        list.apply_pending();
        assert_eq!(list.records().len(), 1);
    }

    #[tokio::test]
    async fn failed_subscribe_reports_error() {
        let store = MemoryStore::new();
        store.fail_subscribe(true);
        let list = RegistryList::mount(Arc::new(store.clone()), COLLECTION).await;
        assert_eq!(list.error(), Some(LOAD_FAILED));
        assert!(!list.is_loading());
        assert!(!list.is_subscribed());
    }

    #[tokio::test]
    async fn confirmed_delete_disappears_from_listing() {
        let store = MemoryStore::new();
        let id = create(&store, draft("12345678901", "Amina Bello")).await;
        let mut list = RegistryList::mount(Arc::new(store.clone()), COLLECTION).await;
        list.apply_pending();

        list.request_delete(id);
        assert_eq!(list.dialog().target(), Some(id));
        assert_eq!(list.confirm_delete().await, DeleteOutcome::Deleted(id));
        list.apply_pending();

        assert!(list.records().is_empty());
        assert!(!list.dialog().is_open());
        assert!(list.error().is_none());
    }

    #[tokio::test]
    async fn cancelled_delete_keeps_record() {
        let store = MemoryStore::new();
        let id = create(&store, draft("12345678901", "Amina Bello")).await;
        let mut list = RegistryList::mount(Arc::new(store.clone()), COLLECTION).await;
        list.apply_pending();

        list.request_delete(id);
        list.cancel_delete();
        assert_eq!(list.confirm_delete().await, DeleteOutcome::Ignored);
        list.apply_pending();
        assert_eq!(list.records().len(), 1);
    }

    #[tokio::test]
    async fn deleting_already_deleted_record_surfaces_error() {
        let store = MemoryStore::new();
        let id = create(&store, draft("12345678901", "Amina Bello")).await;
        let mut list = RegistryList::mount(Arc::new(store.clone()), COLLECTION).await;
        store.remove(COLLECTION, id).await.unwrap();

        list.request_delete(id);
        let outcome = list.confirm_delete().await;

        assert!(matches!(outcome, DeleteOutcome::Failed(_)));
        assert_eq!(list.error(), Some(DELETE_FAILED));
        assert!(!list.dialog().is_open());

        list.dismiss_error();
        assert!(list.error().is_none());
    }

    #[tokio::test]
    async fn edit_is_a_no_op() {
        let store = MemoryStore::new();
        let id = create(&store, draft("12345678901", "Amina Bello")).await;
        let mut list = RegistryList::mount(Arc::new(store.clone()), COLLECTION).await;
        list.apply_pending();

        list.edit(id);
        assert_eq!(list.records().len(), 1);
        assert_eq!(list.records()[0].fields.get(Field::Name), "Amina Bello");
        assert!(!list.dialog().is_open());
    }
}
