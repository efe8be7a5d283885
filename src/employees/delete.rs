use tracing::{error, info};
use uuid::Uuid;

use crate::store::{RecordStore, StoreError};

pub const DELETE_FAILED: &str = "Failed to delete employee. Please try again later.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(Uuid),
    Failed(StoreError),
    /// Nothing to confirm, or a request is already in flight.
    Ignored,
}

/// Two-step guarded deletion: `request` only opens the dialog, the store is
/// touched on `confirm`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteDialog {
    open: bool,
    target: Option<Uuid>,
    in_flight: bool,
}

impl DeleteDialog {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn target(&self) -> Option<Uuid> {
        self.target
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Cancel and Delete are both disabled while a request is in flight.
    pub fn actions_enabled(&self) -> bool {
        !self.in_flight
    }

    pub fn request(&mut self, id: Uuid) {
        if self.in_flight {
            return;
        }
        self.target = Some(id);
        self.open = true;
    }

    pub fn cancel(&mut self) {
        if self.in_flight {
            return;
        }
        self.close();
    }

    /// Mark the delete as in flight and hand out the target to remove.
    pub fn begin(&mut self) -> Option<Uuid> {
        if !self.open || self.in_flight {
            return None;
        }
        let target = self.target?;
        self.in_flight = true;
        Some(target)
    }

    /// Settle an in-flight delete. The dialog closes on success and failure.
    pub fn finish(&mut self, id: Uuid, result: Result<(), StoreError>) -> DeleteOutcome {
        self.in_flight = false;
        self.close();
        match result {
            Ok(()) => {
                info!(%id, "employee deleted");
                DeleteOutcome::Deleted(id)
            }
            Err(e) => {
                error!(error = %e, %id, "delete employee failed");
                DeleteOutcome::Failed(e)
            }
        }
    }

    pub async fn confirm(&mut self, store: &dyn RecordStore, collection: &str) -> DeleteOutcome {
        let Some(id) = self.begin() else {
            return DeleteOutcome::Ignored;
        };
        let result = store.remove(collection, id).await;
        self.finish(id, result)
    }

    fn close(&mut self) {
        self.open = false;
        self.target = None;
    }
}
