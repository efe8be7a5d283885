use time::Date;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::dto::{EmployeeDraft, Field, FieldErrors};
use super::validation::validate;
use crate::store::{RecordStore, StoreError};

pub const SUBMIT_FAILED: &str = "Failed to add employee. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created(Uuid),
    Invalid(FieldErrors),
    Failed(String),
    /// A submission is already in flight.
    Busy,
}

/// State of the "Add New Employee" form.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    open: bool,
    draft: EmployeeDraft,
    errors: FieldErrors,
    submit_error: Option<String>,
    submitting: bool,
}

impl RegistrationForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Form pre-filled with `draft`, as when a client posts the whole form.
    pub fn with_draft(draft: EmployeeDraft) -> Self {
        Self {
            open: true,
            draft,
            ..Self::default()
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn draft(&self) -> &EmployeeDraft {
        &self.draft
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        if self.submitting {
            return;
        }
        self.open = false;
    }

    /// Typing into a field drops its error until the next submit.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        self.draft.set(field, value.into());
        self.errors.remove(&field);
    }

    /// Validate and, when valid, mark the form as submitting and return the
    /// draft to persist.
    pub fn begin_submit(&mut self, today: Date) -> Result<EmployeeDraft, SubmitOutcome> {
        if self.submitting {
            return Err(SubmitOutcome::Busy);
        }
        self.submit_error = None;
        match validate(&self.draft, today) {
            Ok(()) => {
                self.errors.clear();
                self.submitting = true;
                Ok(self.draft.clone())
            }
            Err(errors) => {
                warn!(fields = ?errors.keys().collect::<Vec<_>>(), "employee form rejected");
                self.errors = errors.clone();
                Err(SubmitOutcome::Invalid(errors))
            }
        }
    }

    pub fn finish_submit(&mut self, result: Result<Uuid, StoreError>) -> SubmitOutcome {
        self.submitting = false;
        match result {
            Ok(id) => {
                info!(%id, "employee created");
                self.draft = EmployeeDraft::default();
                self.open = false;
                SubmitOutcome::Created(id)
            }
            Err(e) => {
                error!(error = %e, "add employee failed");
                self.submit_error = Some(SUBMIT_FAILED.to_string());
                SubmitOutcome::Failed(SUBMIT_FAILED.to_string())
            }
        }
    }

    /// Validate, then insert into `collection`. The store assigns the
    /// identifier and the `createdAt`/`updatedAt` timestamps.
    pub async fn submit(
        &mut self,
        store: &dyn RecordStore,
        collection: &str,
        today: Date,
    ) -> SubmitOutcome {
        let draft = match self.begin_submit(today) {
            Ok(d) => d,
            Err(outcome) => return outcome,
        };
        let result = store.insert(collection, draft.into_document()).await;
        self.finish_submit(result)
    }
}
