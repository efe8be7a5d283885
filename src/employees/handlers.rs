use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{delete, get},
    Json, Router,
};
use time::OffsetDateTime;
use tokio_stream::{Stream, StreamExt};
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::delete::{DeleteDialog, DeleteOutcome, DELETE_FAILED};
use super::dto::{
    employees_from_snapshot, registry_columns, registry_order, CreatedEmployeeResponse,
    EmployeeDraft, EmployeePage,
};
use super::form::{RegistrationForm, SubmitOutcome};
use super::list::LOAD_FAILED;
use crate::{
    error::ApiError,
    state::AppState,
    store::{watch, StoreError},
};

pub fn employee_routes() -> Router<AppState> {
    Router::new()
        .route("/employees", get(list_employees).post(create_employee))
        .route("/employees/stream", get(stream_employees))
        .route("/employees/:id", delete(delete_employee))
}

#[instrument(skip(state))]
pub async fn list_employees(
    State(state): State<AppState>,
) -> Result<Json<EmployeePage>, ApiError> {
    let snapshot = state
        .store
        .query(&state.config.employees_collection, &registry_order())
        .await
        .map_err(|e| {
            error!(error = %e, "list employees failed");
            ApiError::Unavailable(LOAD_FAILED.into())
        })?;
    Ok(Json(EmployeePage {
        columns: registry_columns(),
        rows: employees_from_snapshot(snapshot),
    }))
}

/// Server-sent events: one `snapshot` event per change. The subscription is
/// released when the client goes away and the stream is dropped.
#[instrument(skip(state))]
pub async fn stream_employees(
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let feed = watch(
        state.store.as_ref(),
        &state.config.employees_collection,
        registry_order(),
    )
    .await
    .map_err(|e| {
        error!(error = %e, "subscribe to employees failed");
        ApiError::Unavailable(LOAD_FAILED.into())
    })?;

    let events = feed.map(|event| {
        let sse = match event {
            Ok(snapshot) => Event::default()
                .event("snapshot")
                .json_data(employees_from_snapshot(snapshot))
                .unwrap_or_else(|e| {
                    error!(error = %e, "encode employee snapshot failed");
                    Event::default().event("error").data(LOAD_FAILED)
                }),
            Err(e) => {
                error!(error = %e, "employee subscription failed");
                Event::default().event("error").data(LOAD_FAILED)
            }
        };
        Ok(sse)
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

#[instrument(skip(state, draft))]
pub async fn create_employee(
    State(state): State<AppState>,
    Json(draft): Json<EmployeeDraft>,
) -> Result<(StatusCode, Json<CreatedEmployeeResponse>), ApiError> {
    let mut form = RegistrationForm::with_draft(draft);
    let today = OffsetDateTime::now_utc().date();
    match form
        .submit(state.store.as_ref(), &state.config.employees_collection, today)
        .await
    {
        SubmitOutcome::Created(id) => Ok((StatusCode::CREATED, Json(CreatedEmployeeResponse { id }))),
        SubmitOutcome::Invalid(errors) => Err(ApiError::Validation(errors)),
        SubmitOutcome::Failed(message) => Err(ApiError::Unavailable(message)),
        SubmitOutcome::Busy => Err(ApiError::Unavailable("Submission already in progress".into())),
    }
}

#[instrument(skip(state))]
pub async fn delete_employee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    // The client has already confirmed; open and confirm in one step.
    let mut dialog = DeleteDialog::default();
    dialog.request(id);
    match dialog
        .confirm(state.store.as_ref(), &state.config.employees_collection)
        .await
    {
        DeleteOutcome::Deleted(_) => {
            info!(%id, "employee removed via api");
            Ok(StatusCode::NO_CONTENT)
        }
        DeleteOutcome::Failed(StoreError::NotFound { .. }) => {
            Err(ApiError::NotFound(DELETE_FAILED.into()))
        }
        DeleteOutcome::Failed(_) | DeleteOutcome::Ignored => {
            Err(ApiError::Unavailable(DELETE_FAILED.into()))
        }
    }
}
