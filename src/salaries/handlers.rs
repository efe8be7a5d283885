use axum::{
    extract::{Path, State},
    routing::{get, patch},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use super::data::SalaryRow;
use crate::{error::ApiError, state::AppState};

#[derive(Debug, Serialize)]
pub struct ColumnView {
    pub key: &'static str,
    pub header: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SalaryPage {
    pub columns: Vec<ColumnView>,
    pub rows: Vec<SalaryRow>,
}

#[derive(Debug, Deserialize)]
pub struct CommitCellRequest {
    pub value: String,
}

pub fn salary_routes() -> Router<AppState> {
    Router::new()
        .route("/salaries", get(get_salaries))
        .route("/salaries/:row/:column", patch(commit_cell))
}

#[instrument(skip(state))]
pub async fn get_salaries(State(state): State<AppState>) -> Json<SalaryPage> {
    let grid = state.salaries.read().await;
    Json(SalaryPage {
        columns: grid
            .columns()
            .iter()
            .map(|c| ColumnView {
                key: c.key(),
                header: c.header(),
            })
            .collect(),
        rows: grid.visible().iter().map(|r| r.as_ref().clone()).collect(),
    })
}

#[instrument(skip(state, body))]
pub async fn commit_cell(
    State(state): State<AppState>,
    Path((row, column)): Path<(usize, String)>,
    Json(body): Json<CommitCellRequest>,
) -> Result<Json<SalaryRow>, ApiError> {
    let mut grid = state.salaries.write().await;
    match grid.commit(row, &column, body.value) {
        Ok(updated) => Ok(Json(updated.as_ref().clone())),
        Err(e) => {
            warn!(error = %e, "salary cell commit rejected");
            Err(ApiError::NotFound(e.to_string()))
        }
    }
}
