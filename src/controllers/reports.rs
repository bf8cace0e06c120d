use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::Result;
use crate::services::{AssignmentRow, TableOverview};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events/{event_id}/tables", get(seating_overview))
        .route("/events/{event_id}/assignments/export", get(export_assignments))
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub event_id: i64,
    pub rows: Vec<AssignmentRow>,
}

pub async fn seating_overview(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<i64>,
) -> Result<Json<Vec<TableOverview>>> {
    Ok(Json(state.reporting.seating_overview(event_id).await?))
}

pub async fn export_assignments(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<i64>,
) -> Result<Json<ExportResponse>> {
    let rows = state.reporting.assignment_rows(event_id).await?;
    tracing::info!("Exported {} seating row(s) for event {}", rows.len(), event_id);
    Ok(Json(ExportResponse { event_id, rows }))
}
