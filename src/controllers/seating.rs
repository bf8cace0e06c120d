use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use validator::Validate;

use crate::error::Result;
use crate::models::{Guest, NewTable, Table, TableAssignment};
use crate::seating::SeatingLedger;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tables/{table_id}", put(update_table))
        .route("/tables/{table_id}/ledger", get(table_ledger))
        .route("/tables/{table_id}/assignments", post(assign_guest))
        .route("/tables/{table_id}/assignments/bulk", post(bulk_assign))
        .route(
            "/guests/{guest_id}/assignment",
            get(guest_assignment).delete(unassign_guest),
        )
        .route("/events/{event_id}/unassigned", get(unassigned_attending))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AssignRequest {
    #[validate(range(min = 1))]
    pub guest_id: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BulkAssignRequest {
    #[validate(length(min = 1, max = 500))]
    pub guest_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct BulkAssignResponse {
    pub assignments: Vec<TableAssignment>,
    pub count: usize,
}

pub async fn update_table(
    State(state): State<Arc<AppState>>,
    Path(table_id): Path<i64>,
    Json(update): Json<NewTable>,
) -> Result<Json<Table>> {
    Ok(Json(state.seating.update_table(table_id, update).await?))
}

pub async fn table_ledger(
    State(state): State<Arc<AppState>>,
    Path(table_id): Path<i64>,
) -> Result<Json<SeatingLedger>> {
    Ok(Json(state.seating.ledger(table_id).await?))
}

pub async fn assign_guest(
    State(state): State<Arc<AppState>>,
    Path(table_id): Path<i64>,
    Json(req): Json<AssignRequest>,
) -> Result<(StatusCode, Json<TableAssignment>)> {
    req.validate()?;
    let assignment = state.seating.assign(req.guest_id, table_id).await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

pub async fn bulk_assign(
    State(state): State<Arc<AppState>>,
    Path(table_id): Path<i64>,
    Json(req): Json<BulkAssignRequest>,
) -> Result<(StatusCode, Json<BulkAssignResponse>)> {
    req.validate()?;
    let assignments = state.seating.bulk_assign(&req.guest_ids, table_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(BulkAssignResponse {
            count: assignments.len(),
            assignments,
        }),
    ))
}

pub async fn guest_assignment(
    State(state): State<Arc<AppState>>,
    Path(guest_id): Path<i64>,
) -> Result<Json<Value>> {
    let assignment = state.seating.assignment_for(guest_id).await?;
    Ok(Json(json!({
        "guest_id": guest_id,
        "assignment": assignment,
    })))
}

pub async fn unassign_guest(
    State(state): State<Arc<AppState>>,
    Path(guest_id): Path<i64>,
) -> Result<Json<TableAssignment>> {
    Ok(Json(state.seating.unassign(guest_id).await?))
}

pub async fn unassigned_attending(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<i64>,
) -> Result<Json<Vec<Guest>>> {
    Ok(Json(state.seating.unassigned_attending(event_id).await?))
}
