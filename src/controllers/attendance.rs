use axum::{
    extract::{Path, State},
    routing::{get, patch, put},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::attendance::AttendanceSummary;
use crate::error::Result;
use crate::models::{Guest, ManualOverride, NewGuest, RsvpSubmission};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events/{event_id}/attendance", get(attendance_summary))
        .route("/guests/{guest_id}", put(update_guest))
        .route("/guests/{guest_id}/rsvp", put(submit_rsvp))
        .route("/guests/{guest_id}/override", put(set_override))
        .route("/guests/{guest_id}/attending-count", patch(set_attending_count))
}

/// Both fields null clears the override.
#[derive(Debug, Deserialize)]
pub struct OverrideRequest {
    pub is_attending: Option<bool>,
    pub count: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AttendingCountRequest {
    #[validate(range(min = 0))]
    pub count: i32,
}

pub async fn attendance_summary(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<i64>,
) -> Result<Json<AttendanceSummary>> {
    Ok(Json(state.attendance.summary(event_id).await?))
}

pub async fn update_guest(
    State(state): State<Arc<AppState>>,
    Path(guest_id): Path<i64>,
    Json(update): Json<NewGuest>,
) -> Result<Json<Guest>> {
    Ok(Json(state.attendance.update_guest(guest_id, update).await?))
}

pub async fn submit_rsvp(
    State(state): State<Arc<AppState>>,
    Path(guest_id): Path<i64>,
    Json(submission): Json<RsvpSubmission>,
) -> Result<Json<Guest>> {
    Ok(Json(state.attendance.submit_rsvp(guest_id, submission).await?))
}

pub async fn set_override(
    State(state): State<Arc<AppState>>,
    Path(guest_id): Path<i64>,
    Json(req): Json<OverrideRequest>,
) -> Result<Json<Guest>> {
    let manual = ManualOverride::from_parts(req.is_attending, req.count)?;
    Ok(Json(state.attendance.set_manual_override(guest_id, manual).await?))
}

// Быстрое редактирование числа гостей из списка
pub async fn set_attending_count(
    State(state): State<Arc<AppState>>,
    Path(guest_id): Path<i64>,
    Json(req): Json<AttendingCountRequest>,
) -> Result<Json<AttendanceSummary>> {
    req.validate()?;
    Ok(Json(
        state.attendance.set_attending_count(guest_id, req.count).await?,
    ))
}
