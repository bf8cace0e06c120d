pub mod attendance;
pub mod reports;
pub mod seating;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;

use crate::error::Error;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(seating::routes())
        .merge(attendance::routes())
        .merge(reports::routes())
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Error::AlreadyAssigned { .. } => (StatusCode::CONFLICT, "ALREADY_ASSIGNED"),
            Error::NotAssigned { .. } => (StatusCode::NOT_FOUND, "NOT_ASSIGNED"),
            Error::NotAttending { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "NOT_ATTENDING"),
            Error::CapacityExceeded { .. } => (StatusCode::CONFLICT, "CAPACITY_EXCEEDED"),
            Error::InvalidAttendanceInput(_) => {
                (StatusCode::BAD_REQUEST, "INVALID_ATTENDANCE_INPUT")
            }
            Error::InvalidInput(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Error::GuestNotFound(_) | Error::TableNotFound(_) | Error::EventNotFound(_) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND")
            }
            Error::EventMismatch { .. } => (StatusCode::BAD_REQUEST, "EVENT_MISMATCH"),
            Error::TableNameTaken { .. } => (StatusCode::CONFLICT, "TABLE_NAME_TAKEN"),
            Error::Contention => (StatusCode::CONFLICT, "CONTENTION"),
            Error::Database(err) => {
                tracing::error!(error = %err, "Database error");
                let body = json!({
                    "error": "An internal error occurred",
                    "code": "INTERNAL_ERROR",
                });
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
            }
        };

        let mut body = json!({
            "error": self.to_string(),
            "code": code,
        });
        if let Error::CapacityExceeded { needed, available } = self {
            body["needed"] = json!(needed);
            body["available"] = json!(available);
        }

        (status, Json(body)).into_response()
    }
}
