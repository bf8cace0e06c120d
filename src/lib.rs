pub mod attendance;
pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod models;
pub mod repository;
pub mod seating;
pub mod services;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use repository::SeatingRepository;
use seating::SeatingPolicy;
use services::{AttendanceService, ReportingService, SeatingAssignmentService};

pub use error::{Error, Result};

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub seating: SeatingAssignmentService,
    pub attendance: AttendanceService,
    pub reporting: ReportingService,
}

impl AppState {
    pub fn new(repo: Arc<dyn SeatingRepository>, policy: SeatingPolicy) -> Arc<Self> {
        Arc::new(Self {
            seating: SeatingAssignmentService::new(repo.clone(), policy),
            attendance: AttendanceService::new(repo.clone()),
            reporting: ReportingService::new(repo),
        })
    }
}

/// Main router: service banner, health check and the `/api` tree.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Guest Seating API v0.1" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
