use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
}
