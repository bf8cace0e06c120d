use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct Table {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub capacity: i32,
}

/// Links one guest to one table. `guest_id` is unique across all assignments.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableAssignment {
    pub id: i64,
    pub event_id: i64,
    pub guest_id: i64,
    pub table_id: i64,
    pub assigned_at: DateTime<Utc>,
}

pub(crate) const ASSIGNMENT_COLUMNS: &str = "id, event_id, guest_id, table_id, assigned_at";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewTable {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(range(min = 1))]
    pub capacity: i32,
}

impl NewTable {
    pub fn new(name: impl Into<String>, capacity: i32) -> Self {
        NewTable {
            name: name.into(),
            capacity,
        }
    }
}
