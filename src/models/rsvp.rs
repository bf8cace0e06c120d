use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// The guest's own confirmation, one per guest.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Rsvp {
    pub guest_id: i64,
    pub attending: Option<bool>,
    pub number_attending: Option<i32>,
    pub meal_preference: Option<String>,
    pub message: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(crate) const RSVP_COLUMNS: &str =
    "guest_id, attending, number_attending, meal_preference, message, submitted_at, updated_at";

/// Payload of the guest-facing confirmation form.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct RsvpSubmission {
    pub attending: Option<bool>,
    #[validate(range(min = 1))]
    pub number_attending: Option<i32>,
    #[validate(length(max = 200))]
    pub meal_preference: Option<String>,
    #[validate(length(max = 2000))]
    pub message: Option<String>,
}

impl RsvpSubmission {
    pub fn attending(number_attending: Option<i32>) -> Self {
        RsvpSubmission {
            attending: Some(true),
            number_attending,
            ..Default::default()
        }
    }

    pub fn declined() -> Self {
        RsvpSubmission {
            attending: Some(false),
            ..Default::default()
        }
    }
}
