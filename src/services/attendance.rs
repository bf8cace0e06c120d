use std::sync::Arc;

use tracing::info;
use validator::Validate;

use crate::attendance::{validate_override, validate_rsvp, AttendanceSummary};
use crate::error::{Error, Result};
use crate::models::{Guest, ManualOverride, NewGuest, RsvpSubmission};
use crate::repository::SeatingRepository;

/// Writes to the two attendance inputs of a guest.
///
/// Neither write touches table assignments: a seated guest whose
/// attendance changes keeps the seat until a host unassigns them.
#[derive(Clone)]
pub struct AttendanceService {
    repo: Arc<dyn SeatingRepository>,
}

impl AttendanceService {
    pub fn new(repo: Arc<dyn SeatingRepository>) -> Self {
        Self { repo }
    }

    /// Host edit of the invitation. A lower `max_attendees` caps the resolved
    /// headcount of an earlier RSVP or override without rewriting it.
    pub async fn update_guest(&self, guest_id: i64, update: NewGuest) -> Result<Guest> {
        let guest = self.repo.update_guest(guest_id, update).await?;
        info!("Guest {} updated, max_attendees {}", guest_id, guest.max_attendees);
        Ok(guest)
    }

    /// Guest-facing confirmation. Clears any manual override.
    pub async fn submit_rsvp(&self, guest_id: i64, submission: RsvpSubmission) -> Result<Guest> {
        submission
            .validate()
            .map_err(|e| Error::InvalidAttendanceInput(e.to_string()))?;

        let guest = self.repo.guest(guest_id).await?;
        validate_rsvp(&guest, &submission)?;

        self.repo.save_rsvp(guest_id, submission).await?;
        if guest.manual_override.is_some() {
            info!("Guest {} answered digitally, manual override cleared", guest_id);
        } else {
            info!("Guest {} RSVP saved", guest_id);
        }

        self.repo.guest(guest_id).await
    }

    /// Host-entered status and count; `None` removes the override.
    pub async fn set_manual_override(
        &self,
        guest_id: i64,
        manual: Option<ManualOverride>,
    ) -> Result<Guest> {
        if let Some(manual) = &manual {
            let guest = self.repo.guest(guest_id).await?;
            validate_override(&guest, manual)?;
        }

        let guest = self.repo.save_manual_override(guest_id, manual).await?;
        info!("Guest {} manual override set to {:?}", guest_id, manual);
        Ok(guest)
    }

    /// Quick headcount edit from the guest list: a positive count marks the
    /// guest attending, zero marks them declined. Returns the new event totals.
    pub async fn set_attending_count(&self, guest_id: i64, count: i32) -> Result<AttendanceSummary> {
        if count < 0 {
            return Err(Error::invalid_attendance(format!(
                "headcount cannot be negative, got {count}"
            )));
        }

        let manual = ManualOverride {
            attending: count > 0,
            count: Some(count),
        };
        let guest = self.set_manual_override(guest_id, Some(manual)).await?;
        self.summary(guest.event_id).await
    }

    pub async fn summary(&self, event_id: i64) -> Result<AttendanceSummary> {
        self.repo.event(event_id).await?;
        let guests = self.repo.event_guests(event_id).await?;
        Ok(AttendanceSummary::from_guests(&guests))
    }
}
