//! Attendance resolution.
//!
//! A guest's attendance has two competing inputs: the RSVP the guest submits
//! and the override a host enters by hand. The functions here turn them into a
//! single status and headcount. Nothing is cached; callers resolve again
//! whenever they need a number.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{Guest, ManualOverride, RsvpSubmission};

/// Headcount assumed when a host marks a guest attending without a number.
pub const MANUAL_COUNT_FALLBACK: u32 = 1;

/// Headcount assumed when a guest confirms without specifying how many.
pub const RSVP_COUNT_FALLBACK: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Attending,
    NotAttending,
    Unknown,
}

impl AttendanceStatus {
    fn from_tri_state(value: Option<bool>) -> Self {
        match value {
            Some(true) => AttendanceStatus::Attending,
            Some(false) => AttendanceStatus::NotAttending,
            None => AttendanceStatus::Unknown,
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AttendanceStatus::Attending => "attending",
            AttendanceStatus::NotAttending => "not attending",
            AttendanceStatus::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

pub fn resolve_status(guest: &Guest) -> AttendanceStatus {
    if let Some(manual) = &guest.manual_override {
        return AttendanceStatus::from_tri_state(Some(manual.attending));
    }
    match &guest.rsvp {
        Some(rsvp) => AttendanceStatus::from_tri_state(rsvp.attending),
        None => AttendanceStatus::Unknown,
    }
}

/// Resolved headcount, always within `0..=max_attendees`.
pub fn resolve_count(guest: &Guest) -> u32 {
    let cap = u32::try_from(guest.max_attendees).unwrap_or(0);
    unclamped_count(guest).min(cap)
}

fn unclamped_count(guest: &Guest) -> u32 {
    if let Some(manual) = &guest.manual_override {
        if !manual.attending {
            return 0;
        }
        return match manual.count {
            Some(count) => non_negative(count),
            None => MANUAL_COUNT_FALLBACK,
        };
    }

    match &guest.rsvp {
        Some(rsvp) if rsvp.attending == Some(true) => rsvp
            .number_attending
            .filter(|n| *n > 0)
            .map_or(RSVP_COUNT_FALLBACK, non_negative),
        _ => 0,
    }
}

fn non_negative(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

/// Cross-field checks for a guest-submitted RSVP.
pub fn validate_rsvp(guest: &Guest, submission: &RsvpSubmission) -> Result<()> {
    let Some(number) = submission.number_attending else {
        return Ok(());
    };
    if submission.attending != Some(true) {
        return Err(Error::invalid_attendance(
            "a headcount can only be given when attending",
        ));
    }
    check_headcount(guest, number)
}

/// Cross-field checks for a host-entered override.
pub fn validate_override(guest: &Guest, manual: &ManualOverride) -> Result<()> {
    match (manual.attending, manual.count) {
        (_, None) => Ok(()),
        (true, Some(count)) => check_headcount(guest, count),
        // "0 attending" is how the guest list records a decline
        (false, Some(0)) => Ok(()),
        (false, Some(_)) => Err(Error::invalid_attendance(
            "manual attending count requires attending = true",
        )),
    }
}

fn check_headcount(guest: &Guest, count: i32) -> Result<()> {
    if count < 1 {
        return Err(Error::invalid_attendance(format!(
            "headcount must be positive, got {count}"
        )));
    }
    if count > guest.max_attendees {
        return Err(Error::invalid_attendance(format!(
            "headcount {count} exceeds the {} people this invitation covers",
            guest.max_attendees
        )));
    }
    Ok(())
}

/// Event-wide counters shown on the host dashboard and guest list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub total_guests: usize,
    pub confirmed_guests: usize,
    pub declined_guests: usize,
    pub pending_guests: usize,
    pub total_attending: u32,
}

impl AttendanceSummary {
    pub fn from_guests<'a>(guests: impl IntoIterator<Item = &'a Guest>) -> Self {
        guests
            .into_iter()
            .fold(AttendanceSummary::default(), |mut summary, guest| {
                summary.total_guests += 1;
                match resolve_status(guest) {
                    AttendanceStatus::Attending => summary.confirmed_guests += 1,
                    AttendanceStatus::NotAttending => summary.declined_guests += 1,
                    AttendanceStatus::Unknown => summary.pending_guests += 1,
                }
                summary.total_attending = summary.total_attending.saturating_add(resolve_count(guest));
                summary
            })
    }
}
