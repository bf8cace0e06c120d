use serde::Deserialize;

use crate::attendance::{resolve_count, resolve_status, AttendanceStatus};
use crate::error::{Error, Result};
use crate::models::{Guest, Table, TableAssignment};
use crate::seating::SeatingLedger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SeatingPolicy {
    /// Only guests resolved as attending may be seated.
    pub require_confirmed: bool,
}

impl Default for SeatingPolicy {
    fn default() -> Self {
        SeatingPolicy {
            require_confirmed: true,
        }
    }
}

/// Validates seating `candidates` at `table` against a ledger taken in the
/// same critical section as the write that follows.
///
/// Per-guest checks run first and the first failure aborts the whole batch.
/// Capacity is then checked once for the batch total, so a batch either fits
/// entirely or is rejected entirely. Returns the seats the batch needs.
pub fn check_batch(
    policy: &SeatingPolicy,
    table: &Table,
    ledger: &SeatingLedger,
    candidates: &[Guest],
    existing: &[TableAssignment],
) -> Result<u32> {
    let mut needed = 0u32;

    for guest in candidates {
        if guest.event_id != table.event_id {
            return Err(Error::EventMismatch {
                guest_id: guest.id,
                table_id: table.id,
            });
        }

        if let Some(current) = existing.iter().find(|a| a.guest_id == guest.id) {
            return Err(Error::AlreadyAssigned {
                guest_id: guest.id,
                table_id: current.table_id,
            });
        }

        let status = resolve_status(guest);
        if policy.require_confirmed && status != AttendanceStatus::Attending {
            return Err(Error::NotAttending {
                guest_id: guest.id,
                status,
            });
        }

        needed = needed.saturating_add(resolve_count(guest));
    }

    if !ledger.can_seat(needed) {
        return Err(Error::CapacityExceeded {
            needed,
            available: ledger.remaining,
        });
    }

    Ok(needed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Honorific, ManualOverride};
    use chrono::Utc;
    use uuid::Uuid;

    fn table(capacity: i32) -> Table {
        Table {
            id: 3,
            event_id: 1,
            name: "Nasi".to_string(),
            capacity,
        }
    }

    fn guest(id: i64, attending: Option<bool>, count: Option<i32>) -> Guest {
        Guest {
            id,
            event_id: 1,
            unique_id: Uuid::new_v4(),
            name: format!("guest-{id}"),
            honorific: Honorific::Unspecified,
            email: None,
            phone_number: None,
            invitation_method: None,
            max_attendees: 4,
            manual_override: attending.map(|attending| ManualOverride { attending, count }),
            rsvp: None,
        }
    }

    fn check(candidates: &[Guest], seated: &[Guest], capacity: i32) -> Result<u32> {
        let table = table(capacity);
        let ledger = SeatingLedger::build(&table, seated);
        check_batch(&SeatingPolicy::default(), &table, &ledger, candidates, &[])
    }

    #[test]
    fn fits_returns_needed_seats() {
        let needed = check(&[guest(1, Some(true), Some(2))], &[], 4);
        assert_eq!(needed.ok(), Some(2));
    }

    #[test]
    fn rejects_unconfirmed_guest() {
        let err = check(&[guest(1, None, None)], &[], 4);
        assert!(matches!(
            err,
            Err(Error::NotAttending {
                guest_id: 1,
                status: AttendanceStatus::Unknown
            })
        ));
    }

    #[test]
    fn bypass_allows_unconfirmed_guest() {
        let table = table(4);
        let ledger = SeatingLedger::build(&table, &Vec::<Guest>::new());
        let policy = SeatingPolicy {
            require_confirmed: false,
        };
        let needed = check_batch(&policy, &table, &ledger, &[guest(1, None, None)], &[]);
        assert_eq!(needed.ok(), Some(0));
    }

    #[test]
    fn batch_total_is_checked_once() {
        // каждый по отдельности помещается, вместе нет
        let batch = [guest(1, Some(true), Some(2)), guest(2, Some(true), Some(2))];
        let seated = [guest(9, Some(true), Some(1))];
        let err = check(&batch, &seated, 4);
        assert!(matches!(
            err,
            Err(Error::CapacityExceeded {
                needed: 4,
                available: 3
            })
        ));
    }

    #[test]
    fn existing_assignment_aborts_batch() {
        let table = table(8);
        let ledger = SeatingLedger::build(&table, &Vec::<Guest>::new());
        let existing = [TableAssignment {
            id: 1,
            event_id: 1,
            guest_id: 2,
            table_id: 5,
            assigned_at: Utc::now(),
        }];
        let batch = [guest(1, Some(true), Some(1)), guest(2, Some(true), Some(1))];
        let err = check_batch(&SeatingPolicy::default(), &table, &ledger, &batch, &existing);
        assert!(matches!(
            err,
            Err(Error::AlreadyAssigned {
                guest_id: 2,
                table_id: 5
            })
        ));
    }

    #[test]
    fn guest_from_other_event_is_rejected() {
        let mut stranger = guest(1, Some(true), Some(1));
        stranger.event_id = 2;
        assert!(matches!(
            check(&[stranger], &[], 8),
            Err(Error::EventMismatch { guest_id: 1, table_id: 3 })
        ));
    }
}
