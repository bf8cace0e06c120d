use serde::Serialize;

use crate::attendance::resolve_count;
use crate::models::{Guest, Table};

/// One seated party and the seats it takes right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatedParty {
    pub guest_id: i64,
    pub display_name: String,
    pub seats: u32,
}

/// Point-in-time view of a table's occupancy.
///
/// Built from the guests currently assigned to the table and their resolved
/// counts. It is never persisted: a changed RSVP or override shows up the
/// next time a ledger is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatingLedger {
    pub table_id: i64,
    pub capacity: u32,
    pub occupied: u32,
    pub remaining: u32,
    pub parties: Vec<SeatedParty>,
}

impl SeatingLedger {
    pub fn build<'a>(table: &Table, seated: impl IntoIterator<Item = &'a Guest>) -> Self {
        let capacity = u32::try_from(table.capacity).unwrap_or(0);

        let parties: Vec<SeatedParty> = seated
            .into_iter()
            .map(|guest| SeatedParty {
                guest_id: guest.id,
                display_name: guest.display_name(),
                seats: resolve_count(guest),
            })
            .collect();

        let occupied = parties
            .iter()
            .fold(0u32, |sum, party| sum.saturating_add(party.seats));

        SeatingLedger {
            table_id: table.id,
            capacity,
            occupied,
            remaining: capacity.saturating_sub(occupied),
            parties,
        }
    }

    pub fn is_full(&self) -> bool {
        self.remaining == 0
    }

    /// Seats over capacity after seated guests raised their headcount.
    pub fn over_capacity(&self) -> u32 {
        self.occupied.saturating_sub(self.capacity)
    }

    pub fn can_seat(&self, needed: u32) -> bool {
        needed <= self.remaining
    }
}
