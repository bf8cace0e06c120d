use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::attendance::{resolve_count, resolve_status, AttendanceStatus};
use crate::error::{Error, Result};
use crate::models::{Guest, NewTable, Table, TableAssignment};
use crate::repository::SeatingRepository;
use crate::seating::{SeatingLedger, SeatingPolicy};

/// Assigns guests to tables under the capacity and attendance rules.
///
/// Every write goes through [`SeatingRepository::assign_guests`], which
/// evaluates the ledger and inserts in one critical section. A contention
/// signal from the store is retried once; if it persists, the current state
/// is re-read and reported as `AlreadyAssigned` or `CapacityExceeded`, or as
/// `Contention` when neither holds.
#[derive(Clone)]
pub struct SeatingAssignmentService {
    repo: Arc<dyn SeatingRepository>,
    policy: SeatingPolicy,
}

impl SeatingAssignmentService {
    pub fn new(repo: Arc<dyn SeatingRepository>, policy: SeatingPolicy) -> Self {
        Self { repo, policy }
    }

    pub fn policy(&self) -> SeatingPolicy {
        self.policy
    }

    pub async fn assign(&self, guest_id: i64, table_id: i64) -> Result<TableAssignment> {
        let mut created = self.commit(table_id, vec![guest_id]).await?;
        let assignment = created.pop().ok_or(Error::Contention)?;

        info!("Guest {} seated at table {}", guest_id, table_id);
        Ok(assignment)
    }

    /// Seats the whole batch or nobody.
    ///
    /// Duplicate ids are collapsed. The combined headcount of the batch is
    /// checked against the table once, so a batch that would only fit
    /// guest-by-guest in some order is still rejected.
    pub async fn bulk_assign(&self, guest_ids: &[i64], table_id: i64) -> Result<Vec<TableAssignment>> {
        let mut seen = HashSet::with_capacity(guest_ids.len());
        let batch: Vec<i64> = guest_ids.iter().copied().filter(|id| seen.insert(*id)).collect();

        if batch.is_empty() {
            // пустой пакет: только проверяем, что стол существует
            self.repo.table(table_id).await?;
            return Ok(Vec::new());
        }

        let created = self.commit(table_id, batch).await?;
        info!("{} guest(s) seated at table {}", created.len(), table_id);
        Ok(created)
    }

    pub async fn unassign(&self, guest_id: i64) -> Result<TableAssignment> {
        let removed = self.repo.remove_assignment(guest_id).await?;
        info!("Guest {} unseated from table {}", guest_id, removed.table_id);
        Ok(removed)
    }

    /// Host edit of a table. Lowering the capacity below the seats already
    /// taken keeps every guest; the ledger then reports the overflow.
    pub async fn update_table(&self, table_id: i64, update: NewTable) -> Result<Table> {
        let table = self.repo.update_table(table_id, update).await?;
        let ledger = self.ledger(table_id).await?;
        if ledger.over_capacity() > 0 {
            warn!(
                "Table {} resized to {} with {} seats taken",
                table_id, table.capacity, ledger.occupied
            );
        } else {
            info!("Table {} updated, capacity {}", table_id, table.capacity);
        }
        Ok(table)
    }

    /// Current occupancy of a table, resolved fresh from attendance.
    pub async fn ledger(&self, table_id: i64) -> Result<SeatingLedger> {
        let table = self.repo.table(table_id).await?;
        let seated = self.repo.table_guests(table_id).await?;
        Ok(SeatingLedger::build(&table, &seated))
    }

    pub async fn assignment_for(&self, guest_id: i64) -> Result<Option<TableAssignment>> {
        self.repo.assignment_for(guest_id).await
    }

    /// Guests of the event who resolve as attending and have no table yet.
    pub async fn unassigned_attending(&self, event_id: i64) -> Result<Vec<Guest>> {
        self.repo.event(event_id).await?;
        let guests = self.repo.event_guests(event_id).await?;
        let seated: HashSet<i64> = self
            .repo
            .event_assignments(event_id)
            .await?
            .into_iter()
            .map(|a| a.guest_id)
            .collect();

        Ok(guests
            .into_iter()
            .filter(|g| !seated.contains(&g.id))
            .filter(|g| resolve_status(g) == AttendanceStatus::Attending)
            .collect())
    }

    async fn commit(&self, table_id: i64, guest_ids: Vec<i64>) -> Result<Vec<TableAssignment>> {
        match self.repo.assign_guests(table_id, guest_ids.clone(), self.policy).await {
            Err(Error::Contention) => {
                warn!("Seating contention on table {}, retrying once", table_id);
            }
            other => return other,
        }

        match self.repo.assign_guests(table_id, guest_ids.clone(), self.policy).await {
            Err(Error::Contention) => Err(self.explain_contention(table_id, &guest_ids).await),
            other => other,
        }
    }

    /// Turns a persistent contention signal into the outcome the caller
    /// would have seen had the competing write committed first. When the
    /// fresh state still fits the batch, nothing explains the conflict and
    /// `Contention` is returned as is.
    async fn explain_contention(&self, table_id: i64, guest_ids: &[i64]) -> Error {
        warn!("Seating contention on table {} persisted after retry", table_id);

        let mut needed = 0u32;
        for &guest_id in guest_ids {
            match self.repo.assignment_for(guest_id).await {
                Ok(Some(current)) => {
                    return Error::AlreadyAssigned {
                        guest_id,
                        table_id: current.table_id,
                    }
                }
                Ok(None) => {}
                Err(err) => return err,
            }
            match self.repo.guest(guest_id).await {
                Ok(guest) => needed = needed.saturating_add(resolve_count(&guest)),
                Err(err) => return err,
            }
        }

        match self.ledger(table_id).await {
            Ok(ledger) if ledger.can_seat(needed) => Error::Contention,
            Ok(ledger) => Error::CapacityExceeded {
                needed,
                available: ledger.remaining,
            },
            Err(err) => err,
        }
    }
}
