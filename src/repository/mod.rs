//! Storage for guests, tables and assignments.
//!
//! Two implementations:
//!
//! - [`PgSeatingRepository`]: PostgreSQL, one transaction per write with the
//!   target table row locked `FOR UPDATE`.
//! - [`InMemorySeatingRepository`]: all state behind one `tokio` mutex, used
//!   by tests and local runs.
//!
//! The trait returns boxed futures so the services can hold an
//! `Arc<dyn SeatingRepository>`.

pub mod memory;
pub mod postgres;

use futures::future::BoxFuture;

use crate::error::Result;
use crate::models::{
    Event, Guest, ManualOverride, NewGuest, NewTable, Rsvp, RsvpSubmission, Table,
    TableAssignment,
};
use crate::seating::SeatingPolicy;

pub use memory::InMemorySeatingRepository;
pub use postgres::PgSeatingRepository;

pub type RepoFuture<'a, T> = BoxFuture<'a, Result<T>>;

pub trait SeatingRepository: Send + Sync {
    fn create_event(&self, title: String) -> RepoFuture<'_, Event>;

    fn event(&self, event_id: i64) -> RepoFuture<'_, Event>;

    fn create_guest(&self, event_id: i64, guest: NewGuest) -> RepoFuture<'_, Guest>;

    /// Replaces the host-editable fields. RSVP, override and seat are kept.
    fn update_guest(&self, guest_id: i64, guest: NewGuest) -> RepoFuture<'_, Guest>;

    /// Deletes the guest together with its RSVP and assignment.
    fn delete_guest(&self, guest_id: i64) -> RepoFuture<'_, ()>;

    fn create_table(&self, event_id: i64, table: NewTable) -> RepoFuture<'_, Table>;

    /// Renames or resizes a table. Seated guests stay even if the new
    /// capacity is below what they occupy.
    fn update_table(&self, table_id: i64, table: NewTable) -> RepoFuture<'_, Table>;

    /// Deletes the table together with its assignments.
    fn delete_table(&self, table_id: i64) -> RepoFuture<'_, ()>;

    /// Guest with its RSVP attached.
    fn guest(&self, guest_id: i64) -> RepoFuture<'_, Guest>;

    fn table(&self, table_id: i64) -> RepoFuture<'_, Table>;

    fn event_guests(&self, event_id: i64) -> RepoFuture<'_, Vec<Guest>>;

    fn event_tables(&self, event_id: i64) -> RepoFuture<'_, Vec<Table>>;

    fn event_assignments(&self, event_id: i64) -> RepoFuture<'_, Vec<TableAssignment>>;

    /// Guests currently assigned to the table, RSVPs attached.
    fn table_guests(&self, table_id: i64) -> RepoFuture<'_, Vec<Guest>>;

    fn assignment_for(&self, guest_id: i64) -> RepoFuture<'_, Option<TableAssignment>>;

    /// Upserts the guest's RSVP and clears any manual override atomically.
    fn save_rsvp(&self, guest_id: i64, submission: RsvpSubmission) -> RepoFuture<'_, Rsvp>;

    /// Sets (`Some`) or clears (`None`) the host override.
    fn save_manual_override(
        &self,
        guest_id: i64,
        manual: Option<ManualOverride>,
    ) -> RepoFuture<'_, Guest>;

    /// Seats every guest in `guest_ids` at `table_id` or none of them.
    ///
    /// Implementations read the table's current assignments, run
    /// [`check_batch`](crate::seating::check_batch) and insert the rows
    /// without letting another writer touch the same table in between.
    /// A guest seated concurrently at another table is reported as
    /// [`Error::Contention`](crate::error::Error::Contention).
    fn assign_guests(
        &self,
        table_id: i64,
        guest_ids: Vec<i64>,
        policy: SeatingPolicy,
    ) -> RepoFuture<'_, Vec<TableAssignment>>;

    /// Removes and returns the guest's assignment.
    fn remove_assignment(&self, guest_id: i64) -> RepoFuture<'_, TableAssignment>;
}
