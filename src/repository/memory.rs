use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use super::{RepoFuture, SeatingRepository};
use crate::error::{Error, Result};
use crate::models::{
    Event, Guest, ManualOverride, NewGuest, NewTable, Rsvp, RsvpSubmission, Table,
    TableAssignment,
};
use crate::seating::{check_batch, SeatingLedger, SeatingPolicy};

#[derive(Default)]
struct State {
    last_id: i64,
    events: BTreeMap<i64, Event>,
    guests: BTreeMap<i64, Guest>,
    rsvps: HashMap<i64, Rsvp>,
    tables: BTreeMap<i64, Table>,
    // ключ: guest_id, у гостя не больше одного места
    assignments: BTreeMap<i64, TableAssignment>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn guest(&self, guest_id: i64) -> Result<Guest> {
        let mut guest = self
            .guests
            .get(&guest_id)
            .cloned()
            .ok_or(Error::GuestNotFound(guest_id))?;
        guest.rsvp = self.rsvps.get(&guest_id).cloned();
        Ok(guest)
    }

    fn table(&self, table_id: i64) -> Result<Table> {
        self.tables
            .get(&table_id)
            .cloned()
            .ok_or(Error::TableNotFound(table_id))
    }

    fn seated_at(&self, table_id: i64) -> Result<Vec<Guest>> {
        let mut seated = self
            .assignments
            .values()
            .filter(|a| a.table_id == table_id)
            .map(|a| self.guest(a.guest_id))
            .collect::<Result<Vec<_>>>()?;
        seated.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(seated)
    }
}

/// Process-local store. Every operation runs under one `tokio` mutex, so a
/// seating write sees no table, RSVP or override change between its checks
/// and its insert.
#[derive(Default)]
pub struct InMemorySeatingRepository {
    state: Mutex<State>,
}

impl InMemorySeatingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SeatingRepository for InMemorySeatingRepository {
    fn create_event(&self, title: String) -> RepoFuture<'_, Event> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            let event = Event {
                id: state.next_id(),
                title,
                created_at: Utc::now(),
            };
            state.events.insert(event.id, event.clone());
            Ok(event)
        })
    }

    fn event(&self, event_id: i64) -> RepoFuture<'_, Event> {
        Box::pin(async move {
            let state = self.state.lock().await;
            state
                .events
                .get(&event_id)
                .cloned()
                .ok_or(Error::EventNotFound(event_id))
        })
    }

    fn create_guest(&self, event_id: i64, guest: NewGuest) -> RepoFuture<'_, Guest> {
        Box::pin(async move {
            guest.validate()?;

            let mut state = self.state.lock().await;
            if !state.events.contains_key(&event_id) {
                return Err(Error::EventNotFound(event_id));
            }
            let created = Guest {
                id: state.next_id(),
                event_id,
                unique_id: Uuid::new_v4(),
                name: guest.name,
                honorific: guest.honorific,
                email: guest.email,
                phone_number: guest.phone_number,
                invitation_method: guest.invitation_method,
                max_attendees: guest.max_attendees,
                manual_override: None,
                rsvp: None,
            };
            state.guests.insert(created.id, created.clone());
            Ok(created)
        })
    }

    fn update_guest(&self, guest_id: i64, update: NewGuest) -> RepoFuture<'_, Guest> {
        Box::pin(async move {
            update.validate()?;

            let mut state = self.state.lock().await;
            let guest = state
                .guests
                .get_mut(&guest_id)
                .ok_or(Error::GuestNotFound(guest_id))?;
            guest.name = update.name;
            guest.honorific = update.honorific;
            guest.email = update.email;
            guest.phone_number = update.phone_number;
            guest.invitation_method = update.invitation_method;
            guest.max_attendees = update.max_attendees;
            state.guest(guest_id)
        })
    }

    fn delete_guest(&self, guest_id: i64) -> RepoFuture<'_, ()> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            if state.guests.remove(&guest_id).is_none() {
                return Err(Error::GuestNotFound(guest_id));
            }
            state.rsvps.remove(&guest_id);
            state.assignments.remove(&guest_id);
            Ok(())
        })
    }

    fn create_table(&self, event_id: i64, table: NewTable) -> RepoFuture<'_, Table> {
        Box::pin(async move {
            table.validate()?;

            let mut state = self.state.lock().await;
            if !state.events.contains_key(&event_id) {
                return Err(Error::EventNotFound(event_id));
            }
            let taken = state
                .tables
                .values()
                .any(|t| t.event_id == event_id && t.name == table.name);
            if taken {
                return Err(Error::TableNameTaken { name: table.name });
            }
            let created = Table {
                id: state.next_id(),
                event_id,
                name: table.name,
                capacity: table.capacity,
            };
            state.tables.insert(created.id, created.clone());
            Ok(created)
        })
    }

    fn update_table(&self, table_id: i64, update: NewTable) -> RepoFuture<'_, Table> {
        Box::pin(async move {
            update.validate()?;

            let mut state = self.state.lock().await;
            let event_id = state.table(table_id)?.event_id;
            let taken = state
                .tables
                .values()
                .any(|t| t.id != table_id && t.event_id == event_id && t.name == update.name);
            if taken {
                return Err(Error::TableNameTaken { name: update.name });
            }

            let table = state
                .tables
                .get_mut(&table_id)
                .ok_or(Error::TableNotFound(table_id))?;
            table.name = update.name;
            table.capacity = update.capacity;
            Ok(table.clone())
        })
    }

    fn delete_table(&self, table_id: i64) -> RepoFuture<'_, ()> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            if state.tables.remove(&table_id).is_none() {
                return Err(Error::TableNotFound(table_id));
            }
            state.assignments.retain(|_, a| a.table_id != table_id);
            Ok(())
        })
    }

    fn guest(&self, guest_id: i64) -> RepoFuture<'_, Guest> {
        Box::pin(async move { self.state.lock().await.guest(guest_id) })
    }

    fn table(&self, table_id: i64) -> RepoFuture<'_, Table> {
        Box::pin(async move { self.state.lock().await.table(table_id) })
    }

    fn event_guests(&self, event_id: i64) -> RepoFuture<'_, Vec<Guest>> {
        Box::pin(async move {
            let state = self.state.lock().await;
            let mut guests = state
                .guests
                .values()
                .filter(|g| g.event_id == event_id)
                .map(|g| state.guest(g.id))
                .collect::<Result<Vec<_>>>()?;
            guests.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
            Ok(guests)
        })
    }

    fn event_tables(&self, event_id: i64) -> RepoFuture<'_, Vec<Table>> {
        Box::pin(async move {
            let state = self.state.lock().await;
            let mut tables: Vec<Table> = state
                .tables
                .values()
                .filter(|t| t.event_id == event_id)
                .cloned()
                .collect();
            tables.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
            Ok(tables)
        })
    }

    fn event_assignments(&self, event_id: i64) -> RepoFuture<'_, Vec<TableAssignment>> {
        Box::pin(async move {
            let state = self.state.lock().await;
            let mut assignments: Vec<TableAssignment> = state
                .assignments
                .values()
                .filter(|a| a.event_id == event_id)
                .cloned()
                .collect();
            assignments.sort_by_key(|a| a.id);
            Ok(assignments)
        })
    }

    fn table_guests(&self, table_id: i64) -> RepoFuture<'_, Vec<Guest>> {
        Box::pin(async move { self.state.lock().await.seated_at(table_id) })
    }

    fn assignment_for(&self, guest_id: i64) -> RepoFuture<'_, Option<TableAssignment>> {
        Box::pin(async move { Ok(self.state.lock().await.assignments.get(&guest_id).cloned()) })
    }

    fn save_rsvp(&self, guest_id: i64, submission: RsvpSubmission) -> RepoFuture<'_, Rsvp> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            let guest = state
                .guests
                .get_mut(&guest_id)
                .ok_or(Error::GuestNotFound(guest_id))?;
            guest.manual_override = None;

            let now = Utc::now();
            let submitted_at = state
                .rsvps
                .get(&guest_id)
                .map_or(now, |previous| previous.submitted_at);
            let rsvp = Rsvp {
                guest_id,
                attending: submission.attending,
                number_attending: submission.number_attending,
                meal_preference: submission.meal_preference,
                message: submission.message,
                submitted_at,
                updated_at: now,
            };
            state.rsvps.insert(guest_id, rsvp.clone());
            Ok(rsvp)
        })
    }

    fn save_manual_override(
        &self,
        guest_id: i64,
        manual: Option<ManualOverride>,
    ) -> RepoFuture<'_, Guest> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            let guest = state
                .guests
                .get_mut(&guest_id)
                .ok_or(Error::GuestNotFound(guest_id))?;
            guest.manual_override = manual;
            state.guest(guest_id)
        })
    }

    fn assign_guests(
        &self,
        table_id: i64,
        guest_ids: Vec<i64>,
        policy: SeatingPolicy,
    ) -> RepoFuture<'_, Vec<TableAssignment>> {
        Box::pin(async move {
            // Чтение, проверка и вставка под одной блокировкой
            let mut state = self.state.lock().await;

            let table = state.table(table_id)?;
            let candidates = guest_ids
                .iter()
                .map(|id| state.guest(*id))
                .collect::<Result<Vec<_>>>()?;
            let existing: Vec<TableAssignment> = guest_ids
                .iter()
                .filter_map(|id| state.assignments.get(id).cloned())
                .collect();
            let seated = state.seated_at(table_id)?;

            let ledger = SeatingLedger::build(&table, &seated);
            let needed = check_batch(&policy, &table, &ledger, &candidates, &existing)?;

            let assigned_at = Utc::now();
            let mut created = Vec::with_capacity(candidates.len());
            for guest in &candidates {
                let assignment = TableAssignment {
                    id: state.next_id(),
                    event_id: table.event_id,
                    guest_id: guest.id,
                    table_id: table.id,
                    assigned_at,
                };
                state.assignments.insert(guest.id, assignment.clone());
                created.push(assignment);
            }

            debug!(
                "Table {}: {} seats taken by {} guest(s), {} were free",
                table.id,
                needed,
                created.len(),
                ledger.remaining
            );
            Ok(created)
        })
    }

    fn remove_assignment(&self, guest_id: i64) -> RepoFuture<'_, TableAssignment> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            if !state.guests.contains_key(&guest_id) {
                return Err(Error::GuestNotFound(guest_id));
            }
            state
                .assignments
                .remove(&guest_id)
                .ok_or(Error::NotAssigned { guest_id })
        })
    }
}
