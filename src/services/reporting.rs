use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::attendance::resolve_count;
use crate::error::Result;
use crate::models::{Guest, Table};
use crate::repository::SeatingRepository;
use crate::seating::SeatingLedger;

/// One line of the seating export handed to the file writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentRow {
    pub honorific: String,
    pub guest_name: String,
    pub phone_number: String,
    pub email: String,
    pub table_name: String,
    pub attending_count: u32,
    pub invitation_method: String,
    pub meal_preference: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableOverview {
    pub table: Table,
    pub ledger: SeatingLedger,
}

#[derive(Clone)]
pub struct ReportingService {
    repo: Arc<dyn SeatingRepository>,
}

impl ReportingService {
    pub fn new(repo: Arc<dyn SeatingRepository>) -> Self {
        Self { repo }
    }

    /// Export rows for every seated guest, ordered by table then guest name.
    pub async fn assignment_rows(&self, event_id: i64) -> Result<Vec<AssignmentRow>> {
        let (tables, guests, placement) = self.load(event_id).await?;

        let mut rows: Vec<AssignmentRow> = guests
            .iter()
            .filter_map(|guest| {
                let table = tables.get(placement.get(&guest.id)?)?;
                Some(AssignmentRow {
                    honorific: guest.honorific.label().to_string(),
                    guest_name: guest.name.clone(),
                    phone_number: guest.phone_number.clone().unwrap_or_default(),
                    email: guest.email.clone().unwrap_or_default(),
                    table_name: table.name.clone(),
                    attending_count: resolve_count(guest),
                    invitation_method: guest
                        .invitation_method
                        .map(|m| m.label().to_string())
                        .unwrap_or_default(),
                    meal_preference: guest
                        .rsvp
                        .as_ref()
                        .and_then(|r| r.meal_preference.clone())
                        .unwrap_or_default(),
                })
            })
            .collect();

        rows.sort_by(|a, b| {
            a.table_name
                .cmp(&b.table_name)
                .then_with(|| a.guest_name.cmp(&b.guest_name))
        });
        Ok(rows)
    }

    /// Every table of the event with its current ledger, ordered by name.
    pub async fn seating_overview(&self, event_id: i64) -> Result<Vec<TableOverview>> {
        let (tables, guests, placement) = self.load(event_id).await?;

        let mut seated_by_table: HashMap<i64, Vec<&Guest>> = HashMap::new();
        for guest in &guests {
            if let Some(table_id) = placement.get(&guest.id) {
                seated_by_table.entry(*table_id).or_default().push(guest);
            }
        }

        let mut overview: Vec<TableOverview> = tables
            .into_values()
            .map(|table| {
                let seated = seated_by_table.remove(&table.id).unwrap_or_default();
                let ledger = SeatingLedger::build(&table, seated);
                TableOverview { table, ledger }
            })
            .collect();

        overview.sort_by(|a, b| {
            a.table
                .name
                .cmp(&b.table.name)
                .then(a.table.id.cmp(&b.table.id))
        });
        Ok(overview)
    }

    // (столы по id, гости события, guest_id -> table_id)
    async fn load(
        &self,
        event_id: i64,
    ) -> Result<(HashMap<i64, Table>, Vec<Guest>, HashMap<i64, i64>)> {
        self.repo.event(event_id).await?;

        let tables = self
            .repo
            .event_tables(event_id)
            .await?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();
        let guests = self.repo.event_guests(event_id).await?;
        let placement = self
            .repo
            .event_assignments(event_id)
            .await?
            .into_iter()
            .map(|a| (a.guest_id, a.table_id))
            .collect();

        Ok((tables, guests, placement))
    }
}
