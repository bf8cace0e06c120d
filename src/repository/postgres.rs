use std::collections::HashMap;

use sqlx::PgConnection;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use super::{RepoFuture, SeatingRepository};
use crate::database::Database;
use crate::error::{is_foreign_key_violation, is_unique_violation, Error, Result, TABLE_NAME_KEY};
use crate::models::guest::GUEST_COLUMNS;
use crate::models::rsvp::RSVP_COLUMNS;
use crate::models::table::ASSIGNMENT_COLUMNS;
use crate::models::{
    Event, Guest, ManualOverride, NewGuest, NewTable, Rsvp, RsvpSubmission, Table,
    TableAssignment,
};
use crate::seating::{check_batch, SeatingLedger, SeatingPolicy};

const TABLE_COLUMNS: &str = "id, event_id, name, capacity";

#[derive(Clone)]
pub struct PgSeatingRepository {
    db: Database,
}

impl PgSeatingRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

/* ---------- helpers ---------- */

async fn attach_rsvps(conn: &mut PgConnection, guests: &mut [Guest]) -> Result<()> {
    if guests.is_empty() {
        return Ok(());
    }
    let ids: Vec<i64> = guests.iter().map(|g| g.id).collect();

    let query = format!("SELECT {RSVP_COLUMNS} FROM rsvps WHERE guest_id = ANY($1)");
    let rsvps = sqlx::query_as::<_, Rsvp>(&query)
        .bind(&ids)
        .fetch_all(&mut *conn)
        .await?;

    let mut by_guest: HashMap<i64, Rsvp> = rsvps.into_iter().map(|r| (r.guest_id, r)).collect();
    for guest in guests.iter_mut() {
        guest.rsvp = by_guest.remove(&guest.id);
    }
    Ok(())
}

async fn fetch_guest(conn: &mut PgConnection, guest_id: i64) -> Result<Guest> {
    let query = format!("SELECT {GUEST_COLUMNS} FROM guests g WHERE g.id = $1");
    let mut guest = sqlx::query_as::<_, Guest>(&query)
        .bind(guest_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(Error::GuestNotFound(guest_id))?;

    attach_rsvps(conn, std::slice::from_mut(&mut guest)).await?;
    Ok(guest)
}

async fn seated_guests(conn: &mut PgConnection, table_id: i64) -> Result<Vec<Guest>> {
    let query = format!(
        "SELECT {GUEST_COLUMNS}
         FROM guests g
         JOIN table_assignments ta ON ta.guest_id = g.id
         WHERE ta.table_id = $1
         ORDER BY g.name, g.id"
    );
    let mut guests = sqlx::query_as::<_, Guest>(&query)
        .bind(table_id)
        .fetch_all(&mut *conn)
        .await?;

    attach_rsvps(conn, &mut guests).await?;
    Ok(guests)
}

async fn guest_exists(conn: &mut PgConnection, guest_id: i64) -> Result<bool> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM guests WHERE id = $1)")
        .bind(guest_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(exists)
}

impl SeatingRepository for PgSeatingRepository {
    fn create_event(&self, title: String) -> RepoFuture<'_, Event> {
        Box::pin(async move {
            let event = sqlx::query_as::<_, Event>(
                "INSERT INTO events (title) VALUES ($1) RETURNING id, title, created_at",
            )
            .bind(title)
            .fetch_one(&self.db.pool)
            .await?;
            Ok(event)
        })
    }

    fn event(&self, event_id: i64) -> RepoFuture<'_, Event> {
        Box::pin(async move {
            sqlx::query_as::<_, Event>("SELECT id, title, created_at FROM events WHERE id = $1")
                .bind(event_id)
                .fetch_optional(&self.db.pool)
                .await?
                .ok_or(Error::EventNotFound(event_id))
        })
    }

    fn create_guest(&self, event_id: i64, guest: NewGuest) -> RepoFuture<'_, Guest> {
        Box::pin(async move {
            guest.validate()?;

            let query = format!(
                "INSERT INTO guests AS g
                    (event_id, unique_id, name, honorific, email, phone_number, invitation_method, max_attendees)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                 RETURNING {GUEST_COLUMNS}"
            );
            let created = sqlx::query_as::<_, Guest>(&query)
                .bind(event_id)
                .bind(Uuid::new_v4())
                .bind(guest.name)
                .bind(guest.honorific)
                .bind(guest.email)
                .bind(guest.phone_number)
                .bind(guest.invitation_method)
                .bind(guest.max_attendees)
                .fetch_one(&self.db.pool)
                .await
                .map_err(|err| {
                    if is_foreign_key_violation(&err) {
                        Error::EventNotFound(event_id)
                    } else {
                        Error::from(err)
                    }
                })?;
            Ok(created)
        })
    }

    fn update_guest(&self, guest_id: i64, update: NewGuest) -> RepoFuture<'_, Guest> {
        Box::pin(async move {
            update.validate()?;

            let mut conn = self.db.pool.acquire().await?;
            let query = format!(
                "UPDATE guests AS g
                 SET name = $2, honorific = $3, email = $4, phone_number = $5,
                     invitation_method = $6, max_attendees = $7
                 WHERE g.id = $1
                 RETURNING {GUEST_COLUMNS}"
            );
            let mut guest = sqlx::query_as::<_, Guest>(&query)
                .bind(guest_id)
                .bind(update.name)
                .bind(update.honorific)
                .bind(update.email)
                .bind(update.phone_number)
                .bind(update.invitation_method)
                .bind(update.max_attendees)
                .fetch_optional(&mut *conn)
                .await?
                .ok_or(Error::GuestNotFound(guest_id))?;

            attach_rsvps(&mut conn, std::slice::from_mut(&mut guest)).await?;
            info!("Guest {} updated", guest_id);
            Ok(guest)
        })
    }

    fn delete_guest(&self, guest_id: i64) -> RepoFuture<'_, ()> {
        Box::pin(async move {
            // RSVP и рассадка удаляются каскадом
            let result = sqlx::query("DELETE FROM guests WHERE id = $1")
                .bind(guest_id)
                .execute(&self.db.pool)
                .await?;
            if result.rows_affected() == 0 {
                return Err(Error::GuestNotFound(guest_id));
            }
            info!("Guest {} deleted", guest_id);
            Ok(())
        })
    }

    fn create_table(&self, event_id: i64, table: NewTable) -> RepoFuture<'_, Table> {
        Box::pin(async move {
            table.validate()?;

            let query = format!(
                "INSERT INTO seating_tables (event_id, name, capacity) VALUES ($1, $2, $3) RETURNING {TABLE_COLUMNS}"
            );
            let name = table.name.clone();
            let created = sqlx::query_as::<_, Table>(&query)
                .bind(event_id)
                .bind(table.name)
                .bind(table.capacity)
                .fetch_one(&self.db.pool)
                .await
                .map_err(|err| {
                    if is_unique_violation(&err, TABLE_NAME_KEY) {
                        Error::TableNameTaken { name }
                    } else if is_foreign_key_violation(&err) {
                        Error::EventNotFound(event_id)
                    } else {
                        Error::from(err)
                    }
                })?;
            Ok(created)
        })
    }

    fn update_table(&self, table_id: i64, update: NewTable) -> RepoFuture<'_, Table> {
        Box::pin(async move {
            update.validate()?;

            // Та же блокировка строки стола, что и при рассадке
            let query = format!(
                "UPDATE seating_tables SET name = $2, capacity = $3 WHERE id = $1 RETURNING {TABLE_COLUMNS}"
            );
            let name = update.name.clone();
            let updated = sqlx::query_as::<_, Table>(&query)
                .bind(table_id)
                .bind(update.name)
                .bind(update.capacity)
                .fetch_optional(&self.db.pool)
                .await
                .map_err(|err| {
                    if is_unique_violation(&err, TABLE_NAME_KEY) {
                        Error::TableNameTaken { name }
                    } else {
                        Error::from(err)
                    }
                })?
                .ok_or(Error::TableNotFound(table_id))?;
            info!("Table {} updated, capacity {}", table_id, updated.capacity);
            Ok(updated)
        })
    }

    fn delete_table(&self, table_id: i64) -> RepoFuture<'_, ()> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM seating_tables WHERE id = $1")
                .bind(table_id)
                .execute(&self.db.pool)
                .await?;
            if result.rows_affected() == 0 {
                return Err(Error::TableNotFound(table_id));
            }
            info!("Table {} deleted", table_id);
            Ok(())
        })
    }

    fn guest(&self, guest_id: i64) -> RepoFuture<'_, Guest> {
        Box::pin(async move {
            let mut conn = self.db.pool.acquire().await?;
            fetch_guest(&mut conn, guest_id).await
        })
    }

    fn table(&self, table_id: i64) -> RepoFuture<'_, Table> {
        Box::pin(async move {
            let query = format!("SELECT {TABLE_COLUMNS} FROM seating_tables WHERE id = $1");
            sqlx::query_as::<_, Table>(&query)
                .bind(table_id)
                .fetch_optional(&self.db.pool)
                .await?
                .ok_or(Error::TableNotFound(table_id))
        })
    }

    fn event_guests(&self, event_id: i64) -> RepoFuture<'_, Vec<Guest>> {
        Box::pin(async move {
            let mut conn = self.db.pool.acquire().await?;
            let query = format!(
                "SELECT {GUEST_COLUMNS} FROM guests g WHERE g.event_id = $1 ORDER BY g.name, g.id"
            );
            let mut guests = sqlx::query_as::<_, Guest>(&query)
                .bind(event_id)
                .fetch_all(&mut *conn)
                .await?;
            attach_rsvps(&mut conn, &mut guests).await?;
            Ok(guests)
        })
    }

    fn event_tables(&self, event_id: i64) -> RepoFuture<'_, Vec<Table>> {
        Box::pin(async move {
            let query = format!(
                "SELECT {TABLE_COLUMNS} FROM seating_tables WHERE event_id = $1 ORDER BY name, id"
            );
            let tables = sqlx::query_as::<_, Table>(&query)
                .bind(event_id)
                .fetch_all(&self.db.pool)
                .await?;
            Ok(tables)
        })
    }

    fn event_assignments(&self, event_id: i64) -> RepoFuture<'_, Vec<TableAssignment>> {
        Box::pin(async move {
            let query = format!(
                "SELECT {ASSIGNMENT_COLUMNS} FROM table_assignments WHERE event_id = $1 ORDER BY id"
            );
            let assignments = sqlx::query_as::<_, TableAssignment>(&query)
                .bind(event_id)
                .fetch_all(&self.db.pool)
                .await?;
            Ok(assignments)
        })
    }

    fn table_guests(&self, table_id: i64) -> RepoFuture<'_, Vec<Guest>> {
        Box::pin(async move {
            let mut conn = self.db.pool.acquire().await?;
            seated_guests(&mut conn, table_id).await
        })
    }

    fn assignment_for(&self, guest_id: i64) -> RepoFuture<'_, Option<TableAssignment>> {
        Box::pin(async move {
            let query =
                format!("SELECT {ASSIGNMENT_COLUMNS} FROM table_assignments WHERE guest_id = $1");
            let assignment = sqlx::query_as::<_, TableAssignment>(&query)
                .bind(guest_id)
                .fetch_optional(&self.db.pool)
                .await?;
            Ok(assignment)
        })
    }

    fn save_rsvp(&self, guest_id: i64, submission: RsvpSubmission) -> RepoFuture<'_, Rsvp> {
        Box::pin(async move {
            let mut tx = self.db.pool.begin().await?;

            // Цифровой ответ гостя снимает ручное переопределение хоста
            let cleared = sqlx::query(
                "UPDATE guests
                 SET manual_is_attending = NULL, manual_attending_count = NULL
                 WHERE id = $1",
            )
            .bind(guest_id)
            .execute(&mut *tx)
            .await?;
            if cleared.rows_affected() == 0 {
                return Err(Error::GuestNotFound(guest_id));
            }

            let query = format!(
                "INSERT INTO rsvps (guest_id, attending, number_attending, meal_preference, message)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (guest_id) DO UPDATE
                 SET attending = EXCLUDED.attending,
                     number_attending = EXCLUDED.number_attending,
                     meal_preference = EXCLUDED.meal_preference,
                     message = EXCLUDED.message,
                     updated_at = NOW()
                 RETURNING {RSVP_COLUMNS}"
            );
            let rsvp = sqlx::query_as::<_, Rsvp>(&query)
                .bind(guest_id)
                .bind(submission.attending)
                .bind(submission.number_attending)
                .bind(submission.meal_preference)
                .bind(submission.message)
                .fetch_one(&mut *tx)
                .await?;

            tx.commit().await?;
            Ok(rsvp)
        })
    }

    fn save_manual_override(
        &self,
        guest_id: i64,
        manual: Option<ManualOverride>,
    ) -> RepoFuture<'_, Guest> {
        Box::pin(async move {
            let (is_attending, count) = match manual {
                Some(m) => (Some(m.attending), m.count),
                None => (None, None),
            };

            let mut conn = self.db.pool.acquire().await?;
            let query = format!(
                "UPDATE guests AS g
                 SET manual_is_attending = $2, manual_attending_count = $3
                 WHERE g.id = $1
                 RETURNING {GUEST_COLUMNS}"
            );
            let mut guest = sqlx::query_as::<_, Guest>(&query)
                .bind(guest_id)
                .bind(is_attending)
                .bind(count)
                .fetch_optional(&mut *conn)
                .await?
                .ok_or(Error::GuestNotFound(guest_id))?;

            attach_rsvps(&mut conn, std::slice::from_mut(&mut guest)).await?;
            Ok(guest)
        })
    }

    fn assign_guests(
        &self,
        table_id: i64,
        guest_ids: Vec<i64>,
        policy: SeatingPolicy,
    ) -> RepoFuture<'_, Vec<TableAssignment>> {
        Box::pin(async move {
            let mut tx = self.db.pool.begin().await?;

            // 1) Блокируем стол: все записи на этот стол идут строго по очереди
            let query = format!("SELECT {TABLE_COLUMNS} FROM seating_tables WHERE id = $1 FOR UPDATE");
            let table = sqlx::query_as::<_, Table>(&query)
                .bind(table_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(Error::TableNotFound(table_id))?;

            // 2) Блокируем гостей в порядке id, чтобы не словить deadlock
            let query = format!(
                "SELECT {GUEST_COLUMNS} FROM guests g WHERE g.id = ANY($1) ORDER BY g.id FOR UPDATE"
            );
            let mut locked = sqlx::query_as::<_, Guest>(&query)
                .bind(&guest_ids)
                .fetch_all(&mut *tx)
                .await?;
            attach_rsvps(&mut tx, &mut locked).await?;

            let mut by_id: HashMap<i64, Guest> = locked.into_iter().map(|g| (g.id, g)).collect();
            let candidates = guest_ids
                .iter()
                .map(|id| by_id.remove(id).ok_or(Error::GuestNotFound(*id)))
                .collect::<Result<Vec<_>>>()?;

            // 3) Текущее состояние стола и гостей
            let query =
                format!("SELECT {ASSIGNMENT_COLUMNS} FROM table_assignments WHERE guest_id = ANY($1)");
            let existing = sqlx::query_as::<_, TableAssignment>(&query)
                .bind(&guest_ids)
                .fetch_all(&mut *tx)
                .await?;
            let seated = seated_guests(&mut tx, table_id).await?;
            let ledger = SeatingLedger::build(&table, &seated);

            // 4) Проверка; при ошибке транзакция откатывается при drop
            let needed = check_batch(&policy, &table, &ledger, &candidates, &existing)?;

            let insert = format!(
                "INSERT INTO table_assignments (event_id, guest_id, table_id)
                 VALUES ($1, $2, $3)
                 RETURNING {ASSIGNMENT_COLUMNS}"
            );
            let mut created = Vec::with_capacity(candidates.len());
            for guest in &candidates {
                let assignment = sqlx::query_as::<_, TableAssignment>(&insert)
                    .bind(table.event_id)
                    .bind(guest.id)
                    .bind(table.id)
                    .fetch_one(&mut *tx)
                    .await?;
                created.push(assignment);
            }

            tx.commit().await?;
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
            let mut conn = self.db.pool.acquire().await?;
            let query = format!(
                "DELETE FROM table_assignments WHERE guest_id = $1 RETURNING {ASSIGNMENT_COLUMNS}"
            );
            let removed = sqlx::query_as::<_, TableAssignment>(&query)
                .bind(guest_id)
                .fetch_optional(&mut *conn)
                .await?;

            if let Some(assignment) = removed {
                return Ok(assignment);
            }
            if guest_exists(&mut conn, guest_id).await? {
                Err(Error::NotAssigned { guest_id })
            } else {
                Err(Error::GuestNotFound(guest_id))
            }
        })
    }
}
