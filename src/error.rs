use crate::attendance::AttendanceStatus;

/// Unique index on `table_assignments.guest_id`.
pub(crate) const GUEST_ASSIGNMENT_KEY: &str = "table_assignments_guest_id_key";
/// Unique index on `(seating_tables.event_id, seating_tables.name)`.
pub(crate) const TABLE_NAME_KEY: &str = "seating_tables_event_id_name_key";

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

/// Every outcome of an attendance or seating operation that is not a success.
///
/// All variants are per-operation and recoverable. `Contention` is retried once
/// by [`SeatingAssignmentService`](crate::services::seating::SeatingAssignmentService);
/// a caller sees it only when the re-read state shows no seat or capacity conflict.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("guest {guest_id} is already seated at table {table_id}")]
    AlreadyAssigned { guest_id: i64, table_id: i64 },

    #[error("guest {guest_id} is not assigned to any table")]
    NotAssigned { guest_id: i64 },

    #[error("guest {guest_id} is not confirmed as attending (status: {status})")]
    NotAttending {
        guest_id: i64,
        status: AttendanceStatus,
    },

    #[error("not enough seats: {needed} needed, {available} available")]
    CapacityExceeded { needed: u32, available: u32 },

    #[error("invalid attendance input: {0}")]
    InvalidAttendanceInput(String),

    #[error("invalid input: {0}")]
    InvalidInput(#[from] validator::ValidationErrors),

    #[error("guest {0} not found")]
    GuestNotFound(i64),

    #[error("table {0} not found")]
    TableNotFound(i64),

    #[error("event {0} not found")]
    EventNotFound(i64),

    #[error("guest {guest_id} and table {table_id} belong to different events")]
    EventMismatch { guest_id: i64, table_id: i64 },

    #[error("table name {name:?} is already used in this event")]
    TableNameTaken { name: String },

    #[error("concurrent seating change detected")]
    Contention,

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn invalid_attendance(message: impl Into<String>) -> Self {
        Error::InvalidAttendanceInput(message.into())
    }
}

impl From<sqlx::Error> for Error {
    /// Lock conflicts and a duplicate guest assignment are contention
    /// signals, not failures: the seating service retries them.
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) => return Error::Contention,
                Some(UNIQUE_VIOLATION) if db_err.constraint() == Some(GUEST_ASSIGNMENT_KEY) => {
                    return Error::Contention
                }
                _ => {}
            }
        }
        Error::Database(err)
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some(UNIQUE_VIOLATION)
                && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}

pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some(FOREIGN_KEY_VIOLATION),
        _ => false,
    }
}
