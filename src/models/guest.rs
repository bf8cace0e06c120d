use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use uuid::Uuid;
use validator::Validate;

use super::Rsvp;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "honorific", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Honorific {
    Mr,
    Mrs,
    Ms,
    Dr,
    Family,
    Couple,
    #[default]
    #[sqlx(rename = "none")]
    #[serde(rename = "none")]
    Unspecified,
}

impl Honorific {
    /// Human label used in exports.
    pub fn label(self) -> &'static str {
        match self {
            Honorific::Mr => "Mr.",
            Honorific::Mrs => "Mrs.",
            Honorific::Ms => "Ms.",
            Honorific::Dr => "Dr.",
            Honorific::Family => "Family",
            Honorific::Couple => "Couple",
            Honorific::Unspecified => "None",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invitation_method", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvitationMethod {
    Digital,
    Physical,
}

impl InvitationMethod {
    pub fn label(self) -> &'static str {
        match self {
            InvitationMethod::Digital => "Digital Invitation",
            InvitationMethod::Physical => "Physical Invitation",
        }
    }
}

/// Host-entered attendance that takes precedence over the guest's RSVP.
///
/// Absence of the override (`Option::None` on [`Guest`]) is the "unknown"
/// state of the tri-state `manual_is_attending` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualOverride {
    pub attending: bool,
    pub count: Option<i32>,
}

impl ManualOverride {
    /// Builds an override from the two nullable columns the host edits.
    ///
    /// A count without an attendance value is rejected rather than dropped.
    pub fn from_parts(
        is_attending: Option<bool>,
        count: Option<i32>,
    ) -> crate::error::Result<Option<Self>> {
        match (is_attending, count) {
            (None, None) => Ok(None),
            (None, Some(_)) => Err(crate::error::Error::invalid_attendance(
                "manual attending count requires an attendance status",
            )),
            (Some(attending), count) => Ok(Some(ManualOverride { attending, count })),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Guest {
    pub id: i64,
    pub event_id: i64,
    pub unique_id: Uuid,
    pub name: String,
    pub honorific: Honorific,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub invitation_method: Option<InvitationMethod>,
    pub max_attendees: i32,
    pub manual_override: Option<ManualOverride>,
    pub rsvp: Option<Rsvp>,
}

impl Guest {
    /// Name as printed on the invitation, e.g. "The Smith Family" or "Dr. Jones".
    pub fn display_name(&self) -> String {
        match self.honorific {
            Honorific::Family => format!("The {} Family", self.name),
            Honorific::Couple => format!("The {} Couple", self.name),
            Honorific::Unspecified => self.name.clone(),
            other => format!("{} {}", other.label(), self.name),
        }
    }
}

// Колонки гостя; запросы всегда используют алиас `g`
pub(crate) const GUEST_COLUMNS: &str = "g.id, g.event_id, g.unique_id, g.name, g.honorific, \
     g.email, g.phone_number, g.invitation_method, g.max_attendees, \
     g.manual_is_attending, g.manual_attending_count";

impl<'r> FromRow<'r, PgRow> for Guest {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let manual_is_attending: Option<bool> = row.try_get("manual_is_attending")?;
        let manual_attending_count: Option<i32> = row.try_get("manual_attending_count")?;

        Ok(Guest {
            id: row.try_get("id")?,
            event_id: row.try_get("event_id")?,
            unique_id: row.try_get("unique_id")?,
            name: row.try_get("name")?,
            honorific: row.try_get("honorific")?,
            email: row.try_get("email")?,
            phone_number: row.try_get("phone_number")?,
            invitation_method: row.try_get("invitation_method")?,
            max_attendees: row.try_get("max_attendees")?,
            // счётчик без статуса в базе не считается переопределением
            manual_override: manual_is_attending.map(|attending| ManualOverride {
                attending,
                count: manual_attending_count,
            }),
            rsvp: None,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewGuest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub honorific: Honorific,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 30))]
    pub phone_number: Option<String>,
    pub invitation_method: Option<InvitationMethod>,
    #[validate(range(min = 1))]
    pub max_attendees: i32,
}

impl NewGuest {
    pub fn named(name: impl Into<String>, max_attendees: i32) -> Self {
        NewGuest {
            name: name.into(),
            honorific: Honorific::Unspecified,
            email: None,
            phone_number: None,
            invitation_method: Some(InvitationMethod::Physical),
            max_attendees,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guest(honorific: Honorific) -> Guest {
        Guest {
            id: 1,
            event_id: 1,
            unique_id: Uuid::new_v4(),
            name: "Popescu".to_string(),
            honorific,
            email: None,
            phone_number: None,
            invitation_method: None,
            max_attendees: 2,
            manual_override: None,
            rsvp: None,
        }
    }

    #[test]
    fn display_name_follows_honorific() {
        assert_eq!(guest(Honorific::Family).display_name(), "The Popescu Family");
        assert_eq!(guest(Honorific::Couple).display_name(), "The Popescu Couple");
        assert_eq!(guest(Honorific::Dr).display_name(), "Dr. Popescu");
        assert_eq!(guest(Honorific::Unspecified).display_name(), "Popescu");
    }

    #[test]
    fn override_parts_reject_count_without_status() {
        assert!(ManualOverride::from_parts(None, Some(2)).is_err());
        assert_eq!(ManualOverride::from_parts(None, None).ok(), Some(None));
        assert_eq!(
            ManualOverride::from_parts(Some(true), None).ok(),
            Some(Some(ManualOverride { attending: true, count: None }))
        );
    }

    #[test]
    fn new_guest_requires_positive_cap() {
        assert!(NewGuest::named("Ionescu", 0).validate().is_err());
        assert!(NewGuest::named("Ionescu", 3).validate().is_ok());
    }
}
