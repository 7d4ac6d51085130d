use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventStatus {
    Draft,
    Published,
    Cancelled,
    Completed,
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventStatus::Draft => write!(f, "DRAFT"),
            EventStatus::Published => write!(f, "PUBLISHED"),
            EventStatus::Cancelled => write!(f, "CANCELLED"),
            EventStatus::Completed => write!(f, "COMPLETED"),
        }
    }
}

impl std::str::FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DRAFT" => Ok(EventStatus::Draft),
            "PUBLISHED" => Ok(EventStatus::Published),
            "CANCELLED" => Ok(EventStatus::Cancelled),
            "COMPLETED" => Ok(EventStatus::Completed),
            _ => Err(format!("Invalid event status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub status: EventStatus,
    /// Entry price in cents; `None` means free entry.
    pub cover_charge_cents: Option<i64>,
    pub starts_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn is_on_sale(&self) -> bool {
        self.status == EventStatus::Published
    }
}

impl<'r> FromRow<'r, PgRow> for Event {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let status_str: String = row.try_get("status")?;
        let status = status_str
            .parse::<EventStatus>()
            .map_err(|e| sqlx::Error::Decode(Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e))))?;

        Ok(Event {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            status,
            cover_charge_cents: row.try_get("cover_charge_cents")?,
            starts_at: row.try_get("starts_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
