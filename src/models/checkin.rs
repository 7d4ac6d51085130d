use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use uuid::Uuid;

use crate::models::ticket::Ticket;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkin {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub scanned_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Checkin {
    pub fn new(ticket: &Ticket, scanned_by: Uuid) -> Self {
        Checkin {
            id: Uuid::new_v4(),
            ticket_id: ticket.id,
            user_id: ticket.user_id,
            event_id: ticket.event_id,
            scanned_by,
            created_at: Utc::now(),
        }
    }
}

impl<'r> FromRow<'r, PgRow> for Checkin {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Checkin {
            id: row.try_get("id")?,
            ticket_id: row.try_get("ticket_id")?,
            user_id: row.try_get("user_id")?,
            event_id: row.try_get("event_id")?,
            scanned_by: row.try_get("scanned_by")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ScanTicketBody {
    #[serde(rename = "qrCode")]
    pub qr_code: String,
}

#[derive(Debug, Serialize)]
pub struct ScanTicketResponse {
    pub checkin: Checkin,
    pub ticket: Ticket,
}
