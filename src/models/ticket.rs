use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use uuid::Uuid;

use crate::models::event::Event;

/// VIP price when the event has no cover charge, in cents.
const DEFAULT_VIP_PRICE_CENTS: i64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TicketType {
    Regular,
    Vip,
}

impl std::fmt::Display for TicketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketType::Regular => write!(f, "REGULAR"),
            TicketType::Vip => write!(f, "VIP"),
        }
    }
}

impl std::str::FromStr for TicketType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "REGULAR" => Ok(TicketType::Regular),
            "VIP" => Ok(TicketType::Vip),
            _ => Err(format!("Invalid ticket type: {}", s)),
        }
    }
}

impl TicketType {
    pub fn price_cents(&self, event: &Event) -> i64 {
        match (self, event.cover_charge_cents) {
            (TicketType::Regular, cover) => cover.unwrap_or(0),
            (TicketType::Vip, Some(cover)) => cover.saturating_mul(2),
            (TicketType::Vip, None) => DEFAULT_VIP_PRICE_CENTS,
        }
    }
}

/// A ticket moves from issued to scanned exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub ticket_type: TicketType,
    pub price_cents: i64,
    pub is_scanned: bool,
    pub scanned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Ticket {
    pub fn new(user_id: Uuid, event: &Event, ticket_type: TicketType) -> Self {
        Ticket {
            id: Uuid::new_v4(),
            user_id,
            event_id: event.id,
            ticket_type,
            price_cents: ticket_type.price_cents(event),
            is_scanned: false,
            scanned_at: None,
            created_at: Utc::now(),
        }
    }
}

impl<'r> FromRow<'r, PgRow> for Ticket {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let type_str: String = row.try_get("ticket_type")?;
        let ticket_type = type_str
            .parse::<TicketType>()
            .map_err(|e| sqlx::Error::Decode(Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e))))?;

        Ok(Ticket {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            event_id: row.try_get("event_id")?,
            ticket_type,
            price_cents: row.try_get("price_cents")?,
            is_scanned: row.try_get("is_scanned")?,
            scanned_at: row.try_get("scanned_at")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct PurchaseTicketBody {
    #[serde(rename = "eventId")]
    pub event_id: Uuid,
    #[serde(rename = "type", default = "default_ticket_type")]
    pub ticket_type: TicketType,
}

fn default_ticket_type() -> TicketType {
    TicketType::Regular
}

#[derive(Debug, Serialize)]
pub struct TicketWithQr {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub qr_code_image: String,
}

#[derive(Debug, Serialize)]
pub struct TicketQrResponse {
    pub ticket_id: Uuid,
    pub qr_code_image: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::EventStatus;

    fn event(cover_charge_cents: Option<i64>) -> Event {
        Event {
            id: Uuid::new_v4(),
            title: "Friday Night".to_string(),
            status: EventStatus::Published,
            cover_charge_cents,
            starts_at: Utc::now(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn regular_ticket_costs_the_cover_charge() {
        assert_eq!(TicketType::Regular.price_cents(&event(Some(1_500))), 1_500);
        assert_eq!(TicketType::Regular.price_cents(&event(None)), 0);
    }

    #[test]
    fn vip_ticket_doubles_the_cover_charge() {
        assert_eq!(TicketType::Vip.price_cents(&event(Some(1_500))), 3_000);
        assert_eq!(TicketType::Vip.price_cents(&event(None)), 10_000);
    }

    #[test]
    fn vip_price_saturates_on_huge_cover_charge() {
        assert_eq!(TicketType::Vip.price_cents(&event(Some(i64::MAX))), i64::MAX);
    }

    #[test]
    fn new_ticket_is_unscanned() {
        let event = event(Some(1_000));
        let ticket = Ticket::new(Uuid::new_v4(), &event, TicketType::Vip);
        assert_eq!(ticket.event_id, event.id);
        assert_eq!(ticket.price_cents, 2_000);
        assert!(!ticket.is_scanned);
        assert!(ticket.scanned_at.is_none());
    }

    #[test]
    fn purchase_body_defaults_to_regular() {
        let body: PurchaseTicketBody =
            serde_json::from_str(r#"{"eventId":"6f2b8d3c-1d4e-4b7a-9f1e-2c3d4e5f6a7b"}"#).unwrap();
        assert_eq!(body.ticket_type, TicketType::Regular);

        let body: PurchaseTicketBody =
            serde_json::from_str(r#"{"eventId":"6f2b8d3c-1d4e-4b7a-9f1e-2c3d4e5f6a7b","type":"VIP"}"#).unwrap();
        assert_eq!(body.ticket_type, TicketType::Vip);
    }
}
