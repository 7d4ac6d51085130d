use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    models::{checkin::Checkin, ticket::Ticket},
    repositories::DbResult,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn create(&self, new_ticket: &Ticket) -> DbResult<Ticket>;
    async fn find_by_id(&self, id: &Uuid) -> DbResult<Option<Ticket>>;
    async fn find_by_user(&self, user_id: &Uuid) -> DbResult<Vec<Ticket>>;
    /// Marks the ticket scanned and records the check-in in one transaction.
    /// Returns `None` when the ticket was already scanned, including by a
    /// concurrent request.
    async fn redeem(&self, ticket_id: &Uuid, scanned_by: &Uuid) -> DbResult<Option<(Ticket, Checkin)>>;
}

#[derive(Clone, Debug)]
pub struct TicketRepository {
    pool: PgPool,
}
impl TicketRepository {
    pub fn new(pool: &PgPool) -> Self {
        Self { pool: pool.clone() }
    }
}

#[async_trait]
impl TicketStore for TicketRepository {
    async fn create(&self, new_ticket: &Ticket) -> DbResult<Ticket> {
        let ticket = sqlx::query_as::<_, Ticket>(
            "
            INSERT INTO tickets (
                id, user_id, event_id, ticket_type, price_cents, is_scanned, scanned_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            ",
        )
        .bind(new_ticket.id)
        .bind(new_ticket.user_id)
        .bind(new_ticket.event_id)
        .bind(new_ticket.ticket_type.to_string())
        .bind(new_ticket.price_cents)
        .bind(new_ticket.is_scanned)
        .bind(new_ticket.scanned_at)
        .bind(new_ticket.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(ticket)
    }

    async fn find_by_id(&self, id: &Uuid) -> DbResult<Option<Ticket>> {
        let ticket = sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE id = $1")
            .bind(*id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(ticket)
    }

    async fn find_by_user(&self, user_id: &Uuid) -> DbResult<Vec<Ticket>> {
        let tickets = sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(*user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(tickets)
    }

    async fn redeem(&self, ticket_id: &Uuid, scanned_by: &Uuid) -> DbResult<Option<(Ticket, Checkin)>> {
        let mut tx = self.pool.begin().await?;

        let scanned = sqlx::query_as::<_, Ticket>(
            "
            UPDATE tickets
            SET is_scanned = TRUE, scanned_at = NOW()
            WHERE id = $1 AND is_scanned = FALSE
            RETURNING *
            ",
        )
        .bind(*ticket_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(ticket) = scanned else {
            tx.rollback().await?;
            return Ok(None);
        };

        let checkin = Checkin::new(&ticket, *scanned_by);
        let checkin = sqlx::query_as::<_, Checkin>(
            "
            INSERT INTO checkins (id, ticket_id, user_id, event_id, scanned_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            ",
        )
        .bind(checkin.id)
        .bind(checkin.ticket_id)
        .bind(checkin.user_id)
        .bind(checkin.event_id)
        .bind(checkin.scanned_by)
        .bind(checkin.created_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some((ticket, checkin)))
    }
}
