use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{models::event::Event, repositories::DbResult};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> DbResult<Option<Event>>;
}

#[derive(Clone, Debug)]
pub struct EventRepository {
    pool: PgPool,
}
impl EventRepository {
    pub fn new(pool: &PgPool) -> Self {
        Self { pool: pool.clone() }
    }
}

#[async_trait]
impl EventStore for EventRepository {
    async fn find_by_id(&self, id: &Uuid) -> DbResult<Option<Event>> {
        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(*id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(event)
    }
}
