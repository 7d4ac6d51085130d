use std::sync::Arc;

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::repositories::{
    event::{EventRepository, EventStore},
    ticket::{TicketRepository, TicketStore},
    user::{UserRepository, UserStore},
    DbResult,
};

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Record not found: {0}")]
    RecordNotFound(String),
}

/// Repositories the HTTP layer talks to, behind their store traits.
#[derive(Clone)]
pub struct DbPersistence {
    pub users: Arc<dyn UserStore>,
    pub events: Arc<dyn EventStore>,
    pub tickets: Arc<dyn TicketStore>,
}

impl DbPersistence {
    pub async fn new(database_url: &str) -> DbResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self::from_pool(&pool))
    }

    pub fn from_pool(pool: &PgPool) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool)),
            events: Arc::new(EventRepository::new(pool)),
            tickets: Arc::new(TicketRepository::new(pool)),
        }
    }

    pub fn from_stores(users: Arc<dyn UserStore>, events: Arc<dyn EventStore>, tickets: Arc<dyn TicketStore>) -> Self {
        Self { users, events, tickets }
    }
}
