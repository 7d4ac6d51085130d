//! # NightPass Library
//!
//! Ticketing backend for nightclub events. Guests sign in through a
//! Telegram Mini App, buy tickets, and carry an HMAC-signed QR code that
//! door staff redeem exactly once at the entrance.

pub mod args;
pub mod config;
pub mod db_persistence;
pub mod errors;
pub mod handlers;
pub mod http_server;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use db_persistence::DbPersistence;
pub use http_server::AppState;
pub use services::{telegram_auth_service::TelegramAuthService, ticket_qr_service::TicketQrService};

// Re-export errors
pub use db_persistence::DbError;
pub use errors::{AppError, AppResult};
pub use services::ticket_qr_service::TicketQrError;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get the library version
pub fn version() -> &'static str {
    VERSION
}

/// Get the library name
pub fn name() -> &'static str {
    NAME
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }

    #[test]
    fn test_name() {
        assert_eq!(name(), "nightpass");
    }
}
