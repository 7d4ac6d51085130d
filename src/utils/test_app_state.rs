use std::sync::Arc;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use url::form_urlencoded;

use crate::{
    db_persistence::DbPersistence,
    http_server::AppState,
    metrics::Metrics,
    models::user::{User, UserInput, UserRole},
    repositories::{event::MockEventStore, ticket::MockTicketStore, user::MockUserStore},
    services::telegram_auth_service::TelegramAuthService,
    utils::jwt::issue_access_token,
    Config,
};

pub fn create_test_app_state(users: MockUserStore, events: MockEventStore, tickets: MockTicketStore) -> AppState {
    let config = Config::load_test_env().expect("Failed to load test configuration");
    let db = DbPersistence::from_stores(Arc::new(users), Arc::new(events), Arc::new(tickets));

    AppState {
        db: Arc::new(db),
        config: Arc::new(config),
        metrics: Arc::new(Metrics::new()),
    }
}

pub fn create_empty_test_app_state() -> AppState {
    create_test_app_state(MockUserStore::new(), MockEventStore::new(), MockTicketStore::new())
}

pub fn test_user(telegram_id: &str, role: UserRole) -> User {
    let mut input = UserInput::browser_admin(telegram_id);
    input.telegram_id = telegram_id.to_string();
    input.role = role;
    User::new(input).expect("valid test user")
}

pub fn generate_test_token(config: &Config, user: &User) -> String {
    issue_access_token(config, user).expect("Failed to sign token")
}

/// Builds initData signed the way Telegram signs it for `bot_token`.
pub fn signed_init_data(pairs: &[(&str, &str)], bot_token: &str) -> String {
    let owned = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    let data_check_string = TelegramAuthService::data_check_string(owned);

    let mut secret = Hmac::<Sha256>::new_from_slice(b"WebAppData").unwrap();
    secret.update(bot_token.as_bytes());
    let secret_key = secret.finalize().into_bytes();

    let mut mac = Hmac::<Sha256>::new_from_slice(&secret_key).unwrap();
    mac.update(data_check_string.as_bytes());
    let hash = hex::encode(mac.finalize().into_bytes());

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.append_pair("hash", &hash);
    serializer.finish()
}
