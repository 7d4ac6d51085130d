use serde::{Deserialize, Serialize};

use crate::models::user::{SessionRole, UserResponse};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User id.
    pub sub: String,
    pub telegram_id: String,
    pub username: Option<String>,
    pub role: SessionRole,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Debug, Serialize)]
pub struct TelegramLoginResponse {
    pub access_token: String,
    pub user: UserResponse,
}

#[derive(Debug, Deserialize)]
pub struct BrowserLoginBody {
    pub username: String,
    pub secret: String,
}

#[derive(Debug, Serialize)]
pub struct BrowserLoginResponse {
    pub access_token: String,
}
