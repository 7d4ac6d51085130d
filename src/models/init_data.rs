use serde::{Deserialize, Serialize};

/// User object embedded as JSON in the `user` field of Telegram initData.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
    #[serde(default)]
    pub is_premium: Option<bool>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

/// Fields of interest pulled out of an initData query string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedInitData {
    pub user: Option<TelegramUser>,
    pub auth_date: Option<i64>,
    pub hash: String,
}

#[derive(Debug, Deserialize)]
pub struct TelegramAuthBody {
    #[serde(rename = "initData")]
    pub init_data: String,
}
