use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use uuid::Uuid;

use crate::{
    errors::{AppError, ValidationErrors},
    models::init_data::TelegramUser,
};

/// Role stored on the user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    User,
    Vip,
    Premium,
    Promoter,
    Door,
    Manager,
    Admin,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::User => write!(f, "USER"),
            UserRole::Vip => write!(f, "VIP"),
            UserRole::Premium => write!(f, "PREMIUM"),
            UserRole::Promoter => write!(f, "PROMOTER"),
            UserRole::Door => write!(f, "DOOR"),
            UserRole::Manager => write!(f, "MANAGER"),
            UserRole::Admin => write!(f, "ADMIN"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USER" => Ok(UserRole::User),
            "VIP" => Ok(UserRole::Vip),
            "PREMIUM" => Ok(UserRole::Premium),
            "PROMOTER" => Ok(UserRole::Promoter),
            "DOOR" => Ok(UserRole::Door),
            "MANAGER" => Ok(UserRole::Manager),
            "ADMIN" => Ok(UserRole::Admin),
            _ => Err(format!("Invalid user role: {}", s)),
        }
    }
}

/// Role carried in session tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionRole {
    Guest,
    Promoter,
    Door,
    Manager,
    Admin,
}

impl SessionRole {
    pub fn can_scan_tickets(&self) -> bool {
        matches!(self, SessionRole::Door | SessionRole::Manager | SessionRole::Admin)
    }
}

impl From<UserRole> for SessionRole {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::User | UserRole::Vip | UserRole::Premium => SessionRole::Guest,
            UserRole::Promoter => SessionRole::Promoter,
            UserRole::Door => SessionRole::Door,
            UserRole::Manager => SessionRole::Manager,
            UserRole::Admin => SessionRole::Admin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub telegram_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct UserInput {
    pub telegram_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub role: UserRole,
}

impl UserInput {
    pub fn from_telegram(user: &TelegramUser) -> Self {
        Self {
            telegram_id: user.id.to_string(),
            first_name: non_empty(Some(user.first_name.as_str())),
            last_name: non_empty(user.last_name.as_deref()),
            username: non_empty(user.username.as_deref()),
            role: UserRole::User,
        }
    }

    pub fn browser_admin(username: &str) -> Self {
        Self {
            telegram_id: format!("browser_{}", username),
            first_name: Some(username.to_string()),
            last_name: None,
            username: Some(username.to_string()),
            role: UserRole::Admin,
        }
    }
}

/// Profile fields refreshed on every Telegram login. `None` keeps the
/// stored value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl UserProfileUpdate {
    pub fn from_telegram(user: &TelegramUser) -> Self {
        Self {
            first_name: non_empty(Some(user.first_name.as_str())),
            last_name: non_empty(user.last_name.as_deref()),
            username: non_empty(user.username.as_deref()),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(|v| v.to_string())
}

impl User {
    pub fn new(input: UserInput) -> Result<Self, AppError> {
        let mut errors = ValidationErrors::new();

        if input.telegram_id.trim().is_empty() {
            errors.add("telegram_id", String::from("Telegram id shouldn't be empty."));
        }
        if let Some(username) = &input.username {
            if username.len() > 64 {
                errors.add("username", String::from("Username is too long."));
            }
        }

        if !errors.is_empty() {
            return Err(AppError::ValidationErrors(errors));
        }

        let now = Utc::now();
        Ok(User {
            id: Uuid::new_v4(),
            telegram_id: input.telegram_id,
            first_name: input.first_name,
            last_name: input.last_name,
            username: input.username,
            role: input.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn session_role(&self) -> SessionRole {
        SessionRole::from(self.role)
    }
}

impl<'r> FromRow<'r, PgRow> for User {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let role_str: String = row.try_get("role")?;
        let role = role_str
            .parse::<UserRole>()
            .map_err(|e| sqlx::Error::Decode(Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e))))?;

        Ok(User {
            id: row.try_get("id")?,
            telegram_id: row.try_get("telegram_id")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            username: row.try_get("username")?,
            role,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub telegram_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub role: SessionRole,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            telegram_id: user.telegram_id.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            username: user.username.clone(),
            role: user.session_role(),
        }
    }
}
