use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;
use url::form_urlencoded;

use crate::models::init_data::{ParsedInitData, TelegramUser};

type HmacSha256 = Hmac<Sha256>;

const WEB_APP_DATA_KEY: &[u8] = b"WebAppData";
const HASH_FIELD: &str = "hash";

/// Verifies Telegram WebApp `initData` login payloads.
///
/// The bot token is always supplied by the caller. An empty token never
/// validates anything.
pub struct TelegramAuthService;

impl TelegramAuthService {
    pub fn validate_init_data(init_data: &str, bot_token: &str) -> bool {
        if bot_token.is_empty() {
            debug!("validate_init_data: bot token not configured");
            return false;
        }

        let mut pairs = Self::parse_pairs(init_data);

        let Some(hash) = pairs.iter().find(|(key, _)| key == HASH_FIELD).map(|(_, v)| v.clone()) else {
            debug!("validate_init_data: hash field missing");
            return false;
        };
        pairs.retain(|(key, _)| key != HASH_FIELD);

        if !hash.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            debug!("validate_init_data: hash is not lowercase hex");
            return false;
        }
        let Ok(expected) = hex::decode(&hash) else {
            debug!("validate_init_data: hash is not hex");
            return false;
        };

        let data_check_string = Self::data_check_string(pairs);

        let Some(secret_key) = Self::secret_key(bot_token) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(&secret_key) else {
            return false;
        };
        mac.update(data_check_string.as_bytes());

        let ok = mac.verify_slice(&expected).is_ok();
        debug!(ok = ok, fields = data_check_string.lines().count(), "validate_init_data");
        ok
    }

    /// Extracts `user`, `auth_date` and `hash`. Never fails: unparsable
    /// fields come back as `None` (or an empty hash).
    pub fn parse_init_data(init_data: &str) -> ParsedInitData {
        let pairs = Self::parse_pairs(init_data);
        let field = |name: &str| pairs.iter().find(|(key, _)| key == name).map(|(_, v)| v.as_str());

        ParsedInitData {
            user: field("user").and_then(|raw| serde_json::from_str::<TelegramUser>(raw).ok()),
            auth_date: field("auth_date").and_then(|raw| raw.trim().parse::<i64>().ok()),
            hash: field(HASH_FIELD).unwrap_or_default().to_string(),
        }
    }

    /// Parsed payload, only when the signature checks out.
    pub fn verify_init_data(init_data: &str, bot_token: &str) -> Option<ParsedInitData> {
        if Self::validate_init_data(init_data, bot_token) {
            Some(Self::parse_init_data(init_data))
        } else {
            None
        }
    }

    /// `key=value` lines sorted by key, joined with `\n`. The sort is stable
    /// so repeated keys keep their original relative order.
    pub fn data_check_string(mut pairs: Vec<(String, String)>) -> String {
        pairs.sort_by(|(a, _), (b, _)| a.cmp(b));
        pairs
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// HMAC-SHA256 keyed with "WebAppData" over the bot token.
    fn secret_key(bot_token: &str) -> Option<Vec<u8>> {
        let mut mac = HmacSha256::new_from_slice(WEB_APP_DATA_KEY).ok()?;
        mac.update(bot_token.as_bytes());
        Some(mac.finalize().into_bytes().to_vec())
    }

    fn parse_pairs(init_data: &str) -> Vec<(String, String)> {
        form_urlencoded::parse(init_data.as_bytes())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    }
}
