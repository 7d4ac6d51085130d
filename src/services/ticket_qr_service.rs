use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use image::{ImageFormat, Luma};
use qrcode::QrCode;
use sha2::Sha256;
use tracing::debug;

use crate::models::ticket_qr::{IssuedTicketQr, SignedTicketQr, TicketQrPayload};

type HmacSha256 = Hmac<Sha256>;

const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

#[derive(Debug, thiserror::Error)]
pub enum TicketQrError {
    #[error("Invalid signing key")]
    InvalidKey,
    #[error("Failed serializing QR payload: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed encoding QR symbol: {0}")]
    Encode(#[from] qrcode::types::QrError),
    #[error("Failed rendering QR image: {0}")]
    Render(#[from] image::ImageError),
}

pub type TicketQrResult<T> = Result<T, TicketQrError>;

/// Issues and checks HMAC-signed ticket QR codes.
///
/// Stateless: the signing secret is passed to every call. Whether a ticket
/// has already been redeemed is tracked on the ticket record, not here.
pub struct TicketQrService;

impl TicketQrService {
    pub fn default_max_age() -> Duration {
        Duration::hours(24)
    }

    pub fn issue(ticket_id: &str, user_id: &str, event_id: &str, secret: &str) -> TicketQrResult<IssuedTicketQr> {
        let payload = TicketQrPayload {
            ticket_id: ticket_id.to_string(),
            user_id: user_id.to_string(),
            event_id: event_id.to_string(),
            timestamp: Some(Utc::now().timestamp_millis()),
        };

        let signature = Self::sign(&payload, secret)?;
        let token = SignedTicketQr::new(payload, signature);
        let content = serde_json::to_string(&token)?;
        let data_uri = Self::render_data_uri(&content)?;

        debug!(content_len = content.len(), "TicketQrService::issue");
        Ok(IssuedTicketQr {
            token,
            content,
            data_uri,
        })
    }

    /// Hex HMAC-SHA256 over the canonical JSON of the payload.
    pub fn sign(payload: &TicketQrPayload, secret: &str) -> TicketQrResult<String> {
        let message = serde_json::to_string(payload)?;
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| TicketQrError::InvalidKey)?;
        mac.update(message.as_bytes());

        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Only the exact lowercase hex that `sign` produces is accepted.
    pub fn verify(token: &SignedTicketQr, secret: &str) -> bool {
        if !is_lower_hex(&token.signature) {
            return false;
        }
        let Ok(expected) = hex::decode(&token.signature) else {
            return false;
        };
        let Ok(message) = serde_json::to_string(&token.payload()) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
            return false;
        };
        mac.update(message.as_bytes());

        mac.verify_slice(&expected).is_ok()
    }

    /// Parses raw scanned content and verifies it in one step.
    pub fn verify_content(content: &str, secret: &str) -> bool {
        Self::parse(content).is_some_and(|token| Self::verify(&token, secret))
    }

    /// `None` for anything that is not a well-formed token object.
    pub fn parse(content: &str) -> Option<SignedTicketQr> {
        serde_json::from_str(content).ok()
    }

    pub fn is_expired(token: &SignedTicketQr, max_age: Duration) -> bool {
        Self::is_expired_at(token, max_age, Utc::now().timestamp_millis())
    }

    /// Tokens without a timestamp are always expired.
    pub fn is_expired_at(token: &SignedTicketQr, max_age: Duration, now_ms: i64) -> bool {
        match token.timestamp {
            Some(timestamp) => now_ms.saturating_sub(timestamp) > max_age.num_milliseconds(),
            None => true,
        }
    }

    pub fn render_png(content: &str) -> TicketQrResult<Vec<u8>> {
        let code = QrCode::new(content.as_bytes())?;
        let image = code.render::<Luma<u8>>().build();

        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

        Ok(png)
    }

    pub fn render_data_uri(content: &str) -> TicketQrResult<String> {
        let png = Self::render_png(content)?;

        Ok(format!("{}{}", PNG_DATA_URI_PREFIX, STANDARD.encode(png)))
    }
}

fn is_lower_hex(value: &str) -> bool {
    value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    fn payload() -> TicketQrPayload {
        TicketQrPayload {
            ticket_id: "ticket-id".to_string(),
            user_id: "user-id".to_string(),
            event_id: "event-id".to_string(),
            timestamp: Some(1_700_000_000_000),
        }
    }

    fn signed() -> SignedTicketQr {
        let payload = payload();
        let signature = TicketQrService::sign(&payload, SECRET).unwrap();
        SignedTicketQr::new(payload, signature)
    }

    /// Reads the QR symbol back out of a rendered data URI.
    fn decode_data_uri(data_uri: &str) -> String {
        let png = STANDARD
            .decode(data_uri.strip_prefix(PNG_DATA_URI_PREFIX).unwrap())
            .unwrap();
        let image = image::load_from_memory_with_format(&png, ImageFormat::Png)
            .unwrap()
            .to_luma8();

        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            image.width() as usize,
            image.height() as usize,
            |x, y| image.get_pixel(x as u32, y as u32).0[0],
        );
        let grids = prepared.detect_grids();
        assert_eq!(grids.len(), 1);
        let (_, content) = grids[0].decode().unwrap();
        content
    }

    #[test]
    fn canonical_message_matches_wire_format() {
        let message = serde_json::to_string(&payload()).unwrap();
        assert_eq!(
            message,
            r#"{"ticketId":"ticket-id","userId":"user-id","eventId":"event-id","timestamp":1700000000000}"#
        );
    }

    #[test]
    fn sign_then_verify_round_trips() {
        assert!(TicketQrService::verify(&signed(), SECRET));
    }

    #[test]
    fn signing_is_deterministic() {
        let first = TicketQrService::sign(&payload(), SECRET).unwrap();
        let second = TicketQrService::sign(&payload(), SECRET).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn field_order_of_scanned_json_does_not_change_signature() {
        let token = signed();
        let reordered = format!(
            r#"{{"signature":"{}","timestamp":1700000000000,"eventId":"event-id","userId":"user-id","ticketId":"ticket-id"}}"#,
            token.signature
        );

        let parsed = TicketQrService::parse(&reordered).unwrap();
        assert_eq!(parsed, token);
        assert!(TicketQrService::verify_content(&reordered, SECRET));
    }

    #[test]
    fn any_single_field_change_is_detected() {
        let token = signed();

        let mut tampered = token.clone();
        tampered.ticket_id = "ticket-id-2".to_string();
        assert!(!TicketQrService::verify(&tampered, SECRET));

        let mut tampered = token.clone();
        tampered.user_id = "user-id-2".to_string();
        assert!(!TicketQrService::verify(&tampered, SECRET));

        let mut tampered = token.clone();
        tampered.event_id = "event-id-2".to_string();
        assert!(!TicketQrService::verify(&tampered, SECRET));

        let mut tampered = token.clone();
        tampered.timestamp = Some(1_700_000_000_001);
        assert!(!TicketQrService::verify(&tampered, SECRET));

        let mut tampered = token;
        tampered.timestamp = None;
        assert!(!TicketQrService::verify(&tampered, SECRET));
    }

    #[test]
    fn uppercase_signature_is_rejected() {
        let mut token = signed();
        token.signature = token.signature.to_uppercase();
        assert!(!TicketQrService::verify(&token, SECRET));
    }

    #[test]
    fn other_secret_is_rejected() {
        assert!(!TicketQrService::verify(&signed(), "another-secret"));
    }

    #[test]
    fn malformed_signature_is_rejected() {
        let mut token = signed();
        token.signature = "wrong-signature".to_string();
        assert!(!TicketQrService::verify(&token, SECRET));

        token.signature = String::new();
        assert!(!TicketQrService::verify(&token, SECRET));
    }

    #[test]
    fn parse_rejects_corrupt_content() {
        assert!(TicketQrService::parse("invalid-json").is_none());
        assert!(TicketQrService::parse(r#"{"ticketId":"123","signature":"abc"}"#).is_none());
        assert!(TicketQrService::parse(
            r#"{"ticketId":"t","userId":"u","eventId":"e","timestamp":1,"signature":"ab","extra":true}"#
        )
        .is_none());
        assert!(!TicketQrService::verify_content("invalid-json", SECRET));
    }

    #[test]
    fn parse_accepts_token_without_timestamp() {
        let token = TicketQrService::parse(r#"{"ticketId":"t","userId":"u","eventId":"e","signature":"ab"}"#).unwrap();
        assert_eq!(token.timestamp, None);
    }

    #[test]
    fn expiry_boundary() {
        let max_age = TicketQrService::default_max_age();
        let now = 1_800_000_000_000;
        let mut token = signed();

        token.timestamp = Some(now - max_age.num_milliseconds() - 1);
        assert!(TicketQrService::is_expired_at(&token, max_age, now));

        token.timestamp = Some(now - max_age.num_milliseconds());
        assert!(!TicketQrService::is_expired_at(&token, max_age, now));

        token.timestamp = Some(now - max_age.num_milliseconds() + 1);
        assert!(!TicketQrService::is_expired_at(&token, max_age, now));
    }

    #[test]
    fn missing_timestamp_is_expired() {
        let mut token = signed();
        token.timestamp = None;
        assert!(TicketQrService::is_expired(&token, TicketQrService::default_max_age()));
    }

    #[test]
    fn fresh_and_stale_tokens() {
        let now = Utc::now().timestamp_millis();
        let mut token = signed();

        token.timestamp = Some(now);
        assert!(!TicketQrService::is_expired(&token, TicketQrService::default_max_age()));

        token.timestamp = Some(now - Duration::hours(25).num_milliseconds());
        assert!(TicketQrService::is_expired(&token, TicketQrService::default_max_age()));
    }

    #[test]
    fn issue_renders_png_data_uri() {
        let issued = TicketQrService::issue("ticket-id", "user-id", "event-id", SECRET).unwrap();
        assert!(issued.data_uri.starts_with(PNG_DATA_URI_PREFIX));
        assert!(issued.token.timestamp.is_some());
        assert!(TicketQrService::verify(&issued.token, SECRET));
    }

    #[test]
    fn issue_differs_per_ticket() {
        let first = TicketQrService::issue("ticket-1", "user-1", "event-1", SECRET).unwrap();
        let second = TicketQrService::issue("ticket-2", "user-2", "event-2", SECRET).unwrap();
        assert_ne!(first.data_uri, second.data_uri);
    }

    #[test]
    fn issued_image_decodes_to_verifiable_token() {
        let issued = TicketQrService::issue("t1", "u1", "e1", "s").unwrap();
        let content = decode_data_uri(&issued.data_uri);

        assert_eq!(content, issued.content);
        assert!(TicketQrService::verify_content(&content, "s"));
        assert!(!TicketQrService::verify_content(&content, "wrong-secret"));
    }
}
