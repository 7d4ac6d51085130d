use serde::{Deserialize, Serialize};

/// Signed part of a ticket QR code.
///
/// Field declaration order is the canonical signing order; serde serializes
/// structs in declaration order, so the signed message never depends on the
/// order fields arrived in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketQrPayload {
    pub ticket_id: String,
    pub user_id: String,
    pub event_id: String,
    /// Unix milliseconds at issuance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

/// Payload plus its hex HMAC-SHA256 signature, exactly as embedded in the QR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SignedTicketQr {
    pub ticket_id: String,
    pub user_id: String,
    pub event_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    pub signature: String,
}

impl SignedTicketQr {
    pub fn new(payload: TicketQrPayload, signature: String) -> Self {
        Self {
            ticket_id: payload.ticket_id,
            user_id: payload.user_id,
            event_id: payload.event_id,
            timestamp: payload.timestamp,
            signature,
        }
    }

    pub fn payload(&self) -> TicketQrPayload {
        TicketQrPayload {
            ticket_id: self.ticket_id.clone(),
            user_id: self.user_id.clone(),
            event_id: self.event_id.clone(),
            timestamp: self.timestamp,
        }
    }
}

/// Output of QR issuance.
#[derive(Debug, Clone)]
pub struct IssuedTicketQr {
    pub token: SignedTicketQr,
    /// JSON text encoded in the QR symbol.
    pub content: String,
    /// `data:image/png;base64,...`
    pub data_uri: String,
}
