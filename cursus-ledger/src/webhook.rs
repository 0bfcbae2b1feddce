//! Completion-notification envelope and signature verification.
//!
//! The processor signs every delivery with a header of the form
//! `t=<unix seconds>,v1=<hex hmac-sha256>` over `"{t}.{raw body}"`.
//! Verification must happen on the raw body before anything is parsed
//! or mutated; at-least-once delivery means the same event can arrive
//! more than once (the reconciler deduplicates).

use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use cursus_core::CheckoutSession;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the delivery signature.
pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Event type emitted when a hosted checkout settles.
pub const EVENT_CHECKOUT_COMPLETED: &str = "checkout.session.completed";

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    pub object: CheckoutSession,
}

impl WebhookEvent {
    pub fn is_checkout_completed(&self) -> bool {
        self.event_type == EVENT_CHECKOUT_COMPLETED
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature header is missing a timestamp")]
    MissingTimestamp,

    #[error("signature header carries no v1 signature")]
    MissingSignature,

    #[error("signature timestamp outside tolerance")]
    StaleTimestamp,

    #[error("webhook secret rejected")]
    InvalidSecret,

    #[error("signature does not match payload")]
    Mismatch,
}

/// Verifies a delivery signature against the shared webhook secret,
/// using the current wall clock for the timestamp tolerance check.
pub fn verify_signature(
    secret: &str,
    header: &str,
    payload: &[u8],
    tolerance_seconds: i64,
) -> Result<(), SignatureError> {
    verify_signature_at(secret, header, payload, Utc::now().timestamp(), tolerance_seconds)
}

/// Clock-injected variant of [`verify_signature`].
pub fn verify_signature_at(
    secret: &str,
    header: &str,
    payload: &[u8],
    now: i64,
    tolerance_seconds: i64,
) -> Result<(), SignatureError> {
    let mut timestamp: Option<&str> = None;
    let mut signatures: Vec<Vec<u8>> = Vec::new();

    for element in header.split(',') {
        match element.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            // Deliveries may carry several v1 signatures during secret rotation
            Some(("v1", value)) => {
                if let Ok(bytes) = hex::decode(value) {
                    signatures.push(bytes);
                }
            }
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::MissingTimestamp)?;
    let parsed: i64 = timestamp
        .parse()
        .map_err(|_| SignatureError::MissingTimestamp)?;
    if signatures.is_empty() {
        return Err(SignatureError::MissingSignature);
    }
    if (now - parsed).abs() > tolerance_seconds {
        return Err(SignatureError::StaleTimestamp);
    }

    for candidate in &signatures {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| SignatureError::InvalidSecret)?;
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        // Constant-time comparison via the Mac trait
        if mac.verify_slice(candidate).is_ok() {
            return Ok(());
        }
    }
    Err(SignatureError::Mismatch)
}

/// Builds a valid signature header for a payload. Used by tests and by
/// local delivery-replay tooling.
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}
