use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use serde_json::{json, Value};

use cursus_ledger::webhook::{self, WebhookEvent};
use cursus_ledger::ReconcileOutcome;

use crate::error::AppError;
use crate::state::AppState;

/// POST /api/webhooks/stripe
/// Receives payment events from the processor. The signature is
/// checked against the raw body before anything is parsed; a delivery
/// that fails verification changes nothing and gets a 400.
pub async fn handle_stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let signature = headers
        .get(webhook::SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("missing signature header".to_string()))?;

    if let Err(error) = webhook::verify_signature(
        &state.webhook.secret,
        signature,
        &body,
        state.webhook.tolerance_seconds,
    ) {
        tracing::warn!(%error, "webhook signature verification failed");
        return Err(AppError::BadRequest("invalid signature".to_string()));
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("malformed event payload: {}", e)))?;
    tracing::info!(event = %event.id, kind = %event.event_type, "webhook received");

    let outcome = state
        .reconciler
        .on_payment_completed(&event)
        .await
        .map_err(AppError::from_ledger)?;
    if let ReconcileOutcome::Applied { seats } = outcome {
        tracing::info!(event = %event.id, seats, "completion applied");
    }

    Ok(Json(json!({ "received": true })))
}
