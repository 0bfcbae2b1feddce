use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use cursus_core::Participant;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub course_id: String,
    pub price_id: String,
    pub quantity: u32,
    #[serde(default)]
    pub participants: Vec<Participant>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub url: String,
}

/// POST /api/checkout
/// Creates the checkout session and hands back the processor-hosted
/// redirect URL for the enrollment flow.
pub async fn create_checkout(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, AppError> {
    let url = state
        .booking
        .create_booking(
            &request.course_id,
            &request.price_id,
            request.quantity,
            &request.participants,
        )
        .await
        .map_err(AppError::from_ledger)?;
    Ok(Json(CheckoutResponse { url }))
}
