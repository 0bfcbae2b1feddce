use std::sync::Arc;

use tracing::info;

use cursus_core::metadata;
use cursus_core::payment::NewCheckoutSession;
use cursus_core::store::{StoreError, TransactionStore};
use cursus_core::Participant;

use crate::LedgerError;

/// Creates redirectable checkout sessions for course enrollments.
///
/// Business validation (capacity, pricing) happens upstream; this
/// writer only checks structural shape before encoding, so a malformed
/// request can never reach the processor half-formed.
pub struct BookingWriter {
    transactions: Arc<dyn TransactionStore>,
    base_url: String,
}

impl BookingWriter {
    pub fn new(transactions: Arc<dyn TransactionStore>, base_url: &str) -> Self {
        Self {
            transactions,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Creates the checkout session and returns the processor-hosted
    /// redirect URL, with a `return_to` parameter appended so an
    /// abandoned payment links back to the storefront.
    pub async fn create_booking(
        &self,
        course_id: &str,
        price_id: &str,
        quantity: u32,
        participants: &[Participant],
    ) -> Result<String, LedgerError> {
        if quantity < 1 {
            return Err(LedgerError::Validation(
                "at least one seat must be booked".to_string(),
            ));
        }
        if price_id.is_empty() {
            return Err(LedgerError::Validation(
                "course has no price reference".to_string(),
            ));
        }
        if participants.len() != quantity as usize {
            return Err(LedgerError::Validation(format!(
                "{} seats booked but {} participants given",
                quantity,
                participants.len()
            )));
        }
        for (index, participant) in participants.iter().enumerate() {
            if let Some(field) = participant.missing_required_field() {
                return Err(LedgerError::Validation(format!(
                    "participant {} is missing '{}'",
                    index + 1,
                    field
                )));
            }
        }

        let metadata = metadata::encode_participants(course_id, quantity, participants)?;

        let session = self
            .transactions
            .create_checkout_session(NewCheckoutSession {
                price_id: price_id.to_string(),
                quantity,
                metadata,
                success_url: format!(
                    "{}/success?session_id={{CHECKOUT_SESSION_ID}}",
                    self.base_url
                ),
                cancel_url: format!("{}/inschrijven/{}", self.base_url, course_id),
                locale: "nl".to_string(),
                collect_billing_address: true,
                collect_phone_number: true,
            })
            .await?;

        let checkout_url = session.url.ok_or_else(|| {
            StoreError::Decode("checkout session has no redirect URL".to_string())
        })?;
        info!(session = %session.id, course = course_id, quantity, "checkout session created");

        let separator = if checkout_url.contains('?') { '&' } else { '?' };
        Ok(format!(
            "{}{}return_to={}",
            checkout_url,
            separator,
            urlencoding::encode(&self.base_url)
        ))
    }
}
