use std::collections::HashMap;

use async_trait::async_trait;

use crate::payment::{CheckoutSession, LineItem, NewCheckoutSession, Product};

/// Errors talking to the payment processor. Read paths fail closed on
/// any of these; callers decide whether a retry is safe.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("processor transport failure: {0}")]
    Transport(String),

    #[error("processor call timed out")]
    Timeout,

    #[error("processor returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("could not decode processor response: {0}")]
    Decode(String),

    #[error("not found: {0}")]
    NotFound(String),
}

/// The processor's product catalog, used as the course table.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// All active products with their default price expanded.
    async fn list_active_products(&self) -> Result<Vec<Product>, StoreError>;

    async fn get_product(&self, product_id: &str) -> Result<Product, StoreError>;

    /// Replaces the product's metadata map wholesale. The caller is
    /// responsible for carrying over keys it does not intend to change.
    async fn update_product_metadata(
        &self,
        product_id: &str,
        metadata: HashMap<String, String>,
    ) -> Result<Product, StoreError>;
}

/// The processor's checkout transactions, used as the booking ledger.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn create_checkout_session(
        &self,
        request: NewCheckoutSession,
    ) -> Result<CheckoutSession, StoreError>;

    /// Most recent sessions, newest first, regardless of status.
    async fn list_recent_sessions(
        &self,
        limit: u32,
    ) -> Result<Vec<CheckoutSession>, StoreError>;

    /// Line items of one session with price and product expanded.
    async fn list_line_items(
        &self,
        session_id: &str,
    ) -> Result<Vec<LineItem>, StoreError>;
}
