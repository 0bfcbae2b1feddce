//! In-memory stand-in for the payment processor, used by tests and
//! local development. Mirrors the live adapter's observable behavior:
//! newest-first session listing, line items expanded with their
//! product, and an await point on every call.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use cursus_core::payment::{
    CheckoutSession, LineItem, LineItemPrice, NewCheckoutSession, PaymentStatus,
    Product,
};
use cursus_core::store::{CatalogStore, StoreError, TransactionStore};

#[derive(Default)]
pub struct InMemoryProcessor {
    products: RwLock<Vec<Product>>,
    sessions: RwLock<Vec<CheckoutSession>>,
    line_items: RwLock<HashMap<String, Vec<LineItem>>>,
}

impl InMemoryProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_product(&self, product: Product) {
        self.products.write().await.push(product);
    }

    /// Seeds a pre-existing session with its line items, for tests that
    /// need paid history without walking the checkout flow.
    pub async fn add_session(&self, session: CheckoutSession, items: Vec<LineItem>) {
        self.line_items
            .write()
            .await
            .insert(session.id.clone(), items);
        self.sessions.write().await.push(session);
    }

    /// Flips a session to paid, as the hosted checkout flow would.
    pub async fn mark_paid(&self, session_id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.iter_mut().find(|s| s.id == session_id) {
            Some(session) => {
                session.payment_status = PaymentStatus::Paid;
                true
            }
            None => false,
        }
    }

    pub async fn session(&self, session_id: &str) -> Option<CheckoutSession> {
        self.sessions
            .read()
            .await
            .iter()
            .find(|s| s.id == session_id)
            .cloned()
    }

    pub async fn product(&self, product_id: &str) -> Option<Product> {
        self.products
            .read()
            .await
            .iter()
            .find(|p| p.id == product_id)
            .cloned()
    }
}

#[async_trait]
impl CatalogStore for InMemoryProcessor {
    async fn list_active_products(&self) -> Result<Vec<Product>, StoreError> {
        tokio::task::yield_now().await;
        Ok(self
            .products
            .read()
            .await
            .iter()
            .filter(|p| p.active)
            .cloned()
            .collect())
    }

    async fn get_product(&self, product_id: &str) -> Result<Product, StoreError> {
        // Yield where the live client would suspend on the network.
        tokio::task::yield_now().await;
        self.product(product_id)
            .await
            .ok_or_else(|| StoreError::NotFound(product_id.to_string()))
    }

    async fn update_product_metadata(
        &self,
        product_id: &str,
        metadata: HashMap<String, String>,
    ) -> Result<Product, StoreError> {
        tokio::task::yield_now().await;
        let mut products = self.products.write().await;
        let product = products
            .iter_mut()
            .find(|p| p.id == product_id)
            .ok_or_else(|| StoreError::NotFound(product_id.to_string()))?;
        product.metadata = metadata;
        Ok(product.clone())
    }
}

#[async_trait]
impl TransactionStore for InMemoryProcessor {
    async fn create_checkout_session(
        &self,
        request: NewCheckoutSession,
    ) -> Result<CheckoutSession, StoreError> {
        tokio::task::yield_now().await;
        let product = self
            .products
            .read()
            .await
            .iter()
            .find(|p| {
                p.default_price
                    .as_ref()
                    .map(|price| price.id == request.price_id)
                    .unwrap_or(false)
            })
            .cloned()
            .ok_or_else(|| StoreError::NotFound(request.price_id.clone()))?;

        let id = format!("cs_test_{}", Uuid::new_v4().simple());
        let session = CheckoutSession {
            id: id.clone(),
            url: Some(format!("https://checkout.test/c/pay/{}", id)),
            payment_status: PaymentStatus::Pending,
            metadata: request.metadata,
            created: Utc::now(),
        };

        let item = LineItem {
            quantity: Some(request.quantity),
            price: LineItemPrice {
                id: request.price_id,
                unit_amount: product.default_price.as_ref().and_then(|p| p.unit_amount),
                product,
            },
        };
        self.line_items.write().await.insert(id, vec![item]);
        self.sessions.write().await.push(session.clone());
        Ok(session)
    }

    async fn list_recent_sessions(
        &self,
        limit: u32,
    ) -> Result<Vec<CheckoutSession>, StoreError> {
        tokio::task::yield_now().await;
        let sessions = self.sessions.read().await;
        Ok(sessions
            .iter()
            .rev()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn list_line_items(
        &self,
        session_id: &str,
    ) -> Result<Vec<LineItem>, StoreError> {
        tokio::task::yield_now().await;
        self.line_items
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(session_id.to_string()))
    }
}
