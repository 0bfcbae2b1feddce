//! The live payment-processor adapter: a thin reqwest client over the
//! processor's REST API implementing both store traits. Every call
//! carries the client-level timeout; a timed-out write must be treated
//! as "unknown" by the caller.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use cursus_core::payment::{CheckoutSession, LineItem, NewCheckoutSession, Product};
use cursus_core::store::{CatalogStore, StoreError, TransactionStore};

#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
}

/// The processor wraps collection responses in a `data` envelope.
#[derive(Debug, Deserialize)]
struct List<T> {
    data: Vec<T>,
}

impl StripeClient {
    pub fn new(
        secret_key: &str,
        api_base: &str,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, StoreError> {
        debug!(path, "processor GET");
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.secret_key)
            .query(query)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        parse_response(response).await
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<T, StoreError> {
        debug!(path, "processor POST");
        let response = self
            .http
            .post(self.url(path))
            .bearer_auth(&self.secret_key)
            .form(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        parse_response(response).await
    }
}

async fn parse_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, StoreError> {
    let status = response.status();
    let body = response.text().await.map_err(map_reqwest_error)?;
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(StoreError::NotFound(body));
    }
    if !status.is_success() {
        return Err(StoreError::Api {
            status: status.as_u16(),
            message: body,
        });
    }
    serde_json::from_str(&body).map_err(|e| StoreError::Decode(e.to_string()))
}

fn map_reqwest_error(error: reqwest::Error) -> StoreError {
    if error.is_timeout() {
        StoreError::Timeout
    } else {
        StoreError::Transport(error.to_string())
    }
}

#[async_trait]
impl CatalogStore for StripeClient {
    async fn list_active_products(&self) -> Result<Vec<Product>, StoreError> {
        let list: List<Product> = self
            .get_json(
                "/v1/products",
                &[
                    ("active".to_string(), "true".to_string()),
                    ("expand[]".to_string(), "data.default_price".to_string()),
                ],
            )
            .await?;
        Ok(list.data)
    }

    async fn get_product(&self, product_id: &str) -> Result<Product, StoreError> {
        self.get_json(
            &format!("/v1/products/{}", product_id),
            &[("expand[]".to_string(), "default_price".to_string())],
        )
        .await
    }

    async fn update_product_metadata(
        &self,
        product_id: &str,
        metadata: HashMap<String, String>,
    ) -> Result<Product, StoreError> {
        let form: Vec<(String, String)> = metadata
            .into_iter()
            .map(|(key, value)| (format!("metadata[{}]", key), value))
            .collect();
        self.post_form(&format!("/v1/products/{}", product_id), &form)
            .await
    }
}

#[async_trait]
impl TransactionStore for StripeClient {
    async fn create_checkout_session(
        &self,
        request: NewCheckoutSession,
    ) -> Result<CheckoutSession, StoreError> {
        let mut form: Vec<(String, String)> = vec![
            ("mode".to_string(), "payment".to_string()),
            ("line_items[0][price]".to_string(), request.price_id),
            (
                "line_items[0][quantity]".to_string(),
                request.quantity.to_string(),
            ),
            ("success_url".to_string(), request.success_url),
            ("cancel_url".to_string(), request.cancel_url),
            ("locale".to_string(), request.locale),
            ("automatic_tax[enabled]".to_string(), "false".to_string()),
        ];
        if request.collect_billing_address {
            form.push((
                "billing_address_collection".to_string(),
                "required".to_string(),
            ));
        }
        if request.collect_phone_number {
            form.push((
                "phone_number_collection[enabled]".to_string(),
                "true".to_string(),
            ));
        }
        for (key, value) in request.metadata {
            form.push((format!("metadata[{}]", key), value));
        }
        self.post_form("/v1/checkout/sessions", &form).await
    }

    async fn list_recent_sessions(
        &self,
        limit: u32,
    ) -> Result<Vec<CheckoutSession>, StoreError> {
        let list: List<CheckoutSession> = self
            .get_json(
                "/v1/checkout/sessions",
                &[("limit".to_string(), limit.to_string())],
            )
            .await?;
        Ok(list.data)
    }

    async fn list_line_items(
        &self,
        session_id: &str,
    ) -> Result<Vec<LineItem>, StoreError> {
        let list: List<LineItem> = self
            .get_json(
                &format!("/v1/checkout/sessions/{}/line_items", session_id),
                &[("expand[]".to_string(), "data.price.product".to_string())],
            )
            .await?;
        Ok(list.data)
    }
}
