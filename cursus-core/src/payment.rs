use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payment state of a checkout transaction.
///
/// The processor reports `unpaid` / `no_payment_required` for sessions
/// that have not (or will never) settle; both map onto `Pending`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[serde(alias = "unpaid", alias = "no_payment_required")]
    Pending,
    Paid,
    Failed,
    Refunded,
}

/// A catalog product as the processor stores it. Courses are products;
/// everything course-specific lives in the flat `metadata` map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub default_price: Option<Price>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// A price object, expanded onto products and line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Price {
    pub id: String,
    #[serde(default)]
    pub unit_amount: Option<i64>,
    #[serde(default)]
    pub currency: String,
}

/// A checkout transaction with its flat metadata map. The metadata
/// carries the course id and the encoded participant block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created: DateTime<Utc>,
}

/// A purchased line item with its price and owning product expanded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub quantity: Option<u32>,
    pub price: LineItemPrice,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemPrice {
    pub id: String,
    #[serde(default)]
    pub unit_amount: Option<i64>,
    pub product: Product,
}

impl LineItem {
    /// Seats purchased on this line. The processor omits the quantity
    /// for single-unit lines.
    pub fn seats(&self) -> u32 {
        self.quantity.unwrap_or(1)
    }
}

/// Everything needed to create a redirectable checkout session for one
/// course at one quantity.
#[derive(Debug, Clone)]
pub struct NewCheckoutSession {
    pub price_id: String,
    pub quantity: u32,
    pub metadata: HashMap<String, String>,
    pub success_url: String,
    pub cancel_url: String,
    pub locale: String,
    pub collect_billing_address: bool,
    pub collect_phone_number: bool,
}
