use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use cursus_core::metadata;
use cursus_core::store::{CatalogStore, StoreError};
use cursus_core::Product;

use crate::dates;

const KEY_DATE: &str = "datum";
const KEY_DATE_LEGACY: &str = "date";
const KEY_TIME: &str = "tijd";
const KEY_LOCATION: &str = "locatie";
const KEY_ADDRESS: &str = "adres";

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A scheduled training session as the storefront shows it, normalized
/// from a catalog product.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub price_id: Option<String>,
    pub title: String,
    pub description: String,
    /// Display label, e.g. `12 mei`, or `Datum volgt`.
    pub date: String,
    /// Time-slot label from the catalog, e.g. `09:00 - 17:00`.
    pub day_of_week: String,
    pub location: String,
    pub address: String,
    pub total_spots: u32,
    pub available_spots: u32,
    /// Unit price in whole euros.
    pub price: i64,
    pub currency: String,
    #[serde(skip)]
    pub booked_spots: u32,
    #[serde(skip)]
    pub sort_date: NaiveDate,
}

/// Reads courses out of the processor's product catalog.
#[derive(Clone)]
pub struct CourseCatalog {
    store: Arc<dyn CatalogStore>,
}

impl CourseCatalog {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// All active courses, normalized and sorted ascending by date.
    /// Courses without a parsable date sort last. A transport failure
    /// fails the whole listing; there is no partial result.
    pub async fn list_courses(&self) -> Result<Vec<Course>, CatalogError> {
        let products = self.store.list_active_products().await?;
        let mut courses: Vec<Course> =
            products.iter().map(normalize_course).collect();
        courses.sort_by_key(|course| course.sort_date);
        debug!(count = courses.len(), "listed active courses");
        Ok(courses)
    }

    /// One course by product id, normalized the same way as the list.
    pub async fn get_course(&self, course_id: &str) -> Result<Course, CatalogError> {
        let product = self.store.get_product(course_id).await?;
        Ok(normalize_course(&product))
    }
}

fn normalize_course(product: &Product) -> Course {
    let meta = metadata::trimmed_keys(&product.metadata);
    let capacity = metadata::decode_capacity(&meta);

    let raw_date = meta
        .get(KEY_DATE)
        .or_else(|| meta.get(KEY_DATE_LEGACY))
        .map(|value| value.as_str())
        .unwrap_or_default();
    let (date_label, sort_date) = match dates::parse_course_date(raw_date) {
        Some(date) => (dates::format_dutch_date(date), date),
        None => (dates::DATE_TBA.to_string(), dates::far_future()),
    };

    let price = product.default_price.as_ref();
    Course {
        id: product.id.clone(),
        price_id: price.map(|p| p.id.clone()),
        title: product.name.clone(),
        description: product.description.clone().unwrap_or_default(),
        date: date_label,
        day_of_week: meta
            .get(KEY_TIME)
            .cloned()
            .unwrap_or_else(|| dates::TIME_TBA.to_string()),
        location: meta.get(KEY_LOCATION).cloned().unwrap_or_default(),
        address: meta.get(KEY_ADDRESS).cloned().unwrap_or_default(),
        total_spots: capacity.total,
        available_spots: capacity.available(),
        price: price
            .and_then(|p| p.unit_amount)
            .map(|cents| (cents as f64 / 100.0).round() as i64)
            .unwrap_or(0),
        currency: price
            .map(|p| p.currency.clone())
            .unwrap_or_else(|| "eur".to_string()),
        booked_spots: capacity.booked,
        sort_date,
    }
}
