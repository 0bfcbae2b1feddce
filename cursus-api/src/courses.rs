use axum::{extract::State, Json};

use cursus_catalog::Course;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/products
/// Active courses for the storefront, sorted ascending by date.
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<Course>>, AppError> {
    let courses = state.catalog.list_courses().await?;
    Ok(Json(courses))
}
