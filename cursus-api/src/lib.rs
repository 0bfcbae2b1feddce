use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod checkout;
pub mod courses;
pub mod dashboard;
pub mod error;
pub mod state;
pub mod webhooks;

pub use state::{AppState, WebhookSettings};

pub fn app(state: AppState) -> Router {
    // The storefront is served from another origin
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    Router::new()
        .route("/health", get(health))
        .route("/api/products", get(courses::list_products))
        .route("/api/checkout", post(checkout::create_checkout))
        .route("/api/webhooks/stripe", post(webhooks::handle_stripe_webhook))
        .route("/api/webmaster/courses", get(dashboard::webmaster_courses))
        .route(
            "/api/webmaster/export/{course_id}",
            get(dashboard::export_course),
        )
        .route(
            "/api/webmaster/recount/{course_id}",
            post(dashboard::recount_course),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
