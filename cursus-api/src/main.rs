use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use cursus_api::{app, AppState, WebhookSettings};
use cursus_catalog::CourseCatalog;
use cursus_ledger::{BookingWriter, LedgerReconciler, RosterAggregator};
use cursus_store::StripeClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cursus_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = cursus_store::Config::load().expect("Failed to load config");
    tracing::info!("Starting Cursus API on port {}", config.server.port);

    let client = Arc::new(
        StripeClient::new(
            &config.processor.secret_key,
            &config.processor.api_base,
            Duration::from_secs(config.processor.timeout_seconds),
        )
        .expect("Failed to build processor client"),
    );

    let catalog = CourseCatalog::new(client.clone());
    let state = AppState {
        catalog: catalog.clone(),
        booking: Arc::new(BookingWriter::new(client.clone(), &config.site.base_url)),
        reconciler: Arc::new(LedgerReconciler::new(client.clone(), client.clone())),
        roster: Arc::new(RosterAggregator::new(catalog, client.clone())),
        webhook: WebhookSettings {
            secret: config.webhook.secret.clone(),
            tolerance_seconds: config.webhook.tolerance_seconds,
        },
    };

    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}
