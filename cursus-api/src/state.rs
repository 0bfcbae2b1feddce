use std::sync::Arc;

use cursus_catalog::CourseCatalog;
use cursus_ledger::{BookingWriter, LedgerReconciler, RosterAggregator};

#[derive(Clone)]
pub struct WebhookSettings {
    pub secret: String,
    pub tolerance_seconds: i64,
}

#[derive(Clone)]
pub struct AppState {
    pub catalog: CourseCatalog,
    pub booking: Arc<BookingWriter>,
    pub reconciler: Arc<LedgerReconciler>,
    pub roster: Arc<RosterAggregator>,
    pub webhook: WebhookSettings,
}
