pub mod booking;
pub mod reconciler;
pub mod roster;
pub mod webhook;

pub use booking::BookingWriter;
pub use reconciler::{LedgerReconciler, ReconcileOutcome};
pub use roster::{CourseSummary, RosterAggregator, RosterExport, RosterRow};
pub use webhook::{SignatureError, WebhookEvent};

use cursus_catalog::CatalogError;
use cursus_core::metadata::CodecError;
use cursus_core::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("invalid booking request: {0}")]
    Validation(String),

    #[error("webhook rejected: {0}")]
    Signature(#[from] SignatureError),

    #[error("no paid bookings found for course {0}")]
    NothingToExport(String),
}
