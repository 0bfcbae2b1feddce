//! Applies verified payment completions to the per-course booked-seats
//! counter stored in the course product's metadata.
//!
//! The underlying store offers no transactions, so the counter update
//! is a read followed by a write. Two disciplines make it safe:
//! a per-course mutex serializes concurrent completions for the same
//! course, and a bounded seen-session set absorbs the processor's
//! at-least-once redelivery. Session ids are recorded only after a
//! successful apply, so a failed apply stays retryable.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use cursus_core::metadata;
use cursus_core::store::{CatalogStore, TransactionStore};

use crate::webhook::WebhookEvent;
use crate::LedgerError;

/// Retention of the replay guard. Far beyond the processor's
/// redelivery horizon for this sales volume.
const SEEN_SESSION_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Seats were added to the counter.
    Applied { seats: u32 },
    /// The session was already processed; nothing changed.
    Duplicate,
    /// Not a completion event; nothing changed.
    Ignored,
}

struct SeenSessions {
    ids: HashSet<String>,
    order: VecDeque<String>,
}

impl SeenSessions {
    fn new() -> Self {
        Self {
            ids: HashSet::new(),
            order: VecDeque::new(),
        }
    }

    fn contains(&self, session_id: &str) -> bool {
        self.ids.contains(session_id)
    }

    fn record(&mut self, session_id: String) {
        if !self.ids.insert(session_id.clone()) {
            return;
        }
        self.order.push_back(session_id);
        while self.order.len() > SEEN_SESSION_CAPACITY {
            if let Some(evicted) = self.order.pop_front() {
                self.ids.remove(&evicted);
            }
        }
    }
}

pub struct LedgerReconciler {
    catalog: Arc<dyn CatalogStore>,
    transactions: Arc<dyn TransactionStore>,
    seen: Mutex<SeenSessions>,
    course_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LedgerReconciler {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        transactions: Arc<dyn TransactionStore>,
    ) -> Self {
        Self {
            catalog,
            transactions,
            seen: Mutex::new(SeenSessions::new()),
            course_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Handles a signature-verified event from the processor. Only
    /// completed checkouts mutate state; everything else is ignored
    /// with a 2xx so the processor stops redelivering it.
    pub async fn on_payment_completed(
        &self,
        event: &WebhookEvent,
    ) -> Result<ReconcileOutcome, LedgerError> {
        if !event.is_checkout_completed() {
            debug!(event = %event.id, kind = %event.event_type, "ignoring event");
            return Ok(ReconcileOutcome::Ignored);
        }

        let session = &event.data.object;
        if self.seen.lock().await.contains(&session.id) {
            info!(session = %session.id, "completion redelivered, skipping");
            return Ok(ReconcileOutcome::Duplicate);
        }

        if metadata::decode_participants(&session.metadata).is_empty() {
            warn!(session = %session.id, "paid session carries no decodable participants");
        }

        let line_items = self.transactions.list_line_items(&session.id).await?;
        let mut seats_applied = 0;
        for item in &line_items {
            let quantity = item.seats();
            self.add_booked_seats(&item.price.product.id, quantity).await?;
            seats_applied += quantity;
        }

        self.seen.lock().await.record(session.id.clone());
        Ok(ReconcileOutcome::Applied { seats: seats_applied })
    }

    /// Recomputes one course's counter from the authoritative scan of
    /// paid sessions and writes it back. This is the repair path for
    /// drift between the running counter and the transaction history.
    pub async fn recount_course(&self, course_id: &str) -> Result<u32, LedgerError> {
        let sessions = self
            .transactions
            .list_recent_sessions(crate::roster::SESSION_SCAN_LIMIT)
            .await?;
        let booked: u32 = sessions
            .iter()
            .filter(|s| s.payment_status == cursus_core::PaymentStatus::Paid)
            .filter(|s| metadata::decode_course_id(&s.metadata) == Some(course_id))
            .map(|s| metadata::decode_participants(&s.metadata).len() as u32)
            .sum();

        let lock = self.course_lock(course_id).await;
        let _guard = lock.lock().await;

        let product = self.catalog.get_product(course_id).await?;
        let current = metadata::decode_capacity(&product.metadata);
        if current.booked != booked {
            info!(
                course = course_id,
                counter = current.booked,
                recounted = booked,
                "counter drifted from transaction history, rewriting"
            );
        }
        let updated = metadata::encode_booked_spots(&product.metadata, booked);
        self.catalog
            .update_product_metadata(course_id, updated)
            .await?;
        Ok(booked)
    }

    /// Read-modify-write of the counter, serialized per course id so
    /// concurrent completions for the same course cannot lose updates.
    async fn add_booked_seats(
        &self,
        course_id: &str,
        quantity: u32,
    ) -> Result<(), LedgerError> {
        let lock = self.course_lock(course_id).await;
        let _guard = lock.lock().await;

        let product = self.catalog.get_product(course_id).await?;
        let capacity = metadata::decode_capacity(&product.metadata);
        let booked = capacity.booked + quantity;
        if booked > capacity.total {
            warn!(
                course = course_id,
                booked,
                total = capacity.total,
                "course is booked beyond capacity"
            );
        }

        let updated = metadata::encode_booked_spots(&product.metadata, booked);
        self.catalog
            .update_product_metadata(course_id, updated)
            .await?;
        info!(
            course = %product.name,
            from = capacity.booked,
            to = booked,
            "updated booked spots"
        );
        Ok(())
    }

    async fn course_lock(&self, course_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.course_locks.lock().await;
        locks
            .entry(course_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
