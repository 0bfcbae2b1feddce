//! Rebuilds participant rosters from paid-transaction history.
//!
//! This is the authoritative, read-only second view of bookings: it
//! recounts from the sessions themselves and never feeds the capacity
//! counter the reconciler maintains.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use cursus_catalog::{CatalogError, CourseCatalog};
use cursus_core::metadata;
use cursus_core::store::{StoreError, TransactionStore};
use cursus_core::{CheckoutSession, Participant, PaymentStatus};

use crate::LedgerError;

/// How far back the transaction scan reaches. The processor lists
/// newest first; at this sales volume 100 sessions cover a season.
pub const SESSION_SCAN_LIMIT: u32 = 100;

/// Dashboard line for one course with at least one paid participant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub id: String,
    pub title: String,
    pub date: String,
    pub day_of_week: String,
    pub total_bookings: u32,
    pub total_participants: u32,
    pub price_id: Option<String>,
}

/// One exported row: a single attendee of a single paid booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterRow {
    pub salutation: String,
    pub first_name: String,
    pub infix: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: String,
    /// Settlement date, `dd-mm-jjjj`.
    pub payment_date: String,
}

#[derive(Debug, Clone)]
pub struct RosterExport {
    pub course_id: String,
    pub course_title: String,
    pub rows: Vec<RosterRow>,
}

pub struct RosterAggregator {
    catalog: CourseCatalog,
    transactions: Arc<dyn TransactionStore>,
}

impl RosterAggregator {
    pub fn new(catalog: CourseCatalog, transactions: Arc<dyn TransactionStore>) -> Self {
        Self {
            catalog,
            transactions,
        }
    }

    /// Per-course booking totals for the dashboard, date-ascending.
    /// Courses without any paid participant are left out entirely.
    pub async fn courses_with_bookings(
        &self,
    ) -> Result<Vec<CourseSummary>, LedgerError> {
        let courses = self.catalog.list_courses().await?;
        let sessions = self
            .transactions
            .list_recent_sessions(SESSION_SCAN_LIMIT)
            .await?;
        let paid: Vec<&CheckoutSession> = sessions
            .iter()
            .filter(|s| s.payment_status == PaymentStatus::Paid)
            .collect();

        let mut summaries = Vec::new();
        for course in &courses {
            let matching: Vec<&&CheckoutSession> = paid
                .iter()
                .filter(|s| {
                    metadata::decode_course_id(&s.metadata) == Some(course.id.as_str())
                })
                .collect();
            if matching.is_empty() {
                continue;
            }

            let total_participants: u32 = matching
                .iter()
                .map(|s| decoded_participants(s).len() as u32)
                .sum();
            if total_participants == 0 {
                continue;
            }

            summaries.push(CourseSummary {
                id: course.id.clone(),
                title: course.title.clone(),
                date: course.date.clone(),
                day_of_week: course.day_of_week.clone(),
                total_bookings: matching.len() as u32,
                total_participants,
                price_id: course.price_id.clone(),
            });
        }
        Ok(summaries)
    }

    /// Flattens every attendee of every paid booking for one course
    /// into export rows, oldest booking first.
    pub async fn export_roster(&self, course_id: &str) -> Result<RosterExport, LedgerError> {
        let sessions = self
            .transactions
            .list_recent_sessions(SESSION_SCAN_LIMIT)
            .await?;
        let mut matching: Vec<&CheckoutSession> = sessions
            .iter()
            .filter(|s| s.payment_status == PaymentStatus::Paid)
            .filter(|s| metadata::decode_course_id(&s.metadata) == Some(course_id))
            .collect();
        if matching.is_empty() {
            return Err(LedgerError::NothingToExport(course_id.to_string()));
        }
        matching.sort_by_key(|s| s.created);

        let mut rows = Vec::new();
        for session in matching {
            let payment_date = session.created.format("%d-%m-%Y").to_string();
            for participant in decoded_participants(session) {
                rows.push(row_for(participant, &payment_date));
            }
        }

        let course_title = match self.catalog.get_course(course_id).await {
            Ok(course) => course.title,
            // An unpublished course can still have history to export
            Err(CatalogError::Store(StoreError::NotFound(_))) => course_id.to_string(),
            Err(other) => return Err(other.into()),
        };

        Ok(RosterExport {
            course_id: course_id.to_string(),
            course_title,
            rows,
        })
    }
}

fn decoded_participants(session: &CheckoutSession) -> Vec<Participant> {
    let participants = metadata::decode_participants(&session.metadata);
    if participants.is_empty() {
        warn!(session = %session.id, "paid session carries no decodable participants");
    }
    participants
}

fn row_for(participant: Participant, payment_date: &str) -> RosterRow {
    RosterRow {
        salutation: participant.salutation,
        first_name: participant.first_name,
        infix: participant.infix,
        last_name: participant.last_name,
        email: participant.email,
        phone: participant.phone,
        date_of_birth: participant.date_of_birth,
        payment_date: payment_date.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use cursus_core::metadata::encode_participants;
    use cursus_core::{Price, Product};
    use cursus_store::InMemoryProcessor;

    fn participant(first_name: &str) -> Participant {
        Participant {
            salutation: "Dhr.".to_string(),
            initials: "B.".to_string(),
            first_name: first_name.to_string(),
            infix: "van der".to_string(),
            last_name: "Meer".to_string(),
            date_of_birth: "1980-12-05".to_string(),
            phone: "0644444444".to_string(),
            email: format!("{}@example.nl", first_name.to_lowercase()),
        }
    }

    fn course_product(id: &str, date: &str) -> Product {
        Product {
            id: id.to_string(),
            name: format!("BHV {}", id),
            description: None,
            active: true,
            default_price: Some(Price {
                id: format!("price_{}", id),
                unit_amount: Some(14950),
                currency: "eur".to_string(),
            }),
            metadata: [("datum".to_string(), date.to_string())]
                .into_iter()
                .collect(),
        }
    }

    fn session(
        id: &str,
        course_id: &str,
        quantity: u32,
        status: PaymentStatus,
        created: i64,
    ) -> CheckoutSession {
        let participants: Vec<Participant> = (1..=quantity)
            .map(|n| participant(&format!("Naam{}{}", id, n)))
            .collect();
        CheckoutSession {
            id: id.to_string(),
            url: None,
            payment_status: status,
            metadata: encode_participants(course_id, quantity, &participants).unwrap(),
            created: Utc.timestamp_opt(created, 0).unwrap(),
        }
    }

    async fn aggregator(processor: &Arc<InMemoryProcessor>) -> RosterAggregator {
        RosterAggregator::new(
            CourseCatalog::new(processor.clone()),
            processor.clone(),
        )
    }

    #[tokio::test]
    async fn export_flattens_all_paid_participants() {
        let processor = Arc::new(InMemoryProcessor::new());
        processor
            .add_product(course_product("prod_a", "2026-05-12"))
            .await;
        for (id, quantity, created) in
            [("cs_1", 2, 100), ("cs_2", 1, 300), ("cs_3", 3, 200)]
        {
            processor
                .add_session(
                    session(id, "prod_a", quantity, PaymentStatus::Paid, created),
                    Vec::new(),
                )
                .await;
        }

        let export = aggregator(&processor)
            .await
            .export_roster("prod_a")
            .await
            .unwrap();

        assert_eq!(export.course_title, "BHV prod_a");
        assert_eq!(export.rows.len(), 6);
        // Oldest booking first
        assert_eq!(export.rows[0].first_name, "Naamcs_11");
        assert_eq!(export.rows[0].payment_date, "01-01-1970");
        assert_eq!(export.rows[0].infix, "van der");
    }

    #[tokio::test]
    async fn pending_only_course_has_nothing_to_export() {
        let processor = Arc::new(InMemoryProcessor::new());
        processor
            .add_product(course_product("prod_a", "2026-05-12"))
            .await;
        processor
            .add_session(
                session("cs_1", "prod_a", 2, PaymentStatus::Pending, 100),
                Vec::new(),
            )
            .await;

        let result = aggregator(&processor).await.export_roster("prod_a").await;
        assert!(matches!(result, Err(LedgerError::NothingToExport(_))));
    }

    #[tokio::test]
    async fn summaries_exclude_courses_without_paid_participants() {
        let processor = Arc::new(InMemoryProcessor::new());
        processor
            .add_product(course_product("prod_paid", "2026-09-01"))
            .await;
        processor
            .add_product(course_product("prod_pending", "2026-04-01"))
            .await;
        processor
            .add_session(
                session("cs_1", "prod_paid", 2, PaymentStatus::Paid, 100),
                Vec::new(),
            )
            .await;
        processor
            .add_session(
                session("cs_2", "prod_paid", 1, PaymentStatus::Paid, 200),
                Vec::new(),
            )
            .await;
        processor
            .add_session(
                session("cs_3", "prod_pending", 4, PaymentStatus::Pending, 300),
                Vec::new(),
            )
            .await;
        processor
            .add_session(
                session("cs_4", "prod_pending", 1, PaymentStatus::Failed, 400),
                Vec::new(),
            )
            .await;

        let summaries = aggregator(&processor)
            .await
            .courses_with_bookings()
            .await
            .unwrap();

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].id, "prod_paid");
        assert_eq!(summaries[0].total_bookings, 2);
        assert_eq!(summaries[0].total_participants, 3);
        assert_eq!(summaries[0].date, "1 sep");
    }

    #[tokio::test]
    async fn summaries_follow_course_date_order() {
        let processor = Arc::new(InMemoryProcessor::new());
        processor
            .add_product(course_product("prod_late", "2026-10-01"))
            .await;
        processor
            .add_product(course_product("prod_early", "2026-02-01"))
            .await;
        for (id, course) in [("cs_1", "prod_late"), ("cs_2", "prod_early")] {
            processor
                .add_session(
                    session(id, course, 1, PaymentStatus::Paid, 100),
                    Vec::new(),
                )
                .await;
        }

        let summaries = aggregator(&processor)
            .await
            .courses_with_bookings()
            .await
            .unwrap();
        let ids: Vec<&str> = summaries.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["prod_early", "prod_late"]);
    }

    #[tokio::test]
    async fn mangled_position_still_yields_remaining_rows() {
        let processor = Arc::new(InMemoryProcessor::new());
        processor
            .add_product(course_product("prod_a", "2026-05-12"))
            .await;
        let mut damaged = session("cs_1", "prod_a", 3, PaymentStatus::Paid, 100);
        damaged.metadata.remove("deelnemer_2_voornaam");
        processor.add_session(damaged, Vec::new()).await;

        let export = aggregator(&processor)
            .await
            .export_roster("prod_a")
            .await
            .unwrap();
        assert_eq!(export.rows.len(), 2);
    }

    #[tokio::test]
    async fn transport_failure_fails_closed() {
        struct FailingStore;

        #[async_trait::async_trait]
        impl TransactionStore for FailingStore {
            async fn create_checkout_session(
                &self,
                _request: cursus_core::NewCheckoutSession,
            ) -> Result<CheckoutSession, StoreError> {
                Err(StoreError::Transport("down".to_string()))
            }

            async fn list_recent_sessions(
                &self,
                _limit: u32,
            ) -> Result<Vec<CheckoutSession>, StoreError> {
                Err(StoreError::Transport("down".to_string()))
            }

            async fn list_line_items(
                &self,
                _session_id: &str,
            ) -> Result<Vec<cursus_core::LineItem>, StoreError> {
                Err(StoreError::Transport("down".to_string()))
            }
        }

        let processor = Arc::new(InMemoryProcessor::new());
        let aggregator = RosterAggregator::new(
            CourseCatalog::new(processor),
            Arc::new(FailingStore),
        );
        assert!(matches!(
            aggregator.courses_with_bookings().await,
            Err(LedgerError::Store(StoreError::Transport(_)))
        ));
    }

    #[test]
    fn summary_serializes_camel_case() {
        let summary = CourseSummary {
            id: "prod_1".to_string(),
            title: "BHV Basis".to_string(),
            date: "12 mei".to_string(),
            day_of_week: "09:00 - 17:00".to_string(),
            total_bookings: 2,
            total_participants: 3,
            price_id: Some("price_1".to_string()),
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["dayOfWeek"], "09:00 - 17:00");
        assert_eq!(json["totalParticipants"], 3);
        assert_eq!(json["priceId"], "price_1");
        let map = json.as_object().unwrap();
        assert!(map.contains_key("totalBookings"));
    }
}
