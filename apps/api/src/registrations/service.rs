use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::registration::{RegistrationAggregate, RegistrationPatch};
use crate::registrations::projection::{to_document, to_summary, DocumentShape, SummaryShape};
use crate::store::{RegistrationFilter, RegistrationStore};

/// Status values broken out by the summary statistics.
pub const TRACKED_STATUSES: [&str; 4] = ["pending", "in_progress", "completed", "rejected"];

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// `{success, message?, data}` wrapper shared by every non-list response.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
        }
    }

    pub fn with_message(message: &str, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.to_string()),
            data,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FeedbackUpdate {
    #[serde(default)]
    pub feedback: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDetailsUpdate {
    #[serde(default)]
    pub position_type: Option<String>,
    #[serde(default)]
    pub school_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusUpdate {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HrReviewUpdate {
    #[serde(default)]
    pub hr_review: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HrAnswerUpdate {
    #[serde(default)]
    pub hr_answer_to_user: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HrAnswerPayload {
    pub registration_id: String,
    pub hr_answer_to_user: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryStats {
    pub total_registrations: i64,
    pub status_breakdown: StatusBreakdown,
    pub eligibility_stats: EligibilityStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusBreakdown {
    pub pending: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub rejected: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EligibilityStats {
    pub upk_eligible: i64,
    pub teacher_eligible: i64,
    pub substitute_eligible: i64,
}

// ────────────────────────────────────────────────────────────────────────────
// Service
// ────────────────────────────────────────────────────────────────────────────

/// Query and partial-update operations over registrations.
///
/// Updates are keyed by the external registration id only. The store applies
/// each patch in a single transaction, so a failed update leaves no trace.
#[derive(Clone)]
pub struct RegistrationService {
    store: Arc<dyn RegistrationStore>,
    /// Appends every known external id to not-found messages. Diagnostic only:
    /// it exposes the whole id set in an error body.
    list_known_ids_on_miss: bool,
}

impl RegistrationService {
    pub fn new(store: Arc<dyn RegistrationStore>) -> Self {
        Self {
            store,
            list_known_ids_on_miss: false,
        }
    }

    pub fn with_known_ids_on_miss(mut self, enabled: bool) -> Self {
        self.list_known_ids_on_miss = enabled;
        self
    }

    pub async fn list_all(&self) -> Result<Vec<SummaryShape>, AppError> {
        let aggregates = self.store.fetch_all().await?;
        Ok(aggregates.iter().map(to_summary).collect())
    }

    pub async fn get_overview(&self) -> Result<Envelope<Vec<DocumentShape>>, AppError> {
        let aggregates = self.store.fetch_all().await?;
        info!("Overview built for {} registrations", aggregates.len());
        Ok(Envelope::ok(aggregates.iter().map(to_document).collect()))
    }

    pub async fn get_by_internal_id(&self, id: i32) -> Result<Envelope<DocumentShape>, AppError> {
        let aggregate = self
            .store
            .fetch_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Registration not found".to_string()))?;
        Ok(Envelope::ok(to_document(&aggregate)))
    }

    pub async fn get_summary_stats(&self) -> Result<Envelope<SummaryStats>, AppError> {
        let total_registrations = self.store.count(RegistrationFilter::All).await?;

        let mut counts = [0i64; TRACKED_STATUSES.len()];
        for (slot, status) in counts.iter_mut().zip(TRACKED_STATUSES) {
            *slot = self
                .store
                .count(RegistrationFilter::Status(status.to_string()))
                .await?;
        }
        let [pending, in_progress, completed, rejected] = counts;

        let eligibility_stats = EligibilityStats {
            upk_eligible: self.store.count(RegistrationFilter::UpkEligible).await?,
            teacher_eligible: self.store.count(RegistrationFilter::TeacherEligible).await?,
            substitute_eligible: self
                .store
                .count(RegistrationFilter::SubstituteEligible)
                .await?,
        };

        Ok(Envelope::ok(SummaryStats {
            total_registrations,
            status_breakdown: StatusBreakdown {
                pending,
                in_progress,
                completed,
                rejected,
            },
            eligibility_stats,
        }))
    }

    pub async fn update_feedback(
        &self,
        registration_id: &str,
        update: FeedbackUpdate,
    ) -> Result<Envelope<DocumentShape>, AppError> {
        let patch = RegistrationPatch {
            feedback: Some(update.feedback),
            ..Default::default()
        };
        let updated = self.patch(registration_id, &patch).await?;
        info!("Updated feedback for registration {registration_id}");
        Ok(Envelope::with_message(
            "Feedback updated successfully",
            to_document(&updated),
        ))
    }

    pub async fn update_role_details(
        &self,
        registration_id: &str,
        update: RoleDetailsUpdate,
    ) -> Result<Envelope<DocumentShape>, AppError> {
        let patch = RegistrationPatch {
            position_type: update.position_type,
            school_type: update.school_type,
            ..Default::default()
        };
        let updated = self.patch(registration_id, &patch).await?;
        info!("Updated role details for registration {registration_id}");
        Ok(Envelope::with_message(
            "Role details updated successfully",
            to_document(&updated),
        ))
    }

    pub async fn update_status(
        &self,
        registration_id: &str,
        update: StatusUpdate,
    ) -> Result<Envelope<DocumentShape>, AppError> {
        let patch = RegistrationPatch {
            status: update.status,
            ..Default::default()
        };
        let updated = self.patch(registration_id, &patch).await?;
        info!(
            "Updated status for registration {registration_id} to '{}'",
            updated.registration.status
        );
        Ok(Envelope::with_message(
            "Status updated successfully",
            to_document(&updated),
        ))
    }

    pub async fn update_hr_review(
        &self,
        registration_id: &str,
        update: HrReviewUpdate,
    ) -> Result<Envelope<DocumentShape>, AppError> {
        let patch = RegistrationPatch {
            hr_review: update.hr_review,
            ..Default::default()
        };
        let updated = self.patch(registration_id, &patch).await?;
        info!("Updated HR review status for registration {registration_id}");
        Ok(Envelope::with_message(
            "HR review status updated successfully",
            to_document(&updated),
        ))
    }

    pub async fn update_hr_answer(
        &self,
        registration_id: &str,
        update: HrAnswerUpdate,
    ) -> Result<Envelope<HrAnswerPayload>, AppError> {
        let patch = RegistrationPatch {
            hr_answer_to_user: update.hr_answer_to_user,
            ..Default::default()
        };
        let updated = self.patch(registration_id, &patch).await?;
        info!("Updated HR answer for registration {registration_id}");
        Ok(Envelope::with_message(
            "HR answer updated successfully",
            HrAnswerPayload {
                registration_id: updated.registration.registration_id,
                hr_answer_to_user: updated.registration.hr_answer_to_user,
            },
        ))
    }

    async fn patch(
        &self,
        registration_id: &str,
        patch: &RegistrationPatch,
    ) -> Result<RegistrationAggregate, AppError> {
        match self.store.apply_patch(registration_id, patch).await? {
            Some(updated) => Ok(updated),
            None => Err(self.not_found(registration_id).await),
        }
    }

    async fn not_found(&self, registration_id: &str) -> AppError {
        warn!("Registration {registration_id} not found");
        if !self.list_known_ids_on_miss {
            return AppError::NotFound(format!("Registration {registration_id} not found"));
        }
        match self.store.registration_ids().await {
            Ok(ids) => AppError::NotFound(format!(
                "Registration {registration_id} not found. Available registration IDs: {ids:?}"
            )),
            Err(e) => {
                warn!("Could not list registration ids: {e}");
                AppError::NotFound(format!("Registration {registration_id} not found"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::registration::{NewAnswer, NewRegistration};
    use crate::store::InMemoryRegistrationStore;
    use chrono::{Duration, TimeZone, Utc};

    async fn seeded() -> (RegistrationService, InMemoryRegistrationStore) {
        let store = InMemoryRegistrationStore::new();
        let mut new = NewRegistration::new("REG-001", "Ada Lovelace", "ada@example.com");
        new.position_type = "Lead Teacher".to_string();
        let created = store.create(new).await.unwrap();
        store
            .append_answer(
                created.registration.id,
                NewAnswer {
                    question_text: "Are you comfortable with diapering?".to_string(),
                    answer_text: "unsaved draft".to_string(),
                    is_answered: false,
                    question_order: 1,
                },
            )
            .await
            .unwrap();
        let service = RegistrationService::new(Arc::new(store.clone()));
        (service, store)
    }

    #[tokio::test]
    async fn test_feedback_scenario() {
        let (service, _) = seeded().await;
        let resp = service
            .update_feedback(
                "REG-001",
                FeedbackUpdate {
                    feedback: Some("Strong candidate".to_string()),
                },
            )
            .await
            .unwrap();

        assert!(resp.success);
        assert_eq!(resp.message.as_deref(), Some("Feedback updated successfully"));
        assert_eq!(resp.data.feedback.as_deref(), Some("Strong candidate"));
        assert_eq!(resp.data.status, "not attempted");
        assert_eq!(resp.data.interview_data.questions[0].answer, "");
    }

    #[tokio::test]
    async fn test_feedback_omitted_clears_it() {
        let (service, _) = seeded().await;
        service
            .update_feedback(
                "REG-001",
                FeedbackUpdate {
                    feedback: Some("first pass".to_string()),
                },
            )
            .await
            .unwrap();
        let resp = service
            .update_feedback("REG-001", FeedbackUpdate::default())
            .await
            .unwrap();
        assert!(resp.data.feedback.is_none());
    }

    #[tokio::test]
    async fn test_status_only_update_leaves_other_fields() {
        let (service, store) = seeded().await;
        service
            .update_feedback(
                "REG-001",
                FeedbackUpdate {
                    feedback: Some("keep me".to_string()),
                },
            )
            .await
            .unwrap();
        let before = store.fetch_by_registration_id("REG-001").await.unwrap().unwrap();

        service
            .update_status(
                "REG-001",
                StatusUpdate {
                    status: Some("in_progress".to_string()),
                },
            )
            .await
            .unwrap();

        let after = store.fetch_by_registration_id("REG-001").await.unwrap().unwrap();
        assert_eq!(after.registration.status, "in_progress");
        assert_eq!(after.registration.feedback.as_deref(), Some("keep me"));
        assert_eq!(after.registration.hr_review, before.registration.hr_review);
        assert_eq!(after.registration.position_type, "Lead Teacher");
        assert_eq!(after.registration.school_type, before.registration.school_type);
        assert!(after.registration.updated_at > before.registration.updated_at);
    }

    #[tokio::test]
    async fn test_role_details_partial() {
        let (service, _) = seeded().await;
        let resp = service
            .update_role_details(
                "REG-001",
                RoleDetailsUpdate {
                    position_type: None,
                    school_type: Some("Daycare".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(resp.data.position_type, "Lead Teacher");
        assert_eq!(resp.data.school_type, "Daycare");

        let resp = service
            .update_role_details(
                "REG-001",
                RoleDetailsUpdate {
                    position_type: Some(String::new()),
                    school_type: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(resp.data.position_type, "");
        assert_eq!(resp.data.school_type, "Daycare");
    }

    #[tokio::test]
    async fn test_hr_review_and_answer() {
        let (service, _) = seeded().await;
        let resp = service
            .update_hr_review(
                "REG-001",
                HrReviewUpdate {
                    hr_review: Some("approved".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(resp.data.hr_review, "approved");

        let resp = service
            .update_hr_answer(
                "REG-001",
                HrAnswerUpdate {
                    hr_answer_to_user: Some("Orientation is on Monday".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(resp.message.as_deref(), Some("HR answer updated successfully"));
        assert_eq!(resp.data.registration_id, "REG-001");
        assert_eq!(
            resp.data.hr_answer_to_user.as_deref(),
            Some("Orientation is on Monday")
        );
    }

    #[tokio::test]
    async fn test_every_update_rejects_unknown_id() {
        let (service, store) = seeded().await;
        let before = store.fetch_by_registration_id("REG-001").await.unwrap().unwrap();

        let results = [
            service
                .update_feedback("REG-999", FeedbackUpdate::default())
                .await
                .map(|_| ()),
            service
                .update_role_details("REG-999", RoleDetailsUpdate::default())
                .await
                .map(|_| ()),
            service
                .update_status(
                    "REG-999",
                    StatusUpdate {
                        status: Some("completed".to_string()),
                    },
                )
                .await
                .map(|_| ()),
            service
                .update_hr_review("REG-999", HrReviewUpdate::default())
                .await
                .map(|_| ()),
            service
                .update_hr_answer("REG-999", HrAnswerUpdate::default())
                .await
                .map(|_| ()),
        ];
        for result in results {
            assert!(matches!(result, Err(AppError::NotFound(_))));
        }

        let after = store.fetch_by_registration_id("REG-001").await.unwrap().unwrap();
        assert_eq!(after.registration.updated_at, before.registration.updated_at);
        assert_eq!(after.registration.status, before.registration.status);
    }

    #[tokio::test]
    async fn test_not_found_lists_ids_only_when_enabled() {
        let (service, _) = seeded().await;
        let err = service
            .update_status("REG-999", StatusUpdate::default())
            .await
            .unwrap_err();
        assert!(!err.to_string().contains("REG-001"));

        let service = service.with_known_ids_on_miss(true);
        let err = service
            .update_status("REG-999", StatusUpdate::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Available registration IDs: [\"REG-001\"]"));
    }

    #[tokio::test]
    async fn test_get_by_internal_id() {
        let (service, _) = seeded().await;
        let resp = service.get_by_internal_id(1).await.unwrap();
        assert_eq!(resp.data.id, "1");
        assert_eq!(resp.data.registration_id, "REG-001");
        assert!(matches!(
            service.get_by_internal_id(404).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_all_newest_first() {
        let store = InMemoryRegistrationStore::new();
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        for (id, offset) in [("REG-OLD", 0), ("REG-MID", 1)] {
            let mut new = NewRegistration::new(id, "Candidate", "c@example.com");
            new.submitted_at = Some(base + Duration::hours(offset));
            store.create(new).await.unwrap();
        }
        let service = RegistrationService::new(Arc::new(store.clone()));

        let list = service.list_all().await.unwrap();
        assert_eq!(list[0].registration_id, "REG-MID");
        assert_eq!(list[1].registration_id, "REG-OLD");

        let mut newest = NewRegistration::new("REG-NEW", "Candidate", "c@example.com");
        newest.submitted_at = Some(base + Duration::hours(5));
        store.create(newest).await.unwrap();
        let list = service.list_all().await.unwrap();
        assert_eq!(list[0].registration_id, "REG-NEW");
        assert_eq!(list.len(), 3);

        let overview = service.get_overview().await.unwrap();
        assert_eq!(overview.data[0].registration_id, "REG-NEW");
    }

    #[tokio::test]
    async fn test_summary_stats_counts_are_independent() {
        let store = InMemoryRegistrationStore::new();
        let mut a = NewRegistration::new("REG-A", "A", "a@example.com");
        a.eligibility.upk_eligible = true;
        a.eligibility.teacher_eligible = true;
        store.create(a).await.unwrap();
        let mut b = NewRegistration::new("REG-B", "B", "b@example.com");
        b.eligibility.substitute_eligible = true;
        store.create(b).await.unwrap();
        store.create(NewRegistration::new("REG-C", "C", "c@example.com")).await.unwrap();

        let service = RegistrationService::new(Arc::new(store));
        for (id, status) in [("REG-A", "completed"), ("REG-B", "pending")] {
            service
                .update_status(
                    id,
                    StatusUpdate {
                        status: Some(status.to_string()),
                    },
                )
                .await
                .unwrap();
        }

        let stats = service.get_summary_stats().await.unwrap().data;
        assert_eq!(stats.total_registrations, 3);
        assert_eq!(stats.status_breakdown.pending, 1);
        assert_eq!(stats.status_breakdown.in_progress, 0);
        assert_eq!(stats.status_breakdown.completed, 1);
        assert_eq!(stats.status_breakdown.rejected, 0);
        assert_eq!(stats.eligibility_stats.upk_eligible, 1);
        assert_eq!(stats.eligibility_stats.teacher_eligible, 1);
        assert_eq!(stats.eligibility_stats.substitute_eligible, 1);
    }
}
