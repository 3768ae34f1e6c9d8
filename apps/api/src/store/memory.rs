use std::cmp::Reverse;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tokio::sync::RwLock;

use super::{next_updated_at, RegistrationFilter, RegistrationStore, Result, StoreError};
use crate::models::registration::{
    AnswerRow, NewAnswer, NewRegistration, RegistrationAggregate, RegistrationPatch,
    RegistrationRow, DEFAULT_HR_REVIEW, DEFAULT_STATUS, NOT_STARTED_QUESTION_INDEX,
};

#[derive(Default)]
struct Tables {
    registrations: Vec<RegistrationRow>,
    answers: Vec<AnswerRow>,
    next_registration_id: i32,
    next_answer_id: i32,
}

impl Tables {
    fn aggregate(&self, row: &RegistrationRow) -> RegistrationAggregate {
        let answers = self
            .answers
            .iter()
            .filter(|a| a.registration_pk == row.id)
            .cloned()
            .collect();
        RegistrationAggregate::new(row.clone(), answers)
    }
}

/// In-memory registration store.
///
/// Mirrors the PostgreSQL store's defaults, ordering and uniqueness rules.
/// Each operation holds the table lock for its whole duration, which stands in
/// for the transaction boundary.
#[derive(Clone, Default)]
pub struct InMemoryRegistrationStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryRegistrationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RegistrationStore for InMemoryRegistrationStore {
    async fn create(&self, new: NewRegistration) -> Result<RegistrationAggregate> {
        let mut tables = self.tables.write().await;

        if tables
            .registrations
            .iter()
            .any(|r| r.registration_id == new.registration_id)
        {
            return Err(StoreError::DuplicateRegistrationId(new.registration_id));
        }

        tables.next_registration_id += 1;
        let now = Utc::now();
        let row = RegistrationRow {
            id: tables.next_registration_id,
            registration_id: new.registration_id,
            session_token: new.session_token,
            name: new.name,
            email: new.email,
            resume_extracted_text: new.resume_extracted_text,
            resume_summary: new.resume_summary,
            status: DEFAULT_STATUS.to_string(),
            current_question_index: NOT_STARTED_QUESTION_INDEX,
            is_completed: false,
            upk_eligible: new.eligibility.upk_eligible,
            teacher_eligible: new.eligibility.teacher_eligible,
            substitute_eligible: new.eligibility.substitute_eligible,
            shift_available: new.eligibility.shift_available,
            diaper_comfortable: new.eligibility.diaper_comfortable,
            started_at: None,
            completed_at: None,
            submitted_at: Some(new.submitted_at.unwrap_or(now)),
            work_experience_summary: new.work_experience_summary,
            position_type: new.position_type,
            school_type: new.school_type,
            hr_review: DEFAULT_HR_REVIEW.to_string(),
            feedback: None,
            question_by_user_to_hr: None,
            hr_answer_to_user: None,
            resume_comparison: new.resume_comparison.unwrap_or_else(|| json!({})),
            created_at: now,
            updated_at: now,
        };

        tables.registrations.push(row.clone());
        Ok(RegistrationAggregate::new(row, Vec::new()))
    }

    async fn append_answer(&self, registration_pk: i32, answer: NewAnswer) -> Result<AnswerRow> {
        let mut tables = self.tables.write().await;

        let owner = tables
            .registrations
            .iter_mut()
            .find(|r| r.id == registration_pk)
            .ok_or(StoreError::RegistrationMissing(registration_pk))?;
        owner.updated_at = next_updated_at(owner.updated_at);

        tables.next_answer_id += 1;
        let row = AnswerRow {
            id: tables.next_answer_id,
            registration_pk,
            question_text: answer.question_text,
            answer_text: answer.answer_text,
            is_answered: answer.is_answered,
            question_order: answer.question_order,
            timestamp: Some(Utc::now()),
        };
        tables.answers.push(row.clone());
        Ok(row)
    }

    async fn fetch_by_id(&self, id: i32) -> Result<Option<RegistrationAggregate>> {
        let tables = self.tables.read().await;
        Ok(tables
            .registrations
            .iter()
            .find(|r| r.id == id)
            .map(|r| tables.aggregate(r)))
    }

    async fn fetch_by_registration_id(
        &self,
        registration_id: &str,
    ) -> Result<Option<RegistrationAggregate>> {
        let tables = self.tables.read().await;
        Ok(tables
            .registrations
            .iter()
            .find(|r| r.registration_id == registration_id)
            .map(|r| tables.aggregate(r)))
    }

    async fn fetch_all(&self) -> Result<Vec<RegistrationAggregate>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<&RegistrationRow> = tables.registrations.iter().collect();
        // None sorts below Some, so reversing puts null submitted_at last.
        rows.sort_by_key(|r| Reverse((r.submitted_at, r.id)));
        Ok(rows.into_iter().map(|r| tables.aggregate(r)).collect())
    }

    async fn count(&self, filter: RegistrationFilter) -> Result<i64> {
        let tables = self.tables.read().await;
        let matches = |r: &&RegistrationRow| match &filter {
            RegistrationFilter::All => true,
            RegistrationFilter::Status(status) => &r.status == status,
            RegistrationFilter::UpkEligible => r.upk_eligible,
            RegistrationFilter::TeacherEligible => r.teacher_eligible,
            RegistrationFilter::SubstituteEligible => r.substitute_eligible,
        };
        Ok(tables.registrations.iter().filter(matches).count() as i64)
    }

    async fn apply_patch(
        &self,
        registration_id: &str,
        patch: &RegistrationPatch,
    ) -> Result<Option<RegistrationAggregate>> {
        let mut tables = self.tables.write().await;

        let Some(row) = tables
            .registrations
            .iter_mut()
            .find(|r| r.registration_id == registration_id)
        else {
            return Ok(None);
        };

        patch.apply_to(row);
        row.updated_at = next_updated_at(row.updated_at);
        let row = row.clone();

        Ok(Some(tables.aggregate(&row)))
    }

    async fn registration_ids(&self) -> Result<Vec<String>> {
        let tables = self.tables.read().await;
        Ok(tables
            .registrations
            .iter()
            .map(|r| r.registration_id.clone())
            .collect())
    }
}
