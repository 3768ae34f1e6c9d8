use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

pub const DEFAULT_STATUS: &str = "not attempted";
pub const DEFAULT_HR_REVIEW: &str = "pending";
pub const NOT_STARTED_QUESTION_INDEX: i32 = -1;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RegistrationRow {
    pub id: i32,
    pub registration_id: String,
    pub session_token: Option<String>,
    pub name: String,
    pub email: String,
    pub resume_extracted_text: String,
    pub resume_summary: String,
    pub status: String,
    pub current_question_index: i32,
    pub is_completed: bool,
    pub upk_eligible: bool,
    pub teacher_eligible: bool,
    pub substitute_eligible: bool,
    pub shift_available: bool,
    pub diaper_comfortable: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub work_experience_summary: String,
    pub position_type: String,
    pub school_type: String,
    pub hr_review: String,
    pub feedback: Option<String>,
    pub question_by_user_to_hr: Option<String>,
    pub hr_answer_to_user: Option<String>,
    /// Stored opaquely; read through [`ResumeComparison::from_stored`].
    pub resume_comparison: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AnswerRow {
    pub id: i32,
    /// Internal id of the owning registration, not the external identifier.
    #[sqlx(rename = "registration_id")]
    pub registration_pk: i32,
    pub question_text: String,
    pub answer_text: String,
    pub is_answered: bool,
    pub question_order: i32,
    pub timestamp: Option<DateTime<Utc>>,
}

/// A registration together with its answers, sorted by `question_order`.
#[derive(Debug, Clone)]
pub struct RegistrationAggregate {
    pub registration: RegistrationRow,
    answers: Vec<AnswerRow>,
}

impl RegistrationAggregate {
    pub fn new(registration: RegistrationRow, mut answers: Vec<AnswerRow>) -> Self {
        answers.sort_by_key(|a| (a.question_order, a.id));
        Self {
            registration,
            answers,
        }
    }

    pub fn answers(&self) -> &[AnswerRow] {
        &self.answers
    }
}

/// Keys of the `resume_comparison` JSON column, each read on its own and kept
/// as stored. Missing and `null` keys are `None`; defaults are filled in by the
/// projection layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeComparison {
    pub similarity_score: Option<Value>,
    pub overall_assessment: Option<Value>,
    pub matching_points: Option<Value>,
    pub discrepancies: Option<Value>,
    pub recommendation: Option<Value>,
    pub confidence: Option<Value>,
    pub analyzed_at: Option<Value>,
}

impl ResumeComparison {
    /// Reads the stored column. Anything other than an object reads as empty.
    pub fn from_stored(value: &Value) -> Self {
        let Some(fields) = value.as_object() else {
            if !value.is_null() {
                tracing::warn!("resume_comparison is not an object, using defaults: {value}");
            }
            return Self::default();
        };
        let field = |key: &str| fields.get(key).filter(|v| !v.is_null()).cloned();

        Self {
            similarity_score: field("similarity_score"),
            overall_assessment: field("overall_assessment"),
            matching_points: field("matching_points"),
            discrepancies: field("discrepancies"),
            recommendation: field("recommendation"),
            confidence: field("confidence"),
            analyzed_at: field("analyzed_at"),
        }
    }
}

/// Fields supplied by the intake collaborator when a registration is created.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRegistration {
    pub registration_id: String,
    pub session_token: Option<String>,
    pub name: String,
    pub email: String,
    pub resume_extracted_text: String,
    pub resume_summary: String,
    #[serde(default)]
    pub work_experience_summary: String,
    #[serde(default)]
    pub position_type: String,
    #[serde(default)]
    pub school_type: String,
    #[serde(default)]
    pub eligibility: EligibilityFlags,
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resume_comparison: Option<Value>,
}

impl NewRegistration {
    pub fn new(
        registration_id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            registration_id: registration_id.into(),
            session_token: None,
            name: name.into(),
            email: email.into(),
            resume_extracted_text: String::new(),
            resume_summary: String::new(),
            work_experience_summary: String::new(),
            position_type: String::new(),
            school_type: String::new(),
            eligibility: EligibilityFlags::default(),
            submitted_at: None,
            resume_comparison: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EligibilityFlags {
    pub upk_eligible: bool,
    pub teacher_eligible: bool,
    pub substitute_eligible: bool,
    pub shift_available: bool,
    pub diaper_comfortable: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAnswer {
    pub question_text: String,
    #[serde(default)]
    pub answer_text: String,
    #[serde(default)]
    pub is_answered: bool,
    pub question_order: i32,
}

/// Field-level partial update. `None` leaves the stored value untouched;
/// `Some` overwrites it, including with an empty string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrationPatch {
    /// `Some(None)` clears the stored feedback.
    pub feedback: Option<Option<String>>,
    pub position_type: Option<String>,
    pub school_type: Option<String>,
    pub status: Option<String>,
    pub hr_review: Option<String>,
    pub hr_answer_to_user: Option<String>,
}

impl RegistrationPatch {
    /// Applies present fields to an in-memory row. Does not touch `updated_at`.
    pub fn apply_to(&self, row: &mut RegistrationRow) {
        if let Some(feedback) = &self.feedback {
            row.feedback = feedback.clone();
        }
        if let Some(position_type) = &self.position_type {
            row.position_type = position_type.clone();
        }
        if let Some(school_type) = &self.school_type {
            row.school_type = school_type.clone();
        }
        if let Some(status) = &self.status {
            row.status = status.clone();
        }
        if let Some(hr_review) = &self.hr_review {
            row.hr_review = hr_review.clone();
        }
        if let Some(answer) = &self.hr_answer_to_user {
            row.hr_answer_to_user = Some(answer.clone());
        }
    }
}
