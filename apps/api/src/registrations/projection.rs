//! Projection of a registration aggregate into its two response shapes.
//!
//! [`CanonicalRegistration`] is built once per aggregate and applies every
//! default substitution. [`DocumentShape`] keeps the nested camelCase contract
//! of the old document-store API; [`SummaryShape`] is the flat snake_case form
//! used by the list view. Neither mapper adds defaults of its own.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::models::registration::{AnswerRow, RegistrationAggregate, ResumeComparison};

pub const DEFAULT_RECOMMENDATION: &str = "pending";

/// Resume comparison with every default filled in. Stored values pass through
/// untouched, whatever their JSON type.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonView {
    pub similarity_score: Value,
    pub overall_assessment: Value,
    pub matching_points: Value,
    pub discrepancies: Value,
    pub recommendation: Value,
    pub confidence: Value,
    pub analyzed_at: Value,
}

impl From<ResumeComparison> for ComparisonView {
    fn from(c: ResumeComparison) -> Self {
        Self {
            similarity_score: c.similarity_score.unwrap_or_else(|| json!(0)),
            overall_assessment: c.overall_assessment.unwrap_or_else(|| json!("")),
            matching_points: c.matching_points.unwrap_or_else(|| json!([])),
            discrepancies: c.discrepancies.unwrap_or_else(|| json!([])),
            recommendation: c
                .recommendation
                .unwrap_or_else(|| json!(DEFAULT_RECOMMENDATION)),
            confidence: c.confidence.unwrap_or_else(|| json!(0.0)),
            analyzed_at: c.analyzed_at.unwrap_or(Value::Null),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnswerView {
    pub question: String,
    /// Empty unless the question has been answered.
    pub answer: String,
    pub is_answered: bool,
    pub question_order: i32,
    pub timestamp: Option<String>,
}

impl From<&AnswerRow> for AnswerView {
    fn from(a: &AnswerRow) -> Self {
        Self {
            question: a.question_text.clone(),
            answer: if a.is_answered {
                a.answer_text.clone()
            } else {
                String::new()
            },
            is_answered: a.is_answered,
            question_order: a.question_order,
            timestamp: iso(a.timestamp),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRegistration {
    pub id: i32,
    pub registration_id: String,
    pub name: String,
    pub email: String,
    pub status: String,
    pub feedback: Option<String>,
    pub submitted_at: Option<String>,
    pub resume_summary: String,
    pub work_experience_summary: String,
    pub position_type: String,
    pub school_type: String,
    pub hr_review: String,
    pub question_by_user_to_hr: Option<String>,
    pub hr_answer_to_user: Option<String>,
    pub current_question_index: i32,
    pub is_completed: bool,
    pub upk_eligible: bool,
    pub teacher_eligible: bool,
    pub substitute_eligible: bool,
    pub shift_available: bool,
    pub diaper_comfortable: bool,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    /// Sorted by `question_order`.
    pub answers: Vec<AnswerView>,
    pub comparison: ComparisonView,
}

impl From<&RegistrationAggregate> for CanonicalRegistration {
    fn from(agg: &RegistrationAggregate) -> Self {
        let r = &agg.registration;
        Self {
            id: r.id,
            registration_id: r.registration_id.clone(),
            name: r.name.clone(),
            email: r.email.clone(),
            status: r.status.clone(),
            feedback: r.feedback.clone(),
            submitted_at: iso(r.submitted_at),
            resume_summary: r.resume_summary.clone(),
            work_experience_summary: r.work_experience_summary.clone(),
            position_type: r.position_type.clone(),
            school_type: r.school_type.clone(),
            hr_review: r.hr_review.clone(),
            question_by_user_to_hr: r.question_by_user_to_hr.clone(),
            hr_answer_to_user: r.hr_answer_to_user.clone(),
            current_question_index: r.current_question_index,
            is_completed: r.is_completed,
            upk_eligible: r.upk_eligible,
            teacher_eligible: r.teacher_eligible,
            substitute_eligible: r.substitute_eligible,
            shift_available: r.shift_available,
            diaper_comfortable: r.diaper_comfortable,
            started_at: iso(r.started_at),
            completed_at: iso(r.completed_at),
            answers: agg.answers().iter().map(AnswerView::from).collect(),
            comparison: ResumeComparison::from_stored(&r.resume_comparison).into(),
        }
    }
}

fn iso(ts: Option<DateTime<Utc>>) -> Option<String> {
    ts.map(|t| t.to_rfc3339())
}

// ────────────────────────────────────────────────────────────────────────────
// Document shape
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentShape {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub registration_id: String,
    pub status: String,
    pub feedback: Option<String>,
    pub submitted_at: Option<String>,
    pub resume_data: ResumeData,
    pub work_experience_summary: String,
    pub position_type: String,
    pub school_type: String,
    pub hr_review: String,
    pub question_by_user_to_hr: Option<String>,
    pub hr_answer_to_user: Option<String>,
    pub interview_data: InterviewData,
    pub resume_comparison: DocumentComparison,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResumeData {
    pub summary: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewData {
    pub questions: Vec<DocumentQuestion>,
    pub current_question_index: i32,
    pub is_completed: bool,
    pub upk_eligible: bool,
    pub teacher_eligible: bool,
    pub substitute_eligible: bool,
    pub shift_available: bool,
    pub diaper_comfortable: bool,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentQuestion {
    pub question: String,
    pub answer: String,
    pub is_answered: bool,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentComparison {
    pub similarity_score: Value,
    pub overall_assessment: Value,
    pub matching_points: Value,
    pub discrepancies: Value,
    pub recommendation: Value,
    pub confidence: Value,
    pub analyzed_at: Value,
}

impl From<CanonicalRegistration> for DocumentShape {
    fn from(c: CanonicalRegistration) -> Self {
        Self {
            id: c.id.to_string(),
            name: c.name,
            email: c.email,
            registration_id: c.registration_id,
            status: c.status,
            feedback: c.feedback,
            submitted_at: c.submitted_at,
            resume_data: ResumeData {
                summary: c.resume_summary,
            },
            work_experience_summary: c.work_experience_summary,
            position_type: c.position_type,
            school_type: c.school_type,
            hr_review: c.hr_review,
            question_by_user_to_hr: c.question_by_user_to_hr,
            hr_answer_to_user: c.hr_answer_to_user,
            interview_data: InterviewData {
                questions: c
                    .answers
                    .into_iter()
                    .map(|a| DocumentQuestion {
                        question: a.question,
                        answer: a.answer,
                        is_answered: a.is_answered,
                        timestamp: a.timestamp,
                    })
                    .collect(),
                current_question_index: c.current_question_index,
                is_completed: c.is_completed,
                upk_eligible: c.upk_eligible,
                teacher_eligible: c.teacher_eligible,
                substitute_eligible: c.substitute_eligible,
                shift_available: c.shift_available,
                diaper_comfortable: c.diaper_comfortable,
                started_at: c.started_at,
                completed_at: c.completed_at,
            },
            resume_comparison: DocumentComparison {
                similarity_score: c.comparison.similarity_score,
                overall_assessment: c.comparison.overall_assessment,
                matching_points: c.comparison.matching_points,
                discrepancies: c.comparison.discrepancies,
                recommendation: c.comparison.recommendation,
                confidence: c.comparison.confidence,
                analyzed_at: c.comparison.analyzed_at,
            },
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Summary shape
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct SummaryShape {
    pub id: i32,
    pub candidate_name: String,
    pub email: String,
    pub registration_id: String,
    pub status: String,
    pub submitted_at: Option<String>,
    pub resume_summary: String,
    pub work_experience_summary: String,
    pub position_type: String,
    pub school_type: String,
    pub upk_eligible: bool,
    pub teacher_eligible: bool,
    pub substitute_eligible: bool,
    pub shift_available: bool,
    pub diaper_comfortable: bool,
    pub interview_started_at: Option<String>,
    pub interview_completed_at: Option<String>,
    pub interview_completed: bool,
    pub similarity_score: Value,
    pub overall_assessment: Value,
    pub matching_points: Value,
    pub discrepancies: Value,
    pub recommendation: Value,
    pub confidence_score: Value,
    pub question_answers: Vec<SummaryAnswer>,
    // The list view reads these two under their camelCase names.
    #[serde(rename = "questionByUserToHr")]
    pub question_by_user_to_hr: Option<String>,
    #[serde(rename = "hrAnswerToUser")]
    pub hr_answer_to_user: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryAnswer {
    pub question_text: String,
    pub answer_text: String,
    pub question_order: i32,
    pub timestamp: Option<String>,
}

impl From<CanonicalRegistration> for SummaryShape {
    fn from(c: CanonicalRegistration) -> Self {
        Self {
            id: c.id,
            candidate_name: c.name,
            email: c.email,
            registration_id: c.registration_id,
            status: c.status,
            submitted_at: c.submitted_at,
            resume_summary: c.resume_summary,
            work_experience_summary: c.work_experience_summary,
            position_type: c.position_type,
            school_type: c.school_type,
            upk_eligible: c.upk_eligible,
            teacher_eligible: c.teacher_eligible,
            substitute_eligible: c.substitute_eligible,
            shift_available: c.shift_available,
            diaper_comfortable: c.diaper_comfortable,
            interview_started_at: c.started_at,
            interview_completed_at: c.completed_at,
            interview_completed: c.is_completed,
            similarity_score: c.comparison.similarity_score,
            overall_assessment: c.comparison.overall_assessment,
            matching_points: c.comparison.matching_points,
            discrepancies: c.comparison.discrepancies,
            recommendation: c.comparison.recommendation,
            confidence_score: c.comparison.confidence,
            question_answers: c
                .answers
                .into_iter()
                .map(|a| SummaryAnswer {
                    question_text: a.question,
                    answer_text: a.answer,
                    question_order: a.question_order,
                    timestamp: a.timestamp,
                })
                .collect(),
            question_by_user_to_hr: c.question_by_user_to_hr,
            hr_answer_to_user: c.hr_answer_to_user,
        }
    }
}

pub fn to_document(agg: &RegistrationAggregate) -> DocumentShape {
    CanonicalRegistration::from(agg).into()
}

pub fn to_summary(agg: &RegistrationAggregate) -> SummaryShape {
    CanonicalRegistration::from(agg).into()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
