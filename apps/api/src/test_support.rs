use chrono::{TimeZone, Utc};
use serde_json::json;

use crate::models::registration::{
    AnswerRow, RegistrationRow, DEFAULT_HR_REVIEW, DEFAULT_STATUS, NOT_STARTED_QUESTION_INDEX,
};

pub fn registration_row() -> RegistrationRow {
    let submitted = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
    RegistrationRow {
        id: 1,
        registration_id: "REG-001".to_string(),
        session_token: None,
        name: "Ada Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        resume_extracted_text: "Ten years in early childhood education.".to_string(),
        resume_summary: "Experienced pre-K teacher".to_string(),
        status: DEFAULT_STATUS.to_string(),
        current_question_index: NOT_STARTED_QUESTION_INDEX,
        is_completed: false,
        upk_eligible: true,
        teacher_eligible: false,
        substitute_eligible: true,
        shift_available: false,
        diaper_comfortable: true,
        started_at: None,
        completed_at: None,
        submitted_at: Some(submitted),
        work_experience_summary: "Head teacher, 2014-2024".to_string(),
        position_type: "Lead Teacher".to_string(),
        school_type: "UPK".to_string(),
        hr_review: DEFAULT_HR_REVIEW.to_string(),
        feedback: Some("keep".to_string()),
        question_by_user_to_hr: None,
        hr_answer_to_user: None,
        resume_comparison: json!({}),
        created_at: submitted,
        updated_at: submitted,
    }
}

pub fn answer_row(id: i32, question_order: i32, answer_text: &str, is_answered: bool) -> AnswerRow {
    AnswerRow {
        id,
        registration_pk: 1,
        question_text: format!("Question {question_order}"),
        answer_text: answer_text.to_string(),
        is_answered,
        question_order,
        timestamp: Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, id as u32).unwrap()),
    }
}
