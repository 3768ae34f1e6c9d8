//! Axum route handlers for the interview registrations API.

use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::extract::{JsonBody, PathParam};
use crate::registrations::projection::{DocumentShape, SummaryShape};
use crate::registrations::service::{
    Envelope, FeedbackUpdate, HrAnswerPayload, HrAnswerUpdate, HrReviewUpdate, RoleDetailsUpdate,
    StatusUpdate, SummaryStats,
};
use crate::state::AppState;

/// GET /api/interview-registrations/
///
/// Flat summary rows, newest submission first.
#[tracing::instrument(skip(state))]
pub async fn handle_list(
    State(state): State<AppState>,
) -> Result<Json<Vec<SummaryShape>>, AppError> {
    Ok(Json(state.registrations.list_all().await?))
}

/// GET /api/interview-registrations/stats/overview
///
/// Every registration in the document shape the dashboard was built against.
#[tracing::instrument(skip(state))]
pub async fn handle_overview(
    State(state): State<AppState>,
) -> Result<Json<Envelope<Vec<DocumentShape>>>, AppError> {
    Ok(Json(state.registrations.get_overview().await?))
}

/// GET /api/interview-registrations/stats/summary
#[tracing::instrument(skip(state))]
pub async fn handle_summary_stats(
    State(state): State<AppState>,
) -> Result<Json<Envelope<SummaryStats>>, AppError> {
    Ok(Json(state.registrations.get_summary_stats().await?))
}

/// GET /api/interview-registrations/:id
///
/// Looks up by internal numeric id, not the external registration id.
#[tracing::instrument(skip(state))]
pub async fn handle_get(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<Json<Envelope<DocumentShape>>, AppError> {
    Ok(Json(state.registrations.get_by_internal_id(id).await?))
}

/// PATCH /api/interview-registrations/:id/feedback
#[tracing::instrument(skip(state, body))]
pub async fn handle_update_feedback(
    State(state): State<AppState>,
    PathParam(registration_id): PathParam<String>,
    JsonBody(body): JsonBody<FeedbackUpdate>,
) -> Result<Json<Envelope<DocumentShape>>, AppError> {
    Ok(Json(
        state
            .registrations
            .update_feedback(&registration_id, body)
            .await?,
    ))
}

/// PATCH /api/interview-registrations/:id/role-details
#[tracing::instrument(skip(state, body))]
pub async fn handle_update_role_details(
    State(state): State<AppState>,
    PathParam(registration_id): PathParam<String>,
    JsonBody(body): JsonBody<RoleDetailsUpdate>,
) -> Result<Json<Envelope<DocumentShape>>, AppError> {
    Ok(Json(
        state
            .registrations
            .update_role_details(&registration_id, body)
            .await?,
    ))
}

/// PATCH /api/interview-registrations/:id/status
#[tracing::instrument(skip(state, body))]
pub async fn handle_update_status(
    State(state): State<AppState>,
    PathParam(registration_id): PathParam<String>,
    JsonBody(body): JsonBody<StatusUpdate>,
) -> Result<Json<Envelope<DocumentShape>>, AppError> {
    Ok(Json(
        state
            .registrations
            .update_status(&registration_id, body)
            .await?,
    ))
}

/// PATCH /api/interview-registrations/:id/hr-review
#[tracing::instrument(skip(state, body))]
pub async fn handle_update_hr_review(
    State(state): State<AppState>,
    PathParam(registration_id): PathParam<String>,
    JsonBody(body): JsonBody<HrReviewUpdate>,
) -> Result<Json<Envelope<DocumentShape>>, AppError> {
    Ok(Json(
        state
            .registrations
            .update_hr_review(&registration_id, body)
            .await?,
    ))
}

/// PATCH /api/interview-registrations/:id/hr-answer
///
/// Returns only the registration id and the stored answer.
#[tracing::instrument(skip(state, body))]
pub async fn handle_update_hr_answer(
    State(state): State<AppState>,
    PathParam(registration_id): PathParam<String>,
    JsonBody(body): JsonBody<HrAnswerUpdate>,
) -> Result<Json<Envelope<HrAnswerPayload>>, AppError> {
    Ok(Json(
        state
            .registrations
            .update_hr_answer(&registration_id, body)
            .await?,
    ))
}
