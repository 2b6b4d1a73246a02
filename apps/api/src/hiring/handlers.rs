use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::agents::OnboardingPlan;
use crate::decision::aggregator::Decision;
use crate::errors::AppError;
use crate::evaluation::record::{RaterRole, RawEvaluation};
use crate::hiring::intake::{read_multipart, CandidateIntake};
use crate::hiring::pipeline::EvaluationOutcome;
use crate::session::model::{Session, SessionStatus};
use crate::session::state::SessionState;
use crate::state::AppState;

#[derive(Serialize)]
pub struct RegisteredResponse {
    pub candidate_id: Uuid,
    pub round: u32,
    pub state: SessionState,
}

impl From<Session> for RegisteredResponse {
    fn from(session: Session) -> Self {
        Self {
            candidate_id: session.candidate_id(),
            round: session.round,
            state: session.state,
        }
    }
}

#[derive(Serialize)]
pub struct OnboardingResponse {
    pub candidate_id: Uuid,
    pub onboarding_plan: OnboardingPlan,
}

/// POST /api/v1/candidates
pub async fn handle_register(
    State(state): State<AppState>,
    Json(intake): Json<CandidateIntake>,
) -> Result<(StatusCode, Json<RegisteredResponse>), AppError> {
    let session = state.pipeline.register(intake.into_candidate()?).await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

/// POST /api/v1/candidates/upload
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<RegisteredResponse>), AppError> {
    let intake = read_multipart(multipart).await?;
    let session = state.pipeline.register(intake.into_candidate()?).await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

/// POST /api/v1/candidates/:id/evaluate
pub async fn handle_evaluate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EvaluationOutcome>, AppError> {
    Ok(Json(state.pipeline.evaluate(id).await?))
}

/// PUT /api/v1/candidates/:id/evaluations/:role
pub async fn handle_submit_evaluation(
    State(state): State<AppState>,
    Path((id, role)): Path<(Uuid, RaterRole)>,
    Json(raw): Json<RawEvaluation>,
) -> Result<Json<SessionStatus>, AppError> {
    Ok(Json(state.pipeline.submit_evaluation(id, role, raw).await?))
}

/// POST /api/v1/candidates/:id/decision
pub async fn handle_finalize(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EvaluationOutcome>, AppError> {
    Ok(Json(state.pipeline.finalize(id).await?))
}

/// GET /api/v1/candidates/:id/status
pub async fn handle_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionStatus>, AppError> {
    Ok(Json(state.pipeline.status(id).await?))
}

/// GET /api/v1/candidates/:id/decision
pub async fn handle_get_decision(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Decision>, AppError> {
    Ok(Json(state.pipeline.decision(id).await?))
}

/// GET /api/v1/candidates/:id/history
pub async fn handle_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Session>>, AppError> {
    Ok(Json(state.pipeline.history(id).await?))
}

/// GET /api/v1/candidates/:id/onboarding
pub async fn handle_onboarding(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OnboardingResponse>, AppError> {
    let onboarding_plan = state.pipeline.onboarding(id).await?;
    Ok(Json(OnboardingResponse {
        candidate_id: id,
        onboarding_plan,
    }))
}
