use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gateway::Endpoint;
use serde::Serialize;
use serde_json::json;
use session::{
    ActionError, ClearResponse, ExtractCommand, ExtractResponse, GenerateCommand,
    GenerateResponse, SessionState, SummarizeCommand, SummarizeResponse, Transition,
};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::metrics::{Action, MetricsSnapshot};
use crate::sessions::{Lane, Session, SessionHandle};
use crate::AppState;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("session {0} not found")]
    SessionNotFound(Uuid),
    #[error(transparent)]
    Rejected(#[from] ActionError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        (status, Json(json!({ "warning": self.to_string() }))).into_response()
    }
}

fn session_handle(state: &AppState, id: Uuid) -> Result<SessionHandle, ApiError> {
    state.sessions.get(&id).ok_or(ApiError::SessionNotFound(id))
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub sessions: usize,
    pub max_sessions: usize,
    pub summarization_configured: bool,
    pub entity_extraction_configured: bool,
    pub question_generation_configured: bool,
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let gateway = state.gateway_config.as_ref();
    Json(HealthResponse {
        status: "ok",
        sessions: state.sessions.len(),
        max_sessions: state.sessions.max_sessions(),
        summarization_configured: gateway.endpoint_url(Endpoint::Summarization).is_some(),
        entity_extraction_configured: gateway.endpoint_url(Endpoint::EntityExtraction).is_some(),
        question_generation_configured: gateway
            .endpoint_url(Endpoint::QuestionGeneration)
            .is_some(),
    })
}

#[derive(Serialize)]
pub struct OptionsResponse {
    pub models: Vec<String>,
    pub default_model: String,
    pub default_max_new_tokens: u32,
    pub max_entity_choices: Option<usize>,
}

pub async fn get_options(State(state): State<Arc<AppState>>) -> Json<OptionsResponse> {
    let config = state.controller.config();
    Json(OptionsResponse {
        models: config.models.clone(),
        default_model: config.default_model.clone(),
        default_max_new_tokens: config.default_max_new_tokens,
        max_entity_choices: config.max_entity_choices,
    })
}

pub async fn get_metrics(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

#[derive(Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
}

pub async fn create_session(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<CreateSessionResponse>) {
    let session_id = state.sessions.create();
    state.metrics.record_session();
    info!(session = %session_id, "Session created");
    (StatusCode::CREATED, Json(CreateSessionResponse { session_id }))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionState>, ApiError> {
    let handle = session_handle(&state, id)?;
    Ok(Json(handle.snapshot().await))
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !state.sessions.remove(&id) {
        return Err(ApiError::SessionNotFound(id));
    }
    info!(session = %id, "Session removed");
    Ok(StatusCode::NO_CONTENT)
}

async fn apply_result(session: &Session, id: Uuid, epoch: u64, transition: Transition) {
    if !session.apply_if_current(epoch, transition).await {
        debug!(session = %id, "Session cleared during the call, result not stored");
    }
}

pub async fn extract(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(cmd): Json<ExtractCommand>,
) -> Result<Json<ExtractResponse>, ApiError> {
    let handle = session_handle(&state, id)?;
    let _queued = handle.queue(Lane::Extract).await;
    let epoch = handle.epoch();

    let started = Instant::now();
    let outcome = state.controller.extract(cmd).await;
    let response = outcome.response;
    state
        .metrics
        .record_action(Action::Extract, started.elapsed(), response.failure.is_some());
    apply_result(&handle, id, epoch, outcome.transition).await;

    if let Some(reason) = &response.failure {
        warn!(session = %id, reason = %reason, "Extract served fallback");
    }
    info!(session = %id, choices = response.entity_choices.len(), "Extract finished");

    Ok(Json(response))
}

pub async fn generate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(cmd): Json<GenerateCommand>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let handle = session_handle(&state, id)?;
    let _queued = handle.queue(Lane::Generate).await;
    let epoch = handle.epoch();

    let started = Instant::now();
    let outcome = state
        .controller
        .generate(cmd)
        .await
        .inspect_err(|_| state.metrics.record_rejected(Action::Generate))?;
    let response = outcome.response;
    state
        .metrics
        .record_action(Action::Generate, started.elapsed(), response.failure.is_some());
    apply_result(&handle, id, epoch, outcome.transition).await;

    if let Some(reason) = &response.failure {
        warn!(session = %id, reason = %reason, "Generate served fallback");
    }
    info!(session = %id, "Generate finished");

    Ok(Json(response))
}

pub async fn summarize(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(cmd): Json<SummarizeCommand>,
) -> Result<Json<SummarizeResponse>, ApiError> {
    let handle = session_handle(&state, id)?;
    let _queued = handle.queue(Lane::Summarize).await;
    let epoch = handle.epoch();

    let started = Instant::now();
    let outcome = state
        .controller
        .summarize(cmd)
        .await
        .inspect_err(|_| state.metrics.record_rejected(Action::Summarize))?;
    let response = outcome.response;
    state
        .metrics
        .record_action(Action::Summarize, started.elapsed(), response.failure.is_some());
    apply_result(&handle, id, epoch, outcome.transition).await;

    if let Some(reason) = &response.failure {
        warn!(session = %id, reason = %reason, "Summarize served fallback");
    }
    info!(session = %id, summary_len = response.summary.len(), "Summarize finished");

    Ok(Json(response))
}

pub async fn clear(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClearResponse>, ApiError> {
    let handle = session_handle(&state, id)?;

    let started = Instant::now();
    let response = handle
        .reset(|current| state.controller.clear(current))
        .await;
    state
        .metrics
        .record_action(Action::Clear, started.elapsed(), false);
    info!(session = %id, "Session cleared");

    Ok(Json(response))
}
