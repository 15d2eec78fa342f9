use axum::{
    extract::{Path, State},
    Extension, Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::extractors::AppJson;
use crate::middlewares::auth::JwtClaims;
use crate::models::session::{
    FinishSessionRequest, SessionView, StartSessionRequest, StartSessionResponse,
};
use crate::services::{session_service::SessionService, AppState};

use super::{caller_id, ApiError};

fn session_service(state: &AppState) -> SessionService {
    SessionService::new(state.mongo.clone(), state.redis.clone())
}

pub async fn start_session(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    AppJson(req): AppJson<StartSessionRequest>,
) -> Result<Json<StartSessionResponse>, ApiError> {
    req.validate()?;

    let user_id = caller_id(&claims)?;
    let response = session_service(&state).start_session(&user_id, &req).await?;
    Ok(Json(response))
}

pub async fn finish_session(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(session_id): Path<String>,
    AppJson(req): AppJson<FinishSessionRequest>,
) -> Result<Json<SessionView>, ApiError> {
    req.validate()?;

    let user_id = caller_id(&claims)?;
    let view = session_service(&state)
        .finish_session(&user_id, &session_id, &req)
        .await?;
    Ok(Json(view))
}

pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<Json<Vec<SessionView>>, ApiError> {
    let user_id = caller_id(&claims)?;
    let sessions = session_service(&state).list_sessions(&user_id).await?;
    Ok(Json(sessions))
}
