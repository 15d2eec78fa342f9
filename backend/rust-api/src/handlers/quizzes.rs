use axum::{
    extract::{Path, State},
    Extension, Json,
};
use mongodb::bson::oid::ObjectId;
use std::sync::Arc;
use validator::Validate;

use crate::extractors::AppJson;
use crate::middlewares::auth::JwtClaims;
use crate::models::quiz::{AttemptView, QuizDetail, SubmitAttemptRequest, SubmitAttemptResponse};
use crate::services::{quiz_service::QuizService, AppState};

use super::{caller_id, ApiError};

pub async fn get_quiz_for_content(
    State(state): State<Arc<AppState>>,
    Path(content_id): Path<String>,
) -> Result<Json<QuizDetail>, ApiError> {
    let content_id = ObjectId::parse_str(&content_id)
        .map_err(|_| ApiError::bad_request("Invalid content id"))?;

    let service = QuizService::new(state.mongo.clone());
    let quiz = service.get_quiz_for_content(&content_id).await?;
    Ok(Json(quiz))
}

pub async fn submit_attempt(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(quiz_id): Path<String>,
    AppJson(req): AppJson<SubmitAttemptRequest>,
) -> Result<Json<SubmitAttemptResponse>, ApiError> {
    req.validate()?;

    let user_id = caller_id(&claims)?;
    let quiz_id =
        ObjectId::parse_str(&quiz_id).map_err(|_| ApiError::bad_request("Invalid quiz id"))?;

    let service = QuizService::new(state.mongo.clone());
    let response = service.submit_attempt(&user_id, &quiz_id, &req).await?;
    Ok(Json(response))
}

pub async fn list_attempts(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(quiz_id): Path<String>,
) -> Result<Json<Vec<AttemptView>>, ApiError> {
    let user_id = caller_id(&claims)?;
    let quiz_id =
        ObjectId::parse_str(&quiz_id).map_err(|_| ApiError::bad_request("Invalid quiz id"))?;

    let service = QuizService::new(state.mongo.clone());
    let attempts = service.list_attempts_for_quiz(&user_id, &quiz_id).await?;
    Ok(Json(attempts))
}
