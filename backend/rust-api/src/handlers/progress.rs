use axum::{
    extract::{Path, State},
    Extension, Json,
};
use mongodb::bson::oid::ObjectId;
use std::sync::Arc;
use validator::Validate;

use crate::extractors::AppJson;
use crate::middlewares::auth::JwtClaims;
use crate::models::progress::{ProgressView, UpdateProgressRequest};
use crate::services::{progress_service::ProgressService, AppState};

use super::{caller_id, ApiError};

pub async fn list_progress(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<Json<Vec<ProgressView>>, ApiError> {
    let user_id = caller_id(&claims)?;
    let service = ProgressService::new(state.mongo.clone());
    let rows = service.list_progress(&user_id).await?;
    Ok(Json(rows))
}

pub async fn update_progress(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(content_id): Path<String>,
    AppJson(req): AppJson<UpdateProgressRequest>,
) -> Result<Json<ProgressView>, ApiError> {
    req.validate()?;

    let user_id = caller_id(&claims)?;
    let content_id = ObjectId::parse_str(&content_id)
        .map_err(|_| ApiError::bad_request("Invalid content id"))?;

    let service = ProgressService::new(state.mongo.clone());
    let view = service.upsert_progress(&user_id, &content_id, &req).await?;
    Ok(Json(view))
}
