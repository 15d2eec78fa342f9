use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use mongodb::bson::oid::ObjectId;
use std::sync::Arc;

use crate::middlewares::auth::JwtClaims;
use crate::models::content::{ContentDetail, ContentListQuery, ContentSummary};
use crate::services::{content_service::ContentService, AppState};

use super::ApiError;

pub async fn list_content(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Query(query): Query<ContentListQuery>,
) -> Result<Json<Vec<ContentSummary>>, ApiError> {
    let service = ContentService::new(state.mongo.clone());
    let items = service.list_content(&query, claims.level).await?;
    Ok(Json(items))
}

pub async fn get_content(
    State(state): State<Arc<AppState>>,
    Path(content_id): Path<String>,
) -> Result<Json<ContentDetail>, ApiError> {
    let content_id = ObjectId::parse_str(&content_id)
        .map_err(|_| ApiError::bad_request("Invalid content id"))?;

    let service = ContentService::new(state.mongo.clone());
    let detail = service.get_content_detail(&content_id).await?;
    Ok(Json(detail))
}
