use axum::{extract::State, Extension, Json};
use std::sync::Arc;

use crate::middlewares::auth::JwtClaims;
use crate::services::{
    stats_service::{AchievementsResponse, DashboardResponse, StatsService},
    AppState,
};

use super::{caller_id, ApiError};

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let user_id = caller_id(&claims)?;
    let service = StatsService::new(state.mongo.clone(), state.redis.clone());
    let dashboard = service.dashboard(&user_id).await?;
    Ok(Json(dashboard))
}

pub async fn achievements(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<Json<AchievementsResponse>, ApiError> {
    let user_id = caller_id(&claims)?;
    let service = StatsService::new(state.mongo.clone(), state.redis.clone());
    let achievements = service.achievements(&user_id).await?;
    Ok(Json(achievements))
}
