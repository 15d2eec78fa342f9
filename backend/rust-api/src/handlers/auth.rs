use axum::{extract::State, Extension, Json};
use std::sync::Arc;
use validator::Validate;

use crate::extractors::AppJson;
use crate::middlewares::auth::{JwtClaims, JwtService};
use crate::models::user::{AuthResponse, LoginRequest, RegisterRequest, UserProfile};
use crate::services::{auth_service::AuthService, AppState};

use super::{caller_id, ApiError};

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(
        state.mongo.clone(),
        JwtService::new(&state.config.jwt_secret),
    )
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    req.validate()?;

    let response = auth_service(&state).register(req).await?;
    Ok(Json(response))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    req.validate()?;

    let response = auth_service(&state).login(req).await?;
    Ok(Json(response))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<Json<UserProfile>, ApiError> {
    let user_id = caller_id(&claims)?;
    let profile = auth_service(&state).get_profile(&user_id).await?;
    Ok(Json(profile))
}
