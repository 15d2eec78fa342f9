use axum::{
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// JSON body extractor for the reading API.
///
/// Axum's stock `Json` rejects malformed bodies with a plain-text response;
/// the front end expects every error as `{"message", "status"}` JSON, the
/// same shape `ApiError` produces, so this wrapper rewrites rejections into
/// that contract before they leave the extractor.
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: serde::de::DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(payload)) => Ok(AppJson(payload)),
            Err(rejection) => {
                tracing::warn!("Rejected request body: {}", rejection);
                let body = json!({
                    "message": format!("Invalid JSON body: {}", rejection),
                    "status": StatusCode::BAD_REQUEST.as_u16(),
                });
                Err((StatusCode::BAD_REQUEST, Json(body)).into_response())
            }
        }
    }
}
