use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod stats;
pub mod utils;

pub use config::Config;
pub use services::AppState;

/// CSP middleware adds Content-Security-Policy header to all responses
async fn csp_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    response.headers_mut().insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(
            "default-src 'self'; \
             script-src 'self' 'unsafe-inline'; \
             style-src 'self' 'unsafe-inline'; \
             img-src 'self' data: https:; \
             connect-src 'self'",
        ),
    );
    response
}

pub fn create_router(app_state: std::sync::Arc<services::AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_origin(tower_http::cors::Any); // TODO: restrict to specific origins in production

    Router::new()
        // Public endpoints (no auth required)
        .route("/health", get(handlers::health_check))
        // Metrics endpoint with Basic Auth protection
        .route(
            "/metrics",
            get(handlers::metrics_handler)
                .layer(middleware::from_fn(handlers::metrics_auth_middleware)),
        )
        // Auth endpoints (mixed: some public, some protected)
        .nest("/api/v1/auth", auth_routes(app_state.clone()))
        // Protected endpoints (require JWT)
        .nest(
            "/api/v1/content",
            content_routes().layer(middleware::from_fn_with_state(
                app_state.clone(),
                middlewares::auth::auth_middleware,
            )),
        )
        .nest(
            "/api/v1/progress",
            progress_routes().layer(middleware::from_fn_with_state(
                app_state.clone(),
                middlewares::auth::auth_middleware,
            )),
        )
        .nest(
            "/api/v1/quizzes",
            quiz_routes().layer(middleware::from_fn_with_state(
                app_state.clone(),
                middlewares::auth::auth_middleware,
            )),
        )
        .nest(
            "/api/v1/sessions",
            session_routes().layer(middleware::from_fn_with_state(
                app_state.clone(),
                middlewares::auth::auth_middleware,
            )),
        )
        .nest(
            "/api/v1/stats",
            stats_routes().layer(middleware::from_fn_with_state(
                app_state.clone(),
                middlewares::auth::auth_middleware,
            )),
        )
        .with_state(app_state)
        .layer(cors)
        .layer(middleware::from_fn(csp_middleware)) // Apply CSP to all responses
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

fn auth_routes(
    app_state: std::sync::Arc<services::AppState>,
) -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route(
            "/register",
            post(handlers::auth::register).layer(middleware::from_fn_with_state(
                app_state.clone(),
                middlewares::rate_limit::register_rate_limit_middleware,
            )),
        )
        .route(
            "/login",
            post(handlers::auth::login).layer(middleware::from_fn_with_state(
                app_state.clone(),
                middlewares::rate_limit::login_rate_limit_middleware,
            )),
        )
        .route(
            "/me",
            get(handlers::auth::me).layer(middleware::from_fn_with_state(
                app_state,
                middlewares::auth::auth_middleware,
            )),
        )
}

fn content_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route("/", get(handlers::content::list_content))
        .route("/{id}", get(handlers::content::get_content))
        .route("/{id}/quiz", get(handlers::quizzes::get_quiz_for_content))
}

fn progress_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route("/", get(handlers::progress::list_progress))
        .route("/{content_id}", put(handlers::progress::update_progress))
}

fn quiz_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route(
            "/{quiz_id}/attempts",
            get(handlers::quizzes::list_attempts).post(handlers::quizzes::submit_attempt),
        )
}

fn session_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route(
            "/",
            get(handlers::sessions::list_sessions).post(handlers::sessions::start_session),
        )
        .route("/{id}/finish", post(handlers::sessions::finish_session))
}

fn stats_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route("/dashboard", get(handlers::stats::dashboard))
        .route("/achievements", get(handlers::stats::achievements))
}
