//! Router configuration.
//!
//! This module creates the main Axum router that combines all endpoints.

use axum::{
    http::{HeaderName, StatusCode},
    middleware::from_fn_with_state,
    response::Json,
    routing::get,
    Router,
};
use ep_admin::{
    admin_router, identity_middleware, impersonation_router, profile_router, IdentityHeader,
};
use ep_core::{Error, Result};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Creates the main application router.
///
/// # Errors
///
/// Returns [`Error::Config`] if the configured identity header is not a
/// valid header name.
pub fn create_router(state: AppState) -> Result<Router> {
    let header = HeaderName::try_from(state.config.server.identity_header.as_str())
        .map_err(|e| Error::Config(format!("EP_IDENTITY_HEADER: {e}")))?;

    // Account forms; the identity middleware turns the proxy header into
    // the authenticated account
    let forms = admin_router()
        .merge(profile_router())
        .merge(impersonation_router())
        .with_state(state.admin_state())
        .layer(from_fn_with_state(IdentityHeader(header), identity_middleware));

    let health = Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness_check))
        .route("/health/ready", get(readiness_check));

    let app = Router::new()
        .merge(forms)
        .merge(health)
        .route("/", get(root));

    Ok(app.layer(TraceLayer::new_for_http()))
}

/// Root endpoint handler.
async fn root() -> Json<ServerInfo> {
    Json(ServerInfo {
        name: "epeople".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
}

/// Server information response.
#[derive(Serialize)]
pub struct ServerInfo {
    name: String,
    version: String,
}

/// Basic health check.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    })
}

/// Liveness check.
async fn liveness_check() -> StatusCode {
    StatusCode::OK
}

/// Readiness check. The in-memory directory is ready once constructed.
async fn readiness_check() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{body::Body, http::Request};
    use ep_auth::{PasswordHasherService, TracingMailer};
    use ep_core::Config;
    use ep_storage::InMemoryDirectory;
    use tower::util::ServiceExt;

    use super::*;

    fn state(config: Config) -> AppState {
        AppState::new(
            Arc::new(config),
            Arc::new(InMemoryDirectory::new()),
            Arc::new(TracingMailer),
            PasswordHasherService::default(),
        )
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = health_check().await;
        assert_eq!(response.0.status, "healthy");
    }

    #[tokio::test]
    async fn anonymous_profile_request_is_unauthorized() {
        let app = create_router(state(Config::for_testing())).unwrap();

        let response = app
            .oneshot(Request::builder().uri("/profile").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_registration_token_is_a_bad_request() {
        let app = create_router(state(Config::for_testing())).unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/register?token=unknown")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn invalid_identity_header_is_a_config_error() {
        let mut config = Config::for_testing();
        config.server.identity_header = "not a header".to_string();

        let err = create_router(state(config)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
