use crate::api::ApiError;
use crate::AppState;
use axum::{body::Body, http::Request, middleware::Next, response::Response};
use std::sync::Arc;

/// Requires `Authorization: Bearer <token>` when an API token is configured.
pub async fn auth_middleware(req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let state = req
        .extensions()
        .get::<Arc<AppState>>()
        .ok_or_else(|| ApiError::InternalServerError("application state missing".to_string()))?;

    if let Some(expected) = state.api_token.as_deref() {
        let presented = req
            .headers()
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        if presented != Some(expected) {
            tracing::warn!(path = %req.uri().path(), "rejected unauthenticated request");
            return Err(ApiError::Unauthorized);
        }
    }

    Ok(next.run(req).await)
}
