use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::AuthError;
use crate::error::ApiError;

/// JWT authentication middleware that verifies the bearer token and injects
/// the caller's [`Identity`](crate::auth::Identity) into request extensions
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = match request.headers().get(AUTHORIZATION) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| AuthError::Unauthenticated("Invalid Authorization header format"))?,
        ),
        None => None,
    };

    let identity = state.tokens.verify_header(header).map_err(|e| {
        tracing::debug!("Rejected {} {}: {}", request.method(), request.uri().path(), e);
        e
    })?;

    tracing::debug!("Authenticated '{}' as {}", identity.username, identity.role);
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}
