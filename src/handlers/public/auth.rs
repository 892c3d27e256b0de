// handlers/public/auth.rs - POST /auth/login

use axum::extract::State;

use crate::app::AppState;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::accounts::{LoginRequest, LoginResponse};

/// POST /auth/login - Exchange `{Username, Password}` for a bearer token
///
/// Returns `{token, expires_in, user}`. Unknown usernames and wrong
/// passwords both answer 401 `INVALID_CREDENTIAL`.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let response = state.accounts.login(request).await?;
    Ok(ApiResponse::success(response))
}
