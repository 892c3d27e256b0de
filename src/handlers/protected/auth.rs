// handlers/protected/auth.rs - /auth/whoami and /auth/register

use axum::extract::State;
use serde::Serialize;

use crate::app::AppState;
use crate::auth::Identity;
use crate::database::models::Account;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, Authorized, CurrentUser, WriteStructure};
use crate::services::accounts::AccountInput;

#[derive(Debug, Serialize)]
pub struct Registered {
    pub message: String,
    pub user: Account,
}

/// GET /auth/whoami - Echo the verified identity carried by the token
pub async fn whoami(CurrentUser(identity): CurrentUser) -> ApiResult<Identity> {
    Ok(ApiResponse::success(identity))
}

/// POST /auth/register - Manager creates an account `{Username, Password, Role}`
pub async fn register(
    State(state): State<AppState>,
    _manager: Authorized<WriteStructure>,
    ApiJson(input): ApiJson<AccountInput>,
) -> ApiResult<Registered> {
    let user = state.accounts.create(input).await?;
    Ok(ApiResponse::created(Registered {
        message: format!("User '{}' registered", user.username),
        user,
    }))
}
