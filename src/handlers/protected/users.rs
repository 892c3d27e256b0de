// handlers/protected/users.rs - /users (Manager only)

use axum::extract::State;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::Account;
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, Authorized, WithId, WriteStructure};
use crate::services::accounts::AccountInput;

pub async fn list(
    State(state): State<AppState>,
    _manager: Authorized<WriteStructure>,
) -> ApiResult<Vec<Account>> {
    Ok(ApiResponse::success(state.accounts.list().await?))
}

/// POST /users - Create `{Username, Password, Role}`
pub async fn create(
    State(state): State<AppState>,
    _manager: Authorized<WriteStructure>,
    ApiJson(input): ApiJson<AccountInput>,
) -> ApiResult<WithId<Account>> {
    let account = state.accounts.create(input).await?;
    Ok(ApiResponse::created(WithId::new(account.id, account)))
}

/// PUT /users/:id - Change any of `{Username, Password, Role}`; the last Manager keeps the role
pub async fn update(
    State(state): State<AppState>,
    manager: Authorized<WriteStructure>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<AccountInput>,
) -> ApiResult<Account> {
    Ok(ApiResponse::success(state.accounts.update(&manager.identity, id, input).await?))
}

/// DELETE /users/:id - Remove an account other than the caller's own
pub async fn delete(
    State(state): State<AppState>,
    manager: Authorized<WriteStructure>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Value> {
    state.accounts.delete(&manager.identity, id).await?;
    Ok(ApiResponse::success(json!({ "id": id })))
}
