// handlers/protected/categories.rs - /categories

use axum::extract::State;

use crate::app::AppState;
use crate::database::models::Category;
use crate::database::CascadeReport;
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, Authorized, WithId, WriteStructure};
use crate::services::hierarchy::CategoryInput;

/// GET /categories - List every category
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Category>> {
    Ok(ApiResponse::success(state.hierarchy.list_categories().await?))
}

/// POST /categories - Create a category `{Name}`
pub async fn create(
    State(state): State<AppState>,
    _manager: Authorized<WriteStructure>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> ApiResult<WithId<Category>> {
    let category = state.hierarchy.create_category(input).await?;
    Ok(ApiResponse::created(WithId::new(category.id, category)))
}

/// PUT /categories/:id - Rename a category
pub async fn rename(
    State(state): State<AppState>,
    _manager: Authorized<WriteStructure>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> ApiResult<Category> {
    Ok(ApiResponse::success(state.hierarchy.rename_category(id, input).await?))
}

/// DELETE /categories/:id - Delete a category with everything beneath it
pub async fn delete(
    State(state): State<AppState>,
    _manager: Authorized<WriteStructure>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<WithId<CascadeReport>> {
    let report = state.hierarchy.delete_category(id).await?;
    Ok(ApiResponse::success(WithId::new(id, report)))
}
