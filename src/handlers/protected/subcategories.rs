// handlers/protected/subcategories.rs - /subcategories

use axum::extract::State;

use crate::app::AppState;
use crate::database::models::Subcategory;
use crate::database::CascadeReport;
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, Authorized, WithId, WriteStructure};
use crate::services::hierarchy::{CategoryInput, SubcategoryInput};

/// GET /subcategories/:idCategory - Subcategories of one category
pub async fn list_by_category(
    State(state): State<AppState>,
    ApiPath(category_id): ApiPath<i64>,
) -> ApiResult<Vec<Subcategory>> {
    Ok(ApiResponse::success(state.hierarchy.list_subcategories(category_id).await?))
}

/// POST /subcategories - Create `{Name, idCategory}`
pub async fn create(
    State(state): State<AppState>,
    _manager: Authorized<WriteStructure>,
    ApiJson(input): ApiJson<SubcategoryInput>,
) -> ApiResult<WithId<Subcategory>> {
    let subcategory = state.hierarchy.create_subcategory(input).await?;
    Ok(ApiResponse::created(WithId::new(subcategory.id, subcategory)))
}

pub async fn rename(
    State(state): State<AppState>,
    _manager: Authorized<WriteStructure>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> ApiResult<Subcategory> {
    Ok(ApiResponse::success(state.hierarchy.rename_subcategory(id, input).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    _manager: Authorized<WriteStructure>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<WithId<CascadeReport>> {
    let report = state.hierarchy.delete_subcategory(id).await?;
    Ok(ApiResponse::success(WithId::new(id, report)))
}
