// handlers/protected/items.rs - /items

use axum::extract::State;

use crate::app::AppState;
use crate::database::models::{Item, Variant};
use crate::database::CascadeReport;
use crate::middleware::{
    AdjustStock, ApiJson, ApiPath, ApiResponse, ApiResult, Authorized, WithId, WriteStructure,
};
use crate::services::hierarchy::{ItemInput, ItemWithVariants, UpdateInput};
use crate::services::quantity::{Adjusted, QuantityStep, StockTarget};

/// GET /items - Every item, `hasVariants` derived from existing variants
pub async fn list_all(State(state): State<AppState>) -> ApiResult<Vec<Item>> {
    Ok(ApiResponse::success(state.search.list_items_flat().await?))
}

/// GET /items/:idSubcategory - Items of one subcategory
pub async fn list_by_subcategory(
    State(state): State<AppState>,
    ApiPath(subcategory_id): ApiPath<i64>,
) -> ApiResult<Vec<Item>> {
    Ok(ApiResponse::success(state.hierarchy.list_items(subcategory_id).await?))
}

/// GET /items/variants/:itemId - Variants of one item
pub async fn list_variants(
    State(state): State<AppState>,
    ApiPath(item_id): ApiPath<i64>,
) -> ApiResult<Vec<Variant>> {
    Ok(ApiResponse::success(state.hierarchy.list_variants(item_id).await?))
}

/// POST /items - Create `{Name, Quantity, idSubcategory, hasVariants?, variants?}`
///
/// The item and its initial variants are written together or not at all.
pub async fn create(
    State(state): State<AppState>,
    _manager: Authorized<WriteStructure>,
    ApiJson(input): ApiJson<ItemInput>,
) -> ApiResult<WithId<ItemWithVariants>> {
    let created = state.hierarchy.create_item(input).await?;
    Ok(ApiResponse::created(WithId::new(created.item.id, created)))
}

/// PUT /items/:id - Rename and optionally replace the quantity outright
pub async fn update(
    State(state): State<AppState>,
    _manager: Authorized<WriteStructure>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<UpdateInput>,
) -> ApiResult<Item> {
    Ok(ApiResponse::success(state.hierarchy.update_item(id, input).await?))
}

/// PUT /items/:id/quantity - Step the quantity by `{increment}`
pub async fn adjust_quantity(
    State(state): State<AppState>,
    _caller: Authorized<AdjustStock>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(step): ApiJson<QuantityStep>,
) -> ApiResult<Adjusted> {
    Ok(ApiResponse::success(state.quantity.adjust(StockTarget::Item, id, step).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    _manager: Authorized<WriteStructure>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<WithId<CascadeReport>> {
    let report = state.hierarchy.delete_item(id).await?;
    Ok(ApiResponse::success(WithId::new(id, report)))
}
