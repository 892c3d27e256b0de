// handlers/protected/variants.rs - /variants

use axum::extract::State;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::Variant;
use crate::middleware::{
    AdjustStock, ApiJson, ApiPath, ApiResponse, ApiResult, Authorized, WithId, WriteStructure,
};
use crate::services::hierarchy::{UpdateInput, VariantInput};
use crate::services::quantity::{Adjusted, QuantityStep, StockTarget};

/// POST /variants - Create `{name, quantity, idItem}` under a variant-mode item
pub async fn create(
    State(state): State<AppState>,
    _manager: Authorized<WriteStructure>,
    ApiJson(input): ApiJson<VariantInput>,
) -> ApiResult<WithId<Variant>> {
    let variant = state.hierarchy.create_variant(input).await?;
    Ok(ApiResponse::created(WithId::new(variant.id, variant)))
}

pub async fn update(
    State(state): State<AppState>,
    _manager: Authorized<WriteStructure>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<UpdateInput>,
) -> ApiResult<Variant> {
    Ok(ApiResponse::success(state.hierarchy.update_variant(id, input).await?))
}

/// PUT /variants/:id/quantity - Step the quantity by `{increment}`
pub async fn adjust_quantity(
    State(state): State<AppState>,
    _caller: Authorized<AdjustStock>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(step): ApiJson<QuantityStep>,
) -> ApiResult<Adjusted> {
    Ok(ApiResponse::success(state.quantity.adjust(StockTarget::Variant, id, step).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    _manager: Authorized<WriteStructure>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Value> {
    state.hierarchy.delete_variant(id).await?;
    Ok(ApiResponse::success(json!({ "id": id })))
}
