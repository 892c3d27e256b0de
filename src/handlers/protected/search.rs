// handlers/protected/search.rs - GET /search/:level?q=

use axum::extract::{Query, State};
use serde::Deserialize;

use crate::app::AppState;
use crate::middleware::{ApiPath, ApiResponse, ApiResult};
use crate::services::search::{Entity, Level};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Substring to match against names. Omitted or blank lists the whole level.
    pub q: Option<String>,
}

/// GET /search/:level - Name search over categories, subcategories, items or variants
pub async fn search(
    State(state): State<AppState>,
    ApiPath(level): ApiPath<String>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Vec<Entity>> {
    let level: Level = level.parse()?;
    let hits = state.search.search(level, query.q.as_deref().unwrap_or("")).await?;
    Ok(ApiResponse::success(hits))
}
