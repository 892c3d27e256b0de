use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{AccessPolicy, TokenAuthority};
use crate::config::{AppConfig, SecurityConfig};
use crate::database::InventoryStore;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::services::{AccountService, HierarchyService, QuantityAdjuster, SearchService, Storage};

/// Everything a handler can reach. Cloned per request; all members are
/// cheap handles onto the one shared store.
#[derive(Clone)]
pub struct AppState {
    pub storage: Storage,
    pub hierarchy: HierarchyService,
    pub quantity: QuantityAdjuster,
    pub search: SearchService,
    pub accounts: AccountService,
    pub tokens: TokenAuthority,
    pub policy: AccessPolicy,
}

impl AppState {
    pub fn new(store: Arc<dyn InventoryStore>, config: &AppConfig) -> Self {
        let storage = Storage::new(store, config.statement_timeout());
        let tokens = TokenAuthority::from_config(&config.security);

        Self {
            hierarchy: HierarchyService::new(storage.clone()),
            quantity: QuantityAdjuster::new(storage.clone()),
            search: SearchService::new(storage.clone()),
            accounts: AccountService::new(storage.clone(), tokens.clone()),
            policy: AccessPolicy::from_config(&config.policy),
            tokens,
            storage,
        }
    }
}

pub fn router(state: AppState, config: &AppConfig) -> Router {
    let protected_routes = Router::new()
        .merge(auth_routes())
        .merge(hierarchy_routes())
        .merge(user_routes())
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    let app = Router::new()
        // Public
        .route("/health", get(public::health))
        .route("/auth/login", post(public::login))
        // Protected
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(cors_layer(&config.security))
                .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes)),
        );

    let app = if config.api.enable_request_logging {
        app.layer(TraceLayer::new_for_http())
    } else {
        app
    };

    app.with_state(state)
}

fn auth_routes() -> Router<AppState> {
    use protected::auth;

    Router::new()
        .route("/auth/whoami", get(auth::whoami))
        .route("/auth/register", post(auth::register))
}

fn hierarchy_routes() -> Router<AppState> {
    use protected::{categories, items, search, subcategories, variants};

    Router::new()
        .route("/categories", get(categories::list).post(categories::create))
        .route("/categories/:id", put(categories::rename).delete(categories::delete))
        .route("/subcategories", post(subcategories::create))
        .route(
            "/subcategories/:id",
            get(subcategories::list_by_category)
                .put(subcategories::rename)
                .delete(subcategories::delete),
        )
        .route("/items", get(items::list_all).post(items::create))
        .route(
            "/items/:id",
            get(items::list_by_subcategory).put(items::update).delete(items::delete),
        )
        .route("/items/:id/quantity", put(items::adjust_quantity))
        .route("/items/variants/:id", get(items::list_variants))
        .route("/variants", post(variants::create))
        .route("/variants/:id", put(variants::update).delete(variants::delete))
        .route("/variants/:id/quantity", put(variants::adjust_quantity))
        .route("/search/:level", get(search::search))
}

fn user_routes() -> Router<AppState> {
    use protected::users;

    Router::new()
        .route("/users", get(users::list).post(users::create))
        .route("/users/:id", put(users::update).delete(users::delete))
}

/// A layer with no allowed origins adds no CORS headers.
fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
