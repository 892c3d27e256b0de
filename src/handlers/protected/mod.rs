// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every route in this tier sits behind jwt_auth_middleware. Reads need only a
// verified identity; mutating handlers additionally take an Authorized<C>
// extractor that consults the access policy.

pub mod auth;
pub mod categories;
pub mod items;
pub mod search;
pub mod subcategories;
pub mod users;
pub mod variants;
