pub mod auth;
pub mod extract;
pub mod response;

pub use auth::jwt_auth_middleware;
pub use extract::{AdjustStock, ApiJson, ApiPath, Authorized, CurrentUser, RequiredCapability, WriteStructure};
pub use response::{ApiResponse, ApiResult, WithId};
