pub mod auth;
pub mod permission;
pub mod rate_limit;
pub mod response;

pub use auth::{auth_middleware, CredentialKey};
pub use permission::{require_permission, RequiredPermission};
pub use rate_limit::rate_limit_middleware;
pub use response::{ApiResponse, ApiResult};
