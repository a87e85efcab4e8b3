pub mod auth;
pub mod json;
pub mod response;

pub use auth::{require_admin, require_auth, AuthUser};
pub use json::Json;
pub use response::{ApiResponse, ApiResult, Pagination};
