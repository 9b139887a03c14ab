pub mod auth;
pub mod response;

pub use auth::{authorization_middleware, extract_bearer_token, AuthUser, AuthorizationGate, Guard};
pub use response::{ApiResponse, ApiResult};
