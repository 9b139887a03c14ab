// handlers/protected/mod.rs - Protected handlers (bearer token required)
//
// Route prefix: /api/*. Every handler here can rely on an `AuthUser` in the
// request extensions; `authorization_middleware` rejects the request first
// otherwise.
pub mod auth;
pub mod posts;
pub mod users;

pub use posts::posts_get;
pub use users::users_get;
