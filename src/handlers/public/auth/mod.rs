// handlers/public/auth/mod.rs - Account creation and token acquisition
pub mod refresh; // POST /auth/refresh
pub mod signin; // POST /auth/signin
pub mod signup; // POST /auth/signup
mod utils;

pub use refresh::refresh_post;
pub use signin::signin_post;
pub use signup::signup_post;
