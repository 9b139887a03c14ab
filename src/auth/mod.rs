pub mod error;
pub mod password;
pub mod service;
pub mod token;
pub mod validation;

pub use error::AuthError;
pub use password::PasswordHasher;
pub use service::{AuthService, RefreshRequest, SignInRequest, SignUpRequest, TokenPair};
pub use token::{Claims, TokenKind, TokenService, TokenTtl};
