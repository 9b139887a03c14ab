use bcrypt::BcryptError;

use super::error::AuthError;

/// Work factor bounds accepted by bcrypt.
pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

/// One-way salted hashing of plaintext secrets with a fixed bcrypt cost.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub fn hash(&self, secret: &str) -> Result<String, AuthError> {
        bcrypt::hash(secret, self.cost).map_err(|e| AuthError::HashingError(e.to_string()))
    }

    /// `Ok(false)` on mismatch; errors only when `digest` is not a bcrypt hash.
    pub fn verify(&self, digest: &str, secret: &str) -> Result<bool, AuthError> {
        match bcrypt::verify(secret, digest) {
            Ok(matches) => Ok(matches),
            Err(BcryptError::InvalidHash(_))
            | Err(BcryptError::InvalidPrefix(_))
            | Err(BcryptError::InvalidCost(_))
            | Err(BcryptError::InvalidBase64(_)) => Err(AuthError::MalformedDigest),
            Err(e) => Err(AuthError::HashingError(e.to_string())),
        }
    }
}
