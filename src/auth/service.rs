use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::error::AuthError;
use super::password::PasswordHasher;
use super::token::{TokenKind, TokenService};
use super::validation;
use crate::database::models::{Identity, NewIdentity, Role};
use crate::database::{DirectoryError, UserDirectory};

#[derive(Debug, Clone, Deserialize)]
pub struct SignUpRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role_id: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignInRequest {
    /// Username or email.
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub token_type: &'static str,
    /// Seconds
    pub expires_in: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_expires_in: Option<i64>,
}

/// Sign-up, sign-in and refresh on top of the directory, hasher and tokens.
pub struct AuthService {
    directory: Arc<dyn UserDirectory>,
    tokens: Arc<TokenService>,
    hasher: PasswordHasher,
    /// Verified against when the login is unknown, so both rejection paths
    /// pay for one bcrypt verify at the configured cost.
    decoy_digest: String,
}

impl AuthService {
    pub fn new(directory: Arc<dyn UserDirectory>, tokens: Arc<TokenService>, hasher: PasswordHasher) -> Self {
        let decoy_digest = hasher.hash("nge-api-decoy-credential").unwrap_or_else(|e| {
            error!("Failed to prepare decoy digest: {}", e);
            String::new()
        });
        debug!("Auth service ready with bcrypt cost {}", hasher.cost());

        Self { directory, tokens, hasher, decoy_digest }
    }

    pub async fn sign_up(&self, request: SignUpRequest) -> Result<Identity, AuthError> {
        let mut field_errors = BTreeMap::new();
        if let Err(msg) = validation::validate_username(&request.username) {
            field_errors.insert("username", msg);
        }
        if let Err(msg) = validation::validate_email(&request.email) {
            field_errors.insert("email", msg);
        }
        if let Err(msg) = validation::validate_password(&request.password) {
            field_errors.insert("password", msg);
        }
        match request.role_id.map(Role) {
            Some(Role(code)) if code <= 0 => {
                field_errors.insert("role_id", "must be a positive role code".to_string());
            }
            // admins are provisioned out of band
            Some(Role::ADMIN) => {
                field_errors.insert("role_id", "cannot be assigned at sign-up".to_string());
            }
            _ => {}
        }
        if !field_errors.is_empty() {
            return Err(AuthError::Validation(field_errors));
        }

        let password_hash = self.hasher.hash(&request.password)?;
        let identity = self
            .directory
            .create_identity(NewIdentity {
                username: request.username,
                email: request.email.to_lowercase(),
                password_hash,
                role: request.role_id.map(Role).unwrap_or_default(),
            })
            .await?;

        info!("Created identity {} ({}) with role {}", identity.id, identity.username, identity.role);
        Ok(identity)
    }

    pub async fn sign_in(&self, request: SignInRequest) -> Result<TokenPair, AuthError> {
        let login = request.login.trim();
        if login.is_empty() || request.password.is_empty() {
            return Err(AuthError::Unauthenticated("invalid credentials"));
        }
        // Emails are stored lowercased
        let login = if login.contains('@') { login.to_lowercase() } else { login.to_string() };

        // Unknown login and wrong password are indistinguishable to the caller
        let stored = match self.directory.find_by_lookup_key(&login).await {
            Ok(stored) => stored,
            Err(DirectoryError::NotFound) => {
                let _ = self.hasher.verify(&self.decoy_digest, &request.password);
                warn!("Sign-in rejected: unknown login");
                return Err(AuthError::Unauthenticated("invalid credentials"));
            }
            Err(e) => return Err(e.into()),
        };

        if !self.hasher.verify(&stored.password_hash, &request.password)? {
            warn!("Sign-in rejected: bad password for identity {}", stored.id);
            return Err(AuthError::Unauthenticated("invalid credentials"));
        }

        let pair = self.token_pair(stored.id)?;
        info!("Identity {} signed in", stored.id);
        Ok(pair)
    }

    /// Exchange a refresh token for a fresh access token.
    pub async fn refresh(&self, request: RefreshRequest) -> Result<TokenPair, AuthError> {
        if !self.tokens.refresh_enabled() {
            return Err(AuthError::Unauthenticated("refresh tokens are disabled"));
        }

        let claims = self
            .tokens
            .validate(&request.refresh_token, TokenKind::Refresh)
            .map_err(|e| match e {
                AuthError::MalformedToken | AuthError::ExpiredToken => {
                    AuthError::Unauthenticated("invalid or expired refresh token")
                }
                other => other,
            })?;

        // The identity may have been removed since the refresh token was issued
        match self.directory.find_by_id(claims.user_id).await {
            Ok(_) => {}
            Err(DirectoryError::NotFound) => return Err(AuthError::IdentityNotFound),
            Err(e) => return Err(e.into()),
        }

        let access_token = self.tokens.issue(claims.user_id, TokenKind::Access)?;
        Ok(TokenPair {
            access_token,
            token_type: "Bearer",
            expires_in: self.tokens.ttl().access.num_seconds(),
            refresh_token: None,
            refresh_expires_in: None,
        })
    }

    pub async fn whoami(&self, user_id: i64) -> Result<Identity, AuthError> {
        Ok(self.directory.find_by_id(user_id).await?)
    }

    fn token_pair(&self, user_id: i64) -> Result<TokenPair, AuthError> {
        let ttl = self.tokens.ttl();
        let access_token = self.tokens.issue(user_id, TokenKind::Access)?;
        let refresh_token = match ttl.refresh {
            Some(_) => Some(self.tokens.issue(user_id, TokenKind::Refresh)?),
            None => None,
        };

        Ok(TokenPair {
            access_token,
            token_type: "Bearer",
            expires_in: ttl.access.num_seconds(),
            refresh_token,
            refresh_expires_in: ttl.refresh.map(|d| d.num_seconds()),
        })
    }
}
