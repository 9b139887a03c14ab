use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use std::future::Future;
use std::sync::Arc;

use crate::auth::{AuthError, TokenKind, TokenService};
use crate::database::models::Role;
use crate::database::{DirectoryError, UserDirectory};
use crate::error::ApiError;

/// Identity bound to a request once its bearer token checks out
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
    pub issued_at: i64,
    pub expires_at: i64,
}

/// Turns a raw `Authorization` header into an `AuthUser`, optionally
/// enforcing a role. Never touches storage beyond the role lookup.
pub struct AuthorizationGate {
    tokens: Arc<TokenService>,
    directory: Arc<dyn UserDirectory>,
}

impl AuthorizationGate {
    pub fn new(tokens: Arc<TokenService>, directory: Arc<dyn UserDirectory>) -> Self {
        Self { tokens, directory }
    }

    pub async fn authorize(&self, header: Option<&str>, required_role: Option<Role>) -> Result<AuthUser, AuthError> {
        let token = extract_bearer_token(header)?;

        let claims = self.tokens.validate(token, TokenKind::Access).map_err(|e| match e {
            AuthError::MalformedToken => AuthError::Unauthenticated("invalid token"),
            AuthError::ExpiredToken => AuthError::Unauthenticated("expired token"),
            other => other,
        })?;

        if let Some(required) = required_role {
            let role = match self.directory.get_role(claims.user_id).await {
                Ok(role) => role,
                Err(DirectoryError::NotFound) => return Err(AuthError::IdentityNotFound),
                Err(e) => return Err(e.into()),
            };
            if role != required {
                tracing::warn!(
                    "Identity {} with role {} denied, role {} required",
                    claims.user_id, role, required
                );
                return Err(AuthError::Forbidden);
            }
        }

        tracing::debug!("Authenticated identity {}", claims.user_id);
        Ok(AuthUser {
            user_id: claims.user_id,
            issued_at: claims.iat,
            expires_at: claims.exp,
        })
    }

    /// Run `handler` with the authenticated identity, or return the gate's
    /// error without calling it.
    pub async fn call<F, Fut, T>(
        &self,
        header: Option<&str>,
        required_role: Option<Role>,
        handler: F,
    ) -> Result<T, AuthError>
    where
        F: FnOnce(AuthUser) -> Fut,
        Fut: Future<Output = T>,
    {
        let user = self.authorize(header, required_role).await?;
        Ok(handler(user).await)
    }
}

/// Header must be exactly `Bearer <token>`: two space separated parts with
/// the literal `Bearer` prefix. An empty header counts as missing.
pub fn extract_bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = match header {
        Some(h) if !h.is_empty() => h,
        _ => return Err(AuthError::MissingCredential),
    };

    let parts: Vec<&str> = header.split(' ').collect();
    match parts.as_slice() {
        ["Bearer", token] if !token.is_empty() => Ok(token),
        _ => Err(AuthError::MalformedCredential),
    }
}

/// Route-group configuration for `authorization_middleware`
#[derive(Clone)]
pub struct Guard {
    gate: Arc<AuthorizationGate>,
    required_role: Option<Role>,
}

impl Guard {
    pub fn authenticated(gate: Arc<AuthorizationGate>) -> Self {
        Self { gate, required_role: None }
    }

    pub fn with_role(gate: Arc<AuthorizationGate>, role: Role) -> Self {
        Self { gate, required_role: Some(role) }
    }
}

/// Validates the bearer token and injects `AuthUser` into request extensions
pub async fn authorization_middleware(
    State(guard): State<Guard>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = match request.headers().get(AUTHORIZATION) {
        None => None,
        Some(value) => Some(value.to_str().map_err(|_| ApiError::from(AuthError::MalformedCredential))?),
    };

    let auth_user = guard.gate.authorize(header, guard.required_role).await.map_err(|e| {
        tracing::debug!("Request to {} rejected: {}", request.uri().path(), e);
        ApiError::from(e)
    })?;

    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{PasswordHasher, TokenTtl};
    use crate::database::models::NewIdentity;
    use crate::database::MemoryUserDirectory;
    use chrono::{Duration, Utc};
    use std::sync::atomic::{AtomicBool, Ordering};

    async fn gate_with_member() -> (AuthorizationGate, Arc<TokenService>, i64) {
        let tokens = Arc::new(TokenService::new(
            b"gate-test-secret",
            TokenTtl { access: Duration::minutes(15), refresh: None },
        ));
        let directory = Arc::new(MemoryUserDirectory::new());
        let member = directory
            .create_identity(NewIdentity {
                username: "member".into(),
                email: "member@example.com".into(),
                password_hash: PasswordHasher::new(crate::auth::password::MIN_COST).hash("pa55word!").unwrap(),
                role: Role::MEMBER,
            })
            .await
            .unwrap();
        (AuthorizationGate::new(tokens.clone(), directory), tokens, member.id)
    }

    #[test]
    fn bearer_header_shapes() {
        assert!(matches!(extract_bearer_token(None), Err(AuthError::MissingCredential)));
        assert!(matches!(extract_bearer_token(Some("")), Err(AuthError::MissingCredential)));
        assert!(matches!(extract_bearer_token(Some("Basic xyz")), Err(AuthError::MalformedCredential)));
        assert!(matches!(extract_bearer_token(Some("Bearer")), Err(AuthError::MalformedCredential)));
        assert!(matches!(extract_bearer_token(Some("Bearer ")), Err(AuthError::MalformedCredential)));
        assert!(matches!(extract_bearer_token(Some("bearer abc")), Err(AuthError::MalformedCredential)));
        assert!(matches!(extract_bearer_token(Some("Bearer a b")), Err(AuthError::MalformedCredential)));
        assert_eq!(extract_bearer_token(Some("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
    }

    #[tokio::test]
    async fn binds_identity() {
        let (gate, tokens, id) = gate_with_member().await;
        let header = format!("Bearer {}", tokens.issue(id, TokenKind::Access).unwrap());
        let user = gate.authorize(Some(&header), None).await.unwrap();
        assert_eq!(user.user_id, id);
        assert!(user.expires_at > user.issued_at);
    }

    #[tokio::test]
    async fn expired_token_is_unauthenticated() {
        let (gate, tokens, id) = gate_with_member().await;
        let issued = Utc::now() - Duration::minutes(16);
        let header = format!("Bearer {}", tokens.issue_at(id, TokenKind::Access, issued).unwrap());
        assert!(matches!(gate.authorize(Some(&header), None).await, Err(AuthError::Unauthenticated(_))));
    }

    #[tokio::test]
    async fn role_mismatch_is_forbidden() {
        let (gate, tokens, id) = gate_with_member().await;
        let header = format!("Bearer {}", tokens.issue(id, TokenKind::Access).unwrap());
        assert!(matches!(gate.authorize(Some(&header), Some(Role::ADMIN)).await, Err(AuthError::Forbidden)));
        assert!(gate.authorize(Some(&header), Some(Role::MEMBER)).await.is_ok());
    }

    #[tokio::test]
    async fn role_check_for_unknown_identity() {
        let (gate, tokens, _) = gate_with_member().await;
        let header = format!("Bearer {}", tokens.issue(404, TokenKind::Access).unwrap());
        assert!(matches!(
            gate.authorize(Some(&header), Some(Role::ADMIN)).await,
            Err(AuthError::IdentityNotFound)
        ));
    }

    #[tokio::test]
    async fn call_skips_handler_on_failure() {
        let (gate, tokens, id) = gate_with_member().await;

        let ran = AtomicBool::new(false);
        let flag = &ran;
        let result = gate
            .call(Some("Basic xyz"), None, move |_| async move { flag.store(true, Ordering::SeqCst) })
            .await;
        assert!(matches!(result, Err(AuthError::MalformedCredential)));
        assert!(!ran.load(Ordering::SeqCst));

        let header = format!("Bearer {}", tokens.issue(id, TokenKind::Access).unwrap());
        let seen = gate.call(Some(&header), None, |user| async move { user.user_id }).await.unwrap();
        assert_eq!(seen, id);
    }
}
