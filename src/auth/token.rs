use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::AuthError;
use crate::config::{SecurityConfig, MAX_ACCESS_TOKEN_TTL_MINUTES, MAX_REFRESH_TOKEN_TTL_HOURS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Signed claim set. Timestamps are unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub kind: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

/// Lifetime per token class. A `None` refresh TTL means refresh tokens are
/// never issued or accepted.
#[derive(Debug, Clone, Copy)]
pub struct TokenTtl {
    pub access: Duration,
    pub refresh: Option<Duration>,
}

impl TokenTtl {
    /// Values outside the range `AppConfig::from_env` accepts are clamped
    /// into it.
    pub fn from_config(security: &SecurityConfig) -> Self {
        let minutes = security.access_token_ttl_minutes.clamp(1, MAX_ACCESS_TOKEN_TTL_MINUTES);
        Self {
            access: Duration::minutes(minutes),
            refresh: security
                .refresh_token_ttl_hours
                .filter(|hours| *hours > 0)
                .map(|hours| Duration::hours(hours.min(MAX_REFRESH_TOKEN_TTL_HOURS))),
        }
    }

    fn of(&self, kind: TokenKind) -> Option<Duration> {
        match kind {
            TokenKind::Access => Some(self.access),
            TokenKind::Refresh => self.refresh,
        }
    }
}

/// Issues and validates HS256 tokens. Immutable after construction.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: TokenTtl,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: TokenTtl) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked in validate_at against an explicit clock
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn from_config(security: &SecurityConfig) -> Self {
        Self::new(security.jwt_secret.as_bytes(), TokenTtl::from_config(security))
    }

    pub fn ttl(&self) -> TokenTtl {
        self.ttl
    }

    pub fn refresh_enabled(&self) -> bool {
        self.ttl.refresh.is_some()
    }

    pub fn issue(&self, user_id: i64, kind: TokenKind) -> Result<String, AuthError> {
        self.issue_at(user_id, kind, Utc::now())
    }

    pub fn issue_at(&self, user_id: i64, kind: TokenKind, now: DateTime<Utc>) -> Result<String, AuthError> {
        let ttl = self
            .ttl
            .of(kind)
            .ok_or(AuthError::Unauthenticated("refresh tokens are disabled"))?;

        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::SigningError(format!("expiry overflows for ttl {}", ttl)))?;

        let claims = Claims {
            user_id,
            kind,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::SigningError(e.to_string()))
    }

    pub fn validate(&self, token: &str, kind: TokenKind) -> Result<Claims, AuthError> {
        self.validate_at(token, kind, Utc::now())
    }

    /// Pure function of (token, now, secret). A token of the wrong class is
    /// treated the same as one with a bad signature.
    pub fn validate_at(&self, token: &str, kind: TokenKind, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            debug!("Token rejected: {}", e);
            AuthError::MalformedToken
        })?;
        let claims = data.claims;

        if claims.kind != kind {
            debug!("Token rejected: expected {:?} token, got {:?}", kind, claims.kind);
            return Err(AuthError::MalformedToken);
        }
        if now.timestamp() >= claims.exp {
            return Err(AuthError::ExpiredToken);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn service(secret: &str) -> TokenService {
        TokenService::new(
            secret.as_bytes(),
            TokenTtl { access: Duration::minutes(15), refresh: Some(Duration::hours(24)) },
        )
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn round_trips_identity() {
        let tokens = service("test-secret");
        let token = tokens.issue(42, TokenKind::Access).unwrap();
        let claims = tokens.validate(&token, TokenKind::Access).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn expiry_boundary() {
        let tokens = service("test-secret");
        let token = tokens.issue_at(7, TokenKind::Access, t0()).unwrap();
        let ttl = Duration::minutes(15);

        assert!(tokens.validate_at(&token, TokenKind::Access, t0() + ttl - Duration::seconds(1)).is_ok());
        assert!(matches!(
            tokens.validate_at(&token, TokenKind::Access, t0() + ttl),
            Err(AuthError::ExpiredToken)
        ));
        assert!(matches!(
            tokens.validate_at(&token, TokenKind::Access, t0() + ttl + Duration::seconds(1)),
            Err(AuthError::ExpiredToken)
        ));
    }

    #[test]
    fn refresh_tokens_live_longer() {
        let tokens = service("test-secret");
        let token = tokens.issue_at(7, TokenKind::Refresh, t0()).unwrap();
        let later = t0() + Duration::hours(23);
        assert_eq!(tokens.validate_at(&token, TokenKind::Refresh, later).unwrap().user_id, 7);
    }

    #[test]
    fn rejects_wrong_class() {
        let tokens = service("test-secret");
        let refresh = tokens.issue(7, TokenKind::Refresh).unwrap();
        assert!(matches!(tokens.validate(&refresh, TokenKind::Access), Err(AuthError::MalformedToken)));

        let access = tokens.issue(7, TokenKind::Access).unwrap();
        assert!(matches!(tokens.validate(&access, TokenKind::Refresh), Err(AuthError::MalformedToken)));
    }

    #[test]
    fn rejects_foreign_and_garbage_tokens() {
        let ours = service("secret-one");
        let theirs = service("secret-two");
        let token = theirs.issue(1, TokenKind::Access).unwrap();

        assert!(matches!(ours.validate(&token, TokenKind::Access), Err(AuthError::MalformedToken)));
        assert!(matches!(ours.validate("invalid.token.here", TokenKind::Access), Err(AuthError::MalformedToken)));
        assert!(matches!(ours.validate("", TokenKind::Access), Err(AuthError::MalformedToken)));
    }

    #[test]
    fn rejects_tampered_payload() {
        let tokens = service("test-secret");
        let token = tokens.issue(1, TokenKind::Access).unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = tokens.issue(2, TokenKind::Access).unwrap();
        let forged_payload = forged.split('.').nth(1).unwrap().to_string();
        parts[1] = &forged_payload;
        let spliced = parts.join(".");

        assert!(matches!(tokens.validate(&spliced, TokenKind::Access), Err(AuthError::MalformedToken)));
    }

    #[test]
    fn refresh_disabled() {
        let tokens = TokenService::new(b"s", TokenTtl { access: Duration::minutes(15), refresh: None });
        assert!(!tokens.refresh_enabled());
        assert!(tokens.issue(1, TokenKind::Refresh).is_err());
    }

    #[test]
    fn expiry_overflow_is_an_error() {
        let tokens = TokenService::new(b"s", TokenTtl { access: Duration::days(200_000_000), refresh: None });
        assert!(matches!(tokens.issue(1, TokenKind::Access), Err(AuthError::SigningError(_))));
    }

    #[test]
    fn oversized_configured_ttls_are_clamped() {
        let mut config = crate::config::AppConfig::preset(
            crate::config::Environment::Development,
            "s".into(),
            "postgres://localhost/nge".into(),
        );
        config.security.access_token_ttl_minutes = 10_000_000_000_000;
        config.security.refresh_token_ttl_hours = Some(i64::MAX);

        let ttl = TokenTtl::from_config(&config.security);
        assert_eq!(ttl.access, Duration::minutes(MAX_ACCESS_TOKEN_TTL_MINUTES));
        assert_eq!(ttl.refresh, Some(Duration::hours(MAX_REFRESH_TOKEN_TTL_HOURS)));

        let tokens = TokenService::from_config(&config.security);
        let token = tokens.issue(1, TokenKind::Access).unwrap();
        assert_eq!(tokens.validate(&token, TokenKind::Access).unwrap().user_id, 1);
    }
}
