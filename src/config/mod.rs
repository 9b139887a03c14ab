use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use thiserror::Error;

/// Token lifetimes are capped at a year.
pub const MAX_ACCESS_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 365;
pub const MAX_REFRESH_TOKEN_TTL_HOURS: i64 = 24 * 365;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub security: SecurityConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// HS256 signing secret. Loaded once at startup, never mutated.
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub access_token_ttl_minutes: i64,
    /// `None` disables refresh tokens entirely.
    pub refresh_token_ttl_hours: Option<i64>,
    pub bcrypt_cost: u32,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("jwt_secret", &"<redacted>")
            .field("access_token_ttl_minutes", &self.access_token_ttl_minutes)
            .field("refresh_token_ttl_hours", &self.refresh_token_ttl_hours)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("enable_cors", &self.enable_cors)
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
}

/// Per-environment defaults. Anything here can be overridden from the
/// environment.
struct Preset {
    bcrypt_cost: u32,
    max_connections: u32,
    connection_timeout_secs: u64,
    request_logging: bool,
    cors_origins: &'static [&'static str],
}

impl Environment {
    fn from_name(name: &str) -> Self {
        match name {
            "production" | "prod" => Environment::Production,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Development,
        }
    }

    fn preset(self) -> Preset {
        match self {
            Environment::Development => Preset {
                bcrypt_cost: 10,
                max_connections: 10,
                connection_timeout_secs: 30,
                request_logging: true,
                cors_origins: &["http://localhost:3000", "http://localhost:5173"],
            },
            Environment::Staging => Preset {
                bcrypt_cost: 12,
                max_connections: 20,
                connection_timeout_secs: 10,
                request_logging: true,
                cors_origins: &["https://staging.example.com"],
            },
            Environment::Production => Preset {
                bcrypt_cost: 14,
                max_connections: 50,
                connection_timeout_secs: 5,
                request_logging: false,
                cors_origins: &["https://app.example.com"],
            },
        }
    }
}

impl AppConfig {
    /// Build the process configuration from the environment.
    ///
    /// `JWT_SECRET` and `DATABASE_URL` are required; everything else falls back
    /// to the preset selected by `APP_ENV`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = Environment::from_name(env::var("APP_ENV").as_deref().unwrap_or("development"));
        let jwt_secret = required("JWT_SECRET")?;
        let database_url = required("DATABASE_URL")?;

        let mut config = Self::preset(environment, jwt_secret, database_url);
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn preset(environment: Environment, jwt_secret: String, database_url: String) -> Self {
        let preset = environment.preset();

        Self {
            environment,
            security: SecurityConfig {
                jwt_secret,
                access_token_ttl_minutes: 15,
                refresh_token_ttl_hours: Some(24),
                bcrypt_cost: preset.bcrypt_cost,
                enable_cors: true,
                cors_origins: preset.cors_origins.iter().map(|o| o.to_string()).collect(),
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: preset.max_connections,
                connection_timeout_secs: preset.connection_timeout_secs,
            },
            api: ApiConfig {
                port: 8080,
                enable_request_logging: preset.request_logging,
            },
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(minutes) = parse_var::<i64>("SECURITY_ACCESS_TOKEN_TTL_MINUTES")? {
            if !(1..=MAX_ACCESS_TOKEN_TTL_MINUTES).contains(&minutes) {
                return Err(invalid("SECURITY_ACCESS_TOKEN_TTL_MINUTES", minutes));
            }
            self.security.access_token_ttl_minutes = minutes;
        }
        if let Some(hours) = parse_var::<i64>("SECURITY_REFRESH_TOKEN_TTL_HOURS")? {
            if !(0..=MAX_REFRESH_TOKEN_TTL_HOURS).contains(&hours) {
                return Err(invalid("SECURITY_REFRESH_TOKEN_TTL_HOURS", hours));
            }
            // 0 switches refresh tokens off
            self.security.refresh_token_ttl_hours = (hours > 0).then_some(hours);
        }
        if let Some(cost) = parse_var::<u32>("SECURITY_BCRYPT_COST")? {
            if !(crate::auth::password::MIN_COST..=crate::auth::password::MAX_COST).contains(&cost) {
                return Err(invalid("SECURITY_BCRYPT_COST", cost));
            }
            self.security.bcrypt_cost = cost;
        }
        if let Ok(origins) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = origins.split(',').map(|o| o.trim().to_string()).collect();
        }
        override_lenient("SECURITY_ENABLE_CORS", &mut self.security.enable_cors);

        override_lenient("DATABASE_MAX_CONNECTIONS", &mut self.database.max_connections);
        override_lenient("DATABASE_CONNECTION_TIMEOUT", &mut self.database.connection_timeout_secs);

        if env::var("NGE_API_PORT").is_ok() {
            override_lenient("NGE_API_PORT", &mut self.api.port);
        } else {
            override_lenient("PORT", &mut self.api.port);
        }
        override_lenient("API_ENABLE_REQUEST_LOGGING", &mut self.api.enable_request_logging);

        Ok(())
    }
}

/// Strict parse: a present but unparsable value is an error.
fn parse_var<T: std::str::FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(var) {
        Ok(v) => v
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value: v }),
        Err(_) => Ok(None),
    }
}

/// Lenient parse: an unparsable value keeps the preset.
fn override_lenient<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Some(value) = env::var(var).ok().and_then(|v| v.trim().parse().ok()) {
        *target = value;
    }
}

fn invalid(var: &'static str, value: impl ToString) -> ConfigError {
    ConfigError::Invalid { var, value: value.to_string() }
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(var)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::preset(Environment::Development, "secret".into(), "postgres://localhost/nge".into());
        assert_eq!(config.security.access_token_ttl_minutes, 15);
        assert_eq!(config.security.refresh_token_ttl_hours, Some(24));
        assert_eq!(config.security.jwt_secret, "secret");
        assert_eq!(config.database.url, "postgres://localhost/nge");
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::preset(Environment::Production, "secret".into(), "postgres://db/nge".into());
        assert_eq!(config.security.bcrypt_cost, 14);
        assert!(!config.api.enable_request_logging);
    }

    #[test]
    fn test_environment_names() {
        assert_eq!(Environment::from_name("prod"), Environment::Production);
        assert_eq!(Environment::from_name("staging"), Environment::Staging);
        assert_eq!(Environment::from_name("anything-else"), Environment::Development);
        assert_eq!(AppConfig::preset(Environment::Staging, "s".into(), "u".into()).database.max_connections, 20);
    }

    #[test]
    fn test_secret_is_redacted() {
        let config = AppConfig::preset(Environment::Development, "hunter2".into(), "postgres://localhost/nge".into());
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("hunter2"));
    }

    const VARS: &[&str] = &[
        "APP_ENV",
        "JWT_SECRET",
        "DATABASE_URL",
        "SECURITY_ACCESS_TOKEN_TTL_MINUTES",
        "SECURITY_REFRESH_TOKEN_TTL_HOURS",
        "SECURITY_BCRYPT_COST",
        "SECURITY_CORS_ORIGINS",
        "SECURITY_ENABLE_CORS",
        "DATABASE_MAX_CONNECTIONS",
        "DATABASE_CONNECTION_TIMEOUT",
        "NGE_API_PORT",
        "PORT",
        "API_ENABLE_REQUEST_LOGGING",
    ];

    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    /// Run `from_env` with exactly `vars` set, restoring the process env after.
    fn load_with(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let saved: Vec<(&str, Option<String>)> = VARS.iter().map(|v| (*v, env::var(v).ok())).collect();

        for var in VARS {
            env::remove_var(var);
        }
        for (var, value) in vars {
            env::set_var(var, value);
        }

        let result = AppConfig::from_env();

        for (var, value) in saved {
            match value {
                Some(v) => env::set_var(var, v),
                None => env::remove_var(var),
            }
        }
        result
    }

    const BASE: [(&str, &str); 2] = [("JWT_SECRET", "secret"), ("DATABASE_URL", "postgres://localhost/nge")];

    fn with_base(extra: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
        BASE.iter().chain(extra.iter()).copied().collect()
    }

    #[test]
    fn test_from_env_requires_secret_and_url() {
        assert!(matches!(
            load_with(&[("DATABASE_URL", "postgres://localhost/nge")]),
            Err(ConfigError::Missing("JWT_SECRET"))
        ));
        assert!(matches!(
            load_with(&[("JWT_SECRET", "secret")]),
            Err(ConfigError::Missing("DATABASE_URL"))
        ));
        assert!(matches!(
            load_with(&[("JWT_SECRET", "  "), ("DATABASE_URL", "postgres://localhost/nge")]),
            Err(ConfigError::Missing("JWT_SECRET"))
        ));
    }

    #[test]
    fn test_from_env_uses_preset() {
        let config = load_with(&with_base(&[("APP_ENV", "production")])).unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.security.bcrypt_cost, 14);
        assert_eq!(config.security.refresh_token_ttl_hours, Some(24));
        assert_eq!(config.api.port, 8080);
    }

    #[test]
    fn test_from_env_rejects_bad_security_values() {
        let cases: [(&str, &str); 5] = [
            ("SECURITY_BCRYPT_COST", "abc"),
            ("SECURITY_BCRYPT_COST", "3"),
            ("SECURITY_ACCESS_TOKEN_TTL_MINUTES", "0"),
            ("SECURITY_ACCESS_TOKEN_TTL_MINUTES", "9223372036854775807"),
            ("SECURITY_REFRESH_TOKEN_TTL_HOURS", "100000000"),
        ];
        for (var, value) in cases {
            match load_with(&with_base(&[(var, value)])) {
                Err(ConfigError::Invalid { var: got, .. }) => assert_eq!(got, var),
                other => panic!("{}={} gave {:?}", var, value, other.map(|c| c.environment)),
            }
        }
    }

    #[test]
    fn test_from_env_lenient_overrides_keep_preset() {
        let config = load_with(&with_base(&[
            ("DATABASE_MAX_CONNECTIONS", "lots"),
            ("PORT", "abc"),
            ("API_ENABLE_REQUEST_LOGGING", "maybe"),
        ]))
        .unwrap();
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.api.port, 8080);
        assert!(config.api.enable_request_logging);

        let config = load_with(&with_base(&[("PORT", "9000"), ("NGE_API_PORT", "9100")])).unwrap();
        assert_eq!(config.api.port, 9100);
    }

    #[test]
    fn test_from_env_zero_refresh_disables_refresh() {
        let config = load_with(&with_base(&[
            ("SECURITY_REFRESH_TOKEN_TTL_HOURS", "0"),
            ("SECURITY_ACCESS_TOKEN_TTL_MINUTES", "5"),
        ]))
        .unwrap();
        assert_eq!(config.security.refresh_token_ttl_hours, None);
        assert_eq!(config.security.access_token_ttl_minutes, 5);
    }
}
