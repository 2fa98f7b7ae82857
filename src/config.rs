//! Configuration module for environment variables and application settings
//!
//! Loaded once at startup and handed to the components that need it; nothing
//! reads the environment after that.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};

pub const DEFAULT_API_VERSION: &str = "1.0.0";

#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Token signing configuration
    pub auth: AuthConfig,

    /// Version string stamped on every response envelope
    pub api_version: String,

    /// Origins allowed by CORS
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: usize,
    pub ssl: bool,
    pub run_migrations: bool,
}

#[derive(Clone)]
pub struct AuthConfig {
    /// HS256 signing secret
    pub jwt_secret: String,
    /// How often expired revocation entries are purged; `None` disables it
    pub revocation_sweep_interval: Option<Duration>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("revocation_sweep_interval", &self.revocation_sweep_interval)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow!("{key} environment variable is required"))
        };

        let sweep_secs: u64 = parse_or(&lookup, "REVOCATION_SWEEP_SECS", 3600)?;

        Ok(Self {
            server: ServerConfig {
                host: lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&lookup, "PORT", 3000)?,
            },

            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 16)?,
                ssl: parse_bool_or(&lookup, "DATABASE_SSL", false)?,
                run_migrations: parse_bool_or(&lookup, "RUN_MIGRATIONS", true)?,
            },

            auth: AuthConfig {
                jwt_secret: required("JWT_SECRET")?,
                revocation_sweep_interval: (sweep_secs > 0)
                    .then(|| Duration::from_secs(sweep_secs)),
            },

            api_version: lookup("API_VERSION")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),

            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|| "http://localhost:4200".to_string())
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect(),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        None => Ok(default),
    }
}

fn parse_bool_or<F>(lookup: &F, key: &str, default: bool) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => bail!("{key} must be a boolean, got {v:?}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[
            ("DATABASE_URL", "postgres://app:pw@localhost/app"),
            ("JWT_SECRET", "s3cret"),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.database.max_connections, 16);
        assert!(!config.database.ssl);
        assert!(config.database.run_migrations);
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
        assert_eq!(config.cors_allowed_origins, vec!["http://localhost:4200"]);
        assert_eq!(
            config.auth.revocation_sweep_interval,
            Some(Duration::from_secs(3600))
        );
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("DATABASE_URL", "postgres://app:pw@db/app"),
            ("JWT_SECRET", "s3cret"),
            ("PORT", "8080"),
            ("SERVER_HOST", "127.0.0.1"),
            ("DATABASE_SSL", "true"),
            ("API_VERSION", "2.1.0"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example,"),
            ("REVOCATION_SWEEP_SECS", "0"),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert!(config.database.ssl);
        assert_eq!(config.api_version, "2.1.0");
        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(config.auth.revocation_sweep_interval, None);
    }

    #[test]
    fn secret_is_required() {
        let err = load(&[("DATABASE_URL", "postgres://app:pw@db/app")]).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));

        let err = load(&[
            ("DATABASE_URL", "postgres://app:pw@db/app"),
            ("JWT_SECRET", "   "),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn bad_numbers_are_errors() {
        let err = load(&[
            ("DATABASE_URL", "postgres://app:pw@db/app"),
            ("JWT_SECRET", "s3cret"),
            ("PORT", "eighty"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn secret_is_redacted_in_debug() {
        let config = load(&[
            ("DATABASE_URL", "postgres://app:pw@db/app"),
            ("JWT_SECRET", "s3cret"),
        ])
        .unwrap();
        assert!(!format!("{config:?}").contains("s3cret"));
    }
}
