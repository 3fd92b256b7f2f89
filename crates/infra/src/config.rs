//! Process configuration loaded once at startup.
//!
//! Both signing secrets are mandatory; a missing secret is a fatal startup
//! error, never a per-request one.

use chrono::Duration;
use thiserror::Error;

use elearn_auth::SessionPolicy;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub activation_secret: String,
    pub session_secret: String,
    pub activation_ttl: Duration,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub store_timeout: std::time::Duration,
    pub cookie_secure: bool,
    pub bind_addr: String,
    pub redis_url: Option<String>,
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("activation_secret", &"<redacted>")
            .field("session_secret", &"<redacted>")
            .field("activation_ttl", &self.activation_ttl)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("store_timeout", &self.store_timeout)
            .field("cookie_secure", &self.cookie_secure)
            .field("bind_addr", &self.bind_addr)
            .field("redis_url", &self.redis_url.as_ref().map(|_| "<set>"))
            .finish()
    }
}

impl AppConfig {
    /// Defaults for everything except the secrets.
    pub fn with_secrets(activation_secret: impl Into<String>, session_secret: impl Into<String>) -> Self {
        Self {
            activation_secret: activation_secret.into(),
            session_secret: session_secret.into(),
            activation_ttl: Duration::minutes(5),
            access_ttl: Duration::minutes(5),
            refresh_ttl: Duration::days(7),
            store_timeout: std::time::Duration::from_millis(2000),
            cookie_secure: false,
            bind_addr: "0.0.0.0:8080".to_string(),
            redis_url: None,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (environment, file, test map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let mut config = Self::with_secrets(required("ACTIVATION_SECRET")?, required("SESSION_SECRET")?);

        if let Some(secs) = parse_opt::<i64>(&lookup, "ACTIVATION_TTL_SECS")? {
            config.activation_ttl = positive_secs("ACTIVATION_TTL_SECS", secs)?;
        }
        if let Some(secs) = parse_opt::<i64>(&lookup, "ACCESS_TTL_SECS")? {
            config.access_ttl = positive_secs("ACCESS_TTL_SECS", secs)?;
        }
        if let Some(secs) = parse_opt::<i64>(&lookup, "REFRESH_TTL_SECS")? {
            config.refresh_ttl = positive_secs("REFRESH_TTL_SECS", secs)?;
        }
        if let Some(ms) = parse_opt::<u64>(&lookup, "STORE_TIMEOUT_MS")? {
            config.store_timeout = std::time::Duration::from_millis(ms);
        }
        if let Some(secure) = parse_opt::<bool>(&lookup, "COOKIE_SECURE")? {
            config.cookie_secure = secure;
        }
        if let Some(addr) = lookup("BIND_ADDR") {
            config.bind_addr = addr;
        }
        config.redis_url = lookup("REDIS_URL").filter(|v| !v.trim().is_empty());

        if config.refresh_ttl <= config.access_ttl {
            return Err(ConfigError::Invalid {
                key: "REFRESH_TTL_SECS",
                value: config.refresh_ttl.num_seconds().to_string(),
            });
        }

        Ok(config)
    }

    pub fn session_policy(&self) -> SessionPolicy {
        SessionPolicy {
            access_ttl: self.access_ttl,
            refresh_ttl: self.refresh_ttl,
            store_timeout: self.store_timeout,
        }
    }
}

fn parse_opt<T: core::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

fn positive_secs(key: &'static str, secs: i64) -> Result<Duration, ConfigError> {
    if secs <= 0 {
        return Err(ConfigError::Invalid {
            key,
            value: secs.to_string(),
        });
    }
    Ok(Duration::seconds(secs))
}
