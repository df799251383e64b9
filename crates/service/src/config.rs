//! Runtime settings, read from environment variables.
//!
//! | Variable                      | Default                     |
//! |-------------------------------|-----------------------------|
//! | `SECRET_KEY`                  | insecure dev key (warns)    |
//! | `ACCESS_TOKEN_EXPIRE_MINUTES` | `60`                        |
//! | `ADMIN_EMAIL`/`ADMIN_PASSWORD`| unset: no bootstrap admin   |
//! | `ROLE_FRESHNESS`              | `live` (`live` or `token`)  |
//! | `LOG_FORMAT`                  | `json` (`json` or `pretty`) |
//! | `HASH_MEMORY_KIB`             | `19456`                     |

use chrono::Duration;
use thiserror::Error;

use issuetrack_auth::{ResolverConfig, RoleFreshness};
use issuetrack_observability::LogFormat;

const DEV_SECRET: &str = "dev-secret-change-me";
const DEFAULT_TOKEN_MINUTES: i64 = 60;
const DEFAULT_HASH_MEMORY_KIB: u32 = 19 * 1024;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("{present} is set but {missing} is not")]
    Incomplete {
        present: &'static str,
        missing: &'static str,
    },
}

/// Credentials for the admin created at startup when missing.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

impl core::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub secret_key: String,
    pub token_ttl: Duration,
    pub admin: Option<AdminSeed>,
    pub role_freshness: RoleFreshness,
    pub log_format: LogFormat,
    pub hash_memory_kib: u32,
}

impl Settings {
    /// Defaults for everything except the signing secret.
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            token_ttl: Duration::minutes(DEFAULT_TOKEN_MINUTES),
            admin: None,
            role_freshness: RoleFreshness::default(),
            log_format: LogFormat::default(),
            hash_memory_kib: DEFAULT_HASH_MEMORY_KIB,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let secret_key = get("SECRET_KEY").unwrap_or_else(|| {
            tracing::warn!("SECRET_KEY not set; using insecure dev default");
            DEV_SECRET.to_string()
        });
        let mut settings = Self::new(secret_key);

        if let Some(raw) = get("ACCESS_TOKEN_EXPIRE_MINUTES") {
            let minutes = raw
                .parse::<i64>()
                .ok()
                .filter(|m| *m > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    key: "ACCESS_TOKEN_EXPIRE_MINUTES",
                    reason: format!("expected a positive number of minutes, got '{raw}'"),
                })?;
            settings.token_ttl = Duration::minutes(minutes);
        }

        settings.admin = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed { email, password }),
            (Some(_), None) => {
                return Err(ConfigError::Incomplete {
                    present: "ADMIN_EMAIL",
                    missing: "ADMIN_PASSWORD",
                });
            }
            (None, Some(_)) => {
                return Err(ConfigError::Incomplete {
                    present: "ADMIN_PASSWORD",
                    missing: "ADMIN_EMAIL",
                });
            }
            (None, None) => None,
        };

        if let Some(raw) = get("ROLE_FRESHNESS") {
            settings.role_freshness = raw.parse::<RoleFreshness>().map_err(|reason| ConfigError::Invalid {
                key: "ROLE_FRESHNESS",
                reason,
            })?;
        }

        if let Some(raw) = get("LOG_FORMAT") {
            settings.log_format = raw.parse::<LogFormat>().map_err(|e| ConfigError::Invalid {
                key: "LOG_FORMAT",
                reason: e.to_string(),
            })?;
        }

        if let Some(raw) = get("HASH_MEMORY_KIB") {
            settings.hash_memory_kib = raw.parse::<u32>().map_err(|_| ConfigError::Invalid {
                key: "HASH_MEMORY_KIB",
                reason: format!("expected a whole number of KiB, got '{raw}'"),
            })?;
        }

        Ok(settings)
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            token_ttl: self.token_ttl,
            role_freshness: self.role_freshness,
        }
    }
}

impl core::fmt::Debug for Settings {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Settings")
            .field("secret_key", &"<redacted>")
            .field("token_ttl_minutes", &self.token_ttl.num_minutes())
            .field("admin", &self.admin)
            .field("role_freshness", &self.role_freshness)
            .field("log_format", &self.log_format)
            .field("hash_memory_kib", &self.hash_memory_kib)
            .finish()
    }
}
