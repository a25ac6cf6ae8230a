//! Service configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `CARTWISE_DATABASE_PATH` | `<data dir>/cartwise.db` | SQLite file |
//! | `CARTWISE_MAX_CONNECTIONS` | `5` | Pool size |
//! | `CARTWISE_DEFAULT_MEMBER_TIER` | `GOLD` | Tier of identified users; empty = none |
//! | `CARTWISE_MEMBER_TIERS` | (none) | Per-user tiers, `42=PLATINUM,7=SILVER` |
//! | `CARTWISE_LOG` | `info` | Fallback filter when `RUST_LOG` is unset |

use directories::ProjectDirs;
use std::env;
use std::path::PathBuf;

use cartwise_core::{MembershipPolicy, MembershipTier};
use cartwise_db::DbConfig;

pub const ENV_DATABASE_PATH: &str = "CARTWISE_DATABASE_PATH";
pub const ENV_MAX_CONNECTIONS: &str = "CARTWISE_MAX_CONNECTIONS";
pub const ENV_DEFAULT_MEMBER_TIER: &str = "CARTWISE_DEFAULT_MEMBER_TIER";
pub const ENV_MEMBER_TIERS: &str = "CARTWISE_MEMBER_TIERS";
pub const ENV_LOG: &str = "CARTWISE_LOG";

/// Service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub max_connections: u32,

    /// Tier resolution for identified callers
    pub membership: MembershipPolicy,

    /// Default tracing directive
    pub log_filter: String,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = lookup(ENV_DATABASE_PATH)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path);

        let max_connections: u32 = lookup(ENV_MAX_CONNECTIONS)
            .unwrap_or_else(|| "5".to_string())
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(ENV_MAX_CONNECTIONS.to_string()))?;
        if max_connections == 0 {
            return Err(ConfigError::InvalidValue(ENV_MAX_CONNECTIONS.to_string()));
        }

        let default_tier = match lookup(ENV_DEFAULT_MEMBER_TIER) {
            None => Some(MembershipTier::Gold),
            Some(label) if label.trim().is_empty() => None,
            Some(label) => Some(
                label
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue(ENV_DEFAULT_MEMBER_TIER.to_string()))?,
            ),
        };

        let mut membership = MembershipPolicy {
            default_tier,
            ..MembershipPolicy::overrides_only()
        };
        if let Some(pairs) = lookup(ENV_MEMBER_TIERS) {
            for (user_id, tier) in parse_member_tiers(&pairs)? {
                membership = membership.with_override(user_id, tier);
            }
        }

        let log_filter = lookup(ENV_LOG)
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| "info".to_string());

        Ok(ServiceConfig {
            database_path,
            max_connections,
            membership,
            log_filter,
        })
    }

    /// Pool settings for [`cartwise_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path).max_connections(self.max_connections)
    }
}

/// Parses `42=PLATINUM, 7=silver` into `(user_id, tier)` pairs.
fn parse_member_tiers(pairs: &str) -> Result<Vec<(i64, MembershipTier)>, ConfigError> {
    let invalid = || ConfigError::InvalidValue(ENV_MEMBER_TIERS.to_string());

    pairs.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (user_id, tier) = entry.split_once('=').ok_or_else(invalid)?;
            let user_id: i64 = user_id.trim().parse().map_err(|_| invalid())?;
            let tier: MembershipTier = tier.parse().map_err(|_| invalid())?;
            Ok((user_id, tier))
        })
        .collect()
}

/// Platform data directory, e.g. `~/.local/share/cartwise/cartwise.db`.
fn default_database_path() -> PathBuf {
    ProjectDirs::from("com", "cartwise", "cartwise")
        .map(|dirs| dirs.data_dir().join("cartwise.db"))
        .unwrap_or_else(|| PathBuf::from("./cartwise.db"))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
