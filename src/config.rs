//! Runtime configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

/// Default lifetime of a registration code.
pub const DEFAULT_INVITE_TTL: Duration = Duration::from_secs(10 * 60);

/// Longest lifetime a registration code may be given.
pub const MAX_INVITE_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Service configuration.
#[derive(Clone, Debug)]
pub struct FleetConfig {
    /// How long a registration code stays redeemable (from `STARSHIP_INVITE_TTL_SECS`).
    pub invite_ttl: Duration,
    /// Database file (from `STARSHIP_DB_PATH`). `None` uses the platform data dir.
    pub database_path: Option<PathBuf>,
}

impl FleetConfig {
    pub fn from_env() -> Self {
        let invite_ttl = std::env::var("STARSHIP_INVITE_TTL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .map(|ttl| {
                if ttl > MAX_INVITE_TTL {
                    tracing::warn!(
                        "STARSHIP_INVITE_TTL_SECS={} exceeds the limit, using {}",
                        ttl.as_secs(),
                        MAX_INVITE_TTL.as_secs()
                    );
                }
                ttl.min(MAX_INVITE_TTL)
            })
            .unwrap_or(DEFAULT_INVITE_TTL);

        let database_path = std::env::var("STARSHIP_DB_PATH").ok().map(PathBuf::from);

        Self {
            invite_ttl,
            database_path,
        }
    }

    /// Set the code lifetime, capped at [`MAX_INVITE_TTL`].
    pub fn with_invite_ttl(mut self, ttl: Duration) -> Self {
        self.invite_ttl = ttl.min(MAX_INVITE_TTL);
        self
    }

    pub fn invite_ttl_ms(&self) -> i64 {
        i64::try_from(self.invite_ttl.min(MAX_INVITE_TTL).as_millis()).unwrap_or(i64::MAX)
    }

    /// Expiry for a code issued at `now_ms`.
    pub fn invite_expiry(&self, now_ms: i64) -> i64 {
        now_ms.saturating_add(self.invite_ttl_ms())
    }

    /// Resolve the database location, falling back to the platform data dir.
    pub fn resolve_database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }
        let dirs = directories::ProjectDirs::from("", "", "starship-command")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Ok(dirs.data_dir().join("starship.db"))
    }
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            invite_ttl: DEFAULT_INVITE_TTL,
            database_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ttl_is_ten_minutes() {
        let config = FleetConfig::default();
        assert_eq!(config.invite_ttl_ms(), 600_000);
    }

    #[test]
    fn oversized_ttl_is_capped() {
        let config = FleetConfig::default().with_invite_ttl(Duration::from_secs(u64::MAX / 1000));
        assert_eq!(config.invite_ttl, MAX_INVITE_TTL);
        assert_eq!(config.invite_expiry(0), 2_592_000_000);
    }

    #[test]
    fn expiry_saturates_instead_of_overflowing() {
        let config = FleetConfig {
            invite_ttl: Duration::MAX,
            ..Default::default()
        };
        assert_eq!(config.invite_expiry(i64::MAX - 1), i64::MAX);
    }

    #[test]
    fn explicit_database_path_wins() {
        let config = FleetConfig {
            database_path: Some(PathBuf::from("/tmp/fleet.db")),
            ..Default::default()
        };
        assert_eq!(
            config.resolve_database_path().unwrap(),
            PathBuf::from("/tmp/fleet.db")
        );
    }
}
