//! fieldops configuration.
//!
//! Loaded from `~/.fieldops/config.toml`. Defaults apply if missing.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::storage::Storage;
use crate::workflow::DEFAULT_MAX_WRITE_ATTEMPTS;

/// fieldops configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// The account to act as when `--as` and `FIELDOPS_ACTOR` are absent.
    pub default_actor: Option<String>,

    /// Database file. Defaults to `~/.fieldops/fieldops.sqlite`.
    pub database: Option<PathBuf>,

    /// How many times a sheet mutation is attempted when other writers
    /// keep saving the same sheet first.
    pub max_write_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_actor: None,
            database: None,
            max_write_attempts: DEFAULT_MAX_WRITE_ATTEMPTS,
        }
    }
}

impl Config {
    /// Load config from `~/.fieldops/config.toml`.
    /// A missing file yields the defaults; an unreadable or invalid one is an error.
    pub fn load() -> Result<Self, String> {
        let Some(path) = Self::path() else {
            return Ok(Self::default());
        };

        let contents = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
        };

        Self::parse(&contents).map_err(|e| format!("invalid config at {}: {e}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self, String> {
        let config: Self = toml::from_str(contents).map_err(|e| e.to_string())?;
        if config.max_write_attempts == 0 {
            return Err("max-write-attempts must be at least 1".into());
        }
        Ok(config)
    }

    /// The config file path: `~/.fieldops/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".fieldops").join("config.toml"))
    }

    /// The database to open: the configured one, else the default location.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.database.clone().or_else(Storage::default_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.default_actor, None);
        assert_eq!(config.max_write_attempts, DEFAULT_MAX_WRITE_ATTEMPTS);
    }

    #[test]
    fn kebab_case_keys() {
        let config = Config::parse(
            "default-actor = \"rep\"\n\
             database = \"/tmp/fieldops.sqlite\"\n\
             max-write-attempts = 5\n",
        )
        .unwrap();
        assert_eq!(config.default_actor.as_deref(), Some("rep"));
        assert_eq!(
            config.database_path(),
            Some(PathBuf::from("/tmp/fieldops.sqlite"))
        );
        assert_eq!(config.max_write_attempts, 5);
    }

    #[test]
    fn zero_attempts_is_invalid() {
        assert!(Config::parse("max-write-attempts = 0").is_err());
    }
}
