//! Workspace configuration - connection defaults in `archmap.toml`
//!
//! Precedence: CLI flags > environment > config file > built-in defaults.
//! The password never lives in the file; it comes from `--password` or
//! `ARCHMAP_PASSWORD`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::db::ConnectParams;

/// Environment variable consulted for the store password
pub const PASSWORD_ENV: &str = "ARCHMAP_PASSWORD";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ArchmapConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub user: Option<String>,
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("archmap.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<ArchmapConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: ArchmapConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &ArchmapConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        );
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

impl ArchmapConfig {
    /// Merge this config over the built-in defaults, then apply any
    /// explicit overrides and the password from the environment.
    pub fn resolve(
        &self,
        host: Option<String>,
        port: Option<u16>,
        database: Option<String>,
        user: Option<String>,
        password: Option<String>,
    ) -> ConnectParams {
        let defaults = ConnectParams::default();
        ConnectParams {
            host: host
                .or_else(|| self.host.clone())
                .unwrap_or(defaults.host),
            port: port.or(self.port).unwrap_or(defaults.port),
            database: database
                .or_else(|| self.database.clone())
                .unwrap_or(defaults.database),
            user: user
                .or_else(|| self.user.clone())
                .unwrap_or(defaults.user),
            password: password
                .or_else(|| std::env::var(PASSWORD_ENV).ok())
                .unwrap_or(defaults.password),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_config() {
        let config: ArchmapConfig =
            toml::from_str("host = \"db.internal\"\nport = 5433\n").unwrap();
        assert_eq!(config.host.as_deref(), Some("db.internal"));
        assert_eq!(config.port, Some(5433));
        assert!(config.database.is_none());
    }

    #[test]
    fn test_resolution_precedence() {
        let config = ArchmapConfig {
            host: Some("db.internal".to_string()),
            port: Some(5433),
            database: None,
            user: None,
        };

        let params = config.resolve(Some("cli-host".to_string()), None, None, None, None);
        assert_eq!(params.host, "cli-host");
        assert_eq!(params.port, 5433);
        assert_eq!(params.database, "archmap");
        assert_eq!(params.user, "postgres");
    }

    #[test]
    fn test_write_refuses_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archmap.toml");
        let config = ArchmapConfig::default();

        write_config(&path, &config, false).unwrap();
        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &config, true).unwrap();
    }
}
