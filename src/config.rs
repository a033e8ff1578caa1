// Credvault - Runtime configuration
//
// Where the database and gateway socket live, and the default page size.
// Defaults come from the platform data/runtime directories, then the
// CREDVAULT_* environment variables, then CLI flags.

use std::path::PathBuf;

use thiserror::Error;

use crate::service::DEFAULT_PAGE_SIZE;

pub const ENV_DB: &str = "CREDVAULT_DB";
pub const ENV_SOCKET: &str = "CREDVAULT_SOCKET";
pub const ENV_PAGE_SIZE: &str = "CREDVAULT_PAGE_SIZE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be a positive integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub socket_path: PathBuf,
    pub default_page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            socket_path: default_socket_path(),
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Config {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_DB).filter(|v| !v.is_empty()) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(ENV_SOCKET).filter(|v| !v.is_empty()) {
            config.socket_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup(ENV_PAGE_SIZE).filter(|v| !v.is_empty()) {
            config.default_page_size = match raw.trim().parse::<u32>() {
                Ok(size) if size > 0 => size,
                _ => {
                    return Err(ConfigError::InvalidNumber {
                        var: ENV_PAGE_SIZE,
                        value: raw,
                    })
                }
            };
        }

        Ok(config)
    }
}

/// `<data dir>/credvault/credvault.db`, falling back to the working directory.
fn default_db_path() -> PathBuf {
    dirs_next::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("credvault")
        .join("credvault.db")
}

/// `$XDG_RUNTIME_DIR/credvault/credvault.sock`, falling back to `/tmp`.
fn default_socket_path() -> PathBuf {
    std::env::var("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
        .join("credvault")
        .join("credvault.sock")
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert!(config.db_path.ends_with("credvault/credvault.db"));
        assert!(config.socket_path.ends_with("credvault/credvault.sock"));
        assert_eq!(config.default_page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_environment_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            (ENV_DB, "/srv/vault.db"),
            (ENV_SOCKET, "/run/vault.sock"),
            (ENV_PAGE_SIZE, "25"),
        ]))
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/srv/vault.db"));
        assert_eq!(config.socket_path, PathBuf::from("/run/vault.sock"));
        assert_eq!(config.default_page_size, 25);
    }

    #[test]
    fn test_empty_values_are_ignored() {
        let config = Config::from_lookup(lookup_from(&[(ENV_DB, "")])).unwrap();
        assert_eq!(config.db_path, default_db_path());
    }

    #[test]
    fn test_bad_page_size_is_an_error() {
        for raw in ["0", "ten", "-5"] {
            let err = Config::from_lookup(lookup_from(&[(ENV_PAGE_SIZE, raw)])).unwrap_err();
            assert!(err.to_string().contains(ENV_PAGE_SIZE));
        }
    }
}
