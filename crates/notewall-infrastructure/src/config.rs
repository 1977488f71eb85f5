//! Startup configuration.
//!
//! Sources, lowest to highest precedence:
//!
//! 1. built-in defaults
//! 2. an optional TOML file
//! 3. environment (`NOTEWALL_PASSWORD` or `APP_PASSWORD`, `NOTEWALL_DATA_DIR`,
//!    `NOTEWALL_BIND`)
//! 4. explicit overrides (command line flags)
//!
//! A missing password is fatal: [`AppConfig::resolve`] refuses to build a
//! config without one.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notewall_core::NotewallError;
use notewall_core::auth::Secret;
use notewall_core::error::Result;

use crate::memory_session_store::DEFAULT_SESSION_TTL;
use crate::paths::{DEFAULT_DATA_DIR, NotewallPaths};

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

pub const ENV_PASSWORD: &str = "NOTEWALL_PASSWORD";
/// Fallback password variable kept for existing deployments.
pub const ENV_PASSWORD_FALLBACK: &str = "APP_PASSWORD";
pub const ENV_DATA_DIR: &str = "NOTEWALL_DATA_DIR";
pub const ENV_BIND: &str = "NOTEWALL_BIND";

/// Contents of the optional `config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub password: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub bind: Option<String>,
    pub session_ttl_secs: Option<u64>,
    pub serialize_mutations: Option<bool>,
}

impl ConfigFile {
    /// Reads and parses a TOML config file.
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            NotewallError::config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        Ok(toml::from_str(&content)?)
    }
}

/// Values given explicitly on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub data_dir: Option<PathBuf>,
    pub bind: Option<String>,
}

/// Fully resolved startup configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub password: Secret,
    pub data_dir: PathBuf,
    pub bind: SocketAddr,
    pub session_ttl: Duration,
    /// Hold one in-process lock across load/mutate/save of every mutation.
    pub serialize_mutations: bool,
}

impl AppConfig {
    /// Loads configuration from the process environment and an optional file.
    pub fn load(config_path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let file = match config_path {
            Some(path) => ConfigFile::read(path)?,
            None => ConfigFile::default(),
        };
        Self::resolve(file, |key| std::env::var(key).ok(), overrides)
    }

    /// Merges every source. `env` looks up one environment variable.
    ///
    /// Empty values count as unset, in the file and in the environment alike.
    /// A whitespace-only password is skipped so the next source can supply one.
    pub fn resolve<E>(file: ConfigFile, env: E, overrides: ConfigOverrides) -> Result<Self>
    where
        E: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).filter(|v| !v.is_empty());

        let password_from = |raw: Option<String>| raw.map(Secret::new).filter(|s| !s.is_blank());
        let password = password_from(env(ENV_PASSWORD))
            .or_else(|| password_from(env(ENV_PASSWORD_FALLBACK)))
            .or_else(|| password_from(file.password))
            .ok_or_else(|| {
                NotewallError::config(format!(
                    "{} (or {}) is not set.",
                    ENV_PASSWORD, ENV_PASSWORD_FALLBACK
                ))
            })?;

        let data_dir = overrides
            .data_dir
            .or_else(|| env(ENV_DATA_DIR).map(PathBuf::from))
            .or(file.data_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let bind_raw = overrides
            .bind
            .or_else(|| env(ENV_BIND))
            .or(file.bind)
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw.parse::<SocketAddr>().map_err(|e| {
            NotewallError::config(format!("Invalid bind address '{}': {}", bind_raw, e))
        })?;

        let session_ttl = file
            .session_ttl_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SESSION_TTL);
        if session_ttl.is_zero() {
            return Err(NotewallError::config("session_ttl_secs must be positive"));
        }

        Ok(Self {
            password,
            data_dir,
            bind,
            session_ttl,
            serialize_mutations: file.serialize_mutations.unwrap_or(false),
        })
    }

    pub fn paths(&self) -> NotewallPaths {
        NotewallPaths::new(self.data_dir.clone())
    }
}
