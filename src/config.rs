//! Shell configuration parsed from environment variables and the remote
//! manifest.
//!
//! DESIGN
//! ======
//! Which remotes exist, which components they expose, and their bundled
//! fallback routes live in a YAML manifest checked in with the shell. Where
//! each remote is deployed is a deployment-time concern and comes only from
//! environment variables, one per remote.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::remote::RouteDeclaration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_REMOTES_FILE: &str = "remotes.yaml";
pub const DEFAULT_ROUTES_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_ROUTES_PATH: &str = "routes.json";
pub const DEFAULT_ENTRY_PATH: &str = "assets/remoteEntry.js";
pub const DEFAULT_BRAND: &str = "Super App";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read remote manifest {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("remote manifest parse failed: {0}")]
    Parse(String),
    #[error("duplicate remote name in manifest: {0}")]
    DuplicateRemote(String),
    #[error("invalid {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
}

// =============================================================================
// MANIFEST
// =============================================================================

/// One remote as declared in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteSpec {
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Env var holding the base URL. Defaults to `REMOTE_<NAME>_URL`.
    #[serde(default)]
    pub url_env: Option<String>,
    /// Component names the shell expects this remote to expose.
    #[serde(default)]
    pub components: Vec<String>,
    #[serde(default)]
    pub fallback_routes: Option<Vec<RouteDeclaration>>,
    #[serde(default = "default_routes_path")]
    pub routes_path: String,
    #[serde(default = "default_entry_path")]
    pub entry_path: String,
}

fn default_enabled() -> bool {
    true
}

fn default_routes_path() -> String {
    DEFAULT_ROUTES_PATH.to_string()
}

fn default_entry_path() -> String {
    DEFAULT_ENTRY_PATH.to_string()
}

impl RemoteSpec {
    /// Name of the env var that carries this remote's base URL.
    #[must_use]
    pub fn url_var(&self) -> String {
        self.url_env.clone().unwrap_or_else(|| default_url_var(&self.name))
    }

    /// Base URL from the environment, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> Option<String> {
        std::env::var(self.url_var())
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
    }
}

/// `todoApp` → `REMOTE_TODOAPP_URL`, `despensa-inteligente` → `REMOTE_DESPENSA_INTELIGENTE_URL`.
#[must_use]
pub fn default_url_var(name: &str) -> String {
    let upper: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("REMOTE_{upper}_URL")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RemoteManifest {
    /// Shared libraries the shell provides to remote modules.
    #[serde(default)]
    pub shared: Vec<String>,
    #[serde(default)]
    pub remotes: Vec<RemoteSpec>,
}

impl RemoteManifest {
    /// Parse a YAML manifest.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed YAML or duplicate remote names.
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let manifest: Self = serde_yaml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut seen = HashSet::new();
        for remote in &manifest.remotes {
            if !seen.insert(remote.name.as_str()) {
                return Err(ConfigError::DuplicateRemote(remote.name.clone()));
            }
        }
        Ok(manifest)
    }

    /// Read and parse a YAML manifest file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw =
            std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_yaml(&raw)
    }
}

// =============================================================================
// SHELL CONFIG
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request: Duration,
    pub connect: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub port: u16,
    pub brand: String,
    pub manifest: RemoteManifest,
    /// Per-remote bound on route loading. `None` waits indefinitely.
    pub routes_timeout: Option<Duration>,
    pub http: HttpTimeouts,
    pub diagnostics: bool,
}

impl ShellConfig {
    /// Build typed shell config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `SHELL_BRAND`: default "Super App"
    /// - `SHELL_REMOTES_FILE`: default `remotes.yaml`; a missing file means no remotes
    /// - `REMOTE_ROUTES_TIMEOUT_SECS`: default 10, `0` disables the bound
    /// - `REMOTE_HTTP_TIMEOUT_SECS`: default 15
    /// - `REMOTE_CONNECT_TIMEOUT_SECS`: default 5
    /// - `SHELL_DIAGNOSTICS`: boolean, default off
    ///
    /// # Errors
    ///
    /// Returns an error on an unparseable `PORT` or a malformed manifest.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match std::env::var("PORT") {
            Ok(raw) => match raw.trim().parse::<u16>() {
                Ok(port) => port,
                Err(_) => return Err(ConfigError::InvalidValue { var: "PORT", value: raw }),
            },
            Err(_) => DEFAULT_PORT,
        };

        let manifest_path =
            PathBuf::from(std::env::var("SHELL_REMOTES_FILE").unwrap_or_else(|_| DEFAULT_REMOTES_FILE.to_string()));
        let manifest = if manifest_path.exists() {
            RemoteManifest::load(&manifest_path)?
        } else {
            tracing::warn!(path = %manifest_path.display(), "remote manifest not found; shell starts with no remotes");
            RemoteManifest::default()
        };

        let routes_timeout_secs = env_parse("REMOTE_ROUTES_TIMEOUT_SECS", DEFAULT_ROUTES_TIMEOUT_SECS);
        let routes_timeout = (routes_timeout_secs > 0).then(|| Duration::from_secs(routes_timeout_secs));

        Ok(Self {
            port,
            brand: std::env::var("SHELL_BRAND").unwrap_or_else(|_| DEFAULT_BRAND.to_string()),
            manifest,
            routes_timeout,
            http: HttpTimeouts {
                request: Duration::from_secs(env_parse("REMOTE_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)),
                connect: Duration::from_secs(env_parse("REMOTE_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)),
            },
            diagnostics: env_bool("SHELL_DIAGNOSTICS").unwrap_or(false),
        })
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
