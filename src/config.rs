use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::logging::LogLevel;
use crate::session::Endpoint;

/// Environment variable that overrides `[server] token`
pub const TOKEN_ENV: &str = "KUBETERM_TOKEN";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub terminal: TerminalConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Use wss/https instead of ws/http
    pub secure: bool,
    pub api_base: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
            secure: false,
            api_base: "/api/v1".to_string(),
            token: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    pub default_namespace: String,
    /// Namespaces offered by the namespace switcher
    pub namespaces: Vec<String>,
    /// Lines kept in the terminal scrollback
    pub scrollback: usize,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            default_namespace: "default".to_string(),
            namespaces: vec![
                "default".to_string(),
                "kube-system".to_string(),
                "kube-public".to_string(),
            ],
            scrollback: 5000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<LogLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file '{}'", path.display()))?;
        Ok(config)
    }

    /// Load the file if present, otherwise fall back to defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.server.host.clone(), self.server.port, self.server.secure)
            .with_api_base(self.server.api_base.clone())
    }

    /// API token, preferring the environment over the file
    pub fn token(&self) -> Option<String> {
        std::env::var(TOKEN_ENV)
            .ok()
            .filter(|t| !t.is_empty())
            .or_else(|| self.server.token.clone())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.host.trim().is_empty() {
            anyhow::bail!("[server] host cannot be empty");
        }
        if self.server.port == 0 {
            anyhow::bail!("[server] port must be non-zero");
        }
        if self.terminal.default_namespace.trim().is_empty() {
            anyhow::bail!("[terminal] default_namespace cannot be empty");
        }
        if self.terminal.scrollback == 0 {
            anyhow::bail!("[terminal] scrollback must be at least 1");
        }
        Ok(())
    }
}

/// Loads the config for one path on first use and keeps it until told
/// otherwise. Hand one to each consumer instead of sharing a global.
#[derive(Debug)]
pub struct ConfigProvider {
    path: PathBuf,
    cached: Option<Config>,
}

impl ConfigProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: None,
        }
    }

    /// Provider that always serves the given config and never touches disk
    /// until invalidated
    pub fn with_config(path: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            path: path.into(),
            cached: Some(config),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached config, loading it on first use
    pub fn get(&mut self) -> anyhow::Result<&Config> {
        if self.cached.is_none() {
            let config = Config::load_or_default(&self.path)?;
            config.validate()?;
            self.cached = Some(config);
        }
        self.cached
            .as_ref()
            .context("config cache unexpectedly empty")
    }

    /// Drop the cached config; the next `get` reloads it
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// Reload now. On failure the previous config is kept.
    pub fn refresh(&mut self) -> anyhow::Result<&Config> {
        let config = Config::load_or_default(&self.path)?;
        config.validate()?;
        self.cached = Some(config);
        self.get()
    }

    pub fn is_loaded(&self) -> bool {
        self.cached.is_some()
    }
}
