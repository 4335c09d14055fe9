//! Application configuration

use magicinput_gateway::GatewayConfig;
use magicinput_history::LedgerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory name under the platform config/data directories
pub const APP_DIR: &str = "magic-input";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Escalation service connection
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Analysis behavior
    #[serde(default)]
    pub session: SessionConfig,

    /// History location and limits
    #[serde(default)]
    pub history: HistoryConfig,
}

/// Analysis session settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Upper bound on one escalation call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Whether inconclusive input is sent to the escalation service
    #[serde(default = "default_true")]
    pub escalate: bool,
}

impl SessionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            escalate: true,
        }
    }
}

/// History settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Directory holding the history file; platform data dir when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    #[serde(flatten)]
    pub limits: LedgerConfig,
}

/// Values supplied on the command line or environment, taking precedence
/// over the file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
    pub history_dir: Option<PathBuf>,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

/// `<config_dir>/magic-input/config.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.yaml"))
}

impl AppConfig {
    /// Load configuration from file, or use defaults when the file is absent
    pub fn load(config_path: &Path) -> anyhow::Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(config_path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config = serde_yaml::from_str(&content).map_err(|e| {
            anyhow::anyhow!("invalid configuration in {}: {}", config_path.display(), e)
        })?;
        Ok(config)
    }

    /// Apply command-line overrides
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(key) = &overrides.api_key {
            self.gateway.api_key = Some(key.clone());
        }
        if let Some(base_url) = &overrides.base_url {
            self.gateway.base_url = base_url.clone();
        }
        if let Some(model) = &overrides.model {
            self.gateway.model = model.clone();
        }
        if let Some(timeout) = overrides.timeout_secs {
            self.session.timeout_secs = timeout;
        }
        if let Some(dir) = &overrides.history_dir {
            self.history.dir = Some(dir.clone());
        }
    }

    /// Write configuration to file, creating parent directories
    pub fn save(&self, config_path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(config_path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Persist a new API key, keeping every other stored setting
    pub fn set_api_key(config_path: &Path, key: &str) -> anyhow::Result<Self> {
        let key = key.trim();
        if key.is_empty() {
            anyhow::bail!("API key must not be empty");
        }
        let mut config = Self::load(config_path)?;
        config.gateway.api_key = Some(key.to_string());
        config.save(config_path)?;
        Ok(config)
    }

    /// Directory holding the history file
    pub fn history_dir(&self) -> anyhow::Result<PathBuf> {
        if let Some(dir) = &self.history.dir {
            return Ok(dir.clone());
        }
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| anyhow::anyhow!("no data directory available; set history.dir"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig::load(&temp_dir.path().join("config.yaml")).unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.session.timeout(), Duration::from_secs(30));
        assert_eq!(config.history.limits.capacity, 50);
    }

    #[test]
    fn test_partial_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "gateway:\n  api_key: sk-test\n  model: gpt-4o-mini\nhistory:\n  capacity: 10\n",
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.gateway.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.gateway.model, "gpt-4o-mini");
        assert_eq!(config.gateway.max_tokens, 2000);
        assert_eq!(config.history.limits.capacity, 10);
        assert_eq!(config.history.limits.snippet_chars, 200);
        assert!(config.session.escalate);
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(&path, "gateway: [unclosed").unwrap();

        assert!(AppConfig::load(&path).is_err());
    }

    #[test]
    fn test_overrides_win() {
        let mut config = AppConfig::default();
        config.apply(&ConfigOverrides {
            api_key: Some("sk-env".to_string()),
            timeout_secs: Some(5),
            ..Default::default()
        });

        assert!(config.gateway.is_configured());
        assert_eq!(config.session.timeout(), Duration::from_secs(5));
        assert_eq!(config.gateway.model, "qwen-plus");
    }

    #[test]
    fn test_set_api_key_preserves_other_settings() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.yaml");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "session:\n  timeout_secs: 12\n").unwrap();

        AppConfig::set_api_key(&path, "  sk-new  ").unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.gateway.api_key.as_deref(), Some("sk-new"));
        assert_eq!(config.session.timeout_secs, 12);
        assert!(AppConfig::set_api_key(&path, " ").is_err());
    }
}
