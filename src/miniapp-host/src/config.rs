//! Host configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use miniapp_protocol::{PeerId, DEFAULT_SCRIPT_RECEIVER};

use crate::error::Result;

/// Tunables for the web-app host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Input-surface height (points) above which a keyboard opening from
    /// zero counts as a keyboard transition
    #[serde(default = "default_expansion_input_threshold")]
    pub expansion_input_threshold: f64,

    /// Delay between a finished navigation and the reveal check (milliseconds)
    #[serde(default = "default_reveal_delay_ms")]
    pub reveal_delay_ms: u64,

    /// Hosts whose links are handed to the host URL handler instead of loading
    #[serde(default = "default_intercepted_hosts")]
    pub intercepted_hosts: Vec<String>,

    /// Script object receiving outbound events
    #[serde(default = "default_script_receiver")]
    pub script_receiver: String,

    /// Bots that get the grid placeholder instead of the icon
    #[serde(default = "default_grid_placeholder_bots")]
    pub grid_placeholder_bots: Vec<i64>,

    /// Scroll offset at which the navigation bar background becomes opaque
    #[serde(default = "default_max_navigation_alpha_offset")]
    pub max_navigation_alpha_offset: f64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            expansion_input_threshold: default_expansion_input_threshold(),
            reveal_delay_ms: default_reveal_delay_ms(),
            intercepted_hosts: default_intercepted_hosts(),
            script_receiver: default_script_receiver(),
            grid_placeholder_bots: default_grid_placeholder_bots(),
            max_navigation_alpha_offset: default_max_navigation_alpha_offset(),
        }
    }
}

impl HostConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Default configuration file location.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("miniapp").join("host.toml"))
    }

    /// Apply `MINIAPP_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(threshold) = std::env::var("MINIAPP_EXPANSION_THRESHOLD") {
            match threshold.parse() {
                Ok(value) => self.expansion_input_threshold = value,
                Err(_) => warn!(value = %threshold, "Ignoring invalid MINIAPP_EXPANSION_THRESHOLD"),
            }
        }

        if let Ok(delay) = std::env::var("MINIAPP_REVEAL_DELAY_MS") {
            match delay.parse() {
                Ok(value) => self.reveal_delay_ms = value,
                Err(_) => warn!(value = %delay, "Ignoring invalid MINIAPP_REVEAL_DELAY_MS"),
            }
        }

        if let Ok(receiver) = std::env::var("MINIAPP_SCRIPT_RECEIVER") {
            if !receiver.trim().is_empty() {
                self.script_receiver = receiver;
            }
        }
    }

    /// Reveal delay as Duration.
    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_delay_ms)
    }

    /// Whether a bot gets the grid placeholder.
    pub fn uses_grid_placeholder(&self, bot: PeerId) -> bool {
        self.grid_placeholder_bots.contains(&bot.0)
    }
}

fn default_expansion_input_threshold() -> f64 {
    44.0
}

fn default_reveal_delay_ms() -> u64 {
    100
}

fn default_intercepted_hosts() -> Vec<String> {
    ["t.me", "telegram.me", "telegram.dog", "telegra.ph"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn default_script_receiver() -> String {
    DEFAULT_SCRIPT_RECEIVER.to_string()
}

fn default_grid_placeholder_bots() -> Vec<i64> {
    vec![2200339955]
}

fn default_max_navigation_alpha_offset() -> f64 {
    30.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = HostConfig::default();
        assert_eq!(config.expansion_input_threshold, 44.0);
        assert_eq!(config.reveal_delay(), Duration::from_millis(100));
        assert_eq!(config.script_receiver, "window.TelegramGameProxy");
        assert!(config.intercepted_hosts.contains(&"telegra.ph".to_string()));
        assert!(config.uses_grid_placeholder(PeerId(2200339955)));
        assert!(!config.uses_grid_placeholder(PeerId(1)));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = HostConfig::from_toml_str(
            r#"
            reveal_delay_ms = 250
            intercepted_hosts = ["example.org"]
            "#,
        )
        .unwrap();
        assert_eq!(config.reveal_delay_ms, 250);
        assert_eq!(config.intercepted_hosts, vec!["example.org".to_string()]);
        assert_eq!(config.expansion_input_threshold, 44.0);
        assert_eq!(config.max_navigation_alpha_offset, 30.0);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(HostConfig::from_toml_str("").unwrap(), HostConfig::default());
    }

    #[test]
    fn test_invalid_toml() {
        let err = HostConfig::from_toml_str("reveal_delay_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, crate::HostError::ConfigError(_)));
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "script_receiver = \"window.Bridge\"").unwrap();
        writeln!(file, "grid_placeholder_bots = [7, 8]").unwrap();

        let config = tokio_test::assert_ok!(HostConfig::load(file.path()));
        assert_eq!(config.script_receiver, "window.Bridge");
        assert!(config.uses_grid_placeholder(PeerId(8)));
        assert!(!config.uses_grid_placeholder(PeerId(2200339955)));
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        // SAFETY: every test that touches the environment or loads a file is #[serial]
        unsafe {
            std::env::set_var("MINIAPP_EXPANSION_THRESHOLD", "60");
            std::env::set_var("MINIAPP_REVEAL_DELAY_MS", "later");
            std::env::set_var("MINIAPP_SCRIPT_RECEIVER", "window.Proxy");
        }

        let mut config = HostConfig::default();
        config.apply_env_overrides();

        unsafe {
            std::env::remove_var("MINIAPP_EXPANSION_THRESHOLD");
            std::env::remove_var("MINIAPP_REVEAL_DELAY_MS");
            std::env::remove_var("MINIAPP_SCRIPT_RECEIVER");
        }

        assert_eq!(config.expansion_input_threshold, 60.0);
        assert_eq!(config.reveal_delay_ms, 100);
        assert_eq!(config.script_receiver, "window.Proxy");
    }

    #[test]
    #[serial]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = HostConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, crate::HostError::IoError(_)));
    }
}
