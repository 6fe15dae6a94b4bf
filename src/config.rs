//! Native timer configuration.
//!
//! Settings are read from a JSON file. Every field has a default, so a
//! missing file or a partial file both produce a usable configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::types::DEFAULT_ACCENT_COLOR;

/// Directory (under the home directory) holding the daemon socket.
const RUNTIME_DIR_NAME: &str = ".native-timer";

/// Socket file name.
const SOCKET_FILE_NAME: &str = "native-timer.sock";

/// Configuration file name.
const CONFIG_FILE_NAME: &str = "config.json";

fn default_tick_interval_seconds() -> u64 {
    30
}

fn default_accent_color() -> String {
    DEFAULT_ACCENT_COLOR.to_string()
}

fn default_notification_identifier() -> String {
    "native-timer-notification".to_string()
}

fn default_finished_status_label() -> String {
    "Finalizada".to_string()
}

fn default_live_status_enabled() -> bool {
    true
}

/// Configuration for the session manager and the daemon.
///
/// # Example
///
/// ```
/// use native_timer::config::NativeTimerConfig;
///
/// let config = NativeTimerConfig::default();
/// assert_eq!(config.tick_interval_seconds, 30);
/// assert_eq!(config.default_accent_color, "#0045a5");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NativeTimerConfig {
    /// Interval of the periodic tick while a session runs.
    #[serde(default = "default_tick_interval_seconds")]
    pub tick_interval_seconds: u64,

    /// Accent colour used when a caller omits one.
    #[serde(default = "default_accent_color")]
    pub default_accent_color: String,

    /// Identifier under which the background notification is delivered.
    /// Re-deliveries replace the previous notification with this id.
    #[serde(default = "default_notification_identifier")]
    pub notification_identifier: String,

    /// Status label written into a live status when it is stopped.
    #[serde(default = "default_finished_status_label")]
    pub finished_status_label: String,

    /// Whether the in-process live-status board reports itself available.
    #[serde(default = "default_live_status_enabled")]
    pub live_status_enabled: bool,

    /// Daemon socket path; `~/.native-timer/native-timer.sock` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket_path: Option<PathBuf>,
}

impl Default for NativeTimerConfig {
    fn default() -> Self {
        Self {
            tick_interval_seconds: default_tick_interval_seconds(),
            default_accent_color: default_accent_color(),
            notification_identifier: default_notification_identifier(),
            finished_status_label: default_finished_status_label(),
            live_status_enabled: default_live_status_enabled(),
            socket_path: None,
        }
    }
}

impl NativeTimerConfig {
    /// Loads the configuration from `path`, or from the default location
    /// when `path` is `None`.
    ///
    /// A missing file at the default location yields the defaults; a missing
    /// file at an explicit path is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::read_from(path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::read_from(&path)?,
                _ => Self::default(),
            },
        };

        config
            .validate()
            .map_err(|message| anyhow::anyhow!(message))?;
        Ok(config)
    }

    fn read_from(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Returns `<config_dir>/native-timer/config.json`.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("native-timer").join(CONFIG_FILE_NAME))
    }

    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_interval_seconds < 1 || self.tick_interval_seconds > 3600 {
            return Err("tick_interval_seconds must be between 1 and 3600".to_string());
        }
        if !is_hex_color(&self.default_accent_color) {
            return Err(format!(
                "default_accent_color must look like #RRGGBB, got {:?}",
                self.default_accent_color
            ));
        }
        if self.notification_identifier.trim().is_empty() {
            return Err("notification_identifier must not be empty".to_string());
        }
        Ok(())
    }

    /// Returns the tick interval as a `Duration`.
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.tick_interval_seconds)
    }

    /// Resolves the daemon socket path.
    ///
    /// # Errors
    ///
    /// Returns an error if no socket path is configured and the home
    /// directory cannot be determined.
    pub fn resolve_socket_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.socket_path {
            return Ok(path.clone());
        }
        let home = dirs::home_dir().context("Could not determine the home directory")?;
        Ok(home.join(RUNTIME_DIR_NAME).join(SOCKET_FILE_NAME))
    }
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = NativeTimerConfig::default();

        assert_eq!(config.tick_interval_seconds, 30);
        assert_eq!(config.default_accent_color, "#0045a5");
        assert_eq!(config.notification_identifier, "native-timer-notification");
        assert_eq!(config.finished_status_label, "Finalizada");
        assert!(config.live_status_enabled);
        assert!(config.socket_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: NativeTimerConfig =
            serde_json::from_str(r#"{"tick_interval_seconds": 5}"#).unwrap();

        assert_eq!(config.tick_interval_seconds, 5);
        assert_eq!(config.default_accent_color, "#0045a5");
        assert!(config.live_status_enabled);
    }

    #[test]
    fn test_validate_tick_interval_bounds() {
        let mut config = NativeTimerConfig::default();
        config.tick_interval_seconds = 0;
        assert!(config.validate().is_err());

        config.tick_interval_seconds = 3601;
        assert!(config.validate().is_err());

        config.tick_interval_seconds = 3600;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_accent_color() {
        let mut config = NativeTimerConfig::default();
        config.default_accent_color = "blue".to_string();
        assert!(config.validate().is_err());

        config.default_accent_color = "#12ab9F".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_identifier() {
        let config = NativeTimerConfig {
            notification_identifier: "  ".to_string(),
            ..NativeTimerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"finished_status_label": "Done", "socket_path": "/tmp/nt.sock"}}"#
        )
        .unwrap();

        let config = NativeTimerConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.finished_status_label, "Done");
        assert_eq!(
            config.resolve_socket_path().unwrap(),
            PathBuf::from("/tmp/nt.sock")
        );
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = NativeTimerConfig::load(Some(&dir.path().join("missing.json")));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_values_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"tick_interval_seconds": 0}}"#).unwrap();

        let result = NativeTimerConfig::load(Some(file.path()));
        assert!(result.is_err());
    }

    #[test]
    fn test_tick_interval_duration() {
        let config = NativeTimerConfig::default();
        assert_eq!(config.tick_interval(), std::time::Duration::from_secs(30));
    }
}
