//! Console settings

use std::path::PathBuf;

use anyhow::Context;
use sdr_control::ControllerConfig;
use sdr_sim::VirtualUsrpConfig;
use serde::{Deserialize, Serialize};

/// Environment variable naming an explicit settings file
pub const CONFIG_ENV: &str = "SDR_CONSOLE_CONFIG";

/// Console settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleSettings {
    /// Actor timing and channel capacities
    pub controller: ControllerConfig,
    /// Shape and limits of the simulated device
    pub device: VirtualUsrpConfig,
}

impl ConsoleSettings {
    /// Get the XDG config directory for sdr-console
    /// Uses $XDG_CONFIG_HOME/sdr-console, falls back to the platform config dir
    fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("sdr-console"));
            }
        }

        dirs::config_dir().map(|d| d.join("sdr-console"))
    }

    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        if let Ok(explicit) = std::env::var(CONFIG_ENV) {
            return Some(PathBuf::from(explicit));
        }
        Self::config_dir().map(|p| p.join("config.json"))
    }

    /// Load settings from disk
    ///
    /// A missing default file yields defaults; an explicit file that cannot
    /// be read, or any file that does not parse, is an error.
    pub fn load() -> anyhow::Result<Self> {
        let explicit = std::env::var_os(CONFIG_ENV).is_some();
        let Some(path) = Self::settings_path() else {
            return Ok(Self::default());
        };
        if !explicit && !path.exists() {
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        Self::from_json(&text)
            .with_context(|| format!("Failed to parse settings in {}", path.display()))
    }

    /// Parse settings, filling anything missing with defaults
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings() {
        let settings = ConsoleSettings::from_json(
            r#"{"controller": {"poll_interval_ms": 2}, "device": {"channels": 4, "mboards": 2}}"#,
        )
        .unwrap();

        assert_eq!(settings.controller.poll_interval_ms, 2);
        assert_eq!(settings.controller.event_buffer, 256);
        assert_eq!(settings.device.channels, 4);
        assert_eq!(settings.device.mboards, 2);
        assert_eq!(settings.device.gain_range, (0.0, 76.0));
    }

    #[test]
    fn test_empty_settings_are_default() {
        let settings = ConsoleSettings::from_json("{}").unwrap();
        assert_eq!(settings.controller, ControllerConfig::default());
        assert_eq!(settings.device.channels, 2);
    }

    #[test]
    fn test_bad_settings() {
        assert!(ConsoleSettings::from_json(r#"{"controller": 3}"#).is_err());
    }
}
