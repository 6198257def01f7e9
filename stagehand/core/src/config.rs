//! TOML Configuration File Support
//!
//! Centralized configuration loading for the screen manager, supporting a
//! TOML configuration file at `~/.config/stagehand/config.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest
//! first):
//! 1. Programmatic overrides (bind options built by the caller)
//! 2. Environment variables (`STAGEHAND_*`)
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [ui]
//! sidebar_width = 36
//! sidebar_title = "Tasks"
//! theme = "dark"
//! use_mouse = false
//!
//! [behavior]
//! auto_close = true
//! auto_close_delay_ms = 5000
//! exit_on_ctrl_c = true
//! use_tui = true
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::manager::DEFAULT_AUTO_CLOSE_DELAY_MS;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file
    #[error("failed to read config file at {path}: {source}")]
    Read {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    Validation(String),
}

// =============================================================================
// Configuration Shape
// =============================================================================

/// The `[ui]` table
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Sidebar width in columns (must be non-zero)
    pub sidebar_width: u16,
    /// Sidebar title
    pub sidebar_title: String,
    /// Theme name, passed through to the surface
    pub theme: Option<String>,
    /// Whether the surface should enable mouse capture
    pub use_mouse: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            sidebar_width: 32,
            sidebar_title: "Screens".to_string(),
            theme: None,
            use_mouse: false,
        }
    }
}

/// The `[behavior]` table
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Whether to close automatically once every screen succeeds
    pub auto_close: bool,
    /// Delay before auto-close fires (milliseconds)
    pub auto_close_delay_ms: u64,
    /// Whether Ctrl+C ends the session
    pub exit_on_ctrl_c: bool,
    /// Whether to attempt the interactive-terminal path
    pub use_tui: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            auto_close: false,
            auto_close_delay_ms: DEFAULT_AUTO_CLOSE_DELAY_MS,
            exit_on_ctrl_c: true,
            use_tui: true,
        }
    }
}

/// The full configuration file shape
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagehandConfig {
    /// UI settings
    pub ui: UiConfig,
    /// Behavior settings
    pub behavior: BehaviorConfig,
}

impl StagehandConfig {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for out-of-range values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ui.sidebar_width == 0 {
            return Err(ConfigError::Validation(
                "ui.sidebar_width must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Default configuration file path (`~/.config/stagehand/config.toml`)
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("stagehand").join("config.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be read or parsed,
/// or if the resulting configuration is invalid. A missing config file is
/// not an error (defaults are used).
pub fn load_config() -> Result<StagehandConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Arguments
///
/// * `path` - Optional path to the configuration file. If `None`, only
///   defaults and environment variables are used.
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or if the resulting configuration is invalid.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<StagehandConfig, ConfigError> {
    let mut config = StagehandConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::Read {
                    path: config_path.clone(),
                    source: e,
                })?;
            config = toml::from_str(&toml_content)?;
            tracing::info!(path = %config_path.display(), "loaded configuration file");
        }
    }

    apply_env_overrides(&mut config);
    config.validate()?;
    Ok(config)
}

/// Apply `STAGEHAND_*` environment variable overrides
fn apply_env_overrides(config: &mut StagehandConfig) {
    if let Some(width) = env_parse::<u16>("STAGEHAND_SIDEBAR_WIDTH") {
        config.ui.sidebar_width = width;
    }
    if let Ok(title) = std::env::var("STAGEHAND_SIDEBAR_TITLE") {
        config.ui.sidebar_title = title;
    }
    if let Ok(theme) = std::env::var("STAGEHAND_THEME") {
        config.ui.theme = Some(theme);
    }
    if let Some(use_mouse) = env_bool("STAGEHAND_USE_MOUSE") {
        config.ui.use_mouse = use_mouse;
    }
    // STAGEHAND_AUTO_CLOSE accepts "true"/"false" or a delay in milliseconds.
    if let Ok(value) = std::env::var("STAGEHAND_AUTO_CLOSE") {
        if let Some(enabled) = parse_bool(&value) {
            config.behavior.auto_close = enabled;
        } else if let Ok(ms) = value.parse::<u64>() {
            config.behavior.auto_close = true;
            config.behavior.auto_close_delay_ms = ms;
        }
    }
    if let Some(exit) = env_bool("STAGEHAND_EXIT_ON_CTRL_C") {
        config.behavior.exit_on_ctrl_c = exit;
    }
    if let Some(no_tui) = env_bool("STAGEHAND_NO_TUI") {
        config.behavior.use_tui = !no_tui;
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

fn env_bool(name: &str) -> Option<bool> {
    std::env::var(name).ok().and_then(|v| parse_bool(&v))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_defaults_when_no_file() {
        let config = load_config_from_path(None).unwrap();
        assert_eq!(config.ui.sidebar_width, 32);
        assert_eq!(config.ui.sidebar_title, "Screens");
        assert!(!config.behavior.auto_close);
        assert_eq!(
            config.behavior.auto_close_delay_ms,
            DEFAULT_AUTO_CLOSE_DELAY_MS
        );
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let config =
            load_config_from_path(Some(PathBuf::from("/nonexistent/stagehand.toml"))).unwrap();
        assert_eq!(config, StagehandConfig::default());
    }

    #[test]
    fn test_file_values_override_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[ui]\nsidebar_width = 40\nsidebar_title = \"Tasks\"\n\n[behavior]\nauto_close = true\nauto_close_delay_ms = 250"
        )
        .unwrap();

        let config = load_config_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.ui.sidebar_width, 40);
        assert_eq!(config.ui.sidebar_title, "Tasks");
        assert!(config.behavior.auto_close);
        assert_eq!(config.behavior.auto_close_delay_ms, 250);
        // Untouched values keep their defaults.
        assert!(config.behavior.exit_on_ctrl_c);
    }

    #[test]
    fn test_invalid_toml_is_a_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[ui\nsidebar_width = ").unwrap();

        let err = load_config_from_path(Some(file.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_zero_sidebar_width_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[ui]\nsidebar_width = 0").unwrap();

        let err = load_config_from_path(Some(file.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_parse_bool_variants() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("YES"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
