//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.floatscope.toml` files.

use crate::context::DEFAULT_WINDOW_SIZE;
use crate::models::Field;
use crate::stats::ColorPalette;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".floatscope.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Session backend settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Context extraction settings.
    #[serde(default)]
    pub context: ContextConfig,

    /// Default chart selections.
    #[serde(default)]
    pub visualization: VisualizationConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Session backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the chat/session API.
    #[serde(default = "default_backend_url")]
    pub url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_backend_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> u64 {
    60
}

/// Context extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Number of recent user turns considered.
    #[serde(default = "default_window_size")]
    pub window_size: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
        }
    }
}

fn default_window_size() -> usize {
    DEFAULT_WINDOW_SIZE
}

/// Default chart selections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualizationConfig {
    /// Parameter for profile and heatmap charts.
    #[serde(default = "default_parameter")]
    pub parameter: Field,

    /// Metrics for time series charts.
    #[serde(default = "default_metrics")]
    pub metrics: Vec<Field>,

    #[serde(default = "default_parameter")]
    pub x_axis: Field,

    #[serde(default = "default_y_axis")]
    pub y_axis: Field,

    #[serde(default = "default_color_by")]
    pub color_by: Field,

    #[serde(default)]
    pub palette: ColorPalette,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            parameter: default_parameter(),
            metrics: default_metrics(),
            x_axis: default_parameter(),
            y_axis: default_y_axis(),
            color_by: default_color_by(),
            palette: ColorPalette::default(),
        }
    }
}

fn default_parameter() -> Field {
    Field::Temperature
}

fn default_y_axis() -> Field {
    Field::Salinity
}

fn default_color_by() -> Field {
    Field::Depth
}

fn default_metrics() -> Vec<Field> {
    vec![Field::Temperature, Field::Salinity]
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load configuration from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.backend_url {
            self.backend.url = url.clone();
        }

        if let Some(timeout) = args.timeout {
            self.backend.timeout_seconds = timeout;
        }

        if let Some(window) = args.window_size {
            self.context.window_size = window;
        }

        if let Some(palette) = args.palette {
            self.visualization.palette = palette.into();
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check the merged settings.
    ///
    /// The file is not checked by clap, so a `window_size = 0` or a
    /// zero timeout only shows up here.
    pub fn validate(&self) -> Result<()> {
        let url = &self.backend.url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            bail!("Backend URL must start with 'http://' or 'https://': {}", url);
        }

        if self.backend.timeout_seconds == 0 {
            bail!("Backend timeout must be at least 1 second");
        }

        if self.context.window_size == 0 {
            bail!("Context window size must be at least 1 turn");
        }

        if self.visualization.metrics.is_empty() {
            bail!("At least one time series metric is required");
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
