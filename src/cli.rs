//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::{Field, VisualizationKind};
use crate::stats::ColorPalette;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// FloatScope - chat with ARGO float data from the terminal
///
/// Tracks what the conversation is about (parameters, floats, region,
/// period) and turns backend result rows into chart-ready JSON.
///
/// Examples:
///   floatscope chat
///   floatscope extract turns.json
///   floatscope render rows.json --kind heatmap --parameter salinity
///   floatscope render rows.json --kind scatter --format text
///   floatscope health --backend-url http://localhost:8000
///   floatscope --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .floatscope.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Session backend base URL
    #[arg(long, value_name = "URL", env = "FLOATSCOPE_BACKEND_URL", global = true)]
    pub backend_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Number of recent user turns used for context extraction
    #[arg(long, value_name = "TURNS", global = true)]
    pub window_size: Option<usize>,

    /// Color palette for heatmap and scatter charts
    #[arg(long, value_name = "PALETTE", global = true)]
    pub palette: Option<PaletteArg>,

    /// Generate a default .floatscope.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Interactive chat session with the backend
    ///
    /// Commands inside the session: /context, /clear, /export, /pin LAT LON, /quit
    Chat,

    /// Extract the query context from a JSON turn log
    Extract {
        /// JSON array of conversation turns ("-" for stdin)
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Map backend result rows to a render spec
    Render {
        /// JSON array of measurement rows ("-" for stdin)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Chart type
        #[arg(short, long, default_value = "profile")]
        kind: KindArg,

        /// Parameter for profile and heatmap charts
        #[arg(long, value_name = "FIELD")]
        parameter: Option<Field>,

        /// Metrics for time series charts (comma-separated)
        #[arg(long, value_name = "FIELDS", value_delimiter = ',')]
        metrics: Option<Vec<Field>>,

        /// Scatter x axis
        #[arg(long, value_name = "FIELD")]
        x_axis: Option<Field>,

        /// Scatter y axis
        #[arg(long, value_name = "FIELD")]
        y_axis: Option<Field>,

        /// Scatter color field
        #[arg(long, value_name = "FIELD")]
        color_by: Option<Field>,

        /// Output format (json, text)
        #[arg(long, default_value = "json", value_name = "FORMAT")]
        format: OutputFormat,

        /// Write the output to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Check the session backend's health
    Health,
}

/// Output format for rendered charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Render spec as JSON (default)
    #[default]
    Json,
    /// Short terminal summary
    Text,
}

/// Chart type for `render`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum KindArg {
    Profile,
    #[value(alias = "timeseries")]
    TimeSeries,
    Scatter,
    Heatmap,
}

impl From<KindArg> for VisualizationKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Profile => VisualizationKind::Profile,
            KindArg::TimeSeries => VisualizationKind::TimeSeries,
            KindArg::Scatter => VisualizationKind::Scatter,
            KindArg::Heatmap => VisualizationKind::Heatmap,
        }
    }
}

/// Palette choice for --palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PaletteArg {
    Thermal,
    Ocean,
    Viridis,
}

impl From<PaletteArg> for ColorPalette {
    fn from(palette: PaletteArg) -> Self {
        match palette {
            PaletteArg::Thermal => ColorPalette::Thermal,
            PaletteArg::Ocean => ColorPalette::Ocean,
            PaletteArg::Viridis => ColorPalette::Viridis,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.command.is_none() {
            return Err("A command is required (chat, extract, render, health)".to_string());
        }

        if let Some(ref url) = self.backend_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Backend URL must start with 'http://' or 'https://'".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(window) = self.window_size {
            if window == 0 {
                return Err("Window size must be at least 1 turn".to_string());
            }
        }

        if let Some(Command::Render {
            metrics: Some(ref metrics),
            ..
        }) = self.command
        {
            if metrics.is_empty() {
                return Err("At least one metric is required".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `--quiet` wins over `verbose = true` in the config file.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            command: Some(Command::Health),
            config: None,
            verbose: false,
            quiet: false,
            backend_url: None,
            timeout: None,
            window_size: None,
            palette: None,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_render() {
        let args = Args::try_parse_from([
            "floatscope",
            "render",
            "rows.json",
            "--kind",
            "heatmap",
            "--parameter",
            "salinity",
            "--palette",
            "ocean",
        ])
        .unwrap();

        match args.command {
            Some(Command::Render {
                kind, parameter, ..
            }) => {
                assert_eq!(VisualizationKind::from(kind), VisualizationKind::Heatmap);
                assert_eq!(parameter, Some(Field::Salinity));
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(args.palette.map(ColorPalette::from), Some(ColorPalette::Ocean));
    }

    #[test]
    fn test_parse_metrics_list() {
        let args = Args::try_parse_from([
            "floatscope",
            "render",
            "rows.json",
            "--kind",
            "time-series",
            "--metrics",
            "temperature,oxygen",
        ])
        .unwrap();

        match args.command {
            Some(Command::Render { metrics, .. }) => {
                assert_eq!(metrics, Some(vec![Field::Temperature, Field::Oxygen]));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_validation_requires_command() {
        let mut args = make_args();
        args.command = None;
        assert!(args.validate().is_err());

        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args();
        args.backend_url = Some("localhost:8000".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_window() {
        let mut args = make_args();
        args.window_size = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(false), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(false), tracing::Level::ERROR);
    }

    #[test]
    fn test_log_level_honors_config_verbose() {
        let mut args = make_args();
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.quiet = true;
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }
}
