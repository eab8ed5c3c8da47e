//! Configuration loading and data path resolution
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments
//! 2. Environment variables (`MCF_CONFIG`, `MCF_DATA_DIR`)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)
//!
//! A missing TOML file never aborts startup: the built-in defaults are used
//! and [`ConfigSource::log`] reports it as a warning. A TOML file that exists
//! but cannot be parsed or fails validation is a hard error.
//!
//! Config loading happens before the tracing subscriber exists (the log
//! level is itself a config value), so loading records where the settings
//! came from in [`ConfigSource`] and the caller logs it once tracing is up.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// Environment variable naming the TOML config file
pub const CONFIG_ENV_VAR: &str = "MCF_CONFIG";

/// Environment variable naming the data directory
pub const DATA_DIR_ENV_VAR: &str = "MCF_DATA_DIR";

/// Data directory used when nothing else is configured
pub const DEFAULT_DATA_DIR: &str = "lastfmdata";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// Directory holding the interaction and artist files (optional)
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Interaction file name, relative to the data directory
    #[serde(default = "default_interactions_file")]
    pub interactions_file: String,

    /// Artist catalog file name, relative to the data directory
    #[serde(default = "default_artists_file")]
    pub artists_file: String,

    /// Field delimiter of both data files (single ASCII character)
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Factorization model settings (optional)
    #[serde(default)]
    pub model: ModelConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Which factorization collaborator to train
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Implicit-feedback alternating least squares
    Als,
    /// Non-personalised total-weight baseline
    Popularity,
}

impl FromStr for ModelKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "als" => Ok(ModelKind::Als),
            "popularity" => Ok(ModelKind::Popularity),
            other => Err(Error::InvalidInput(format!(
                "unknown model kind '{}' (expected 'als' or 'popularity')",
                other
            ))),
        }
    }
}

/// Factorization model hyper-parameters
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_kind")]
    pub kind: ModelKind,

    /// Latent factor count
    #[serde(default = "default_factors")]
    pub factors: usize,

    /// L2 regularization (lambda)
    #[serde(default = "default_regularization")]
    pub regularization: f32,

    /// Training sweeps over users and artists
    #[serde(default = "default_iterations")]
    pub iterations: usize,

    /// Confidence scaling applied to play counts
    #[serde(default = "default_alpha")]
    pub alpha: f32,

    /// Seed for factor initialisation; None draws from OS entropy
    #[serde(default = "default_seed")]
    pub seed: Option<u64>,
}

fn default_interactions_file() -> String {
    "user_artists.dat".to_string()
}

fn default_artists_file() -> String {
    "artists.dat".to_string()
}

fn default_delimiter() -> String {
    "\t".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_model_kind() -> ModelKind {
    ModelKind::Als
}

fn default_factors() -> usize {
    64
}

fn default_regularization() -> f32 {
    0.05
}

fn default_iterations() -> usize {
    15
}

fn default_alpha() -> f32 {
    1.0
}

fn default_seed() -> Option<u64> {
    Some(42)
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            interactions_file: default_interactions_file(),
            artists_file: default_artists_file(),
            delimiter: default_delimiter(),
            logging: LoggingConfig::default(),
            model: ModelConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            kind: default_model_kind(),
            factors: default_factors(),
            regularization: default_regularization(),
            iterations: default_iterations(),
            alpha: default_alpha(),
            seed: default_seed(),
        }
    }
}

impl TomlConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Delimiter as the single byte the TSV readers expect
    pub fn delimiter_byte(&self) -> Result<u8> {
        match self.delimiter.as_bytes() {
            [b] if b.is_ascii() => Ok(*b),
            _ => Err(Error::Config(format!(
                "delimiter must be exactly one ASCII character, got {:?}",
                self.delimiter
            ))),
        }
    }

    /// Check field ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        self.delimiter_byte()?;
        self.logging.validate()?;
        self.model.validate()
    }
}

impl LoggingConfig {
    /// The level must name a tracing level; anything else would be read as
    /// a target directive by the env filter and silence most output.
    pub fn validate(&self) -> Result<()> {
        self.level.trim().parse::<tracing::Level>().map_err(|_| {
            Error::Config(format!(
                "logging.level must be one of trace, debug, info, warn, error; got {:?}",
                self.level
            ))
        })?;
        Ok(())
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<()> {
        if self.factors == 0 {
            return Err(Error::Config("model.factors must be at least 1".to_string()));
        }
        if self.iterations == 0 {
            return Err(Error::Config("model.iterations must be at least 1".to_string()));
        }
        if !self.regularization.is_finite() || self.regularization < 0.0 {
            return Err(Error::Config(format!(
                "model.regularization must be finite and >= 0, got {}",
                self.regularization
            )));
        }
        if !self.alpha.is_finite() || self.alpha <= 0.0 {
            return Err(Error::Config(format!(
                "model.alpha must be finite and > 0, got {}",
                self.alpha
            )));
        }
        Ok(())
    }
}

/// Read one TOML config file
///
/// Fails with `NotFound` when the file does not exist and `Config` when it
/// cannot be parsed or validated.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        return Err(Error::NotFound(format!("config file {}", path.display())));
    }
    let content = std::fs::read_to_string(path)?;
    TomlConfig::from_toml_str(&content)
}

/// Locate the config file following the priority order
///
/// 1. Command-line argument
/// 2. `MCF_CONFIG` environment variable
/// 3. `<platform config dir>/mcf/config.toml`, only if it exists
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Some(path) = env_path(CONFIG_ENV_VAR) {
        return Some(path);
    }

    default_config_path().filter(|path| path.exists())
}

/// Platform config file location (`~/.config/mcf/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mcf").join("config.toml"))
}

/// Where the active settings came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from this file
    File(PathBuf),
    /// This file was requested but does not exist; defaults in use
    Missing(PathBuf),
    /// No file requested and none at the platform location
    Defaults,
}

impl ConfigSource {
    /// Report the outcome of [`load_or_default`]
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => {
                info!("Loaded TOML configuration from {}", path.display())
            }
            ConfigSource::Missing(path) => warn!(
                "Config file {} not found, using built-in defaults",
                path.display()
            ),
            ConfigSource::Defaults => info!("No config file found, using built-in defaults"),
        }
    }
}

/// Configuration together with its source
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: TomlConfig,
    pub source: ConfigSource,
}

/// Load configuration with graceful degradation
///
/// A missing file falls back to built-in defaults and is reported as
/// [`ConfigSource::Missing`]; parse and validation failures propagate.
pub fn load_or_default(cli_arg: Option<&Path>) -> Result<LoadedConfig> {
    let Some(path) = resolve_config_path(cli_arg) else {
        return Ok(LoadedConfig {
            config: TomlConfig::default(),
            source: ConfigSource::Defaults,
        });
    };

    match load_toml_config(&path) {
        Ok(config) => Ok(LoadedConfig {
            config,
            source: ConfigSource::File(path),
        }),
        Err(Error::NotFound(_)) => Ok(LoadedConfig {
            config: TomlConfig::default(),
            source: ConfigSource::Missing(path),
        }),
        Err(e) => Err(e),
    }
}

/// Resolved locations of the two input files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub data_dir: PathBuf,
    pub interactions: PathBuf,
    pub artists: PathBuf,
}

impl DataPaths {
    /// Resolve input file paths
    ///
    /// The data directory comes from the CLI, then `MCF_DATA_DIR`, then the
    /// TOML `data_dir`, then [`DEFAULT_DATA_DIR`]. Explicit per-file CLI
    /// paths bypass the data directory entirely.
    pub fn resolve(
        cli_data_dir: Option<&Path>,
        cli_interactions: Option<&Path>,
        cli_artists: Option<&Path>,
        config: &TomlConfig,
    ) -> Self {
        let data_dir = cli_data_dir
            .map(Path::to_path_buf)
            .or_else(|| env_path(DATA_DIR_ENV_VAR))
            .or_else(|| config.data_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let interactions = cli_interactions
            .map(Path::to_path_buf)
            .unwrap_or_else(|| data_dir.join(&config.interactions_file));
        let artists = cli_artists
            .map(Path::to_path_buf)
            .unwrap_or_else(|| data_dir.join(&config.artists_file));

        Self {
            data_dir,
            interactions,
            artists,
        }
    }
}

/// Read a path from an environment variable, ignoring empty values
fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
