//! # MCF Common Library
//!
//! Shared code for the music collaborative filtering crates:
//! - Configuration loading (TOML bootstrap file + environment + CLI priority)
//! - Data file path resolution
//! - Common error type

pub mod config;
pub mod error;

pub use config::{ConfigSource, DataPaths, LoadedConfig, LoggingConfig, ModelConfig, ModelKind, TomlConfig};
pub use error::{Error, Result};
