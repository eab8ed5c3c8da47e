//! Integration tests for configuration loading and path resolution
//!
//! Tests that manipulate MCF_CONFIG or MCF_DATA_DIR are marked with #[serial]
//! so they run sequentially, not in parallel.

use mcf_common::config::{
    load_or_default, load_toml_config, resolve_config_path, CONFIG_ENV_VAR, DATA_DIR_ENV_VAR,
    DEFAULT_DATA_DIR,
};
use mcf_common::{ConfigSource, DataPaths, Error, ModelKind, TomlConfig};
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tracing_subscriber::{layer::SubscriberExt, Registry};

/// Collects (level, message) for every event
#[derive(Clone, Default)]
struct LogCapture {
    events: Arc<Mutex<Vec<(tracing::Level, String)>>>,
}

impl LogCapture {
    fn events(&self) -> Vec<(tracing::Level, String)> {
        self.events.lock().unwrap().clone()
    }
}

impl<S> tracing_subscriber::Layer<S> for LogCapture
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.events
            .lock()
            .unwrap()
            .push((*event.metadata().level(), visitor.message));
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }
}

fn capture_logs(f: impl FnOnce()) -> Vec<(tracing::Level, String)> {
    let capture = LogCapture::default();
    let subscriber = Registry::default().with(capture.clone());
    tracing::subscriber::with_default(subscriber, f);
    capture.events()
}

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_full_config() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(
        &temp_dir,
        r#"
data_dir = "/srv/lastfm"
interactions_file = "plays.tsv"
artists_file = "names.tsv"
delimiter = ","

[logging]
level = "debug"

[model]
kind = "popularity"
factors = 16
regularization = 0.1
iterations = 5
alpha = 2.0
seed = 7
"#,
    );

    let config = load_toml_config(&path).unwrap();

    assert_eq!(config.data_dir, Some(PathBuf::from("/srv/lastfm")));
    assert_eq!(config.interactions_file, "plays.tsv");
    assert_eq!(config.artists_file, "names.tsv");
    assert_eq!(config.delimiter_byte().unwrap(), b',');
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.model.kind, ModelKind::Popularity);
    assert_eq!(config.model.factors, 16);
    assert_eq!(config.model.iterations, 5);
    assert_eq!(config.model.seed, Some(7));
}

#[test]
fn test_partial_config_keeps_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(&temp_dir, "[model]\nfactors = 8\n");

    let config = load_toml_config(&path).unwrap();

    assert_eq!(config.model.factors, 8);
    assert_eq!(config.model.iterations, 15);
    assert_eq!(config.artists_file, "artists.dat");
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_missing_config_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let result = load_toml_config(&temp_dir.path().join("absent.toml"));
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[test]
fn test_malformed_config_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(&temp_dir, "[model\nfactors = ");
    assert!(matches!(load_toml_config(&path), Err(Error::Config(_))));
}

#[test]
fn test_invalid_values_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(&temp_dir, "[model]\niterations = 0\n");
    assert!(matches!(load_toml_config(&path), Err(Error::Config(_))));

    let path = write_config(&temp_dir, "[logging]\nlevel = \"verbose\"\n");
    assert!(matches!(load_toml_config(&path), Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_load_or_default_with_missing_cli_file() {
    env::remove_var(CONFIG_ENV_VAR);
    let temp_dir = TempDir::new().unwrap();

    let missing = temp_dir.path().join("nope.toml");

    let loaded = load_or_default(Some(&missing)).unwrap();

    assert_eq!(loaded.config.model.factors, TomlConfig::default().model.factors);
    assert_eq!(loaded.source, ConfigSource::Missing(missing));
}

#[test]
#[serial]
fn test_missing_config_is_logged_as_warning() {
    env::remove_var(CONFIG_ENV_VAR);
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nope.toml");

    // Loading runs before any subscriber exists; the outcome is logged later
    let during_load = capture_logs(|| {
        load_or_default(Some(&missing)).unwrap();
    });
    assert!(during_load.is_empty());

    let source = load_or_default(Some(&missing)).unwrap().source;
    let events = capture_logs(|| source.log());

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].0, tracing::Level::WARN);
    assert!(events[0].1.contains("not found, using built-in defaults"));
    assert!(events[0].1.contains("nope.toml"));
}

#[test]
#[serial]
fn test_loaded_config_is_logged_as_info() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(&temp_dir, "[model]\nfactors = 3\n");

    let source = load_or_default(Some(&path)).unwrap().source;
    let events = capture_logs(|| source.log());

    assert_eq!(source, ConfigSource::File(path));
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].0, tracing::Level::INFO);
    assert!(events[0].1.starts_with("Loaded TOML configuration from"));
}

#[test]
#[serial]
fn test_load_or_default_propagates_parse_errors() {
    env::remove_var(CONFIG_ENV_VAR);
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(&temp_dir, "delimiter = 5");

    assert!(load_or_default(Some(&path)).is_err());
}

#[test]
#[serial]
fn test_config_path_cli_takes_precedence_over_env() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/mcf-env-config.toml");

    let resolved = resolve_config_path(Some(Path::new("/tmp/mcf-cli-config.toml")));
    assert_eq!(resolved, Some(PathBuf::from("/tmp/mcf-cli-config.toml")));

    let resolved = resolve_config_path(None);
    assert_eq!(resolved, Some(PathBuf::from("/tmp/mcf-env-config.toml")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_config_from_env_var_is_loaded() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(&temp_dir, "[model]\nfactors = 3\n");
    env::set_var(CONFIG_ENV_VAR, &path);

    let loaded = load_or_default(None).unwrap();
    assert_eq!(loaded.config.model.factors, 3);
    assert_eq!(loaded.source, ConfigSource::File(path));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_data_paths_default() {
    env::remove_var(DATA_DIR_ENV_VAR);

    let paths = DataPaths::resolve(None, None, None, &TomlConfig::default());

    assert_eq!(paths.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
    assert_eq!(paths.interactions, Path::new(DEFAULT_DATA_DIR).join("user_artists.dat"));
    assert_eq!(paths.artists, Path::new(DEFAULT_DATA_DIR).join("artists.dat"));
}

#[test]
#[serial]
fn test_data_paths_priority() {
    let config = TomlConfig {
        data_dir: Some(PathBuf::from("/from/toml")),
        ..TomlConfig::default()
    };

    env::remove_var(DATA_DIR_ENV_VAR);
    let paths = DataPaths::resolve(None, None, None, &config);
    assert_eq!(paths.data_dir, PathBuf::from("/from/toml"));

    env::set_var(DATA_DIR_ENV_VAR, "/from/env");
    let paths = DataPaths::resolve(None, None, None, &config);
    assert_eq!(paths.data_dir, PathBuf::from("/from/env"));

    let paths = DataPaths::resolve(Some(Path::new("/from/cli")), None, None, &config);
    assert_eq!(paths.data_dir, PathBuf::from("/from/cli"));
    assert_eq!(paths.artists, PathBuf::from("/from/cli/artists.dat"));

    env::remove_var(DATA_DIR_ENV_VAR);
}

#[test]
#[serial]
fn test_explicit_file_paths_bypass_data_dir() {
    env::remove_var(DATA_DIR_ENV_VAR);

    let paths = DataPaths::resolve(
        Some(Path::new("/data")),
        Some(Path::new("/elsewhere/plays.tsv")),
        None,
        &TomlConfig::default(),
    );

    assert_eq!(paths.interactions, PathBuf::from("/elsewhere/plays.tsv"));
    assert_eq!(paths.artists, PathBuf::from("/data/artists.dat"));
}
