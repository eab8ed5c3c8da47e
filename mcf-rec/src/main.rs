//! mcf-rec - Main entry point
//!
//! Loads the interaction and artist files, fits the configured
//! factorization model and prints the top-N artists for one user.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use mcf_common::config::load_or_default;
use mcf_common::{DataPaths, LoadedConfig, ModelKind, TomlConfig};
use mcf_rec::presentation::{format_json, format_text};
use mcf_rec::{build_model, ArtistCatalog, InteractionLoader, RecommendOutcome, RecommendationEngine};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Output rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Command-line arguments for mcf-rec
#[derive(Parser, Debug)]
#[command(name = "mcf-rec")]
#[command(about = "Artist recommendations from implicit listening counts")]
#[command(version)]
struct Args {
    /// TOML configuration file (falls back to MCF_CONFIG, then the platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the data files (falls back to MCF_DATA_DIR)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Interaction file, overrides data_dir + interactions_file
    #[arg(long)]
    interactions: Option<PathBuf>,

    /// Artist catalog file, overrides data_dir + artists_file
    #[arg(long)]
    artists: Option<PathBuf>,

    /// User to recommend for
    #[arg(short, long, default_value_t = 2, allow_negative_numbers = true)]
    user: i64,

    /// Number of recommendations
    #[arg(short = 'n', long, default_value_t = 5, allow_negative_numbers = true)]
    count: i64,

    /// Factorization model (als, popularity)
    #[arg(short, long)]
    model: Option<ModelKind>,

    /// Latent factor count
    #[arg(long)]
    factors: Option<usize>,

    /// Training iterations
    #[arg(long)]
    iterations: Option<usize>,

    /// L2 regularization
    #[arg(long)]
    regularization: Option<f32>,

    /// Confidence scaling for play counts
    #[arg(long)]
    alpha: Option<f32>,

    /// Initialisation seed
    #[arg(long)]
    seed: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    /// CLI model settings win over TOML
    fn apply_overrides(&self, config: &mut TomlConfig) {
        let model = &mut config.model;
        if let Some(kind) = self.model {
            model.kind = kind;
        }
        if let Some(factors) = self.factors {
            model.factors = factors;
        }
        if let Some(iterations) = self.iterations {
            model.iterations = iterations;
        }
        if let Some(regularization) = self.regularization {
            model.regularization = regularization;
        }
        if let Some(alpha) = self.alpha {
            model.alpha = alpha;
        }
        if self.seed.is_some() {
            model.seed = self.seed;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

fn init_tracing(default_level: &str) {
    // Logs go to stderr so JSON output on stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Nothing is logged here; the source is reported once tracing is up
    let LoadedConfig { mut config, source } =
        load_or_default(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply_overrides(&mut config);
    config.validate().context("Invalid configuration")?;

    init_tracing(&config.logging.level);

    info!(
        "Starting mcf-rec v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_ID"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    source.log();

    let paths = DataPaths::resolve(
        args.data_dir.as_deref(),
        args.interactions.as_deref(),
        args.artists.as_deref(),
        &config,
    );

    let matrix = InteractionLoader::from_config(&config)?
        .load(&paths.interactions)
        .context("Failed to load user-artist interactions")?;

    let mut catalog = ArtistCatalog::from_config(&config)?;
    catalog
        .load(&paths.artists)
        .context("Failed to load artist metadata")?;

    let model = build_model(&config.model);
    info!(model = model.name(), settings = ?config.model, "Model configured");

    let mut engine = RecommendationEngine::new(catalog, model);
    engine.fit(matrix).context("Failed to fit model")?;

    let recommendations = match engine
        .recommend_outcome(args.user, args.count)
        .with_context(|| format!("Failed to recommend for user {}", args.user))?
    {
        RecommendOutcome::Recommended(recommendations) => recommendations,
        RecommendOutcome::ScoringFailed { reason } => {
            warn!("Scoring failed, no recommendations available: {}", reason);
            Vec::new()
        }
    };

    match args.format {
        OutputFormat::Text => print!("{}", format_text(args.user, args.count, &recommendations)),
        OutputFormat::Json => println!(
            "{}",
            format_json(args.user, args.count, &recommendations)
                .context("Failed to render JSON")?
        ),
    }

    Ok(())
}
