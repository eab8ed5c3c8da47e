//! mcf-rec library - implicit-feedback collaborative filtering over
//! user–artist listening counts
//!
//! Data flow:
//! interaction file → [`InteractionLoader`] → [`InteractionMatrix`] →
//! [`RecommendationEngine::fit`] → [`RecommendationEngine::recommend`] →
//! [`ArtistCatalog::resolve`] → named, scored list → [`presentation`].

pub mod catalog;
pub mod engine;
pub mod error;
pub mod loader;
pub mod matrix;
pub mod model;
pub mod presentation;

mod tsv;

pub use catalog::{ArtistCatalog, ArtistRecord};
pub use engine::{Recommendation, RecommendOutcome, RecommendationEngine, RecommendationResult};
pub use error::{Error, Result};
pub use loader::InteractionLoader;
pub use matrix::{InteractionMatrix, InteractionRecord, UserRow};
pub use model::{build_model, FactorizationModel, ModelError};
