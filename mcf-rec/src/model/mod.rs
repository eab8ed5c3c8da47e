//! Factorization model capability
//!
//! The engine only needs two things from a model: `train` on an interaction
//! matrix and `score` one user's row into top-N (artist_id, score) pairs.
//! Implementations are selected by composition, see [`build_model`].
//!
//! # Implementations
//! 1. **als** - implicit-feedback alternating least squares
//! 2. **popularity** - total-weight baseline, no personalisation

pub mod als;
pub mod popularity;

pub use als::{AlsConfig, AlternatingLeastSquares};
pub use popularity::Popularity;

use crate::matrix::{InteractionMatrix, UserRow};
use mcf_common::{ModelConfig, ModelKind};
use std::cmp::Ordering;
use thiserror::Error;

/// Failures reported by a factorization model
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ModelError {
    #[error("model has not been trained")]
    NotTrained,

    #[error("cannot train on an empty interaction matrix")]
    EmptyMatrix,

    #[error("user {user_id} is outside the trained model ({users} users)")]
    UserOutOfRange { user_id: usize, users: usize },

    #[error("numerical failure: {0}")]
    Numerical(String),
}

/// Trainable top-N scorer
///
/// # Example
/// ```rust,ignore
/// let mut model = AlternatingLeastSquares::new(AlsConfig::default());
/// model.train(&matrix)?;
/// let top = model.score(matrix.row(2).unwrap(), 5)?;
/// ```
pub trait FactorizationModel {
    /// Model name for logging
    fn name(&self) -> &'static str;

    /// Fit to `matrix`, replacing any previous training
    fn train(&mut self, matrix: &InteractionMatrix) -> Result<(), ModelError>;

    /// Up to `top_n` (artist_id, score) pairs for `row.user_id`, descending by score
    fn score(&self, row: UserRow<'_>, top_n: usize) -> Result<Vec<(u32, f32)>, ModelError>;
}

/// Construct the configured model
pub fn build_model(config: &ModelConfig) -> Box<dyn FactorizationModel> {
    match config.kind {
        ModelKind::Als => Box::new(AlternatingLeastSquares::new(AlsConfig::from(config))),
        ModelKind::Popularity => Box::new(Popularity::new()),
    }
}

/// Keep the `n` best candidates, descending by score, ties by ascending id
pub(crate) fn top_n(candidates: impl Iterator<Item = (u32, f32)>, n: usize) -> Vec<(u32, f32)> {
    if n == 0 {
        return Vec::new();
    }

    let ranking = |a: &(u32, f32), b: &(u32, f32)| -> Ordering {
        b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
    };

    let mut scored: Vec<(u32, f32)> = candidates.collect();
    if scored.len() > n {
        scored.select_nth_unstable_by(n - 1, ranking);
        scored.truncate(n);
    }
    scored.sort_unstable_by(ranking);
    scored
}
