//! Popularity baseline
//!
//! Scores every artist by its total weight across all users. Useful as a
//! sanity check against ALS and for datasets too small to factorize.

use super::{top_n, FactorizationModel, ModelError};
use crate::matrix::{InteractionMatrix, UserRow};

#[derive(Debug, Clone, Default)]
pub struct Popularity {
    /// Total weight per artist; None until trained
    totals: Option<Vec<f32>>,
}

impl Popularity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trained total for `artist_id`
    pub fn total(&self, artist_id: u32) -> Option<f32> {
        self.totals.as_ref()?.get(artist_id as usize).copied()
    }
}

impl FactorizationModel for Popularity {
    fn name(&self) -> &'static str {
        "popularity"
    }

    fn train(&mut self, matrix: &InteractionMatrix) -> Result<(), ModelError> {
        if matrix.nnz() == 0 {
            return Err(ModelError::EmptyMatrix);
        }

        let mut sums = vec![0f64; matrix.cols()];
        for (_, artist_id, weight) in matrix.iter() {
            sums[artist_id as usize] += weight as f64;
        }
        self.totals = Some(sums.into_iter().map(|s| s as f32).collect());
        Ok(())
    }

    fn score(&self, row: UserRow<'_>, top_n_count: usize) -> Result<Vec<(u32, f32)>, ModelError> {
        let totals = self.totals.as_ref().ok_or(ModelError::NotTrained)?;

        let candidates = totals
            .iter()
            .enumerate()
            .filter(|(a, total)| **total > 0.0 && !row.contains(*a as u32))
            .map(|(a, &total)| (a as u32, total));

        Ok(top_n(candidates, top_n_count))
    }
}
