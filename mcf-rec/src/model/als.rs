//! Alternating least squares for implicit feedback
//!
//! Weights are treated as confidence `c = 1 + alpha * w` on a binary
//! preference (1 for every stored cell). Each half-iteration solves, for
//! every row on one side,
//!
//! ```text
//! (YᵀY + Σ (c - 1) y yᵀ + λI) x = Σ c y
//! ```
//!
//! where the sums run over that row's stored cells, so only the shared Gram
//! matrix YᵀY is dense work.

use super::{top_n, FactorizationModel, ModelError};
use crate::matrix::{InteractionMatrix, UserRow};
use mcf_common::ModelConfig;
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// ALS hyper-parameters
#[derive(Debug, Clone)]
pub struct AlsConfig {
    /// Number of latent factors (embedding dimension)
    pub factors: usize,
    /// Regularization parameter (lambda)
    pub regularization: f32,
    /// Number of iterations
    pub iterations: usize,
    /// Confidence scaling for implicit feedback
    pub alpha: f32,
    /// Initialisation seed; None uses OS entropy
    pub seed: Option<u64>,
}

impl Default for AlsConfig {
    fn default() -> Self {
        Self::from(&ModelConfig::default())
    }
}

impl From<&ModelConfig> for AlsConfig {
    fn from(config: &ModelConfig) -> Self {
        Self {
            factors: config.factors,
            regularization: config.regularization,
            iterations: config.iterations,
            alpha: config.alpha,
            seed: config.seed,
        }
    }
}

#[derive(Debug, Clone)]
struct Factors {
    /// [users x factors]
    users: Array2<f32>,
    /// [artists x factors]
    artists: Array2<f32>,
    /// Artists with at least one interaction; only these are candidates
    observed: Vec<bool>,
}

/// Implicit-feedback ALS model
#[derive(Debug, Clone)]
pub struct AlternatingLeastSquares {
    config: AlsConfig,
    factors: Option<Factors>,
}

impl AlternatingLeastSquares {
    pub fn new(config: AlsConfig) -> Self {
        Self {
            config,
            factors: None,
        }
    }

    pub fn config(&self) -> &AlsConfig {
        &self.config
    }

    pub fn is_trained(&self) -> bool {
        self.factors.is_some()
    }

    /// Latent vector of `user_id`, if trained and in range
    pub fn user_factors(&self, user_id: usize) -> Option<Vec<f32>> {
        let factors = self.factors.as_ref()?;
        (user_id < factors.users.nrows()).then(|| factors.users.row(user_id).to_vec())
    }

    /// Latent vector of `artist_id`, if trained and in range
    pub fn artist_factors(&self, artist_id: u32) -> Option<Vec<f32>> {
        let factors = self.factors.as_ref()?;
        let idx = artist_id as usize;
        (idx < factors.artists.nrows()).then(|| factors.artists.row(idx).to_vec())
    }

    fn random_factors(rng: &mut ChaCha8Rng, rows: usize, k: usize) -> Array2<f32> {
        Array2::from_shape_simple_fn((rows, k), || rng.gen_range(0.0..0.01))
    }

    /// Solve every row of `interactions` against the fixed side `fixed`
    fn solve_side(
        &self,
        interactions: &InteractionMatrix,
        fixed: &Array2<f32>,
        out: &mut Array2<f32>,
    ) -> Result<(), ModelError> {
        let k = self.config.factors;
        let alpha = self.config.alpha as f64;

        let mut gram = fixed.t().dot(fixed).mapv(f64::from);
        for i in 0..k {
            gram[[i, i]] += self.config.regularization as f64;
        }

        for r in 0..interactions.rows() {
            let Some(row) = interactions.row(r) else {
                continue;
            };
            if row.is_empty() {
                out.row_mut(r).fill(0.0);
                continue;
            }

            let mut a = gram.clone();
            let mut b = Array1::<f64>::zeros(k);
            for (other, weight) in row.iter() {
                let y = fixed.row(other as usize);
                let confidence = 1.0 + alpha * weight as f64;
                for i in 0..k {
                    let yi = y[i] as f64;
                    b[i] += confidence * yi;
                    for j in 0..k {
                        a[[i, j]] += (confidence - 1.0) * yi * y[j] as f64;
                    }
                }
            }

            let x = solve_cholesky(&a, &b)?;
            out.row_mut(r).assign(&x.mapv(|v| v as f32));
        }
        Ok(())
    }
}

impl FactorizationModel for AlternatingLeastSquares {
    fn name(&self) -> &'static str {
        "als"
    }

    fn train(&mut self, matrix: &InteractionMatrix) -> Result<(), ModelError> {
        if matrix.nnz() == 0 {
            return Err(ModelError::EmptyMatrix);
        }

        let k = self.config.factors;
        let mut rng = match self.config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let by_artist = matrix.transpose();
        let mut users = Self::random_factors(&mut rng, matrix.rows(), k);
        let mut artists = Self::random_factors(&mut rng, matrix.cols(), k);

        for iteration in 0..self.config.iterations {
            self.solve_side(matrix, &artists, &mut users)?;
            self.solve_side(&by_artist, &users, &mut artists)?;
            debug!(
                iteration = iteration + 1,
                iterations = self.config.iterations,
                "ALS iteration complete"
            );
        }

        let observed = (0..by_artist.rows())
            .map(|a| by_artist.row(a).is_some_and(|row| !row.is_empty()))
            .collect();

        self.factors = Some(Factors {
            users,
            artists,
            observed,
        });
        Ok(())
    }

    fn score(&self, row: UserRow<'_>, top_n_count: usize) -> Result<Vec<(u32, f32)>, ModelError> {
        let factors = self.factors.as_ref().ok_or(ModelError::NotTrained)?;
        if row.user_id >= factors.users.nrows() {
            return Err(ModelError::UserOutOfRange {
                user_id: row.user_id,
                users: factors.users.nrows(),
            });
        }

        let scores = factors.artists.dot(&factors.users.row(row.user_id));
        if scores.iter().any(|s| !s.is_finite()) {
            return Err(ModelError::Numerical(format!(
                "non-finite score for user {}",
                row.user_id
            )));
        }

        let candidates = scores
            .iter()
            .enumerate()
            .filter(|(a, _)| factors.observed[*a] && !row.contains(*a as u32))
            .map(|(a, &s)| (a as u32, s));

        Ok(top_n(candidates, top_n_count))
    }
}

/// Solve A·x = b for symmetric positive definite A
///
/// Cholesky factorisation A = L·Lᵀ, then forward and back substitution.
fn solve_cholesky(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>, ModelError> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }

            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 || !diag.is_finite() {
                    return Err(ModelError::Numerical(
                        "system is not positive definite; increase regularization".to_string(),
                    ));
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // L·y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // Lᵀ·x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    Ok(x)
}
