//! Recommendation engine
//!
//! Owns the artist catalog, a factorization model and, once fitted, the
//! interaction matrix it was trained on.
//!
//! # State machine
//! `Unfit` → (`fit`) → `Fit`. Re-fitting retrains and replaces the stored
//! matrix; a failed fit leaves the previous state in place.
//!
//! # Failure policy
//! Precondition failures (`NotFitted`, `OutOfRange`, `NotLoaded`) are hard
//! errors. A failure inside the model's `score` is logged and reported as an
//! empty result by [`RecommendationEngine::recommend`];
//! [`RecommendationEngine::recommend_outcome`] exposes it as
//! [`RecommendOutcome::ScoringFailed`] for callers that need to tell it apart
//! from "nothing to recommend".

use crate::catalog::ArtistCatalog;
use crate::error::{Error, Result};
use crate::matrix::InteractionMatrix;
use crate::model::FactorizationModel;
use tracing::{error, info};

/// One recommended artist
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub artist_id: u32,
    pub artist_name: String,
    pub score: f32,
}

/// Recommendations ordered by descending score
pub type RecommendationResult = Vec<Recommendation>;

/// Tagged result of a recommendation request
#[derive(Debug, Clone, PartialEq)]
pub enum RecommendOutcome {
    /// Scoring succeeded (the list may still be empty)
    Recommended(RecommendationResult),
    /// The model's scoring step failed
    ScoringFailed { reason: String },
}

impl RecommendOutcome {
    /// Collapse to a plain list; scoring failures become empty
    pub fn into_recommendations(self) -> RecommendationResult {
        match self {
            RecommendOutcome::Recommended(recommendations) => recommendations,
            RecommendOutcome::ScoringFailed { .. } => Vec::new(),
        }
    }
}

enum EngineState {
    Unfit,
    Fit { matrix: InteractionMatrix },
}

/// Computes recommendations for a user with a pluggable factorization model
pub struct RecommendationEngine {
    catalog: ArtistCatalog,
    model: Box<dyn FactorizationModel>,
    state: EngineState,
}

impl RecommendationEngine {
    pub fn new(catalog: ArtistCatalog, model: Box<dyn FactorizationModel>) -> Self {
        Self {
            catalog,
            model,
            state: EngineState::Unfit,
        }
    }

    pub fn is_fitted(&self) -> bool {
        matches!(self.state, EngineState::Fit { .. })
    }

    /// Matrix the model was last fitted on
    pub fn matrix(&self) -> Option<&InteractionMatrix> {
        match &self.state {
            EngineState::Fit { matrix } => Some(matrix),
            EngineState::Unfit => None,
        }
    }

    pub fn model_name(&self) -> &'static str {
        self.model.name()
    }

    pub fn catalog(&self) -> &ArtistCatalog {
        &self.catalog
    }

    /// Train the model on `matrix` and keep the matrix for later lookups
    ///
    /// # Errors
    /// `Model` if training fails; the engine keeps its previous state.
    pub fn fit(&mut self, matrix: InteractionMatrix) -> Result<()> {
        let (rows, cols) = matrix.shape();
        info!(
            model = self.model.name(),
            rows,
            cols,
            "Fitting model to user-artist data..."
        );

        self.model.train(&matrix)?;
        self.state = EngineState::Fit { matrix };

        info!("Model fitting completed.");
        Ok(())
    }

    /// Top `n` named recommendations for `user_id`
    ///
    /// `n <= 0` yields an empty result. Scoring failures yield an empty
    /// result as well, see [`Self::recommend_outcome`].
    ///
    /// # Errors
    /// - `NotFitted` before [`Self::fit`]
    /// - `OutOfRange` if `user_id` is negative or not a row of the fitted matrix
    /// - `NotLoaded` if the catalog was never loaded
    pub fn recommend(&self, user_id: i64, n: i64) -> Result<RecommendationResult> {
        Ok(self.recommend_outcome(user_id, n)?.into_recommendations())
    }

    /// Same as [`Self::recommend`] but distinguishes scoring failures
    pub fn recommend_outcome(&self, user_id: i64, n: i64) -> Result<RecommendOutcome> {
        let matrix = match &self.state {
            EngineState::Fit { matrix } => matrix,
            EngineState::Unfit => return Err(Error::NotFitted),
        };

        let row = usize::try_from(user_id)
            .ok()
            .and_then(|u| matrix.row(u))
            .ok_or(Error::OutOfRange {
                user_id,
                rows: matrix.rows(),
            })?;

        if n <= 0 {
            return Ok(RecommendOutcome::Recommended(Vec::new()));
        }
        let n = usize::try_from(n).unwrap_or(usize::MAX);

        info!("Generating top {} recommendations for user {}...", n, user_id);

        let mut scored = match self.model.score(row, n) {
            Ok(scored) => scored,
            Err(e) => {
                error!(
                    user_id,
                    model = self.model.name(),
                    error = %e,
                    "Error generating recommendations"
                );
                return Ok(RecommendOutcome::ScoringFailed {
                    reason: e.to_string(),
                });
            }
        };
        scored.truncate(n);

        let recommendations = scored
            .into_iter()
            .map(|(artist_id, score)| {
                Ok(Recommendation {
                    artist_id,
                    artist_name: self.catalog.resolve(artist_id)?.into_owned(),
                    score,
                })
            })
            .collect::<Result<RecommendationResult>>()?;

        info!("Recommendation generation completed.");
        Ok(RecommendOutcome::Recommended(recommendations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{unknown_artist_name, ArtistRecord};
    use crate::matrix::{InteractionRecord, UserRow};
    use crate::model::ModelError;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Returns a fixed list for every user
    struct ScriptedModel {
        scores: Vec<(u32, f32)>,
        trained: Rc<Cell<usize>>,
    }

    impl FactorizationModel for ScriptedModel {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn train(&mut self, _matrix: &InteractionMatrix) -> std::result::Result<(), ModelError> {
            self.trained.set(self.trained.get() + 1);
            Ok(())
        }

        fn score(
            &self,
            _row: UserRow<'_>,
            _top_n: usize,
        ) -> std::result::Result<Vec<(u32, f32)>, ModelError> {
            Ok(self.scores.clone())
        }
    }

    /// Trains once, then fails training and scoring
    struct BrokenModel {
        trains: usize,
    }

    impl FactorizationModel for BrokenModel {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn train(&mut self, _matrix: &InteractionMatrix) -> std::result::Result<(), ModelError> {
            self.trains += 1;
            if self.trains > 1 {
                return Err(ModelError::Numerical("diverged".to_string()));
            }
            Ok(())
        }

        fn score(
            &self,
            _row: UserRow<'_>,
            _top_n: usize,
        ) -> std::result::Result<Vec<(u32, f32)>, ModelError> {
            Err(ModelError::Numerical("scoring blew up".to_string()))
        }
    }

    fn alpha_catalog() -> ArtistCatalog {
        ArtistCatalog::from_records([ArtistRecord {
            artist_id: 10,
            name: "Alpha".to_string(),
        }])
    }

    fn matrix(rows: &[(u32, u32, f64)]) -> InteractionMatrix {
        let records: Vec<_> = rows
            .iter()
            .map(|&(u, a, w)| InteractionRecord::new(u, a, w))
            .collect();
        InteractionMatrix::from_records(&records).unwrap()
    }

    fn scripted(scores: Vec<(u32, f32)>) -> (Box<dyn FactorizationModel>, Rc<Cell<usize>>) {
        let trained = Rc::new(Cell::new(0));
        let model = ScriptedModel {
            scores,
            trained: Rc::clone(&trained),
        };
        (Box::new(model), trained)
    }

    #[test]
    fn test_recommend_before_fit() {
        let (model, _) = scripted(vec![]);
        let engine = RecommendationEngine::new(alpha_catalog(), model);

        assert!(!engine.is_fitted());
        assert!(matches!(engine.recommend(0, 5), Err(Error::NotFitted)));
    }

    #[test]
    fn test_resolves_names_in_model_order() {
        let (model, trained) = scripted(vec![(10, 0.9), (5, 0.4)]);
        let mut engine = RecommendationEngine::new(alpha_catalog(), model);
        engine.fit(matrix(&[(0, 10, 5.0), (0, 10, 3.0), (1, 10, 1.0)])).unwrap();

        let result = engine.recommend(0, 2).unwrap();

        assert_eq!(trained.get(), 1);
        assert_eq!(
            result,
            vec![
                Recommendation {
                    artist_id: 10,
                    artist_name: "Alpha".to_string(),
                    score: 0.9,
                },
                Recommendation {
                    artist_id: 5,
                    artist_name: unknown_artist_name(5),
                    score: 0.4,
                },
            ]
        );
    }

    #[test]
    fn test_out_of_range_users() {
        let (model, _) = scripted(vec![(10, 0.9)]);
        let mut engine = RecommendationEngine::new(alpha_catalog(), model);
        engine.fit(matrix(&[(0, 10, 1.0), (1, 10, 1.0)])).unwrap();

        assert!(matches!(
            engine.recommend(2, 5),
            Err(Error::OutOfRange { user_id: 2, rows: 2 })
        ));
        assert!(matches!(engine.recommend(-1, 5), Err(Error::OutOfRange { .. })));
        // Bounds are checked even when nothing is requested
        assert!(matches!(engine.recommend(7, 0), Err(Error::OutOfRange { .. })));
    }

    #[test]
    fn test_non_positive_n_is_empty() {
        let (model, _) = scripted(vec![(10, 0.9)]);
        let mut engine = RecommendationEngine::new(alpha_catalog(), model);
        engine.fit(matrix(&[(0, 10, 1.0)])).unwrap();

        assert!(engine.recommend(0, 0).unwrap().is_empty());
        assert!(engine.recommend(0, -3).unwrap().is_empty());
    }

    #[test]
    fn test_output_truncated_to_n() {
        let (model, _) = scripted(vec![(10, 0.9), (11, 0.5), (12, 0.1)]);
        let mut engine = RecommendationEngine::new(alpha_catalog(), model);
        engine.fit(matrix(&[(0, 1, 1.0)])).unwrap();

        let result = engine.recommend(0, 2).unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].artist_name, "Alpha");
    }

    #[test]
    fn test_scoring_failure_is_soft() {
        let mut engine =
            RecommendationEngine::new(alpha_catalog(), Box::new(BrokenModel { trains: 0 }));
        engine.fit(matrix(&[(0, 10, 1.0)])).unwrap();

        assert!(engine.recommend(0, 5).unwrap().is_empty());
        assert!(matches!(
            engine.recommend_outcome(0, 5).unwrap(),
            RecommendOutcome::ScoringFailed { .. }
        ));
    }

    #[test]
    fn test_failed_refit_keeps_previous_state() {
        let mut engine =
            RecommendationEngine::new(alpha_catalog(), Box::new(BrokenModel { trains: 0 }));
        engine.fit(matrix(&[(0, 10, 1.0)])).unwrap();

        let result = engine.fit(matrix(&[(0, 10, 1.0), (4, 10, 1.0)]));

        assert!(matches!(result, Err(Error::Model(ModelError::Numerical(_)))));
        assert!(engine.is_fitted());
        assert_eq!(engine.matrix().unwrap().rows(), 1);
    }

    #[test]
    fn test_refit_replaces_matrix() {
        let (model, trained) = scripted(vec![]);
        let mut engine = RecommendationEngine::new(alpha_catalog(), model);

        engine.fit(matrix(&[(0, 10, 1.0)])).unwrap();
        engine.fit(matrix(&[(0, 10, 1.0), (3, 10, 1.0)])).unwrap();

        assert_eq!(trained.get(), 2);
        assert_eq!(engine.matrix().unwrap().rows(), 4);
        assert!(engine.recommend(3, 5).unwrap().is_empty());
    }

    #[test]
    fn test_unloaded_catalog_is_hard_error() {
        let (model, _) = scripted(vec![(10, 0.9)]);
        let mut engine = RecommendationEngine::new(ArtistCatalog::new(), model);
        engine.fit(matrix(&[(0, 10, 1.0)])).unwrap();

        assert!(matches!(engine.recommend(0, 1), Err(Error::NotLoaded)));
    }
}
