use crate::error::TrainError;

pub const DEFAULT_CASES: usize = 400;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_TREES: usize = 200;

/// Knobs for the one-time startup fit. The seed drives the synthetic corpus
/// directly and the forest through a derived seed, so two fits with equal
/// configs are identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainingConfig {
    pub cases: usize,
    pub seed: u64,
    pub trees: usize,
    /// Candidate features per split; `None` means `floor(sqrt(n_features))`.
    pub max_features: Option<usize>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            cases: DEFAULT_CASES,
            seed: DEFAULT_SEED,
            trees: DEFAULT_TREES,
            max_features: None,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<(), TrainError> {
        if self.cases == 0 {
            return Err(TrainError::NoCases);
        }
        if self.trees == 0 {
            return Err(TrainError::EmptyEnsemble);
        }
        Ok(())
    }

    pub fn features_per_split(&self, n_features: usize) -> usize {
        let default = (n_features as f64).sqrt().floor() as usize;
        self.max_features
            .unwrap_or(default)
            .clamp(1, n_features.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_startup_fit() {
        let config = TrainingConfig::default();
        assert_eq!(config.cases, 400);
        assert_eq!(config.trees, 200);
        assert_eq!(config.seed, 42);
        assert_eq!(config.features_per_split(12), 3);
    }

    #[test]
    fn rejects_empty_corpus_and_ensemble() {
        let no_cases = TrainingConfig {
            cases: 0,
            ..TrainingConfig::default()
        };
        assert_eq!(no_cases.validate(), Err(TrainError::NoCases));

        let no_trees = TrainingConfig {
            trees: 0,
            ..TrainingConfig::default()
        };
        assert_eq!(no_trees.validate(), Err(TrainError::EmptyEnsemble));
    }

    #[test]
    fn explicit_feature_count_is_clamped() {
        let config = TrainingConfig {
            max_features: Some(40),
            ..TrainingConfig::default()
        };
        assert_eq!(config.features_per_split(12), 12);
    }
}
