use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::assemble::{self, RawRequest};
use crate::config::TrainingConfig;
use crate::error::TrainError;
use crate::forest::{Dataset, ForestParams, RandomForest};
use crate::generator::{self, TrainingCase};
use crate::models::{FeatureVector, LabelProbability, PredictionResponse, RankedPrediction};
use crate::schema::FEATURE_COUNT;

/// Mixed into the configured seed so the forest does not replay the corpus
/// stream.
const FOREST_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Trained diagnosis model. A value of this type only exists after a
/// successful fit and is never mutated afterwards, so it can be shared across
/// threads freely.
#[derive(Debug, Clone)]
pub struct Classifier {
    classes: Vec<String>,
    forest: RandomForest,
}

impl Classifier {
    /// Generates the synthetic corpus, fits the ensemble and drops the corpus.
    pub fn train(config: &TrainingConfig) -> Result<Self, TrainError> {
        config.validate()?;
        let mut corpus_rng = StdRng::seed_from_u64(config.seed);
        let cases = generator::generate_cases(config.cases, &mut corpus_rng);
        Self::fit(&cases, config)
    }

    pub fn fit(cases: &[TrainingCase], config: &TrainingConfig) -> Result<Self, TrainError> {
        config.validate()?;
        if cases.is_empty() {
            return Err(TrainError::NoCases);
        }

        let classes: Vec<String> = cases
            .iter()
            .map(|case| case.label.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();
        if classes.len() < 2 {
            return Err(TrainError::DegenerateLabels {
                found: classes.len(),
            });
        }

        let rows: Vec<Vec<f64>> = cases
            .iter()
            .map(|case| case.features.to_row().to_vec())
            .collect();
        let targets: Vec<usize> = cases
            .iter()
            .map(|case| {
                classes
                    .iter()
                    .position(|class| class == case.label.as_str())
                    .unwrap_or_else(|| unreachable!("class list is built from these labels"))
            })
            .collect();

        let params = ForestParams {
            trees: config.trees,
            max_features: config.features_per_split(FEATURE_COUNT),
        };
        let data = Dataset {
            rows: &rows,
            targets: &targets,
            n_classes: classes.len(),
        };
        let mut forest_rng = StdRng::seed_from_u64(forest_seed(config.seed));
        let forest = RandomForest::fit(&data, params, &mut forest_rng);

        log::info!(
            "trained {} trees on {} cases x {} features over {} labels: {}",
            forest.n_trees(),
            cases.len(),
            forest.n_features(),
            classes.len(),
            classes.join(", ")
        );

        Ok(Self { classes, forest })
    }

    /// Labels in native order, which is also the tie-break order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn predict(&self, features: &FeatureVector) -> RankedPrediction {
        let proba = self.forest.predict_proba(&features.to_row());
        rank(&self.classes, &proba)
    }
}

fn forest_seed(seed: u64) -> u64 {
    seed ^ FOREST_SEED_SALT
}

/// Answers one JSON request. Validation failures become a failure response
/// rather than an error, so callers always get a body to hand back.
pub fn respond(classifier: &Classifier, payload: &str) -> PredictionResponse {
    match RawRequest::from_json(payload).and_then(|request| assemble::assemble(&request)) {
        Ok(features) => PredictionResponse::success(&classifier.predict(&features)),
        Err(err) => {
            log::warn!("rejected prediction request: {err}");
            PredictionResponse::failure(err)
        }
    }
}

/// Sorts by probability, highest first. Equal probabilities keep class order.
pub fn rank(classes: &[String], proba: &[f64]) -> RankedPrediction {
    let mut order: Vec<usize> = (0..classes.len()).collect();
    order.sort_by(|a, b| proba[*b].total_cmp(&proba[*a]));

    RankedPrediction {
        ranking: order
            .into_iter()
            .map(|index| LabelProbability {
                label: classes[index].clone(),
                prob: proba[index],
            })
            .collect(),
    }
}
