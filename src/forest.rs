//! Bagged ensemble of Gini decision trees.
//!
//! Each tree is grown to purity on a bootstrap resample, drawing a random
//! subset of candidate features at every split. Leaves keep the class
//! distribution of their samples; the forest averages those distributions.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

const MIN_SAMPLES_SPLIT: usize = 2;
const IMPURITY_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        distribution: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn leaf_for(&self, row: &[f64]) -> &[f64] {
        let mut node = self;
        loop {
            match node {
                Node::Leaf { distribution } => return distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold {
                        &**left
                    } else {
                        &**right
                    };
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ForestParams {
    pub trees: usize,
    pub max_features: usize,
}

/// Rows and encoded class ids of a training set.
pub struct Dataset<'a> {
    pub rows: &'a [Vec<f64>],
    pub targets: &'a [usize],
    pub n_classes: usize,
}

#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<Node>,
    n_classes: usize,
    n_features: usize,
}

impl RandomForest {
    /// Callers guarantee a non-empty dataset and at least one tree.
    pub fn fit(data: &Dataset<'_>, params: ForestParams, rng: &mut StdRng) -> Self {
        let n_samples = data.rows.len();
        let n_features = data.rows.first().map_or(0, Vec::len);
        let builder = TreeBuilder {
            data,
            n_features,
            max_features: params.max_features.clamp(1, n_features.max(1)),
        };

        let trees = (0..params.trees)
            .map(|_| {
                let mut sample: Vec<usize> =
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
                builder.grow(&mut sample, rng)
            })
            .collect();

        Self {
            trees,
            n_classes: data.n_classes,
            n_features,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Mean of the per-tree leaf distributions, renormalised to sum to one.
    pub fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        let mut totals = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (total, p) in totals.iter_mut().zip(tree.leaf_for(row)) {
                *total += p;
            }
        }

        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            for total in totals.iter_mut() {
                *total /= sum;
            }
        }
        totals
    }
}

struct TreeBuilder<'d, 'a> {
    data: &'d Dataset<'a>,
    n_features: usize,
    max_features: usize,
}

struct Candidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

impl TreeBuilder<'_, '_> {
    fn grow(&self, sample: &mut [usize], rng: &mut StdRng) -> Node {
        let counts = self.class_counts(sample);
        let occupied = counts.iter().filter(|count| **count > 0.0).count();
        if occupied <= 1 || sample.len() < MIN_SAMPLES_SPLIT {
            return self.leaf(&counts, sample.len());
        }

        let Some(best) = self.best_split(sample, &counts, rng) else {
            return self.leaf(&counts, sample.len());
        };

        let (feature, threshold) = (best.feature, best.threshold);
        let split_at = partition(sample, |index| self.data.rows[index][feature] <= threshold);
        let (left, right) = sample.split_at_mut(split_at);

        Node::Split {
            feature,
            threshold,
            left: Box::new(self.grow(left, rng)),
            right: Box::new(self.grow(right, rng)),
        }
    }

    fn leaf(&self, counts: &[f64], total: usize) -> Node {
        let total = total.max(1) as f64;
        Node::Leaf {
            distribution: counts.iter().map(|count| count / total).collect(),
        }
    }

    fn class_counts(&self, sample: &[usize]) -> Vec<f64> {
        let mut counts = vec![0.0; self.data.n_classes];
        for &index in sample {
            counts[self.data.targets[index]] += 1.0;
        }
        counts
    }

    /// Visits features in random order. Features that are constant within the
    /// node are skipped and do not use up the `max_features` budget. Once the
    /// budget is spent the search stops as soon as any valid split exists.
    fn best_split(
        &self,
        sample: &mut [usize],
        counts: &[f64],
        rng: &mut StdRng,
    ) -> Option<Candidate> {
        let parent = weighted_gini(counts, sample.len() as f64);
        let mut order: Vec<usize> = (0..self.n_features).collect();
        order.shuffle(rng);

        let mut best: Option<Candidate> = None;
        let mut searched = 0;
        for &feature in &order {
            if searched >= self.max_features && best.is_some() {
                break;
            }
            let Some(candidate) = self.best_threshold(sample, feature, counts) else {
                continue;
            };
            searched += 1;

            let improves = candidate.impurity < parent - IMPURITY_EPSILON;
            let beats = best
                .as_ref()
                .map_or(true, |current| candidate.impurity < current.impurity);
            if improves && beats {
                best = Some(candidate);
            }
        }
        best
    }

    /// Best cut on one feature, or `None` when the feature is constant here.
    fn best_threshold(
        &self,
        sample: &mut [usize],
        feature: usize,
        counts: &[f64],
    ) -> Option<Candidate> {
        let rows = self.data.rows;
        sample.sort_by(|a, b| rows[*a][feature].total_cmp(&rows[*b][feature]));

        let total = sample.len() as f64;
        let mut left = vec![0.0; counts.len()];
        let mut best: Option<Candidate> = None;

        for position in 0..sample.len() - 1 {
            left[self.data.targets[sample[position]]] += 1.0;
            let here = rows[sample[position]][feature];
            let next = rows[sample[position + 1]][feature];
            if here == next {
                continue;
            }

            let n_left = (position + 1) as f64;
            let right: Vec<f64> = counts.iter().zip(&left).map(|(all, l)| all - l).collect();
            let impurity = weighted_gini(&left, n_left) + weighted_gini(&right, total - n_left);

            if best.as_ref().map_or(true, |current| impurity < current.impurity) {
                best = Some(Candidate {
                    feature,
                    threshold: midpoint(here, next),
                    impurity,
                });
            }
        }
        best
    }
}

/// `n * gini`, so children can be summed and compared with the parent.
fn weighted_gini(counts: &[f64], n: f64) -> f64 {
    if n <= 0.0 {
        return 0.0;
    }
    let squares: f64 = counts.iter().map(|count| count * count).sum();
    n - squares / n
}

fn midpoint(low: f64, high: f64) -> f64 {
    let mid = low + (high - low) / 2.0;
    if mid >= high {
        low
    } else {
        mid
    }
}

/// Moves every index satisfying `goes_left` to the front, returning the count.
fn partition(sample: &mut [usize], goes_left: impl Fn(usize) -> bool) -> usize {
    let mut boundary = 0;
    for i in 0..sample.len() {
        if goes_left(sample[i]) {
            sample.swap(boundary, i);
            boundary += 1;
        }
    }
    boundary
}
