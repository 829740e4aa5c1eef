use rand::{rngs::SmallRng, Rng, SeedableRng};

use super::tree::{RegressionTree, TreeParams};

/// Hyperparameters of the bagged ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForestParams {
    pub trees: usize,
    pub seed: u64,
    pub tree: TreeParams,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            trees: 200,
            seed: 42,
            tree: TreeParams::default(),
        }
    }
}

/// Bootstrap-aggregated regression trees; predictions average every tree.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForestRegressor {
    trees: Vec<RegressionTree>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForestError {
    #[error("cannot fit a forest on an empty dataset")]
    EmptyDataset,
    #[error("{features} feature rows but {targets} targets")]
    LengthMismatch { features: usize, targets: usize },
    #[error("forest needs at least one tree")]
    NoTrees,
}

impl RandomForestRegressor {
    pub fn fit(
        features: &[Vec<f64>],
        targets: &[f64],
        params: &ForestParams,
    ) -> Result<Self, ForestError> {
        if features.len() != targets.len() {
            return Err(ForestError::LengthMismatch {
                features: features.len(),
                targets: targets.len(),
            });
        }
        if targets.is_empty() {
            return Err(ForestError::EmptyDataset);
        }
        if params.trees == 0 {
            return Err(ForestError::NoTrees);
        }

        let rows = targets.len();
        let mut rng = SmallRng::seed_from_u64(params.seed);
        let trees = (0..params.trees)
            .map(|_| {
                let bootstrap: Vec<usize> = (0..rows).map(|_| rng.gen_range(0..rows)).collect();
                RegressionTree::fit(features, targets, bootstrap, &params.tree)
            })
            .collect();

        Ok(Self { trees })
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let total: f64 = self.trees.iter().map(|tree| tree.predict(row)).sum();
        total / self.trees.len() as f64
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }
}
