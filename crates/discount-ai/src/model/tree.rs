/// Growth limits for a single regression tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// CART regression tree using squared error, stored as a flat node arena rooted at index 0.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

struct Split {
    feature: usize,
    threshold: f64,
    sse: f64,
}

impl RegressionTree {
    /// Grows a tree over the rows listed in `samples` (duplicates allowed for bootstrapping).
    pub fn fit(
        features: &[Vec<f64>],
        targets: &[f64],
        samples: Vec<usize>,
        params: &TreeParams,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(features, targets, samples, 0, params);
        tree
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut id = 0;
        loop {
            match self.nodes.get(id) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = row.get(*feature).copied().unwrap_or(0.0);
                    id = if value <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }

    pub fn depth(&self) -> usize {
        self.depth_from(0)
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, Node::Leaf { .. }))
            .count()
    }

    fn depth_from(&self, id: usize) -> usize {
        match self.nodes.get(id) {
            Some(Node::Split { left, right, .. }) => {
                1 + self.depth_from(*left).max(self.depth_from(*right))
            }
            _ => 0,
        }
    }

    fn grow(
        &mut self,
        features: &[Vec<f64>],
        targets: &[f64],
        samples: Vec<usize>,
        depth: usize,
        params: &TreeParams,
    ) -> usize {
        let id = self.nodes.len();
        let value = mean(samples.iter().map(|&idx| targets[idx]));
        self.nodes.push(Node::Leaf { value });

        let depth_allows = params.max_depth.map_or(true, |max| depth < max);
        if !depth_allows || samples.len() < params.min_samples_split.max(2) {
            return id;
        }

        let Some(split) = best_split(features, targets, &samples, params.min_samples_leaf) else {
            return id;
        };

        let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&idx| features[idx][split.feature] <= split.threshold);

        let left = self.grow(features, targets, left_samples, depth + 1, params);
        let right = self.grow(features, targets, right_samples, depth + 1, params);
        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }
}

fn mean<I: Iterator<Item = f64>>(values: I) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn sum_squared_error(sum: f64, sum_sq: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum_sq - sum * sum / count as f64
    }
}

fn best_split(
    features: &[Vec<f64>],
    targets: &[f64],
    samples: &[usize],
    min_samples_leaf: usize,
) -> Option<Split> {
    let min_leaf = min_samples_leaf.max(1);
    let total_sum: f64 = samples.iter().map(|&idx| targets[idx]).sum();
    let total_sq: f64 = samples.iter().map(|&idx| targets[idx] * targets[idx]).sum();
    let node_sse = sum_squared_error(total_sum, total_sq, samples.len());
    if node_sse <= 1e-12 {
        return None;
    }

    let width = samples
        .first()
        .map(|&idx| features[idx].len())
        .unwrap_or_default();
    let mut best: Option<Split> = None;
    let mut order = samples.to_vec();

    for feature in 0..width {
        order.sort_by(|a, b| features[*a][feature].total_cmp(&features[*b][feature]));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for position in 0..order.len() - 1 {
            let target = targets[order[position]];
            left_sum += target;
            left_sq += target * target;

            let left_count = position + 1;
            let right_count = order.len() - left_count;
            if left_count < min_leaf || right_count < min_leaf {
                continue;
            }

            let current = features[order[position]][feature];
            let next = features[order[position + 1]][feature];
            if current >= next {
                continue;
            }

            let sse = sum_squared_error(left_sum, left_sq, left_count)
                + sum_squared_error(total_sum - left_sum, total_sq - left_sq, right_count);
            if sse < node_sse && best.as_ref().map_or(true, |split| sse < split.sse) {
                let midpoint = current + (next - current) / 2.0;
                let threshold = if midpoint < next { midpoint } else { current };
                best = Some(Split {
                    feature,
                    threshold,
                    sse,
                });
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_step_function_exactly() {
        let features: Vec<Vec<f64>> = (0..10).map(|x| vec![x as f64]).collect();
        let targets: Vec<f64> = (0..10).map(|x| if x < 5 { 1.0 } else { 9.0 }).collect();
        let tree = RegressionTree::fit(
            &features,
            &targets,
            (0..10).collect(),
            &TreeParams::default(),
        );

        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.predict(&[2.0]), 1.0);
        assert_eq!(tree.predict(&[4.4]), 1.0);
        assert_eq!(tree.predict(&[4.6]), 9.0);
        assert_eq!(tree.predict(&[100.0]), 9.0);
    }

    #[test]
    fn constant_targets_produce_single_leaf() {
        let features: Vec<Vec<f64>> = (0..6).map(|x| vec![x as f64, 1.0]).collect();
        let targets = vec![3.5; 6];
        let tree = RegressionTree::fit(
            &features,
            &targets,
            (0..6).collect(),
            &TreeParams::default(),
        );

        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.predict(&[0.0, 1.0]), 3.5);
    }

    #[test]
    fn respects_max_depth() {
        let features: Vec<Vec<f64>> = (0..32).map(|x| vec![x as f64]).collect();
        let targets: Vec<f64> = (0..32).map(|x| (x * x) as f64).collect();
        let params = TreeParams {
            max_depth: Some(3),
            ..TreeParams::default()
        };
        let tree = RegressionTree::fit(&features, &targets, (0..32).collect(), &params);

        assert!(tree.depth() <= 3);
        assert!(tree.leaf_count() <= 8);
    }

    #[test]
    fn empty_sample_predicts_zero() {
        let tree = RegressionTree::fit(&[], &[], Vec::new(), &TreeParams::default());
        assert_eq!(tree.predict(&[1.0]), 0.0);
    }
}
