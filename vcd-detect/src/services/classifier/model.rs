//! Fitted binary classifier
//!
//! Supported artifact kinds:
//! - `random_forest`: flattened decision trees (`children_left`,
//!   `children_right`, `feature`, `threshold`, `value` per node). The class
//!   distribution is the mean of the per-tree normalized leaf weights.
//! - `logistic_regression`: `P(class 1) = sigmoid(coef · x + intercept)`.

use serde::Deserialize;

/// Marker for a leaf in `children_left` / `children_right`
const LEAF: i64 = -1;

/// One fitted decision tree
#[derive(Debug, Clone, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Per-node class weights, `classes.len()` entries each
    pub value: Vec<Vec<f64>>,
}

impl DecisionTree {
    fn node_count(&self) -> usize {
        self.children_left.len()
    }

    fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        let nodes = self.node_count();
        if nodes == 0 {
            return Err("tree has no nodes".to_string());
        }
        if self.children_right.len() != nodes
            || self.feature.len() != nodes
            || self.threshold.len() != nodes
            || self.value.len() != nodes
        {
            return Err("tree node arrays have different lengths".to_string());
        }

        for node in 0..nodes {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == LEAF || right == LEAF {
                if left != right {
                    return Err(format!("node {} has exactly one child", node));
                }
                let weights = &self.value[node];
                if weights.len() != n_classes {
                    return Err(format!(
                        "leaf {} has {} class weights, expected {}",
                        node,
                        weights.len(),
                        n_classes
                    ));
                }
                if weights.iter().any(|w| !w.is_finite() || *w < 0.0)
                    || weights.iter().sum::<f64>() <= 0.0
                {
                    return Err(format!("leaf {} has invalid class weights", node));
                }
                continue;
            }

            // Children always follow their parent, which also rules out cycles
            for child in [left, right] {
                if child <= node as i64 || child >= nodes as i64 {
                    return Err(format!("node {} has out-of-range child {}", node, child));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature as usize >= n_features {
                return Err(format!(
                    "node {} splits on feature {} (model has {})",
                    node, feature, n_features
                ));
            }
            if self.threshold[node].is_nan() {
                return Err(format!("node {} has NaN threshold", node));
            }
        }
        Ok(())
    }

    /// Normalized class distribution of the leaf `features` falls into
    fn leaf_distribution(&self, features: &[f64]) -> Vec<f64> {
        let mut node = 0usize;
        while self.children_left[node] != LEAF {
            let feature = self.feature[node] as usize;
            node = if features[feature] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }

        let weights = &self.value[node];
        let total: f64 = weights.iter().sum();
        weights.iter().map(|w| w / total).collect()
    }
}

/// Persisted classifier parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierState {
    RandomForest {
        classes: Vec<i64>,
        n_features: usize,
        trees: Vec<DecisionTree>,
    },
    LogisticRegression {
        classes: Vec<i64>,
        coef: Vec<f64>,
        intercept: f64,
    },
}

impl ClassifierState {
    pub fn n_features(&self) -> usize {
        match self {
            ClassifierState::RandomForest { n_features, .. } => *n_features,
            ClassifierState::LogisticRegression { coef, .. } => coef.len(),
        }
    }

    pub fn classes(&self) -> &[i64] {
        match self {
            ClassifierState::RandomForest { classes, .. } => classes,
            ClassifierState::LogisticRegression { classes, .. } => classes,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let classes = self.classes();
        let binary = classes.len() == 2 && classes.contains(&0) && classes.contains(&1);
        if !binary {
            return Err(format!("classes must be exactly {{0, 1}}, got {:?}", classes));
        }
        if self.n_features() == 0 {
            return Err("classifier has no features".to_string());
        }

        match self {
            ClassifierState::RandomForest {
                n_features, trees, ..
            } => {
                if trees.is_empty() {
                    return Err("random forest has no trees".to_string());
                }
                for (idx, tree) in trees.iter().enumerate() {
                    tree.validate(*n_features, classes.len())
                        .map_err(|e| format!("tree {}: {}", idx, e))?;
                }
            }
            ClassifierState::LogisticRegression {
                coef, intercept, ..
            } => {
                if !intercept.is_finite() || coef.iter().any(|c| !c.is_finite()) {
                    return Err("logistic regression weights must be finite".to_string());
                }
            }
        }
        Ok(())
    }

    /// Class distribution in `classes()` order
    pub fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        match self {
            ClassifierState::RandomForest { classes, trees, .. } => {
                let mut sums = vec![0.0f64; classes.len()];
                for tree in trees {
                    for (sum, p) in sums.iter_mut().zip(tree.leaf_distribution(features)) {
                        *sum += p;
                    }
                }
                let count = trees.len() as f64;
                sums.into_iter().map(|s| s / count).collect()
            }
            ClassifierState::LogisticRegression {
                classes,
                coef,
                intercept,
            } => {
                let z: f64 = coef.iter().zip(features).map(|(c, x)| c * x).sum::<f64>() + intercept;
                let p_one = 1.0 / (1.0 + (-z).exp());
                classes
                    .iter()
                    .map(|&class| if class == 1 { p_one } else { 1.0 - p_one })
                    .collect()
            }
        }
    }

    /// Decision (class value) and the probability mass of that class
    pub fn predict(&self, features: &[f64]) -> (i64, f64) {
        let proba = self.predict_proba(features);
        let classes = self.classes();

        let index = match self {
            ClassifierState::LogisticRegression { .. } => {
                // Class 1 only when strictly above one half
                let p_one = classes
                    .iter()
                    .position(|&c| c == 1)
                    .map(|i| proba[i])
                    .unwrap_or(0.0);
                let wanted = if p_one > 0.5 { 1 } else { 0 };
                classes.iter().position(|&c| c == wanted).unwrap_or(0)
            }
            ClassifierState::RandomForest { .. } => argmax_first(&proba),
        };

        (classes[index], proba[index])
    }
}

/// Index of the largest value; earliest index wins ties
fn argmax_first(values: &[f64]) -> usize {
    let mut best = 0;
    for (idx, value) in values.iter().enumerate().skip(1) {
        if *value > values[best] {
            best = idx;
        }
    }
    best
}
