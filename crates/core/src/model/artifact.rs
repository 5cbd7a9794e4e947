use crate::domain::prediction::Market;
use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// On-disk form of a trained model, as exported by the training pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    #[serde(default)]
    pub market: Option<Market>,
    #[serde(default)]
    pub version: Option<String>,
    /// Trained feature ordering; scorer weights and split indices refer to it.
    pub feature_names: Vec<String>,
    pub scorer: Scorer,
    pub output: Output,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Scorer {
    Linear {
        intercept: f64,
        coefficients: Vec<f64>,
    },
    TreeEnsemble {
        #[serde(default)]
        base_score: f64,
        trees: Vec<Tree>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    /// Goes to `yes` when the feature is below `threshold`.
    Split {
        feature: usize,
        threshold: f64,
        yes: usize,
        no: usize,
    },
    Leaf(f64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Output {
    /// Raw score is a log-odds.
    Classifier,
    /// Raw score is a predicted margin.
    Regression {
        #[serde(default)]
        sigma: Option<f64>,
    },
}

impl ModelArtifact {
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read model artifact {}", path.display()))?;
        let artifact = serde_json::from_str::<ModelArtifact>(&text)
            .with_context(|| format!("model artifact {} is not valid JSON", path.display()))?;
        artifact
            .validate()
            .with_context(|| format!("model artifact {} failed validation", path.display()))?;
        Ok(artifact)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let n = self.feature_names.len();
        ensure!(n > 0, "feature_names must be non-empty");

        let mut seen = std::collections::HashSet::new();
        for name in &self.feature_names {
            ensure!(seen.insert(name.as_str()), "duplicate feature name {name:?}");
        }

        match &self.scorer {
            Scorer::Linear {
                intercept,
                coefficients,
            } => {
                ensure!(
                    coefficients.len() == n,
                    "linear scorer has {} coefficients for {n} features",
                    coefficients.len()
                );
                ensure!(
                    intercept.is_finite() && coefficients.iter().all(|c| c.is_finite()),
                    "linear scorer weights must be finite"
                );
            }
            Scorer::TreeEnsemble { base_score, trees } => {
                ensure!(base_score.is_finite(), "base_score must be finite");
                ensure!(!trees.is_empty(), "tree ensemble must have at least one tree");
                for (i, tree) in trees.iter().enumerate() {
                    tree.validate(n).with_context(|| format!("tree {i}"))?;
                }
            }
        }

        if let Output::Regression { sigma: Some(sigma) } = self.output {
            ensure!(
                sigma.is_finite() && sigma > 0.0,
                "regression sigma must be positive (got {sigma})"
            );
        }

        Ok(())
    }
}

impl Scorer {
    /// Raw score for inputs laid out in trained feature order.
    pub fn score(&self, x: &[f64]) -> f64 {
        match self {
            Scorer::Linear {
                intercept,
                coefficients,
            } => {
                intercept
                    + coefficients
                        .iter()
                        .zip(x)
                        .map(|(w, v)| w * v)
                        .sum::<f64>()
            }
            Scorer::TreeEnsemble { base_score, trees } => {
                base_score + trees.iter().map(|t| t.predict(x)).sum::<f64>()
            }
        }
    }
}

impl Tree {
    fn validate(&self, n_features: usize) -> anyhow::Result<()> {
        ensure!(!self.nodes.is_empty(), "tree has no nodes");
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    yes,
                    no,
                } => {
                    ensure!(
                        *feature < n_features,
                        "node {i} splits on feature {feature} (only {n_features})"
                    );
                    ensure!(threshold.is_finite(), "node {i} threshold must be finite");
                    // Children after parents keeps every walk finite.
                    for child in [*yes, *no] {
                        if child <= i || child >= self.nodes.len() {
                            bail!("node {i} has out-of-order child {child}");
                        }
                    }
                }
                TreeNode::Leaf(v) => ensure!(v.is_finite(), "leaf {i} must be finite"),
            }
        }
        Ok(())
    }

    fn predict(&self, x: &[f64]) -> f64 {
        let mut i = 0;
        loop {
            match self.nodes[i] {
                TreeNode::Leaf(v) => return v,
                TreeNode::Split {
                    feature,
                    threshold,
                    yes,
                    no,
                } => {
                    let v = x.get(feature).copied().unwrap_or_default();
                    i = if v < threshold { yes } else { no };
                }
            }
        }
    }
}
