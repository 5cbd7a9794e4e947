pub mod artifact;
pub mod stats;

use crate::domain::prediction::{Market, Side};
use crate::error::{PredictError, PredictResult};
use crate::features::FeatureVector;
use anyhow::Context;
use artifact::{ModelArtifact, Output, Scorer};
use std::collections::HashMap;
use std::path::Path;

/// How a model's raw score becomes a probability of the modeled side (home / over).
#[derive(Debug, Clone)]
pub enum ProbabilityModel {
    Classifier { scorer: Scorer },
    Regression { scorer: Scorer, sigma: f64 },
}

impl ProbabilityModel {
    fn probability(&self, x: &[f64]) -> f64 {
        let p = match self {
            ProbabilityModel::Classifier { scorer } => stats::sigmoid(scorer.score(x)),
            ProbabilityModel::Regression { scorer, sigma } => {
                stats::margin_to_probability(scorer.score(x), *sigma)
            }
        };
        p.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone)]
pub struct MarketModel {
    pub market: Market,
    pub version: Option<String>,
    pub feature_names: Vec<String>,
    pub model: ProbabilityModel,
}

impl MarketModel {
    pub fn from_artifact(
        market: Market,
        artifact: ModelArtifact,
        default_sigma: f64,
    ) -> anyhow::Result<Self> {
        artifact.validate()?;
        if let Some(declared) = artifact.market {
            anyhow::ensure!(
                declared == market,
                "artifact declares market {declared}, loaded as {market}"
            );
        }

        let model = match artifact.output {
            Output::Classifier => ProbabilityModel::Classifier {
                scorer: artifact.scorer,
            },
            Output::Regression { sigma } => ProbabilityModel::Regression {
                scorer: artifact.scorer,
                sigma: sigma.unwrap_or(default_sigma),
            },
        };

        Ok(Self {
            market,
            version: artifact.version,
            feature_names: artifact.feature_names,
            model,
        })
    }

    /// Probability of the home (or over) outcome.
    pub fn modeled_probability(&self, features: &FeatureVector) -> f64 {
        let x = features.to_model_input(&self.feature_names);
        self.model.probability(&x)
    }
}

/// One model per market, loaded at startup and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: HashMap<Market, MarketModel>,
}

impl ModelRegistry {
    pub fn new(models: impl IntoIterator<Item = MarketModel>) -> Self {
        Self {
            models: models.into_iter().map(|m| (m.market, m)).collect(),
        }
    }

    /// Loads `<market>.json` for every market found in `dir`. A market without
    /// an artifact is left unsupported.
    pub fn load_dir(dir: &Path, spread_sigma: f64, total_sigma: f64) -> anyhow::Result<Self> {
        let mut models = Vec::new();
        for market in Market::ALL {
            let path = dir.join(format!("{}.json", market.as_str()));
            if !path.exists() {
                tracing::warn!(
                    %market,
                    path = %path.display(),
                    "model artifact missing; market disabled"
                );
                continue;
            }

            let sigma = match market {
                Market::Overunder => total_sigma,
                Market::Moneyline | Market::Spread => spread_sigma,
            };
            let artifact = ModelArtifact::read(&path)?;
            let model = MarketModel::from_artifact(market, artifact, sigma)
                .with_context(|| format!("failed to load {market} model"))?;

            tracing::info!(
                %market,
                version = model.version.as_deref().unwrap_or("unversioned"),
                features = model.feature_names.len(),
                "model loaded"
            );
            models.push(model);
        }

        anyhow::ensure!(
            !models.is_empty(),
            "no model artifacts found in {}",
            dir.display()
        );
        Ok(Self::new(models))
    }

    pub fn get(&self, market: Market) -> Option<&MarketModel> {
        self.models.get(&market)
    }

    pub fn markets(&self) -> Vec<Market> {
        Market::ALL
            .into_iter()
            .filter(|m| self.models.contains_key(m))
            .collect()
    }

    /// Probability that the user's side wins.
    pub fn probability(
        &self,
        market: Market,
        side: Side,
        features: &FeatureVector,
    ) -> PredictResult<f64> {
        let model = self.get(market).ok_or_else(|| {
            PredictError::validation(format!("no model loaded for market '{market}'"))
        })?;

        let missing = features.missing(&model.feature_names);
        if !missing.is_empty() {
            tracing::debug!(%market, ?missing, "features defaulted to 0.0");
        }

        Ok(side_probability(model.modeled_probability(features), side))
    }
}

pub fn side_probability(modeled: f64, side: Side) -> f64 {
    if side.is_modeled() {
        modeled
    } else {
        1.0 - modeled
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn classifier_flips_for_away_side() {
        let registry = ModelRegistry::new([constant_moneyline(0.62)]);
        let fv = FeatureVector::new();
        let home = registry.probability(Market::Moneyline, Side::Home, &fv).unwrap();
        let away = registry.probability(Market::Moneyline, Side::Away, &fv).unwrap();
        assert!((home - 0.62).abs() < 1e-12);
        assert!((home + away - 1.0).abs() < 1e-12);
    }

    #[test]
    fn spread_regression_at_zero_margin_is_even() {
        let model = single_feature(
            Market::Spread,
            "netrtg_diff_last5",
            0.0,
            1.0,
            Output::Regression { sigma: None },
        );
        let registry = ModelRegistry::new([model]);

        // Feature absent: default fill gives a zero margin.
        let p = registry
            .probability(Market::Spread, Side::Away, &FeatureVector::new())
            .unwrap();
        assert_eq!(p, 0.5);

        let mut fv = FeatureVector::new();
        fv.insert("netrtg_diff_last5", 6.56);
        let p = registry.probability(Market::Spread, Side::Home, &fv).unwrap();
        assert!((p - 0.841_344_746).abs() < 1e-6);
    }

    #[test]
    fn overunder_uses_artifact_sigma_when_present() {
        let model = single_feature(
            Market::Overunder,
            "pace_adj_total",
            -220.0,
            1.0,
            Output::Regression { sigma: Some(11.0) },
        );
        let registry = ModelRegistry::new([model]);
        let mut fv = FeatureVector::new();
        fv.insert("pace_adj_total", 231.0);
        let over = registry.probability(Market::Overunder, Side::Over, &fv).unwrap();
        let under = registry.probability(Market::Overunder, Side::Under, &fv).unwrap();
        assert!((over - 0.841_344_746).abs() < 1e-6);
        assert!((under - (1.0 - over)).abs() < 1e-12);
    }

    #[test]
    fn missing_market_is_rejected() {
        let registry = ModelRegistry::new([constant_moneyline(0.5)]);
        let err = registry
            .probability(Market::Spread, Side::Home, &FeatureVector::new())
            .unwrap_err();
        assert!(matches!(err, PredictError::Validation(_)));
        assert_eq!(registry.markets(), vec![Market::Moneyline]);
    }

    #[test]
    fn artifact_market_must_match_slot() {
        let model = constant_moneyline(0.5);
        let artifact = ModelArtifact {
            market: Some(Market::Moneyline),
            version: None,
            feature_names: model.feature_names.clone(),
            scorer: Scorer::Linear {
                intercept: 0.0,
                coefficients: vec![0.0],
            },
            output: Output::Classifier,
        };
        assert!(MarketModel::from_artifact(Market::Spread, artifact, 6.56).is_err());
    }
}
