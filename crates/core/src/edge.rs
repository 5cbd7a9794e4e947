use crate::domain::prediction::{round3, ConfidenceLevel, Recommendation};
use crate::odds::pricing::{fair_probability, implied_probability};
use anyhow::bail;

/// Minimum edge (exclusive) before a side is worth betting.
pub const BET_EDGE_THRESHOLD: f64 = 0.01;
/// Minimum |p - 0.5| the strict mode demands before betting.
pub const STRICT_MIN_CERTAINTY: f64 = 0.10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeMode {
    /// Confidence from the edge alone.
    #[default]
    Standard,
    /// Also gates on model certainty and reports the weaker of the two labels.
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgePolicy {
    pub mode: EdgeMode,
    /// Compare against vig-free probabilities when the opposing price is known.
    pub devig: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeAssessment {
    pub model_prob: f64,
    pub implied_prob: f64,
    pub value_edge: f64,
    pub recommendation: Recommendation,
    pub confidence: ConfidenceLevel,
}

impl EdgePolicy {
    pub fn from_env() -> anyhow::Result<Self> {
        let mode = match std::env::var("EDGE_MODE").ok().as_deref().map(str::trim) {
            None | Some("") | Some("standard") => EdgeMode::Standard,
            Some("strict") => EdgeMode::Strict,
            Some(other) => bail!("EDGE_MODE must be 'standard' or 'strict' (got {other:?})"),
        };
        let devig = match std::env::var("EDGE_DEVIG").ok().as_deref().map(str::trim) {
            None | Some("") | Some("false") | Some("0") => false,
            Some("true") | Some("1") => true,
            Some(other) => bail!("EDGE_DEVIG must be true or false (got {other:?})"),
        };
        Ok(Self { mode, devig })
    }

    /// Market probability for the user's price.
    pub fn implied_probability(&self, user_odds: f64, opposing_odds: Option<f64>) -> f64 {
        match opposing_odds {
            Some(opp) if self.devig => fair_probability(user_odds, opp),
            _ => implied_probability(user_odds),
        }
    }

    /// Classifies the raw edge; only the reported figures are rounded.
    pub fn assess(&self, model_prob: f64, implied_prob: f64) -> EdgeAssessment {
        let value_edge = model_prob - implied_prob;
        let certainty = (model_prob - 0.5).abs();

        let edge_ok = value_edge > BET_EDGE_THRESHOLD;
        let (recommend, confidence) = match self.mode {
            EdgeMode::Standard => (edge_ok, edge_level(value_edge.abs())),
            EdgeMode::Strict => (
                edge_ok && certainty >= STRICT_MIN_CERTAINTY,
                edge_level(value_edge.abs()).min(certainty_level(certainty)),
            ),
        };

        EdgeAssessment {
            model_prob: round3(model_prob),
            implied_prob: round3(implied_prob),
            value_edge: round3(value_edge),
            recommendation: if recommend {
                Recommendation::Bet
            } else {
                Recommendation::Pass
            },
            confidence,
        }
    }
}

pub fn edge_level(edge: f64) -> ConfidenceLevel {
    if edge >= 0.10 {
        ConfidenceLevel::High
    } else if edge >= 0.05 {
        ConfidenceLevel::Moderate
    } else if edge >= 0.01 {
        ConfidenceLevel::Low
    } else {
        ConfidenceLevel::Negligible
    }
}

pub fn certainty_level(certainty: f64) -> ConfidenceLevel {
    if certainty >= 0.40 {
        ConfidenceLevel::High
    } else if certainty >= 0.25 {
        ConfidenceLevel::Moderate
    } else if certainty >= 0.10 {
        ConfidenceLevel::Low
    } else {
        ConfidenceLevel::Negligible
    }
}
