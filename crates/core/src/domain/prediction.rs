use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    Moneyline,
    Spread,
    #[serde(alias = "totals", alias = "over_under")]
    Overunder,
}

impl Market {
    pub const ALL: [Market; 3] = [Market::Moneyline, Market::Spread, Market::Overunder];

    pub fn as_str(self) -> &'static str {
        match self {
            Market::Moneyline => "moneyline",
            Market::Spread => "spread",
            Market::Overunder => "overunder",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "moneyline" | "h2h" => Some(Market::Moneyline),
            "spread" | "spreads" => Some(Market::Spread),
            "overunder" | "over_under" | "totals" => Some(Market::Overunder),
            _ => None,
        }
    }

    pub fn accepts(self, side: Side) -> bool {
        match self {
            Market::Moneyline | Market::Spread => matches!(side, Side::Home | Side::Away),
            Market::Overunder => matches!(side, Side::Over | Side::Under),
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
    Over,
    Under,
}

impl Side {
    /// Models predict the home/over outcome; the other side reads the complement.
    pub fn is_modeled(self) -> bool {
        matches!(self, Side::Home | Side::Over)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Home => "home",
            Side::Away => "away",
            Side::Over => "over",
            Side::Under => "under",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    Bet,
    Pass,
}

/// Ordered weakest to strongest so `min` picks the weaker label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    Negligible,
    Low,
    Moderate,
    High,
}

impl ConfidenceLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfidenceLevel::Negligible => "Negligible",
            ConfidenceLevel::Low => "Low",
            ConfidenceLevel::Moderate => "Moderate",
            ConfidenceLevel::High => "High",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamPair {
    pub home: String,
    pub away: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub bet_type: Market,
    pub teams: TeamPair,
    pub user_side: Side,
    pub user_odds: f64,
    pub implied_prob: f64,
    pub model_prob: f64,
    pub value_edge: f64,
    pub model_recommendation: Recommendation,
    pub confidence_level: ConfidenceLevel,
}

pub fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}
