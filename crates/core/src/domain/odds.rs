use serde::{Deserialize, Serialize};

/// Market lines for one event as seen at fetch time. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OddsSnapshot {
    pub event_id: String,
    pub home_team: String,
    pub away_team: String,
    pub moneyline_home: Option<f64>,
    pub moneyline_away: Option<f64>,
    /// Home team's handicap.
    pub spread_point: Option<f64>,
    pub spread_price_home: Option<f64>,
    pub spread_price_away: Option<f64>,
    pub total_point: Option<f64>,
    pub over_price: Option<f64>,
    pub under_price: Option<f64>,
    pub bookmakers: Vec<String>,
}

impl OddsSnapshot {
    pub fn is_complete(&self) -> bool {
        self.moneyline_home.is_some()
            && self.moneyline_away.is_some()
            && self.spread_point.is_some()
            && self.spread_price_home.is_some()
            && self.spread_price_away.is_some()
            && self.total_point.is_some()
            && self.over_price.is_some()
            && self.under_price.is_some()
    }
}
