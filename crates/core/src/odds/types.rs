use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MARKET_H2H: &str = "h2h";
pub const MARKET_SPREADS: &str = "spreads";
pub const MARKET_TOTALS: &str = "totals";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OddsEvent {
    pub id: String,
    #[serde(default)]
    pub sport_key: Option<String>,
    #[serde(default)]
    pub commence_time: Option<DateTime<Utc>>,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub bookmakers: Vec<Bookmaker>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bookmaker {
    pub key: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub markets: Vec<BookMarket>,
}

impl Bookmaker {
    pub fn market(&self, key: &str) -> Option<&BookMarket> {
        self.markets.iter().find(|m| m.key == key)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookMarket {
    pub key: String,
    #[serde(default)]
    pub outcomes: Vec<Outcome>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub point: Option<f64>,
}
