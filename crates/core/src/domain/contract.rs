use crate::domain::prediction::{Market, Side};
use crate::domain::team::normalize_abbreviation;
use crate::error::{PredictError, PredictResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Wire shape of an inbound prediction request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub home_team: String,
    pub away_team: String,
    #[serde(alias = "user_team")]
    pub user_side: Side,
    /// Optional when the market comes from the route instead.
    #[serde(default)]
    pub market: Option<Market>,
    pub event_id: String,
    #[serde(default)]
    pub bookmaker: Option<String>,
    #[serde(default)]
    pub user_odds: Option<f64>,
    #[serde(default)]
    pub game_date: Option<NaiveDate>,
}

/// A request that passed shape validation; team existence is checked later
/// against the log store.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionInput {
    pub home_team: String,
    pub away_team: String,
    pub user_side: Side,
    pub market: Market,
    pub event_id: String,
    pub bookmaker: Option<String>,
    pub user_odds: Option<f64>,
    pub game_date: Option<NaiveDate>,
}

impl PredictRequest {
    pub fn validate_and_into_input(
        self,
        route_market: Option<Market>,
    ) -> PredictResult<PredictionInput> {
        let market = match (route_market, self.market) {
            (Some(route), Some(body)) if route != body => {
                return Err(PredictError::validation(format!(
                    "market mismatch: route says {route}, body says {body}"
                )));
            }
            (Some(m), _) | (None, Some(m)) => m,
            (None, None) => return Err(PredictError::validation("market is required")),
        };

        let home_team = normalize_abbreviation(&self.home_team);
        ensure(!home_team.is_empty(), "home_team must be non-empty")?;
        let away_team = normalize_abbreviation(&self.away_team);
        ensure(!away_team.is_empty(), "away_team must be non-empty")?;
        ensure(
            home_team != away_team,
            format!("home_team and away_team must differ (both {home_team})"),
        )?;

        ensure(
            market.accepts(self.user_side),
            format!("side '{}' is not valid for market '{market}'", self.user_side),
        )?;

        let event_id = self.event_id.trim().to_string();
        ensure(!event_id.is_empty(), "event_id must be non-empty")?;

        let bookmaker = self
            .bookmaker
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        if let Some(odds) = self.user_odds {
            ensure(
                odds.is_finite() && odds.abs() >= 100.0,
                format!("user_odds must be American odds with |odds| >= 100 (got {odds})"),
            )?;
        }

        Ok(PredictionInput {
            home_team,
            away_team,
            user_side: self.user_side,
            market,
            event_id,
            bookmaker,
            user_odds: self.user_odds,
            game_date: self.game_date,
        })
    }
}

fn ensure(cond: bool, msg: impl Into<String>) -> PredictResult<()> {
    if cond {
        Ok(())
    } else {
        Err(PredictError::validation(msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(v: serde_json::Value) -> PredictRequest {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn normalizes_teams_and_takes_market_from_body() {
        let input = request(json!({
            "home_team": " bos ",
            "away_team": "lal",
            "user_side": "home",
            "market": "moneyline",
            "event_id": "evt-1",
            "bookmaker": "  ",
        }))
        .validate_and_into_input(None)
        .unwrap();

        assert_eq!(input.home_team, "BOS");
        assert_eq!(input.away_team, "LAL");
        assert_eq!(input.market, Market::Moneyline);
        assert_eq!(input.bookmaker, None);
    }

    #[test]
    fn accepts_legacy_user_team_key_and_route_market() {
        let input = request(json!({
            "home_team": "BOS",
            "away_team": "LAL",
            "user_team": "under",
            "event_id": "evt-1",
            "game_date": "2025-02-01",
        }))
        .validate_and_into_input(Some(Market::Overunder))
        .unwrap();
        assert_eq!(input.user_side, Side::Under);
        assert_eq!(input.game_date, NaiveDate::from_ymd_opt(2025, 2, 1));
    }

    #[test]
    fn rejects_side_that_does_not_fit_market() {
        let err = request(json!({
            "home_team": "BOS",
            "away_team": "LAL",
            "user_side": "over",
            "market": "spread",
            "event_id": "evt-1",
        }))
        .validate_and_into_input(None)
        .unwrap_err();
        assert!(matches!(err, PredictError::Validation(_)));
    }

    #[test]
    fn rejects_same_team_and_bad_odds() {
        let same = request(json!({
            "home_team": "BOS",
            "away_team": "bos",
            "user_side": "home",
            "market": "moneyline",
            "event_id": "evt-1",
        }))
        .validate_and_into_input(None);
        assert!(matches!(same, Err(PredictError::Validation(_))));

        let odds = request(json!({
            "home_team": "BOS",
            "away_team": "LAL",
            "user_side": "home",
            "market": "moneyline",
            "event_id": "evt-1",
            "user_odds": 50.0,
        }))
        .validate_and_into_input(None);
        assert!(matches!(odds, Err(PredictError::Validation(_))));
    }

    #[test]
    fn rejects_conflicting_or_missing_market() {
        let body = json!({
            "home_team": "BOS",
            "away_team": "LAL",
            "user_side": "home",
            "market": "moneyline",
            "event_id": "evt-1",
        });
        assert!(request(body.clone())
            .validate_and_into_input(Some(Market::Spread))
            .is_err());

        let mut no_market = body;
        no_market.as_object_mut().unwrap().remove("market");
        assert!(request(no_market).validate_and_into_input(None).is_err());
    }
}
