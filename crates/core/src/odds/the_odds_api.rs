use crate::config::Settings;
use crate::domain::odds::OddsSnapshot;
use crate::error::{PredictError, PredictResult};
use crate::odds::types::{Bookmaker, OddsEvent, MARKET_H2H, MARKET_SPREADS, MARKET_TOTALS};
use crate::odds::OddsGateway;
use anyhow::Context;
use reqwest::StatusCode;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.the-odds-api.com";

#[derive(Debug, Clone)]
pub struct TheOddsApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    sport: String,
    regions: String,
}

impl TheOddsApiClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_odds_api_key()?.to_string();
        let base_url = settings
            .odds_api_base_url
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.odds_api_timeout_secs))
            .build()
            .context("failed to build odds api http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
            sport: settings.odds_sport.clone(),
            regions: settings.odds_regions.clone(),
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/v4/sports/{}/odds/",
            self.base_url.trim_end_matches('/'),
            self.sport
        )
    }

    async fn fetch_events(&self, event_id: &str) -> PredictResult<Vec<OddsEvent>> {
        let markets = [MARKET_H2H, MARKET_SPREADS, MARKET_TOTALS].join(",");
        let res = self
            .http
            .get(self.url())
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("regions", self.regions.as_str()),
                ("markets", markets.as_str()),
                ("oddsFormat", "american"),
                ("eventIds", event_id),
            ])
            .send()
            .await
            .map_err(|e| PredictError::Upstream(format!("odds api request failed: {e}")))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| PredictError::Upstream(format!("failed to read odds api response: {e}")))?;

        if status == StatusCode::NOT_FOUND {
            return Err(PredictError::NotFound(format!("odds event '{event_id}'")));
        }
        if !status.is_success() {
            tracing::error!(%status, body = %text, "odds api error");
            return Err(PredictError::Upstream(format!(
                "odds api failed with status {status}: {text}"
            )));
        }

        serde_json::from_str::<Vec<OddsEvent>>(&text)
            .map_err(|e| PredictError::Upstream(format!("odds api response is not valid: {e}")))
    }
}

#[async_trait::async_trait]
impl OddsGateway for TheOddsApiClient {
    fn provider_name(&self) -> &'static str {
        "the_odds_api"
    }

    async fn fetch_odds(
        &self,
        event_id: &str,
        bookmaker: Option<&str>,
    ) -> PredictResult<OddsSnapshot> {
        let events = self.fetch_events(event_id).await?;
        let snapshot = snapshot_from_events(&events, event_id, bookmaker)?;

        tracing::info!(
            event_id,
            spread = ?snapshot.spread_point,
            total = ?snapshot.total_point,
            moneyline_home = ?snapshot.moneyline_home,
            moneyline_away = ?snapshot.moneyline_away,
            bookmakers = ?snapshot.bookmakers,
            "odds fetched"
        );
        Ok(snapshot)
    }
}

/// Collapses the provider payload into one snapshot. Bookmakers are read in
/// order and each line keeps the first price offered for it.
pub fn snapshot_from_events(
    events: &[OddsEvent],
    event_id: &str,
    bookmaker: Option<&str>,
) -> PredictResult<OddsSnapshot> {
    if events.is_empty() {
        return Err(PredictError::Upstream(format!(
            "no odds data returned for event_id: {event_id}"
        )));
    }

    let event = events
        .iter()
        .find(|e| e.id == event_id)
        .ok_or_else(|| PredictError::NotFound(format!("odds event '{event_id}'")))?;

    let mut snap = OddsSnapshot {
        event_id: event.id.clone(),
        home_team: event.home_team.clone(),
        away_team: event.away_team.clone(),
        ..Default::default()
    };

    for book in &event.bookmakers {
        if bookmaker.is_some_and(|wanted| book.key != wanted) {
            continue;
        }
        if merge_bookmaker(&mut snap, event, book) {
            snap.bookmakers.push(book.key.clone());
        }
        if snap.is_complete() {
            break;
        }
    }

    Ok(snap)
}

/// Returns whether the bookmaker filled any field.
fn merge_bookmaker(snap: &mut OddsSnapshot, event: &OddsEvent, book: &Bookmaker) -> bool {
    let mut used = false;
    let mut fill = |slot: &mut Option<f64>, value: Option<f64>| {
        if slot.is_none() && value.is_some() {
            *slot = value;
            used = true;
        }
    };

    if let Some(h2h) = book.market(MARKET_H2H) {
        for o in &h2h.outcomes {
            if o.name == event.home_team {
                fill(&mut snap.moneyline_home, Some(o.price));
            } else if o.name == event.away_team {
                fill(&mut snap.moneyline_away, Some(o.price));
            }
        }
    }

    if let Some(spreads) = book.market(MARKET_SPREADS) {
        for o in &spreads.outcomes {
            if o.name == event.home_team {
                // Line and price must come from the same book.
                if snap.spread_point.is_none() && o.point.is_some() {
                    fill(&mut snap.spread_point, o.point);
                    fill(&mut snap.spread_price_home, Some(o.price));
                }
            } else if o.name == event.away_team {
                fill(&mut snap.spread_price_away, Some(o.price));
            }
        }
    }

    if let Some(totals) = book.market(MARKET_TOTALS) {
        for o in &totals.outcomes {
            if o.name.eq_ignore_ascii_case("over") {
                if snap.total_point.is_none() && o.point.is_some() {
                    fill(&mut snap.total_point, o.point);
                    fill(&mut snap.over_price, Some(o.price));
                }
            } else if o.name.eq_ignore_ascii_case("under") {
                fill(&mut snap.under_price, Some(o.price));
            }
        }
    }

    used
}
