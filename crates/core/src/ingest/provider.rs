use crate::config::Settings;
use crate::domain::team::normalize_abbreviation;
use crate::ingest::types::{GameLogRow, TeamGameLogResponse};
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::StatusCode;
use std::collections::HashSet;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PATH: &str = "/v1/team_game_logs";
const DEFAULT_RETRIES: u32 = 3;

#[async_trait::async_trait]
pub trait GameLogProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_team_game_log(&self, team: &str, season: &str) -> Result<TeamGameLogResponse>;
}

#[derive(Debug, Clone)]
pub struct HttpJsonGameLogProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    path: String,
    retries: u32,
}

impl HttpJsonGameLogProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_stats_provider_base_url()?.to_string();
        let api_key = settings.stats_provider_api_key.clone();

        let timeout_secs = std::env::var("STATS_PROVIDER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("STATS_PROVIDER_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES)
            .max(1);

        let path = std::env::var("STATS_PROVIDER_GAME_LOGS_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PATH.to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build stats provider http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
            path,
            retries,
        })
    }

    fn url(&self) -> String {
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };

        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }

    async fn fetch_once(&self, team: &str, season: &str) -> Result<TeamGameLogResponse> {
        let res = self
            .http
            .get(self.url())
            .headers(self.headers()?)
            .query(&[("team", team), ("season", season)])
            .send()
            .await
            .context("stats provider request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read stats provider response")?;
        parse_response(status, &text)
    }
}

fn parse_response(status: StatusCode, text: &str) -> Result<TeamGameLogResponse> {
    if !status.is_success() {
        anyhow::bail!("stats provider HTTP {status}: {text}");
    }
    serde_json::from_str::<TeamGameLogResponse>(text)
        .context("failed to parse stats provider response into TeamGameLogResponse")
}

#[async_trait::async_trait]
impl GameLogProvider for HttpJsonGameLogProvider {
    fn provider_name(&self) -> &'static str {
        "stats_http_json"
    }

    async fn fetch_team_game_log(&self, team: &str, season: &str) -> Result<TeamGameLogResponse> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.fetch_once(team, season).await {
                Ok(parsed) => {
                    validate(&parsed, team, season)?;
                    return Ok(parsed);
                }
                Err(err) => {
                    if attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = Duration::from_secs(1 << (attempt - 1));
                    tracing::warn!(team, attempt, ?backoff, error = %err, "game log fetch failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

pub fn validate(resp: &TeamGameLogResponse, team: &str, season: &str) -> Result<()> {
    anyhow::ensure!(
        normalize_abbreviation(&resp.team) == normalize_abbreviation(team),
        "provider team mismatch: expected {team}, got {}",
        resp.team
    );
    anyhow::ensure!(
        resp.season.trim() == season,
        "provider season mismatch: expected {season}, got {}",
        resp.season
    );

    let mut seen = HashSet::new();
    for row in &resp.games {
        anyhow::ensure!(
            seen.insert(row.game_id.as_str()),
            "duplicate game_id {} for {team}",
            row.game_id
        );
        validate_row(row).with_context(|| format!("game {} for {team}", row.game_id))?;
    }
    Ok(())
}

fn validate_row(row: &GameLogRow) -> Result<()> {
    anyhow::ensure!(!row.game_id.trim().is_empty(), "game_id must be non-empty");
    let counts = [
        row.pts, row.fgm, row.fga, row.fg3m, row.fg3a, row.ftm, row.fta, row.oreb, row.reb,
        row.tov,
    ];
    anyhow::ensure!(
        counts.iter().all(|v| v.is_finite() && *v >= 0.0),
        "box score counts must be non-negative"
    );
    anyhow::ensure!(row.fgm <= row.fga, "fgm exceeds fga");
    anyhow::ensure!(row.fg3m <= row.fg3a, "fg3m exceeds fg3a");
    anyhow::ensure!(row.oreb <= row.reb, "oreb exceeds reb");
    Ok(())
}
