pub mod domain;
pub mod edge;
pub mod error;
pub mod features;
pub mod ingest;
pub mod model;
pub mod odds;
pub mod predictor;
pub mod storage;
pub mod store;
pub mod time;

pub mod config {
    use anyhow::Context;
    use std::path::PathBuf;

    use crate::edge::EdgePolicy;

    const DEFAULT_MODELS_DIR: &str = "models";
    const DEFAULT_SPREAD_SIGMA: f64 = 6.56;
    const DEFAULT_TOTAL_SIGMA: f64 = 11.0;
    const DEFAULT_ODDS_SPORT: &str = "basketball_nba";
    const DEFAULT_ODDS_REGIONS: &str = "us";
    const DEFAULT_ODDS_API_TIMEOUT_SECS: u64 = 15;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub sentry_dsn: Option<String>,
        pub odds_api_base_url: Option<String>,
        pub odds_api_key: Option<String>,
        pub odds_sport: String,
        pub odds_regions: String,
        pub odds_api_timeout_secs: u64,
        pub stats_provider_base_url: Option<String>,
        pub stats_provider_api_key: Option<String>,
        pub game_logs_path: Option<PathBuf>,
        pub game_logs_season: Option<String>,
        pub models_dir: PathBuf,
        pub spread_sigma: f64,
        pub total_sigma: f64,
        pub edge_policy: EdgePolicy,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                database_url: std::env::var("DATABASE_URL").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                odds_api_base_url: std::env::var("ODDS_API_BASE_URL").ok(),
                odds_api_key: std::env::var("ODDS_API_KEY").ok(),
                odds_sport: env_or("ODDS_SPORT", DEFAULT_ODDS_SPORT),
                odds_regions: env_or("ODDS_REGIONS", DEFAULT_ODDS_REGIONS),
                odds_api_timeout_secs: match std::env::var("ODDS_API_TIMEOUT_SECS") {
                    Ok(s) if !s.trim().is_empty() => s.trim().parse::<u64>().with_context(|| {
                        format!("ODDS_API_TIMEOUT_SECS must be whole seconds (got {s:?})")
                    })?,
                    _ => DEFAULT_ODDS_API_TIMEOUT_SECS,
                },
                stats_provider_base_url: std::env::var("STATS_PROVIDER_BASE_URL").ok(),
                stats_provider_api_key: std::env::var("STATS_PROVIDER_API_KEY").ok(),
                game_logs_path: std::env::var("GAME_LOGS_PATH")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .map(PathBuf::from),
                game_logs_season: std::env::var("GAME_LOGS_SEASON")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
                models_dir: std::env::var("MODELS_DIR")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_MODELS_DIR)),
                spread_sigma: parse_env_f64("SPREAD_SIGMA")?.unwrap_or(DEFAULT_SPREAD_SIGMA),
                total_sigma: parse_env_f64("TOTAL_SIGMA")?.unwrap_or(DEFAULT_TOTAL_SIGMA),
                edge_policy: EdgePolicy::from_env()?,
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }

        pub fn require_odds_api_key(&self) -> anyhow::Result<&str> {
            self.odds_api_key
                .as_deref()
                .context("ODDS_API_KEY is required")
        }

        pub fn require_stats_provider_base_url(&self) -> anyhow::Result<&str> {
            self.stats_provider_base_url
                .as_deref()
                .context("STATS_PROVIDER_BASE_URL is required")
        }
    }

    fn env_or(key: &str, default: &str) -> String {
        std::env::var(key)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| default.to_string())
    }

    fn parse_env_f64(key: &str) -> anyhow::Result<Option<f64>> {
        match std::env::var(key) {
            Ok(s) if !s.trim().is_empty() => {
                let v = s
                    .trim()
                    .parse::<f64>()
                    .with_context(|| format!("{key} must be a number (got {s:?})"))?;
                anyhow::ensure!(v.is_finite() && v > 0.0, "{key} must be positive (got {v})");
                Ok(Some(v))
            }
            _ => Ok(None),
        }
    }
}
