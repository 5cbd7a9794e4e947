mod routes;

use anyhow::Context;
use chrono::Utc;
use courtline_core::config::Settings;
use courtline_core::features::builder::FeatureBuilder;
use courtline_core::model::ModelRegistry;
use courtline_core::odds::the_odds_api::TheOddsApiClient;
use courtline_core::predictor::Predictor;
use courtline_core::store::csv::read_game_logs;
use courtline_core::store::GameLogStore;
use courtline_core::time::nba_calendar::{eastern_date, parse_season, season_for_date};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use routes::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let predictor = match build_predictor(&settings).await {
        Ok(p) => Some(Arc::new(p)),
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = ?e, "predictor setup failed; starting API in degraded mode");
            None
        }
    };

    let app = routes::router(AppState { predictor });

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn build_predictor(settings: &Settings) -> anyhow::Result<Predictor> {
    let store = load_store(settings).await?;
    anyhow::ensure!(!store.is_empty(), "game log store is empty");
    tracing::info!(
        teams = store.team_count(),
        games = store.total_games(),
        league_pace = store.league_pace(),
        "game logs loaded"
    );

    let models = ModelRegistry::load_dir(
        &settings.models_dir,
        settings.spread_sigma,
        settings.total_sigma,
    )?;
    let odds = TheOddsApiClient::from_settings(settings)?;

    Ok(Predictor::new(
        FeatureBuilder::new(Arc::new(store)),
        Arc::new(models),
        Arc::new(odds),
        settings.edge_policy,
    ))
}

/// Flat file when `GAME_LOGS_PATH` is set, otherwise the ingested season in Postgres.
async fn load_store(settings: &Settings) -> anyhow::Result<GameLogStore> {
    if let Some(path) = &settings.game_logs_path {
        tracing::info!(path = %path.display(), "loading game logs from file");
        return Ok(GameLogStore::from_records(read_game_logs(path)?));
    }

    let season = match &settings.game_logs_season {
        Some(s) => parse_season(s)?,
        None => season_for_date(eastern_date(Utc::now())),
    };

    let db_url = settings.require_database_url()?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(db_url)
        .await
        .context("db connect failed")?;
    courtline_core::storage::migrate(&pool).await?;

    tracing::info!(%season, "loading game logs from database");
    let records = courtline_core::storage::game_logs::load_season(&pool, &season).await?;
    pool.close().await;

    Ok(GameLogStore::from_records(records))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
