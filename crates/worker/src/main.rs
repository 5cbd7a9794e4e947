use anyhow::Context;
use clap::Parser;
use courtline_core::config::Settings;
use courtline_core::ingest::provider::{GameLogProvider, HttpJsonGameLogProvider};
use courtline_core::storage::game_logs::{record_ingest_run, upsert_game_logs_atomic, IngestRunSummary};
use courtline_core::storage::lock;
use courtline_core::store::csv::write_game_logs;
use courtline_core::time::nba_calendar::{eastern_date, parse_season, season_for_date};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod ingest;
mod teams;

#[derive(Debug, Parser)]
#[command(name = "courtline_worker")]
struct Args {
    /// Season label such as 2024-25. Defaults to the season of today's US-Eastern date.
    #[arg(long)]
    season: Option<String>,

    /// Comma-separated team abbreviations. Defaults to all 30 teams.
    #[arg(long)]
    teams: Option<String>,

    /// Also write the fetched logs to this CSV file (loadable via GAME_LOGS_PATH).
    #[arg(long)]
    csv_out: Option<PathBuf>,

    /// Do everything except writing to the database.
    #[arg(long)]
    dry_run: bool,
}

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

    let args = Args::parse();

    let season = match args.season.as_deref() {
        Some(s) => parse_season(s)?,
        None => season_for_date(eastern_date(chrono::Utc::now())),
    };
    let teams = teams::resolve_teams(args.teams.as_deref())?;
    let provider = HttpJsonGameLogProvider::from_settings(&settings)?;

    let fetch = ingest::fetch_season(&provider, &teams, &season).await;
    tracing::info!(
        %season,
        teams_ok = fetch.teams_ok.len(),
        teams_failed = fetch.failures.len(),
        rows = fetch.records.len(),
        "season fetch finished"
    );

    if let Some(path) = &args.csv_out {
        if fetch.records.is_empty() {
            tracing::warn!(path = %path.display(), "no rows fetched; csv not written");
        } else {
            write_game_logs(path, &fetch.records)?;
            tracing::info!(path = %path.display(), rows = fetch.records.len(), "game logs csv written");
        }
    }

    if args.dry_run {
        tracing::info!(%season, dry_run = true, status = fetch.status(), "ingest run (dry-run)");
        return Ok(());
    }

    let db_url = settings.require_database_url()?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .context("connect DATABASE_URL failed")?;

    courtline_core::storage::migrate(&pool).await?;

    // Session-scoped lock: acquire and release on one pinned connection.
    let mut lock_conn = pool
        .acquire()
        .await
        .context("acquire lock connection failed")?;
    let acquired = lock::try_acquire_season_lock(&mut *lock_conn, &season).await?;
    if !acquired {
        tracing::warn!(%season, "season lock not acquired; another run in progress");
        return Ok(());
    }

    let result = persist(&pool, &season, provider.provider_name(), &fetch).await;

    let release = lock::release_season_lock(&mut *lock_conn, &season).await;
    match LockRelease::from_result(&release) {
        LockRelease::Released => tracing::debug!(%season, "season lock released"),
        LockRelease::NotHeld => {
            tracing::warn!(%season, "season lock was not held at release")
        }
        LockRelease::Failed => {
            if let Err(err) = &release {
                sentry_anyhow::capture_anyhow(err);
                tracing::error!(%season, error = %format!("{err:#}"), "season lock release failed");
            }
        }
    }
    result
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LockRelease {
    Released,
    NotHeld,
    Failed,
}

impl LockRelease {
    fn from_result(res: &anyhow::Result<bool>) -> Self {
        match res {
            Ok(true) => LockRelease::Released,
            Ok(false) => LockRelease::NotHeld,
            Err(_) => LockRelease::Failed,
        }
    }
}

async fn persist(
    pool: &sqlx::PgPool,
    season: &str,
    provider: &str,
    fetch: &ingest::SeasonFetch,
) -> anyhow::Result<()> {
    let mut status = fetch.status();
    let mut error = fetch.error_summary();
    let mut rows_affected: u64 = 0;

    if !fetch.records.is_empty() {
        match upsert_game_logs_atomic(pool, season, &fetch.records).await {
            Ok(n) => rows_affected = n,
            Err(err) => {
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(%season, error = %format!("{err:#}"), "game log upsert failed");
                status = "error";
                error = Some(format!("{err:#}"));
            }
        }
    }

    let run_id = record_ingest_run(
        pool,
        &IngestRunSummary {
            season,
            provider,
            status,
            teams_ok: i32::try_from(fetch.teams_ok.len()).unwrap_or(i32::MAX),
            teams_failed: i32::try_from(fetch.failures.len()).unwrap_or(i32::MAX),
            rows_affected: i64::try_from(rows_affected).unwrap_or(i64::MAX),
            error: error.as_deref(),
        },
    )
    .await?;

    if status == "error" {
        let err = anyhow::anyhow!(
            "ingest run {run_id} for {season} failed: {}",
            error.as_deref().unwrap_or("no teams fetched")
        );
        sentry_anyhow::capture_anyhow(&err);
        return Err(err);
    }

    tracing::info!(%season, %run_id, status, rows_affected, "ingest run recorded");
    Ok(())
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
