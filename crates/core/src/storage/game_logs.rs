use crate::domain::game::{GameOutcome, GameRecord};
use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
struct GameLogDbRow {
    team: String,
    game_id: String,
    game_date: NaiveDate,
    matchup: String,
    wl: String,
    pts: f64,
    fgm: f64,
    fga: f64,
    fg_pct: f64,
    fg3m: f64,
    fg3a: f64,
    ftm: f64,
    fta: f64,
    oreb: f64,
    reb: f64,
    tov: f64,
    opp_pts: Option<f64>,
}

impl GameLogDbRow {
    fn into_record(self) -> anyhow::Result<GameRecord> {
        let wl = GameOutcome::parse(&self.wl)
            .with_context(|| format!("invalid wl {:?} for game {}", self.wl, self.game_id))?;
        Ok(GameRecord {
            team: self.team,
            game_id: self.game_id,
            game_date: self.game_date,
            matchup: self.matchup,
            wl,
            pts: self.pts,
            fgm: self.fgm,
            fga: self.fga,
            fg_pct: self.fg_pct,
            fg3m: self.fg3m,
            fg3a: self.fg3a,
            ftm: self.ftm,
            fta: self.fta,
            oreb: self.oreb,
            reb: self.reb,
            tov: self.tov,
            opp_pts: self.opp_pts,
            rest_days: None,
        })
    }
}

pub async fn load_season(pool: &sqlx::PgPool, season: &str) -> anyhow::Result<Vec<GameRecord>> {
    let rows = sqlx::query_as::<_, GameLogDbRow>(
        "SELECT team, game_id, game_date, matchup, wl, pts, fgm, fga, fg_pct, fg3m, fg3a, \
                ftm, fta, oreb, reb, tov, opp_pts \
         FROM team_game_logs \
         WHERE season = $1 \
         ORDER BY team ASC, game_date ASC",
    )
    .persistent(false)
    .bind(season)
    .fetch_all(pool)
    .await
    .with_context(|| format!("select team_game_logs failed (season={season})"))?;

    rows.into_iter().map(GameLogDbRow::into_record).collect()
}

pub async fn upsert_game_logs_atomic(
    pool: &sqlx::PgPool,
    season: &str,
    records: &[GameRecord],
) -> anyhow::Result<u64> {
    anyhow::ensure!(!records.is_empty(), "records must be non-empty");

    let mut tx = pool.begin().await.context("begin transaction failed")?;

    let chunk_size: usize = std::env::var("GAME_LOGS_UPSERT_BATCH")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(200);
    anyhow::ensure!(chunk_size >= 1, "GAME_LOGS_UPSERT_BATCH must be >= 1");

    let mut affected: u64 = 0;
    for (batch_idx, chunk) in records.chunks(chunk_size).enumerate() {
        let t0 = std::time::Instant::now();
        let mut qb = sqlx::QueryBuilder::new(
            "INSERT INTO team_game_logs (season, team, game_id, game_date, matchup, wl, pts, fgm, \
             fga, fg_pct, fg3m, fg3a, ftm, fta, oreb, reb, tov, opp_pts) ",
        );
        qb.push_values(chunk, |mut b, r| {
            b.push_bind(season)
                .push_bind(r.team.trim())
                .push_bind(r.game_id.trim())
                .push_bind(r.game_date)
                .push_bind(r.matchup.as_str())
                .push_bind(r.wl.as_str())
                .push_bind(r.pts)
                .push_bind(r.fgm)
                .push_bind(r.fga)
                .push_bind(r.fg_pct)
                .push_bind(r.fg3m)
                .push_bind(r.fg3a)
                .push_bind(r.ftm)
                .push_bind(r.fta)
                .push_bind(r.oreb)
                .push_bind(r.reb)
                .push_bind(r.tov)
                .push_bind(r.opp_pts);
        });
        qb.push(
            " ON CONFLICT (season, team, game_id) DO UPDATE \
               SET game_date = EXCLUDED.game_date, matchup = EXCLUDED.matchup, wl = EXCLUDED.wl, \
                   pts = EXCLUDED.pts, fgm = EXCLUDED.fgm, fga = EXCLUDED.fga, \
                   fg_pct = EXCLUDED.fg_pct, fg3m = EXCLUDED.fg3m, fg3a = EXCLUDED.fg3a, \
                   ftm = EXCLUDED.ftm, fta = EXCLUDED.fta, oreb = EXCLUDED.oreb, \
                   reb = EXCLUDED.reb, tov = EXCLUDED.tov, \
                   opp_pts = COALESCE(EXCLUDED.opp_pts, team_game_logs.opp_pts), \
                   updated_at = now()",
        );

        let res = qb
            .build()
            .persistent(false)
            .execute(&mut *tx)
            .await
            .context("batch upsert team_game_logs failed")?;
        affected += res.rows_affected();

        tracing::debug!(
            season,
            batch_idx,
            batch_size = chunk.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "team_game_logs batch upsert"
        );
    }

    tx.commit().await.context("commit transaction failed")?;
    Ok(affected)
}

#[derive(Debug, Clone)]
pub struct IngestRunSummary<'a> {
    pub season: &'a str,
    pub provider: &'a str,
    pub status: &'a str,
    pub teams_ok: i32,
    pub teams_failed: i32,
    pub rows_affected: i64,
    pub error: Option<&'a str>,
}

pub async fn record_ingest_run(
    pool: &sqlx::PgPool,
    summary: &IngestRunSummary<'_>,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    let generated_at: DateTime<Utc> = Utc::now();

    sqlx::query(
        "INSERT INTO game_log_ingest_runs \
         (id, season, generated_at, provider, status, teams_ok, teams_failed, rows_affected, error) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .persistent(false)
    .bind(id)
    .bind(summary.season)
    .bind(generated_at)
    .bind(summary.provider)
    .bind(summary.status)
    .bind(summary.teams_ok)
    .bind(summary.teams_failed)
    .bind(summary.rows_affected)
    .bind(summary.error)
    .execute(pool)
    .await
    .context("insert game_log_ingest_runs failed")?;

    Ok(id)
}
