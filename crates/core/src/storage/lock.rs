use anyhow::Context;

// Advisory locks are scoped to the Postgres session. Used as a best-effort guard
// against two ingest runs writing the same season at once.
const LOCK_NAMESPACE: i64 = 0x434F_5552_544C; // "COURTL"

fn lock_key_for_season(season: &str) -> i64 {
    let start_year: i64 = season
        .split('-')
        .next()
        .and_then(|y| y.trim().parse().ok())
        .unwrap_or_default();
    LOCK_NAMESPACE ^ start_year
}

/// Takes the lock on `conn`. Release must go through the same connection.
pub async fn try_acquire_season_lock(
    conn: &mut sqlx::PgConnection,
    season: &str,
) -> anyhow::Result<bool> {
    let key = lock_key_for_season(season);
    let acquired: (bool,) = sqlx::query_as("SELECT pg_try_advisory_lock($1)")
        .persistent(false)
        .bind(key)
        .fetch_one(&mut *conn)
        .await
        .with_context(|| format!("failed to acquire advisory lock (key={key})"))?;
    Ok(acquired.0)
}

/// Returns `false` when `conn` did not hold the lock.
pub async fn release_season_lock(
    conn: &mut sqlx::PgConnection,
    season: &str,
) -> anyhow::Result<bool> {
    let key = lock_key_for_season(season);
    let released: (bool,) = sqlx::query_as("SELECT pg_advisory_unlock($1)")
        .persistent(false)
        .bind(key)
        .fetch_one(&mut *conn)
        .await
        .with_context(|| format!("failed to release advisory lock (key={key})"))?;
    Ok(released.0)
}
