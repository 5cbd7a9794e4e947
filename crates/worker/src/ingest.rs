use courtline_core::domain::game::GameRecord;
use courtline_core::ingest::provider::GameLogProvider;
use courtline_core::store::GameLogStore;

#[derive(Debug, Default)]
pub struct SeasonFetch {
    /// Opponent points linked across teams, ordered by team then date.
    pub records: Vec<GameRecord>,
    pub teams_ok: Vec<String>,
    pub failures: Vec<(String, String)>,
}

impl SeasonFetch {
    pub fn status(&self) -> &'static str {
        match (self.teams_ok.is_empty(), self.failures.is_empty()) {
            (false, true) => "success",
            (false, false) => "partial",
            (true, _) => "error",
        }
    }

    pub fn error_summary(&self) -> Option<String> {
        if self.failures.is_empty() {
            return None;
        }
        Some(
            self.failures
                .iter()
                .map(|(team, err)| format!("{team}: {err}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Pulls every team's log one at a time. A team that fails after the provider's
/// retries is recorded and skipped.
pub async fn fetch_season(
    provider: &dyn GameLogProvider,
    teams: &[String],
    season: &str,
) -> SeasonFetch {
    let mut rows = Vec::new();
    let mut out = SeasonFetch::default();

    for team in teams {
        match provider.fetch_team_game_log(team, season).await {
            Ok(resp) => {
                let n = resp.games.len();
                rows.extend(resp.games.into_iter().map(|g| g.into_record(team)));
                tracing::info!(team = %team, season, games = n, "team game log fetched");
                out.teams_ok.push(team.clone());
            }
            Err(err) => {
                tracing::error!(team = %team, season, error = %format!("{err:#}"), "team game log fetch failed; skipping");
                out.failures.push((team.clone(), format!("{err:#}")));
            }
        }
    }

    out.records = GameLogStore::from_records(rows).into_records();
    out
}
