pub mod csv;

use crate::domain::game::GameRecord;
use crate::domain::team::normalize_abbreviation;
use crate::error::{PredictError, PredictResult};
use chrono::NaiveDate;
use std::collections::HashMap;

/// In-memory game logs, built once at startup and only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct GameLogStore {
    by_team: HashMap<String, Vec<GameRecord>>,
    league_pace: f64,
    total_games: usize,
}

impl GameLogStore {
    pub fn from_records(records: Vec<GameRecord>) -> Self {
        let opp_points = opponent_points_by_game(&records);

        let mut by_team: HashMap<String, Vec<GameRecord>> = HashMap::new();
        for mut record in records {
            record.team = normalize_abbreviation(&record.team);
            if record.opp_pts.is_none() {
                record.opp_pts = opp_points
                    .get(record.game_id.as_str())
                    .and_then(|teams| {
                        teams
                            .iter()
                            .find(|(team, _)| *team != record.team)
                            .map(|(_, pts)| *pts)
                    });
            }
            by_team.entry(record.team.clone()).or_default().push(record);
        }

        let mut total_games = 0usize;
        let mut pace_sum = 0.0;
        for games in by_team.values_mut() {
            games.sort_by(|a, b| {
                a.game_date
                    .cmp(&b.game_date)
                    .then_with(|| a.game_id.cmp(&b.game_id))
            });
            games.dedup_by(|b, a| a.game_id == b.game_id);

            let mut prev: Option<NaiveDate> = None;
            for g in games.iter_mut() {
                g.rest_days = prev.map(|d| (g.game_date - d).num_days());
                prev = Some(g.game_date);
                pace_sum += g.pace();
            }
            total_games += games.len();
        }

        let league_pace = if total_games == 0 {
            0.0
        } else {
            pace_sum / total_games as f64
        };

        tracing::debug!(
            teams = by_team.len(),
            total_games,
            league_pace,
            "game log store built"
        );

        Self {
            by_team,
            league_pace,
            total_games,
        }
    }

    /// All games with opponent points linked, ordered by team then date.
    pub fn into_records(self) -> Vec<GameRecord> {
        let mut teams: Vec<(String, Vec<GameRecord>)> = self.by_team.into_iter().collect();
        teams.sort_by(|a, b| a.0.cmp(&b.0));
        teams.into_iter().flat_map(|(_, games)| games).collect()
    }

    /// Games for `team` in ascending date order.
    pub fn team_games(&self, team: &str) -> PredictResult<&[GameRecord]> {
        let abbr = normalize_abbreviation(team);
        self.by_team
            .get(&abbr)
            .map(Vec::as_slice)
            .ok_or_else(|| PredictError::NotFound(format!("game logs for team '{abbr}'")))
    }

    pub fn contains_team(&self, team: &str) -> bool {
        self.by_team.contains_key(&normalize_abbreviation(team))
    }

    /// Mean pace over every game of every team.
    pub fn league_pace(&self) -> f64 {
        self.league_pace
    }

    pub fn team_count(&self) -> usize {
        self.by_team.len()
    }

    pub fn total_games(&self) -> usize {
        self.total_games
    }

    pub fn is_empty(&self) -> bool {
        self.total_games == 0
    }
}

fn opponent_points_by_game(records: &[GameRecord]) -> HashMap<String, Vec<(String, f64)>> {
    let mut out: HashMap<String, Vec<(String, f64)>> = HashMap::new();
    for r in records {
        out.entry(r.game_id.clone())
            .or_default()
            .push((normalize_abbreviation(&r.team), r.pts));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::game::fixtures::game;
    use crate::domain::game::GameOutcome;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    #[test]
    fn links_opponent_points_and_rest_days() {
        let records = vec![
            game("BOS", "g2", d(5), GameOutcome::Loss, 101.0),
            game("bos", "g1", d(2), GameOutcome::Win, 120.0),
            game("LAL", "g1", d(2), GameOutcome::Loss, 99.0),
        ];
        let store = GameLogStore::from_records(records);

        let bos = store.team_games("BOS").unwrap();
        assert_eq!(bos.len(), 2);
        assert_eq!(bos[0].game_id, "g1");
        assert_eq!(bos[0].opp_pts, Some(99.0));
        assert_eq!(bos[0].rest_days, None);
        assert_eq!(bos[1].rest_days, Some(3));
        assert_eq!(bos[1].opp_pts, None);

        let lal = store.team_games("lal").unwrap();
        assert_eq!(lal[0].opp_pts, Some(120.0));
        assert_eq!(store.total_games(), 3);
    }

    #[test]
    fn unknown_team_is_not_found() {
        let store = GameLogStore::from_records(vec![game("BOS", "g1", d(2), GameOutcome::Win, 100.0)]);
        assert!(matches!(store.team_games("NYK"), Err(PredictError::NotFound(_))));
    }

    #[test]
    fn league_pace_is_mean_over_all_games() {
        let mut slow = game("BOS", "g1", d(2), GameOutcome::Win, 100.0);
        slow.fga = 80.0;
        let fast = game("LAL", "g2", d(3), GameOutcome::Win, 100.0);
        let expected = (slow.pace() + fast.pace()) / 2.0;
        let store = GameLogStore::from_records(vec![slow, fast]);
        assert!((store.league_pace() - expected).abs() < 1e-9);
    }

    #[test]
    fn drops_duplicate_rows_for_same_game() {
        let store = GameLogStore::from_records(vec![
            game("BOS", "g1", d(2), GameOutcome::Win, 100.0),
            game("BOS", "g1", d(2), GameOutcome::Win, 100.0),
        ]);
        assert_eq!(store.team_games("BOS").unwrap().len(), 1);
    }

    #[test]
    fn into_records_orders_by_team_then_date() {
        let store = GameLogStore::from_records(vec![
            game("LAL", "g1", d(2), GameOutcome::Loss, 99.0),
            game("BOS", "g2", d(5), GameOutcome::Loss, 101.0),
            game("BOS", "g1", d(2), GameOutcome::Win, 120.0),
        ]);
        let ids: Vec<(String, String)> = store
            .into_records()
            .into_iter()
            .map(|r| (r.team, r.game_id))
            .collect();
        assert_eq!(
            ids,
            vec![
                ("BOS".to_string(), "g1".to_string()),
                ("BOS".to_string(), "g2".to_string()),
                ("LAL".to_string(), "g1".to_string()),
            ]
        );
    }
}
