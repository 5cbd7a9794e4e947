use crate::domain::game::{GameOutcome, GameRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamGameLogResponse {
    pub team: String,
    pub season: String,
    pub games: Vec<GameLogRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameLogRow {
    pub game_id: String,
    pub game_date: NaiveDate,
    #[serde(default)]
    pub matchup: Option<String>,
    pub wl: GameOutcome,
    pub pts: f64,
    pub fgm: f64,
    pub fga: f64,
    #[serde(default)]
    pub fg_pct: Option<f64>,
    #[serde(default)]
    pub fg3m: f64,
    #[serde(default)]
    pub fg3a: f64,
    #[serde(default)]
    pub ftm: f64,
    pub fta: f64,
    pub oreb: f64,
    pub reb: f64,
    pub tov: f64,
    #[serde(default)]
    pub opp_pts: Option<f64>,
}

impl GameLogRow {
    pub fn into_record(self, team: &str) -> GameRecord {
        let fg_pct = self.fg_pct.unwrap_or(if self.fga > 0.0 {
            self.fgm / self.fga
        } else {
            0.0
        });
        GameRecord {
            team: team.to_string(),
            game_id: self.game_id,
            game_date: self.game_date,
            matchup: self.matchup.unwrap_or_default(),
            wl: self.wl,
            pts: self.pts,
            fgm: self.fgm,
            fga: self.fga,
            fg_pct,
            fg3m: self.fg3m,
            fg3a: self.fg3a,
            ftm: self.ftm,
            fta: self.fta,
            oreb: self.oreb,
            reb: self.reb,
            tov: self.tov,
            opp_pts: self.opp_pts,
            rest_days: None,
        }
    }
}
