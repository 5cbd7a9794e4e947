use crate::domain::game::GameRecord;
use crate::error::{PredictError, PredictResult};
use chrono::NaiveDate;

pub const MIN_GAMES: usize = 3;
pub const BACK_TO_BACK_MAX_REST: i64 = 1;
const WIN_STREAK_WINDOW: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    Last(usize),
    Season,
}

pub const WINDOWS: [Window; 4] = [
    Window::Last(3),
    Window::Last(5),
    Window::Last(10),
    Window::Season,
];

impl Window {
    pub fn suffix(self) -> String {
        match self {
            Window::Last(n) => format!("last{n}"),
            Window::Season => "season".to_string(),
        }
    }

    fn take(self, available: usize) -> usize {
        match self {
            Window::Last(n) => n.min(available),
            Window::Season => available,
        }
    }
}

/// Means over the most recent games in one window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowStats {
    pub games: usize,
    pub ppg: f64,
    pub fg_pct: f64,
    pub efg_pct: Option<f64>,
    pub reb: f64,
    pub tov: f64,
    pub offrtg: Option<f64>,
    pub defrtg: Option<f64>,
    pub netrtg: Option<f64>,
    pub pace: f64,
    pub win_pct: f64,
    pub fga: f64,
    pub fg3a: f64,
    pub fta: f64,
}

impl WindowStats {
    fn from_games(games: &[&GameRecord]) -> Self {
        Self {
            games: games.len(),
            ppg: mean(games.iter().map(|g| g.pts)).unwrap_or_default(),
            fg_pct: mean(games.iter().map(|g| g.fg_pct)).unwrap_or_default(),
            efg_pct: mean(games.iter().filter_map(|g| g.efg_pct())),
            reb: mean(games.iter().map(|g| g.reb)).unwrap_or_default(),
            tov: mean(games.iter().map(|g| g.tov)).unwrap_or_default(),
            offrtg: mean(games.iter().filter_map(|g| g.off_rating())),
            defrtg: mean(games.iter().filter_map(|g| g.def_rating())),
            netrtg: mean(games.iter().filter_map(|g| g.net_rating())),
            pace: mean(games.iter().map(|g| g.pace())).unwrap_or_default(),
            win_pct: mean(games.iter().map(|g| if g.wl.is_win() { 1.0 } else { 0.0 }))
                .unwrap_or_default(),
            fga: mean(games.iter().map(|g| g.fga)).unwrap_or_default(),
            fg3a: mean(games.iter().map(|g| g.fg3a)).unwrap_or_default(),
            fta: mean(games.iter().map(|g| g.fta)).unwrap_or_default(),
        }
    }

    /// Feature stems paired with values; stems feed `home_{stem}_{window}` names.
    pub fn named(&self) -> [(&'static str, Option<f64>); 13] {
        [
            ("ppg", Some(self.ppg)),
            ("fg_pct", Some(self.fg_pct)),
            ("efg_pct", self.efg_pct),
            ("reb", Some(self.reb)),
            ("tov", Some(self.tov)),
            ("offrtg", self.offrtg),
            ("defrtg", self.defrtg),
            ("netrtg", self.netrtg),
            ("pace", Some(self.pace)),
            ("win_pct", Some(self.win_pct)),
            ("fga", Some(self.fga)),
            ("fg3a", Some(self.fg3a)),
            ("fta", Some(self.fta)),
        ]
    }
}

/// A team's recent form as of a date, from games strictly before it.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamForm {
    pub team: String,
    pub as_of: NaiveDate,
    pub last_game_date: NaiveDate,
    pub rest_days: i64,
    pub back_to_back: bool,
    pub wins_last_10: usize,
    pub windows: Vec<(Window, WindowStats)>,
}

impl TeamForm {
    /// `games` must be in ascending date order, as the log store keeps them.
    pub fn compute(team: &str, games: &[GameRecord], as_of: NaiveDate) -> PredictResult<Self> {
        let recent: Vec<&GameRecord> = games
            .iter()
            .rev()
            .filter(|g| g.game_date < as_of)
            .collect();

        if recent.len() < MIN_GAMES {
            return Err(PredictError::InsufficientData {
                team: team.to_string(),
                games: recent.len(),
                required: MIN_GAMES,
            });
        }

        let last_game_date = recent[0].game_date;
        let rest_days = (as_of - last_game_date).num_days();
        let wins_last_10 = recent
            .iter()
            .take(WIN_STREAK_WINDOW)
            .filter(|g| g.wl.is_win())
            .count();

        let windows = WINDOWS
            .iter()
            .map(|w| (*w, WindowStats::from_games(&recent[..w.take(recent.len())])))
            .collect();

        Ok(Self {
            team: team.to_string(),
            as_of,
            last_game_date,
            rest_days,
            back_to_back: rest_days <= BACK_TO_BACK_MAX_REST,
            wins_last_10,
            windows,
        })
    }

    pub fn window(&self, window: Window) -> Option<&WindowStats> {
        self.windows
            .iter()
            .find(|(w, _)| *w == window)
            .map(|(_, s)| s)
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        None
    } else {
        Some(sum / n as f64)
    }
}
