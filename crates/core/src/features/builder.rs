use crate::domain::odds::OddsSnapshot;
use crate::error::PredictResult;
use crate::features::team_form::{TeamForm, Window, WINDOWS};
use crate::features::FeatureVector;
use crate::odds::pricing::implied_probability;
use crate::store::GameLogStore;
use chrono::NaiveDate;
use std::sync::Arc;

/// Turns the shared log store into per-matchup feature vectors.
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    store: Arc<GameLogStore>,
}

impl FeatureBuilder {
    pub fn new(store: Arc<GameLogStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &GameLogStore {
        &self.store
    }

    pub fn team_form(&self, team: &str, as_of: NaiveDate) -> PredictResult<TeamForm> {
        let games = self.store.team_games(team)?;
        TeamForm::compute(team, games, as_of)
    }

    pub fn build(&self, home: &str, away: &str, as_of: NaiveDate) -> PredictResult<FeatureVector> {
        tracing::debug!(home, away, %as_of, "building feature vector");

        let home_form = self.team_form(home, as_of)?;
        let away_form = self.team_form(away, as_of)?;

        let features = combine(&home_form, &away_form, self.store.league_pace());
        tracing::debug!(home, away, features = features.len(), "feature vector built");
        Ok(features)
    }
}

/// Pairs two teams' form into side-prefixed values and home-minus-away differentials.
pub fn combine(home: &TeamForm, away: &TeamForm, league_pace: f64) -> FeatureVector {
    let mut fv = FeatureVector::new();

    for window in WINDOWS {
        let (Some(h), Some(a)) = (home.window(window), away.window(window)) else {
            continue;
        };
        let suffix = window.suffix();
        for ((stem, hv), (_, av)) in h.named().into_iter().zip(a.named()) {
            fv.insert_opt(format!("home_{stem}_{suffix}"), hv);
            fv.insert_opt(format!("away_{stem}_{suffix}"), av);
            if let (Some(hv), Some(av)) = (hv, av) {
                fv.insert(format!("{stem}_diff_{suffix}"), hv - av);
            }
        }
    }

    fv.insert("home_rest_days", home.rest_days as f64);
    fv.insert("away_rest_days", away.rest_days as f64);
    fv.insert("rest_advantage", (home.rest_days - away.rest_days) as f64);
    fv.insert("is_home_back_to_back", flag(home.back_to_back));
    fv.insert("is_away_back_to_back", flag(away.back_to_back));

    fv.insert("home_win_streak_last_10", home.wins_last_10 as f64);
    fv.insert("away_win_streak_last_10", away.wins_last_10 as f64);
    fv.insert(
        "win_streak_diff",
        home.wins_last_10 as f64 - away.wins_last_10 as f64,
    );

    insert_form_aliases(&mut fv, home, away);

    fv.insert("league_pace", league_pace);
    if let (Some(h5), Some(a5)) = (home.window(Window::Last(5)), away.window(Window::Last(5))) {
        let matchup_pace = (h5.pace + a5.pace) / 2.0;
        fv.insert(
            "pace_adj_total",
            pace_adjusted_total(h5.ppg + a5.ppg, matchup_pace, league_pace),
        );
    }

    fv
}

/// Names the trained models were fit on for the short-window form stats.
fn insert_form_aliases(fv: &mut FeatureVector, home: &TeamForm, away: &TeamForm) {
    let (Some(h3), Some(a3)) = (home.window(Window::Last(3)), away.window(Window::Last(3))) else {
        return;
    };
    fv.insert("home_avg_pts_last_3", h3.ppg);
    fv.insert("away_avg_pts_last_3", a3.ppg);
    fv.insert("form_diff_pts_3", h3.ppg - a3.ppg);
    fv.insert("fg_pct_roll3_home", h3.fg_pct);
    fv.insert("fg_pct_roll3_away", a3.fg_pct);
    fv.insert("fg_pct_diff_form", h3.fg_pct - a3.fg_pct);
    fv.insert("reb_diff_form", h3.reb - a3.reb);
    fv.insert("tov_diff_form", h3.tov - a3.tov);

    if let (Some(h5), Some(a5)) = (home.window(Window::Last(5)), away.window(Window::Last(5))) {
        fv.insert("home_avg_pts_last_5", h5.ppg);
        fv.insert("away_avg_pts_last_5", a5.ppg);
    }
}

/// Rescales a points total by how much faster than league average the matchup plays.
pub fn pace_adjusted_total(total: f64, matchup_pace: f64, league_pace: f64) -> f64 {
    if league_pace <= 0.0 {
        return total;
    }
    total * matchup_pace / league_pace
}

/// Adds the market-derived features once the odds snapshot is in hand.
pub fn add_market_features(fv: &mut FeatureVector, odds: &OddsSnapshot) {
    fv.insert_opt("implied_prob_home", odds.moneyline_home.map(implied_probability));
    fv.insert_opt("implied_prob_away", odds.moneyline_away.map(implied_probability));
    fv.insert_opt("spread_point", odds.spread_point);
    fv.insert_opt("outcome_point_Over", odds.total_point);
}

fn flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}
