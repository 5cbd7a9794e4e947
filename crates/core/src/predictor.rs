use crate::domain::contract::PredictionInput;
use crate::domain::odds::OddsSnapshot;
use crate::domain::prediction::{Market, PredictionResult, Side, TeamPair};
use crate::domain::team::full_name;
use crate::edge::EdgePolicy;
use crate::error::{PredictError, PredictResult};
use crate::features::builder::{add_market_features, FeatureBuilder};
use crate::model::ModelRegistry;
use crate::odds::OddsGateway;
use crate::time::nba_calendar::eastern_date;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Request-path orchestration: features, live odds, model, then edge.
#[derive(Clone)]
pub struct Predictor {
    features: FeatureBuilder,
    models: Arc<ModelRegistry>,
    odds: Arc<dyn OddsGateway>,
    policy: EdgePolicy,
}

impl Predictor {
    pub fn new(
        features: FeatureBuilder,
        models: Arc<ModelRegistry>,
        odds: Arc<dyn OddsGateway>,
        policy: EdgePolicy,
    ) -> Self {
        Self {
            features,
            models,
            odds,
            policy,
        }
    }

    pub fn markets(&self) -> Vec<Market> {
        self.models.markets()
    }

    pub fn odds_provider(&self) -> &'static str {
        self.odds.provider_name()
    }

    pub async fn predict(
        &self,
        input: PredictionInput,
        now_utc: DateTime<Utc>,
    ) -> PredictResult<PredictionResult> {
        let store = self.features.store();
        for team in [&input.home_team, &input.away_team] {
            if !store.contains_team(team) {
                return Err(PredictError::NotFound(format!("team '{team}'")));
            }
        }
        if self.models.get(input.market).is_none() {
            return Err(PredictError::validation(format!(
                "market '{}' is not available",
                input.market
            )));
        }

        let as_of = match input.game_date {
            Some(d) => d,
            None => eastern_date(now_utc),
        };

        let (snapshot, mut features) = tokio::try_join!(
            self.odds
                .fetch_odds(&input.event_id, input.bookmaker.as_deref()),
            async {
                self.features
                    .build(&input.home_team, &input.away_team, as_of)
            },
        )?;

        check_event_teams(&snapshot, &input)?;
        let (book_price, opposing_price) = side_prices(&snapshot, input.market, input.user_side)?;

        add_market_features(&mut features, &snapshot);
        let model_prob = self
            .models
            .probability(input.market, input.user_side, &features)?;

        let user_odds = input.user_odds.unwrap_or(book_price);
        let implied_prob = self
            .policy
            .implied_probability(user_odds, Some(opposing_price));
        let assessment = self.policy.assess(model_prob, implied_prob);

        tracing::info!(
            market = %input.market,
            home = %input.home_team,
            away = %input.away_team,
            side = %input.user_side,
            %as_of,
            event_id = %input.event_id,
            books = ?snapshot.bookmakers,
            model_prob = assessment.model_prob,
            implied_prob = assessment.implied_prob,
            value_edge = assessment.value_edge,
            "prediction computed"
        );

        Ok(PredictionResult {
            bet_type: input.market,
            teams: TeamPair {
                home: input.home_team,
                away: input.away_team,
            },
            user_side: input.user_side,
            user_odds,
            implied_prob: assessment.implied_prob,
            model_prob: assessment.model_prob,
            value_edge: assessment.value_edge,
            model_recommendation: assessment.recommendation,
            confidence_level: assessment.confidence,
        })
    }
}

/// Book price for the user's side and for the opposite side of the same market.
/// Both must be quoted, along with the line for spread and total markets.
fn side_prices(snap: &OddsSnapshot, market: Market, side: Side) -> PredictResult<(f64, f64)> {
    let (line_ok, first, second, names) = match market {
        Market::Moneyline => (
            true,
            snap.moneyline_home,
            snap.moneyline_away,
            ["moneyline_home", "moneyline_away"],
        ),
        Market::Spread => (
            snap.spread_point.is_some(),
            snap.spread_price_home,
            snap.spread_price_away,
            ["spread_price_home", "spread_price_away"],
        ),
        Market::Overunder => (
            snap.total_point.is_some(),
            snap.over_price,
            snap.under_price,
            ["over_price", "under_price"],
        ),
    };

    if !line_ok {
        return Err(PredictError::validation(format!(
            "no {market} line quoted for event {}",
            snap.event_id
        )));
    }
    let (Some(first), Some(second)) = (first, second) else {
        let missing: Vec<&str> = [(first, names[0]), (second, names[1])]
            .into_iter()
            .filter(|(v, _)| v.is_none())
            .map(|(_, n)| n)
            .collect();
        return Err(PredictError::validation(format!(
            "odds for event {} missing {}",
            snap.event_id,
            missing.join(", ")
        )));
    };

    if side.is_modeled() {
        Ok((first, second))
    } else {
        Ok((second, first))
    }
}

fn check_event_teams(snap: &OddsSnapshot, input: &PredictionInput) -> PredictResult<()> {
    let pairs = [
        ("home", &input.home_team, snap.home_team.as_str()),
        ("away", &input.away_team, snap.away_team.as_str()),
    ];
    for (role, abbr, event_name) in pairs {
        let Some(expected) = full_name(abbr) else {
            continue;
        };
        if event_name.is_empty() || event_name.eq_ignore_ascii_case(expected) {
            continue;
        }
        return Err(PredictError::validation(format!(
            "event {} lists {event_name} as {role} team, request says {abbr}",
            snap.event_id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::game::fixtures::game;
    use crate::domain::game::{GameOutcome, GameRecord};
    use crate::domain::prediction::{ConfidenceLevel, Recommendation};
    use crate::model::artifact::Output;
    use crate::model::fixtures::{constant_moneyline, single_feature};
    use crate::store::GameLogStore;
    use chrono::{NaiveDate, TimeZone};
    use std::sync::Mutex;

    struct StubOdds {
        snapshot: PredictResult<OddsSnapshot>,
        calls: Mutex<Vec<(String, Option<String>)>>,
    }

    impl StubOdds {
        fn new(snapshot: PredictResult<OddsSnapshot>) -> Arc<Self> {
            Arc::new(Self {
                snapshot,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl OddsGateway for StubOdds {
        fn provider_name(&self) -> &'static str {
            "stub"
        }

        async fn fetch_odds(
            &self,
            event_id: &str,
            bookmaker: Option<&str>,
        ) -> PredictResult<OddsSnapshot> {
            self.calls
                .lock()
                .unwrap()
                .push((event_id.to_string(), bookmaker.map(str::to_string)));
            match &self.snapshot {
                Ok(s) => Ok(s.clone()),
                Err(e) => Err(PredictError::Upstream(e.to_string())),
            }
        }
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn records() -> Vec<GameRecord> {
        let mut out = Vec::new();
        for (team, opp, days) in [
            ("BOS", "CHA", vec![1, 3, 5, 7]),
            ("LAL", "UTA", vec![2, 4, 6]),
            ("NYK", "DET", vec![2, 4]),
        ] {
            for day in days {
                let id = format!("{team}-{day}");
                out.push(game(team, &id, d(day), GameOutcome::Win, 112.0));
                out.push(game(opp, &id, d(day), GameOutcome::Loss, 104.0));
            }
        }
        out
    }

    fn snapshot() -> OddsSnapshot {
        OddsSnapshot {
            event_id: "evt-1".to_string(),
            home_team: "Boston Celtics".to_string(),
            away_team: "Los Angeles Lakers".to_string(),
            moneyline_home: Some(-122.222_222_222_222_2),
            moneyline_away: Some(102.0),
            spread_point: Some(-4.5),
            spread_price_home: Some(-110.0),
            spread_price_away: Some(-110.0),
            total_point: None,
            over_price: None,
            under_price: None,
            bookmakers: vec!["draftkings".to_string()],
        }
    }

    fn predictor(odds: Arc<StubOdds>, models: ModelRegistry) -> Predictor {
        let store = Arc::new(GameLogStore::from_records(records()));
        Predictor::new(
            FeatureBuilder::new(store),
            Arc::new(models),
            odds,
            EdgePolicy::default(),
        )
    }

    fn input(market: Market, side: Side) -> PredictionInput {
        PredictionInput {
            home_team: "BOS".to_string(),
            away_team: "LAL".to_string(),
            user_side: side,
            market,
            event_id: "evt-1".to_string(),
            bookmaker: Some("draftkings".to_string()),
            user_odds: None,
            game_date: Some(d(10)),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 10, 18, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn moneyline_edge_end_to_end() {
        let odds = StubOdds::new(Ok(snapshot()));
        let p = predictor(odds.clone(), ModelRegistry::new([constant_moneyline(0.62)]));

        let res = p
            .predict(input(Market::Moneyline, Side::Home), now())
            .await
            .unwrap();

        assert_eq!(res.bet_type, Market::Moneyline);
        assert_eq!(res.teams.home, "BOS");
        assert_eq!(res.model_prob, 0.62);
        assert_eq!(res.implied_prob, 0.55);
        assert_eq!(res.value_edge, 0.07);
        assert_eq!(res.model_recommendation, Recommendation::Bet);
        assert_eq!(res.confidence_level, ConfidenceLevel::Moderate);

        let calls = odds.calls.lock().unwrap();
        assert_eq!(
            calls.as_slice(),
            &[("evt-1".to_string(), Some("draftkings".to_string()))]
        );
    }

    #[tokio::test]
    async fn request_odds_override_book_price() {
        let odds = StubOdds::new(Ok(snapshot()));
        let p = predictor(odds, ModelRegistry::new([constant_moneyline(0.62)]));

        let mut req = input(Market::Moneyline, Side::Away);
        req.user_odds = Some(150.0);
        let res = p.predict(req, now()).await.unwrap();

        assert_eq!(res.user_odds, 150.0);
        assert_eq!(res.implied_prob, 0.4);
        assert_eq!(res.model_prob, 0.38);
        assert_eq!(res.value_edge, -0.02);
        assert_eq!(res.model_recommendation, Recommendation::Pass);
        assert_eq!(res.confidence_level, ConfidenceLevel::Low);
    }

    #[tokio::test]
    async fn spread_reads_market_features() {
        let model = single_feature(
            Market::Spread,
            "spread_point",
            0.0,
            -1.0,
            Output::Regression { sigma: None },
        );
        let p = predictor(StubOdds::new(Ok(snapshot())), ModelRegistry::new([model]));

        let res = p
            .predict(input(Market::Spread, Side::Home), now())
            .await
            .unwrap();
        // margin = 4.5 against sigma 6.56
        assert_eq!(res.model_prob, 0.754);
        assert_eq!(res.user_odds, -110.0);
        assert_eq!(res.implied_prob, 0.524);
    }

    #[tokio::test]
    async fn missing_market_odds_is_a_validation_error() {
        let model = single_feature(
            Market::Overunder,
            "pace_adj_total",
            -220.0,
            1.0,
            Output::Regression { sigma: None },
        );
        let p = predictor(StubOdds::new(Ok(snapshot())), ModelRegistry::new([model]));

        let err = p
            .predict(input(Market::Overunder, Side::Over), now())
            .await
            .unwrap_err();
        assert!(matches!(err, PredictError::Validation(_)));
    }

    #[tokio::test]
    async fn thin_logs_and_unknown_teams_fail_before_scoring() {
        let p = predictor(
            StubOdds::new(Ok(snapshot())),
            ModelRegistry::new([constant_moneyline(0.6)]),
        );

        let mut thin = input(Market::Moneyline, Side::Home);
        thin.away_team = "NYK".to_string();
        let err = p.predict(thin, now()).await.unwrap_err();
        assert!(matches!(
            err,
            PredictError::InsufficientData { ref team, games: 2, required: 3 } if team == "NYK"
        ));

        let mut unknown = input(Market::Moneyline, Side::Home);
        unknown.away_team = "SAC".to_string();
        let err = p.predict(unknown, now()).await.unwrap_err();
        assert!(matches!(err, PredictError::NotFound(_)));
    }

    #[tokio::test]
    async fn upstream_and_team_mismatch_surface() {
        let failing = predictor(
            StubOdds::new(Err(PredictError::Upstream("down".to_string()))),
            ModelRegistry::new([constant_moneyline(0.6)]),
        );
        let err = failing
            .predict(input(Market::Moneyline, Side::Home), now())
            .await
            .unwrap_err();
        assert!(matches!(err, PredictError::Upstream(_)));

        let mut swapped = snapshot();
        std::mem::swap(&mut swapped.home_team, &mut swapped.away_team);
        let p = predictor(
            StubOdds::new(Ok(swapped)),
            ModelRegistry::new([constant_moneyline(0.6)]),
        );
        let err = p
            .predict(input(Market::Moneyline, Side::Home), now())
            .await
            .unwrap_err();
        assert!(matches!(err, PredictError::Validation(_)));
    }

    #[tokio::test]
    async fn unloaded_market_is_rejected() {
        let p = predictor(
            StubOdds::new(Ok(snapshot())),
            ModelRegistry::new([constant_moneyline(0.6)]),
        );
        let err = p
            .predict(input(Market::Spread, Side::Home), now())
            .await
            .unwrap_err();
        assert!(matches!(err, PredictError::Validation(_)));
        assert_eq!(p.markets(), vec![Market::Moneyline]);
    }
}
