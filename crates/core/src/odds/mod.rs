pub mod pricing;
pub mod the_odds_api;
pub mod types;

use crate::domain::odds::OddsSnapshot;
use crate::error::PredictResult;

#[async_trait::async_trait]
pub trait OddsGateway: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_odds(&self, event_id: &str, bookmaker: Option<&str>)
        -> PredictResult<OddsSnapshot>;
}
