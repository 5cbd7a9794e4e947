use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use courtline_core::domain::contract::PredictRequest;
use courtline_core::domain::prediction::{Market, PredictionResult};
use courtline_core::error::PredictError;
use courtline_core::predictor::Predictor;
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    /// `None` when startup could not load logs, models, or the odds client.
    pub predictor: Option<Arc<Predictor>>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/markets", get(markets))
        .route("/predict", post(predict))
        .route("/predict/:market", post(predict_market))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Serialize)]
struct MarketsResponse {
    markets: Vec<Market>,
    odds_provider: &'static str,
}

async fn markets(State(state): State<AppState>) -> Result<Json<MarketsResponse>, ApiError> {
    let predictor = state.predictor.as_ref().ok_or(ApiError::Unavailable)?;
    Ok(Json(MarketsResponse {
        markets: predictor.markets(),
        odds_provider: predictor.odds_provider(),
    }))
}

async fn predict(
    State(state): State<AppState>,
    body: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    run_prediction(&state, None, body).await
}

async fn predict_market(
    State(state): State<AppState>,
    Path(market): Path<String>,
    body: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    let market = Market::parse(&market)
        .ok_or_else(|| PredictError::NotFound(format!("market '{market}'")))?;
    run_prediction(&state, Some(market), body).await
}

async fn run_prediction(
    state: &AppState,
    route_market: Option<Market>,
    body: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    let predictor = state.predictor.as_ref().ok_or(ApiError::Unavailable)?;
    let Json(req) = body.map_err(|e| PredictError::validation(e.body_text()))?;
    let input = req.validate_and_into_input(route_market)?;
    let result = predictor.predict(input, Utc::now()).await?;
    Ok(Json(result))
}

#[derive(Debug)]
pub enum ApiError {
    Unavailable,
    Predict(PredictError),
}

impl From<PredictError> for ApiError {
    fn from(e: PredictError) -> Self {
        ApiError::Predict(e)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorBody {
                    error: "predictor unavailable".to_string(),
                    kind: "unavailable",
                },
            ),
            ApiError::Predict(e) => {
                let status = match &e {
                    PredictError::InsufficientData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    PredictError::NotFound(_) => StatusCode::NOT_FOUND,
                    PredictError::Upstream(_) => StatusCode::BAD_GATEWAY,
                    PredictError::Validation(_) => StatusCode::BAD_REQUEST,
                    PredictError::Internal(inner) => {
                        sentry_anyhow::capture_anyhow(inner);
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                if status.is_server_error() {
                    tracing::error!(error = %e, kind = e.kind(), "prediction failed");
                } else {
                    tracing::warn!(error = %e, kind = e.kind(), "prediction rejected");
                }
                (
                    status,
                    ErrorBody {
                        error: e.to_string(),
                        kind: e.kind(),
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
