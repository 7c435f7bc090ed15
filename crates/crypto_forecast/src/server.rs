//! HTTP service for serving forecasts.
//!
//! Two endpoints: `/` reports health and whether a model is loaded;
//! `/predict` generates a forecast, persists it best-effort, and returns
//! the rows as JSON. Persistence outcomes never change the response.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use database::{PredictionRecord, PredictionSink};
use forecast_model::ForecastModel;
use serde_json::{Value, json};
use tracing::{debug, warn};

/// Horizon used when the request does not specify one.
const DEFAULT_HORIZON_DAYS: u32 = 7;

/// Shared service state, constructed once at startup and read-only for
/// the process lifetime.
pub struct AppState {
    /// The loaded forecast model, or `None` when startup found no usable
    /// artifact.
    pub model: Option<ForecastModel>,

    /// Best-effort writer for generated forecasts.
    pub sink: Arc<dyn PredictionSink>,
}

/// Builds the service router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/predict", get(predict))
        .with_state(state)
}

/// Health endpoint: always succeeds, no side effects.
async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "model_loaded": state.model.is_some(),
    }))
}

/// Forecast endpoint.
///
/// Order matters: model availability is checked before the horizon is
/// parsed, and nothing is persisted unless a forecast was generated.
async fn predict(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let Some(model) = &state.model else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Model not loaded on server" })),
        );
    };

    let Some(days) = parse_days(params.get("days")) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid days parameter" })),
        );
    };

    let rows = model.forecast(days);
    debug!(days, rows = rows.len(), "Generated forecast");

    // Best-effort: the response below is already decided.
    let records: Vec<PredictionRecord> = rows
        .iter()
        .map(|row| PredictionRecord::new(row.ds, row.yhat))
        .collect();
    if state.sink.persist(&records).await.is_failure() {
        warn!(rows = records.len(), "Forecast rows were not persisted");
    }

    (StatusCode::OK, Json(json!(rows)))
}

/// Parses the `days` query parameter: absent means the default horizon,
/// anything that is not a positive integer is rejected.
fn parse_days(raw: Option<&String>) -> Option<u32> {
    match raw {
        None => Some(DEFAULT_HORIZON_DAYS),
        Some(s) => match s.trim().parse::<u32>() {
            Ok(days) if days >= 1 => Some(days),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{Days, NaiveDate};
    use database::{NullSink, PersistOutcome};
    use forecast_model::{ModelConfig, PricePoint, fit};

    use super::*;

    /// Sink that records how many times it was invoked.
    #[derive(Default)]
    struct CountingSink {
        calls: AtomicUsize,
        rows_seen: AtomicUsize,
    }

    #[async_trait]
    impl PredictionSink for CountingSink {
        async fn persist(&self, rows: &[PredictionRecord]) -> PersistOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.rows_seen.fetch_add(rows.len(), Ordering::SeqCst);
            PersistOutcome::Saved(rows.len())
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    /// Model trained on daily data through 2024-12-31.
    fn trained_model() -> ForecastModel {
        let start = date(2024, 11, 1);
        let points: Vec<PricePoint> = (0..61)
            .map(|i| PricePoint {
                ds: start.checked_add_days(Days::new(i)).expect("valid date"),
                y: 40_000.0 + 25.0 * i as f64,
            })
            .collect();
        fit(&points, &ModelConfig::default()).expect("fit")
    }

    fn state_with(
        model: Option<ForecastModel>,
        sink: Arc<dyn PredictionSink>,
    ) -> Arc<AppState> {
        Arc::new(AppState { model, sink })
    }

    fn query(pairs: &[(&str, &str)]) -> Query<HashMap<String, String>> {
        Query(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        )
    }

    #[tokio::test]
    async fn health_reports_model_presence() {
        let loaded = state_with(Some(trained_model()), Arc::new(NullSink));
        let Json(body) = health(State(loaded)).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["model_loaded"], true);

        let empty = state_with(None, Arc::new(NullSink));
        let Json(body) = health(State(empty)).await;
        assert_eq!(body["model_loaded"], false);
    }

    #[tokio::test]
    async fn predict_without_model_returns_500_and_never_persists() {
        let sink = Arc::new(CountingSink::default());
        let state = state_with(None, sink.clone());

        for days in ["5", "abc", "0"] {
            let (status, Json(body)) =
                predict(State(state.clone()), query(&[("days", days)])).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body["error"], "Model not loaded on server");
        }

        assert_eq!(sink.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn predict_rejects_unparseable_days_before_any_work() {
        let sink = Arc::new(CountingSink::default());
        let state = state_with(Some(trained_model()), sink.clone());

        for days in ["abc", "3.5", "-1", "0", ""] {
            let (status, Json(body)) =
                predict(State(state.clone()), query(&[("days", days)])).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "days={days}");
            assert_eq!(body["error"], "Invalid days parameter");
        }

        assert_eq!(sink.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn predict_defaults_to_seven_days() {
        let state = state_with(Some(trained_model()), Arc::new(NullSink));

        let (status, Json(implicit)) = predict(State(state.clone()), query(&[])).await;
        assert_eq!(status, StatusCode::OK);

        let (_, Json(explicit)) = predict(State(state), query(&[("days", "7")])).await;

        assert_eq!(implicit.as_array().map(Vec::len), Some(7));
        assert_eq!(implicit, explicit);
    }

    #[tokio::test]
    async fn predict_returns_dated_rows_after_training_end() {
        let state = state_with(Some(trained_model()), Arc::new(NullSink));

        let (status, Json(body)) = predict(State(state), query(&[("days", "3")])).await;
        assert_eq!(status, StatusCode::OK);

        let rows = body.as_array().expect("array body");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["ds"], "2025-01-01");
        assert_eq!(rows[1]["ds"], "2025-01-02");
        assert_eq!(rows[2]["ds"], "2025-01-03");
        for row in rows {
            assert!(row["yhat"].is_number());
        }
    }

    #[tokio::test]
    async fn persistence_failure_leaves_response_unchanged() {
        let model = trained_model();

        let healthy_sink = Arc::new(CountingSink::default());
        let healthy = state_with(Some(model.clone()), healthy_sink.clone());
        let (ok_status, Json(ok_body)) =
            predict(State(healthy), query(&[("days", "5")])).await;

        let failing = state_with(Some(model), Arc::new(NullSink));
        let (fail_status, Json(fail_body)) =
            predict(State(failing), query(&[("days", "5")])).await;

        assert_eq!(ok_status, fail_status);
        assert_eq!(ok_body, fail_body);
        assert_eq!(healthy_sink.rows_seen.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn parse_days_accepts_positive_integers_only() {
        assert_eq!(parse_days(None), Some(7));
        assert_eq!(parse_days(Some(&"1".to_string())), Some(1));
        assert_eq!(parse_days(Some(&"30".to_string())), Some(30));
        assert_eq!(parse_days(Some(&"0".to_string())), None);
        assert_eq!(parse_days(Some(&"-3".to_string())), None);
        assert_eq!(parse_days(Some(&"abc".to_string())), None);
        assert_eq!(parse_days(Some(&"7.5".to_string())), None);
    }
}
