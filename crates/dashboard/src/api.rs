// Rust guideline compliant 2026-10-18

//! HTTP/JSON routes of the dashboard.
//!
//! Every success body carries `"status": "success"`; every failure is rendered
//! by [`ApiError`] as `{"status": "error", "message": ...}`.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use domain::{History as _, MonitorError, TaskType, Trainer};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::context::AppContext;

/// Sample size when `n` is absent.
pub const DEFAULT_SAMPLE_SIZE: usize = 10;

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

/// A [`MonitorError`] on its way out of a handler.
///
/// `NotReady` and `InvalidRequest` map to 400; training and inference failures
/// map to 500.
#[derive(Debug)]
pub struct ApiError(MonitorError);

impl From<MonitorError> for ApiError {
    fn from(e: MonitorError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            MonitorError::NotReady | MonitorError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            MonitorError::TrainingFailure { .. } | MonitorError::Inference { .. } => {
                tracing::error!(error = %self.0, "dashboard.request.failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        error_body(status, &self.0.to_string())
    }
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "status": "error", "message": message }))).into_response()
}

type ApiResult = Result<Json<Value>, ApiError>;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the router over `ctx` with permissive CORS and request tracing.
pub fn router<T: Trainer + 'static>(ctx: AppContext<T>) -> Router {
    Router::new()
        .route("/api/train/classification", post(train_classification::<T>))
        .route("/api/train/regression", post(train_regression::<T>))
        .route("/api/performance", get(performance::<T>))
        .route("/api/predictions", get(predictions::<T>))
        .route("/api/history/performance", get(performance_history::<T>))
        .route("/api/model/info", get(model_info::<T>))
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn not_found() -> Response {
    error_body(StatusCode::NOT_FOUND, "Not found")
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn train_classification<T: Trainer + 'static>(State(ctx): State<AppContext<T>>) -> ApiResult {
    train(&ctx, TaskType::Classification).await
}

async fn train_regression<T: Trainer + 'static>(State(ctx): State<AppContext<T>>) -> ApiResult {
    train(&ctx, TaskType::Regression).await
}

/// Training is CPU bound; it runs on the blocking pool so reads keep flowing.
async fn train<T: Trainer + 'static>(ctx: &AppContext<T>, task: TaskType) -> ApiResult {
    let manager = Arc::clone(&ctx.manager);
    let history = tokio::task::spawn_blocking(move || manager.train(task))
        .await
        .map_err(|e| MonitorError::TrainingFailure { reason: e.to_string() })??;
    let label = match task {
        TaskType::Classification => "Classification",
        TaskType::Regression => "Regression",
    };
    Ok(Json(json!({
        "status": "success",
        "message": format!("{label} model trained successfully"),
        "history": history,
    })))
}

/// Current metrics; the returned snapshot is also appended to the history.
async fn performance<T: Trainer>(State(ctx): State<AppContext<T>>) -> ApiResult {
    let snapshot = ctx.manager.get_metrics()?;
    ctx.history.append(snapshot.clone());
    Ok(Json(json!({
        "status": "success",
        "model_type": snapshot.metrics.task(),
        "metrics": snapshot,
    })))
}

#[derive(Debug, Deserialize)]
struct PredictionParams {
    n: Option<String>,
}

impl PredictionParams {
    fn sample_size(&self) -> Result<usize, MonitorError> {
        match self.n.as_deref() {
            None => Ok(DEFAULT_SAMPLE_SIZE),
            Some(raw) => raw.trim().parse().map_err(|_parse_error| MonitorError::InvalidRequest {
                reason: format!("n must be a non-negative integer, got {raw:?}"),
            }),
        }
    }
}

async fn predictions<T: Trainer>(
    State(ctx): State<AppContext<T>>,
    Query(params): Query<PredictionParams>,
) -> ApiResult {
    let n = params.sample_size()?;
    let batch = ctx.manager.get_prediction_sample(n)?;
    Ok(Json(json!({
        "status": "success",
        "model_type": batch.task,
        "predictions": batch,
    })))
}

async fn performance_history<T: Trainer>(State(ctx): State<AppContext<T>>) -> Json<Value> {
    Json(json!({
        "status": "success",
        "history": ctx.history.list_all(),
    }))
}

async fn model_info<T: Trainer>(State(ctx): State<AppContext<T>>) -> ApiResult {
    let info = ctx.manager.get_model_info()?;
    Ok(Json(json!({
        "status": "success",
        "model_type": info.model_type,
        "total_params": info.total_params,
        "layers": info.layers,
    })))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ring_history::RingHistory;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, header};
    use domain::{TrainedModel, TrainerError};
    use modelizer::{ManagerConfig, ModelManager};
    use ndarray::{Array1, Array2};
    use network::{NetworkTrainer, TrainerConfig};
    use tower::ServiceExt as _;

    fn test_app() -> (Router, AppContext) {
        let trainer = NetworkTrainer::new(TrainerConfig::builder().epochs(2).seed(3).build().unwrap());
        let manager = ModelManager::new(trainer, ManagerConfig::builder().sampler_seed(4).build().unwrap());
        let ctx = AppContext::new(manager, RingHistory::default());
        (router(ctx.clone()), ctx)
    }

    async fn call(app: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
        call(app, Method::GET, uri).await
    }

    fn assert_not_ready(status: StatusCode, body: &Value) {
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "No model trained yet");
    }

    // ------------------------------------------------------------------
    // Before training
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn reads_before_training_report_not_ready() {
        let (app, _) = test_app();
        for uri in ["/api/performance", "/api/predictions", "/api/model/info"] {
            let (status, body) = get_json(&app, uri).await;
            assert_not_ready(status, &body);
        }
    }

    #[tokio::test]
    async fn history_starts_empty() {
        let (app, _) = test_app();
        let (status, body) = get_json(&app, "/api/history/performance").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["history"], json!([]));
    }

    #[tokio::test]
    async fn unknown_route_is_404_envelope() {
        let (app, _) = test_app();
        let (status, body) = get_json(&app, "/api/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "error");
    }

    // ------------------------------------------------------------------
    // Classification flow
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn train_then_query_classification() {
        let (app, ctx) = test_app();

        let (status, body) = call(&app, Method::POST, "/api/train/classification").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "Classification model trained successfully");
        assert_eq!(body["history"]["loss"].as_array().unwrap().len(), 2);
        assert!(body["history"]["val_accuracy"].is_array());

        let (status, body) = get_json(&app, "/api/performance").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["model_type"], "classification");
        for key in ["accuracy", "precision", "recall", "f1_score"] {
            let v = body["metrics"][key].as_f64().unwrap();
            assert!((0.0..=1.0).contains(&v), "{key} = {v}");
        }
        assert!(body["metrics"]["timestamp"].is_string());
        assert!(body["metrics"].get("mse").is_none());
        assert_eq!(ctx.history.len(), 1);

        let (status, body) = get_json(&app, "/api/history/performance").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["history"].as_array().unwrap().len(), 1);
        assert!(body["history"][0]["accuracy"].is_number());

        let (status, body) = get_json(&app, "/api/predictions?n=5").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["model_type"], "classification");
        let p = &body["predictions"];
        for key in ["indices", "actual", "predicted", "confidence"] {
            assert_eq!(p[key].as_array().unwrap().len(), 5, "{key}");
        }
        assert!(p["actual"][0].is_u64());
        assert!(p.get("task").is_none());

        let (_, body) = get_json(&app, "/api/predictions").await;
        assert_eq!(body["predictions"]["indices"].as_array().unwrap().len(), DEFAULT_SAMPLE_SIZE);

        let (_, body) = get_json(&app, "/api/predictions?n=100000").await;
        assert_eq!(body["predictions"]["indices"].as_array().unwrap().len(), 200);
    }

    #[tokio::test]
    async fn malformed_sample_size_is_invalid_request() {
        let (app, _) = test_app();
        for uri in ["/api/predictions?n=abc", "/api/predictions?n=-3", "/api/predictions?n=1.5"] {
            let (status, body) = get_json(&app, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["status"], "error");
            assert!(body["message"].as_str().unwrap().starts_with("invalid request"), "{uri}");
        }
    }

    // ------------------------------------------------------------------
    // Regression flow
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn model_info_after_regression_training() {
        let (app, _) = test_app();
        let (status, body) = call(&app, Method::POST, "/api/train/regression").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["history"]["val_mae"].is_array());

        let (status, body) = get_json(&app, "/api/model/info").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["model_type"], "regression");
        assert_eq!(body["total_params"], 1344 + 2080 + 33);
        let layers = body["layers"].as_array().unwrap();
        assert_eq!(layers.len(), 5);
        assert_eq!(layers[0]["name"], "dense");
        assert_eq!(layers[0]["type"], "Dense");
        assert_eq!(layers[1]["type"], "Dropout");
        assert_eq!(layers[4]["output_shape"], "(None, 1)");

        let (_, body) = get_json(&app, "/api/performance").await;
        assert_eq!(body["model_type"], "regression");
        assert!(body["metrics"]["r2_score"].is_number());

        let (_, body) = get_json(&app, "/api/predictions?n=3").await;
        assert_eq!(body["predictions"]["confidence"], json!([1.0, 1.0, 1.0]));
    }

    // ------------------------------------------------------------------
    // Training failure
    // ------------------------------------------------------------------

    /// Always diverges on the first epoch.
    struct DivergingTrainer;

    impl Trainer for DivergingTrainer {
        type Model = network::Network;

        fn train(
            &self,
            _task: TaskType,
            _features: &Array2<f64>,
            _labels: &Array1<f64>,
        ) -> Result<TrainedModel<Self::Model>, TrainerError> {
            Err(TrainerError::Diverged { epoch: 0 })
        }
    }

    #[tokio::test]
    async fn failed_training_is_500_envelope_and_publishes_nothing() {
        let manager = ModelManager::new(DivergingTrainer, ManagerConfig::builder().build().unwrap());
        let app = router(AppContext::new(manager, RingHistory::default()));

        for uri in ["/api/train/classification", "/api/train/regression"] {
            let (status, body) = call(&app, Method::POST, uri).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
            assert_eq!(body["status"], "error");
            assert_eq!(body["message"], "training failed: loss diverged at epoch 0");
        }

        let (status, body) = get_json(&app, "/api/performance").await;
        assert_not_ready(status, &body);
    }

    // ------------------------------------------------------------------
    // Layers
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn cors_allows_any_origin() {
        let (app, _) = test_app();
        let request = Request::builder()
            .uri("/api/history/performance")
            .header(header::ORIGIN, "http://example.com")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}
