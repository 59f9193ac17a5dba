// Rust guideline compliant 2026-10-18

//! Shared domain types for the live model monitor.
//!
//! Defines the metric, prediction and model-description types served over
//! HTTP, the error taxonomy, and the hexagonal port traits: `Model`,
//! `Trainer`, `MetricsSource`, and `History`.
//! All components depend on this crate; no other workspace crate is imported here.

use std::collections::BTreeMap;

use chrono::{DateTime, Local};
use ndarray::{Array1, Array2};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Task type
// ---------------------------------------------------------------------------

/// Kind of model currently published.
///
/// Serialized as `"classification"` / `"regression"` (the `model_type` field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    /// Discrete class output (soft-max over the classes).
    Classification,
    /// Single continuous output.
    Regression,
}

impl TaskType {
    /// Lowercase name, identical to the serialized form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Classification => "classification",
            Self::Regression => "regression",
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Metric values for one evaluation of the published model.
///
/// The variant fixes the key set, so a value can never mix classification and
/// regression keys. Serialized as a flat map of metric name to value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Metrics {
    /// Weighted classification scores, each in `[0, 1]`.
    Classification {
        accuracy: f64,
        precision: f64,
        recall: f64,
        f1_score: f64,
    },
    /// Regression errors; unbounded.
    Regression {
        mse: f64,
        rmse: f64,
        r2_score: f64,
        mae: f64,
    },
}

impl Metrics {
    /// Task type this metric set belongs to.
    #[must_use]
    pub fn task(&self) -> TaskType {
        match self {
            Self::Classification { .. } => TaskType::Classification,
            Self::Regression { .. } => TaskType::Regression,
        }
    }

    /// Metric names and values, in serialization order.
    #[must_use]
    pub fn entries(&self) -> [(&'static str, f64); 4] {
        match *self {
            Self::Classification { accuracy, precision, recall, f1_score } => [
                ("accuracy", accuracy),
                ("precision", precision),
                ("recall", recall),
                ("f1_score", f1_score),
            ],
            Self::Regression { mse, rmse, r2_score, mae } => {
                [("mse", mse), ("rmse", rmse), ("r2_score", r2_score), ("mae", mae)]
            }
        }
    }

    /// Return a new value with `draw()` added to every field.
    ///
    /// `draw` is called once per field in serialization order. Classification
    /// fields are clamped back into `[0, 1]`; regression fields are left
    /// unclamped.
    #[must_use]
    pub fn jittered(&self, mut draw: impl FnMut() -> f64) -> Self {
        let unit = |v: f64| v.clamp(0.0, 1.0);
        match *self {
            Self::Classification { accuracy, precision, recall, f1_score } => {
                Self::Classification {
                    accuracy: unit(accuracy + draw()),
                    precision: unit(precision + draw()),
                    recall: unit(recall + draw()),
                    f1_score: unit(f1_score + draw()),
                }
            }
            Self::Regression { mse, rmse, r2_score, mae } => Self::Regression {
                mse: mse + draw(),
                rmse: rmse + draw(),
                r2_score: r2_score + draw(),
                mae: mae + draw(),
            },
        }
    }
}

/// One time-stamped metric record, as stored in the performance history.
///
/// Serialized flat: the metric fields followed by an ISO-8601 `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSnapshot {
    /// Metric values.
    #[serde(flatten)]
    pub metrics: Metrics,
    /// Wall-clock time the snapshot was taken.
    pub timestamp: DateTime<Local>,
}

impl MetricSnapshot {
    /// Stamp `metrics` with the current local time.
    #[must_use]
    pub fn now(metrics: Metrics) -> Self {
        Self { metrics, timestamp: Local::now() }
    }
}

// ---------------------------------------------------------------------------
// Predictions
// ---------------------------------------------------------------------------

/// A single actual or predicted value.
///
/// Untagged: class ids serialize as integers, regression targets as reals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Label {
    /// Class index.
    Class(usize),
    /// Continuous target.
    Value(f64),
}

/// A random sample of test-set predictions.
///
/// The four sequences are parallel: position `i` of each describes the test
/// row `indices[i]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionBatch {
    /// Sampled row indices into the test set, distinct.
    pub indices: Vec<usize>,
    /// True label per sampled row.
    pub actual: Vec<Label>,
    /// Model output per sampled row.
    pub predicted: Vec<Label>,
    /// Max class probability, or the constant `1.0` placeholder for regression.
    pub confidence: Vec<f64>,
    /// Task of the model state the sample was drawn from.
    #[serde(skip)]
    pub task: TaskType,
}

impl PredictionBatch {
    /// Number of sampled rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// `true` when no rows were sampled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Model description and training curve
// ---------------------------------------------------------------------------

/// Description of one network layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerSummary {
    /// Layer name, e.g. `"dense_1"`.
    pub name: String,
    /// Layer kind, e.g. `"Dense"`.
    #[serde(rename = "type")]
    pub layer_type: String,
    /// Output shape with a free batch dimension, e.g. `"(None, 64)"`.
    pub output_shape: String,
    /// Trainable parameter count.
    pub param_count: usize,
}

/// Architecture summary of the published model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    /// Task of the published model.
    pub model_type: TaskType,
    /// Sum of all layer parameter counts.
    pub total_params: usize,
    /// Layers in forward order.
    pub layers: Vec<LayerSummary>,
}

/// Per-epoch training curve keyed by curve name (`loss`, `val_loss`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TrainingHistory(BTreeMap<String, Vec<f64>>);

impl TrainingHistory {
    /// Create an empty curve set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one epoch value to the curve `name`, creating it if needed.
    pub fn push(&mut self, name: &str, value: f64) {
        self.0.entry(name.to_owned()).or_default().push(value);
    }

    /// Values recorded for `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.0.get(name).map(Vec::as_slice)
    }

    /// Curve names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of epochs recorded (length of the longest curve).
    #[must_use]
    pub fn epochs(&self) -> usize {
        self.0.values().map(Vec::len).max().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced by the monitor's query and training operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MonitorError {
    /// No model state has been published yet.
    #[error("No model trained yet")]
    NotReady,
    /// The caller supplied malformed input.
    #[error("invalid request: {reason}")]
    InvalidRequest {
        /// Human-readable description.
        reason: String,
    },
    /// Training failed; the previously published state is untouched.
    #[error("training failed: {reason}")]
    TrainingFailure {
        /// Human-readable description.
        reason: String,
    },
    /// Inference against the published model failed.
    #[error("inference failed: {reason}")]
    Inference {
        /// Human-readable description.
        reason: String,
    },
}

/// Errors from the `Trainer` port.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrainerError {
    /// Hyperparameters are inconsistent.
    #[error("invalid trainer configuration: {reason}")]
    InvalidConfig {
        /// Human-readable description.
        reason: String,
    },
    /// Training data does not fit the requested task.
    #[error("invalid training input: {reason}")]
    InvalidInput {
        /// Human-readable description.
        reason: String,
    },
    /// The loss became NaN or infinite.
    #[error("loss diverged at epoch {epoch}")]
    Diverged {
        /// Zero-based epoch index.
        epoch: usize,
    },
}

impl From<TrainerError> for MonitorError {
    fn from(e: TrainerError) -> Self {
        Self::TrainingFailure { reason: e.to_string() }
    }
}

/// Errors from the `Model` port.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// The feature matrix does not match the model's input width.
    #[error("expected {expected} input features, got {actual}")]
    ShapeMismatch {
        /// Input width the model was built for.
        expected: usize,
        /// Width of the supplied matrix.
        actual: usize,
    },
}

impl From<ModelError> for MonitorError {
    fn from(e: ModelError) -> Self {
        Self::Inference { reason: e.to_string() }
    }
}

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Hexagonal port: a trained model used for inference.
///
/// Implemented by the network adapter. Inference never mutates the model, so
/// one instance is shared by all readers.
pub trait Model: Send + Sync {
    /// Run inference on every row of `features`.
    ///
    /// Returns one output row per input row: class probabilities for
    /// classification, a single column for regression.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ShapeMismatch`] if the column count is wrong.
    fn predict(&self, features: &Array2<f64>) -> Result<Array2<f64>, ModelError>;

    /// Width of each output row.
    fn output_dim(&self) -> usize;

    /// Layer descriptions in forward order.
    fn layers(&self) -> Vec<LayerSummary>;

    /// Total trainable parameters.
    fn param_count(&self) -> usize {
        self.layers().iter().map(|l| l.param_count).sum()
    }
}

/// Output of a successful [`Trainer::train`] call.
#[derive(Debug)]
pub struct TrainedModel<M> {
    /// The fitted model.
    pub model: M,
    /// Per-epoch loss and metric curves.
    pub history: TrainingHistory,
}

/// Hexagonal port: the training library.
///
/// Treated as a black box: given a task and a standardized training split it
/// returns a fitted model and its training curve, or fails.
pub trait Trainer: Send + Sync {
    /// Concrete model type produced.
    type Model: Model;

    /// Build and fit a model for `task`.
    ///
    /// `labels` holds class ids (as `f64`) for classification and targets for
    /// regression; its length equals the row count of `features`.
    ///
    /// # Errors
    ///
    /// Returns a [`TrainerError`] when the inputs are unusable or training diverges.
    fn train(
        &self,
        task: TaskType,
        features: &Array2<f64>,
        labels: &Array1<f64>,
    ) -> Result<TrainedModel<Self::Model>, TrainerError>;
}

/// Hexagonal port: source of fresh, un-stamped metrics for the published model.
pub trait MetricsSource: Send + Sync {
    /// Evaluate the currently published model.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::NotReady`] before the first successful training.
    fn current_metrics(&self) -> Result<Metrics, MonitorError>;
}

/// Hexagonal port: bounded, ordered store of metric snapshots.
pub trait History: Send + Sync {
    /// Append `snapshot`, evicting the oldest entry when full.
    fn append(&self, snapshot: MetricSnapshot);

    /// Copy of every stored snapshot, oldest first.
    fn list_all(&self) -> Vec<MetricSnapshot>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classification(v: f64) -> Metrics {
        Metrics::Classification { accuracy: v, precision: v, recall: v, f1_score: v }
    }

    #[test]
    fn task_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TaskType::Classification).unwrap(), "\"classification\"");
        assert_eq!(serde_json::to_string(&TaskType::Regression).unwrap(), "\"regression\"");
        assert_eq!(TaskType::Regression.to_string(), "regression");
    }

    #[test]
    fn metrics_task_matches_variant() {
        assert_eq!(classification(0.5).task(), TaskType::Classification);
        let r = Metrics::Regression { mse: 4.0, rmse: 2.0, r2_score: 0.9, mae: 1.5 };
        assert_eq!(r.task(), TaskType::Regression);
        let keys: Vec<_> = r.entries().iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, ["mse", "rmse", "r2_score", "mae"]);
    }

    #[test]
    fn jitter_clamps_classification_into_unit_interval() {
        let up = classification(0.995).jittered(|| 0.01);
        let down = classification(0.005).jittered(|| -0.01);
        for (_, v) in up.entries() {
            assert!((v - 1.0).abs() < f64::EPSILON, "expected clamp to 1, got {v}");
        }
        for (_, v) in down.entries() {
            assert!(v.abs() < f64::EPSILON, "expected clamp to 0, got {v}");
        }
    }

    #[test]
    fn jitter_leaves_regression_unclamped() {
        let r = Metrics::Regression { mse: 120.0, rmse: 10.95, r2_score: -0.005, mae: 8.0 };
        let j = r.jittered(|| -0.01);
        let Metrics::Regression { mse, r2_score, .. } = j else {
            panic!("variant changed");
        };
        assert!((mse - 119.99).abs() < 1e-9);
        assert!((r2_score - -0.015).abs() < 1e-9, "negative values must pass through");
    }

    #[test]
    fn jitter_returns_new_value() {
        let original = classification(0.5);
        let mut calls = 0;
        let _ = original.jittered(|| {
            calls += 1;
            0.01
        });
        assert_eq!(calls, 4);
        assert_eq!(original, classification(0.5));
    }

    #[test]
    fn snapshot_serializes_flat_with_timestamp() {
        let snap = MetricSnapshot::now(classification(0.75));
        let v: serde_json::Value = serde_json::to_value(&snap).unwrap();
        let obj = v.as_object().unwrap();
        assert_eq!(obj.len(), 5);
        for key in ["accuracy", "precision", "recall", "f1_score", "timestamp"] {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert!(obj["timestamp"].is_string());
    }

    #[test]
    fn labels_serialize_untagged() {
        let v = serde_json::to_value([Label::Class(2), Label::Value(1.5)]).unwrap();
        assert_eq!(v, serde_json::json!([2, 1.5]));
    }

    #[test]
    fn layer_summary_uses_type_key() {
        let layer = LayerSummary {
            name: "dense".to_owned(),
            layer_type: "Dense".to_owned(),
            output_shape: "(None, 64)".to_owned(),
            param_count: 1344,
        };
        let v = serde_json::to_value(&layer).unwrap();
        assert_eq!(v["type"], "Dense");
        assert_eq!(v["param_count"], 1344);
    }

    #[test]
    fn training_history_tracks_epochs() {
        let mut h = TrainingHistory::new();
        assert_eq!(h.epochs(), 0);
        h.push("loss", 1.0);
        h.push("loss", 0.5);
        h.push("val_loss", 1.2);
        assert_eq!(h.epochs(), 2);
        assert_eq!(h.get("loss"), Some(&[1.0, 0.5][..]));
        assert_eq!(h.names().collect::<Vec<_>>(), ["loss", "val_loss"]);
        let v = serde_json::to_value(&h).unwrap();
        assert_eq!(v["loss"], serde_json::json!([1.0, 0.5]));
    }

    #[test]
    fn error_messages() {
        assert_eq!(MonitorError::NotReady.to_string(), "No model trained yet");
        let e: MonitorError = TrainerError::Diverged { epoch: 3 }.into();
        assert_eq!(
            e,
            MonitorError::TrainingFailure { reason: "loss diverged at epoch 3".to_owned() }
        );
        let e: MonitorError = ModelError::ShapeMismatch { expected: 20, actual: 3 }.into();
        assert_eq!(e.to_string(), "inference failed: expected 20 input features, got 3");
    }

    #[test]
    fn prediction_batch_skips_task_in_json() {
        let batch = PredictionBatch {
            indices: vec![4],
            actual: vec![Label::Class(1)],
            predicted: vec![Label::Class(1)],
            confidence: vec![0.8],
            task: TaskType::Classification,
        };
        assert_eq!(batch.len(), 1);
        assert!(!batch.is_empty());
        let v = serde_json::to_value(&batch).unwrap();
        assert!(v.get("task").is_none());
        assert_eq!(v["indices"], serde_json::json!([4]));
    }
}
