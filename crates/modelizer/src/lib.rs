// Rust guideline compliant 2026-10-18

//! Model state ownership for the live model monitor.
//!
//! [`ModelManager`] owns the currently published [`ModelState`] and swaps it
//! atomically after every successful training run. Readers take one reference
//! to the published state per call, so a metrics or prediction query is always
//! answered from a single version even while a retrain is in flight.
//! Training runs are serialized; the model itself comes from an injected
//! `domain::Trainer` adapter.

pub mod metrics;
pub mod sampler;

use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Local};
use dataset::{DatasetConfig, DatasetError, StandardScaler, generate, train_test_split};
use domain::{
    Metrics, MetricSnapshot, MetricsSource, Model, ModelInfo, MonitorError, PredictionBatch, TaskType, Trainer,
    TrainingHistory,
};
use ndarray::{Array1, Array2};
use parking_lot::Mutex;
use rand::{SeedableRng, rngs::StdRng};
use uuid::Uuid;

/// Class count of the classification task; the model's soft-max width.
pub const CLASSIFICATION_CLASSES: usize = 3;

// ---------------------------------------------------------------------------
// ModelState
// ---------------------------------------------------------------------------

/// Immutable bundle of a trained model and the test split it is scored on.
///
/// Built once by [`ModelManager::train`] and never mutated afterwards.
#[derive(Debug)]
pub struct ModelState<M> {
    id: Uuid,
    task: TaskType,
    model: M,
    scaler: StandardScaler,
    test_features: Array2<f64>,
    test_labels: Array1<f64>,
    created_at: DateTime<Local>,
}

impl<M: Model> ModelState<M> {
    /// Bundle a trained model with its scaler and standardized test split.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::TrainingFailure`] when the parts disagree: label
    /// count differs from test rows, scaler width differs from feature width, or
    /// the model's output width is not [`CLASSIFICATION_CLASSES`] (classification)
    /// or 1 (regression).
    pub fn new(
        task: TaskType,
        model: M,
        scaler: StandardScaler,
        test_features: Array2<f64>,
        test_labels: Array1<f64>,
    ) -> Result<Self, MonitorError> {
        if test_features.nrows() != test_labels.len() {
            return Err(failure(format!(
                "{} test rows but {} test labels",
                test_features.nrows(),
                test_labels.len()
            )));
        }
        if scaler.n_features() != test_features.ncols() {
            return Err(failure(format!(
                "scaler fitted on {} features, test split has {}",
                scaler.n_features(),
                test_features.ncols()
            )));
        }
        let width_ok = match task {
            TaskType::Classification => model.output_dim() == CLASSIFICATION_CLASSES,
            TaskType::Regression => model.output_dim() == 1,
        };
        if !width_ok {
            return Err(failure(format!("output width {} does not fit {task}", model.output_dim())));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            task,
            model,
            scaler,
            test_features,
            test_labels,
            created_at: Local::now(),
        })
    }
}

impl<M> ModelState<M> {
    /// Version id, unique per published state.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Task the model was trained for.
    #[must_use]
    pub fn task(&self) -> TaskType {
        self.task
    }

    /// Trained model.
    #[must_use]
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Scaler fitted on the training split.
    #[must_use]
    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    /// Standardized test features.
    #[must_use]
    pub fn test_features(&self) -> &Array2<f64> {
        &self.test_features
    }

    /// Test labels, one per test row.
    #[must_use]
    pub fn test_labels(&self) -> &Array1<f64> {
        &self.test_labels
    }

    /// When the state was built.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }
}

fn failure(reason: impl ToString) -> MonitorError {
    MonitorError::TrainingFailure { reason: reason.to_string() }
}

// ---------------------------------------------------------------------------
// ManagerConfig + builder
// ---------------------------------------------------------------------------

/// Data preparation settings for [`ModelManager`].
///
/// Construct via [`ManagerConfig::builder`].
#[derive(Debug, Clone, PartialEq)]
pub struct ManagerConfig {
    /// Dataset generated for classification runs.
    pub classification: DatasetConfig,
    /// Dataset generated for regression runs.
    pub regression: DatasetConfig,
    /// Held-out fraction of every dataset.
    pub test_size: f64,
    /// Seed of the train/test shuffle.
    pub split_seed: u64,
    /// Optional seed for prediction sampling. `None` seeds from the OS.
    pub sampler_seed: Option<u64>,
}

impl ManagerConfig {
    /// Create a builder with the default presets.
    ///
    /// Default values: the per-task `DatasetConfig` presets, `test_size = 0.2`,
    /// `split_seed = 42`, `sampler_seed = None`.
    #[must_use]
    pub fn builder() -> ManagerConfigBuilder {
        ManagerConfigBuilder {
            classification: None,
            regression: None,
            test_size: 0.2,
            split_seed: 42,
            sampler_seed: None,
        }
    }

    /// Dataset settings for `task`.
    #[must_use]
    pub fn dataset(&self, task: TaskType) -> &DatasetConfig {
        match task {
            TaskType::Classification => &self.classification,
            TaskType::Regression => &self.regression,
        }
    }
}

/// Builder for [`ManagerConfig`].
#[derive(Debug)]
pub struct ManagerConfigBuilder {
    classification: Option<DatasetConfig>,
    regression: Option<DatasetConfig>,
    test_size: f64,
    split_seed: u64,
    sampler_seed: Option<u64>,
}

impl ManagerConfigBuilder {
    /// Replace the classification dataset.
    #[must_use]
    pub fn classification(mut self, config: DatasetConfig) -> Self {
        self.classification = Some(config);
        self
    }

    /// Replace the regression dataset.
    #[must_use]
    pub fn regression(mut self, config: DatasetConfig) -> Self {
        self.regression = Some(config);
        self
    }

    /// Override the held-out fraction.
    #[must_use]
    pub fn test_size(mut self, fraction: f64) -> Self {
        self.test_size = fraction;
        self
    }

    /// Override the split seed.
    #[must_use]
    pub fn split_seed(mut self, seed: u64) -> Self {
        self.split_seed = seed;
        self
    }

    /// Fix the prediction sampling seed.
    #[must_use]
    pub fn sampler_seed(mut self, seed: u64) -> Self {
        self.sampler_seed = Some(seed);
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::InvalidConfig`] when `test_size` is outside
    /// `(0, 1)`, a dataset is configured for the wrong task, or the
    /// classification dataset does not have [`CLASSIFICATION_CLASSES`] classes.
    #[must_use = "the Result must be checked; use ? or unwrap"]
    pub fn build(self) -> Result<ManagerConfig, DatasetError> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(DatasetError::InvalidConfig { reason: "test_size must be in (0, 1)".to_owned() });
        }
        let preset = |given: Option<DatasetConfig>, task: TaskType| -> Result<DatasetConfig, DatasetError> {
            let config = match given {
                Some(config) => config,
                None => DatasetConfig::builder(task).build()?,
            };
            if config.task == task {
                Ok(config)
            } else {
                Err(DatasetError::InvalidConfig { reason: format!("{task} slot holds a {} dataset", config.task) })
            }
        };
        let classification = preset(self.classification, TaskType::Classification)?;
        if classification.n_classes != CLASSIFICATION_CLASSES {
            return Err(DatasetError::InvalidConfig {
                reason: format!(
                    "classification dataset must have {CLASSIFICATION_CLASSES} classes, got {}",
                    classification.n_classes
                ),
            });
        }
        Ok(ManagerConfig {
            classification,
            regression: preset(self.regression, TaskType::Regression)?,
            test_size: self.test_size,
            split_seed: self.split_seed,
            sampler_seed: self.sampler_seed,
        })
    }
}

// ---------------------------------------------------------------------------
// ModelManager
// ---------------------------------------------------------------------------

/// Owner of the published [`ModelState`].
///
/// Generic over the `Trainer` adapter. Reads never block on a training run.
pub struct ModelManager<T: Trainer> {
    trainer: T,
    config: ManagerConfig,
    state: ArcSwapOption<ModelState<T::Model>>,
    training: Mutex<()>,
    rng: Mutex<StdRng>,
}

impl<T: Trainer> std::fmt::Debug for ModelManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelManager")
            .field("version", &self.current().map(|s| s.id))
            .field("training", &self.is_training())
            .finish_non_exhaustive()
    }
}

impl<T: Trainer> ModelManager<T> {
    /// Create a manager with nothing published.
    #[must_use]
    pub fn new(trainer: T, config: ManagerConfig) -> Self {
        let rng = match config.sampler_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            trainer,
            config,
            state: ArcSwapOption::empty(),
            training: Mutex::new(()),
            rng: Mutex::new(rng),
        }
    }

    /// Generate, split, scale and fit a model for `task`, then publish it.
    ///
    /// Blocks until any other training run has finished. The new state becomes
    /// visible in one swap once it is complete; on failure the previous state
    /// stays published.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::TrainingFailure`] when data preparation or the
    /// trainer fails.
    pub fn train(&self, task: TaskType) -> Result<TrainingHistory, MonitorError> {
        let _guard = self.training.lock();
        let started = Instant::now();
        tracing::info!(%task, "modelizer.train.started");

        let result = self.build_state(task);
        let elapsed_ms = started.elapsed().as_millis();
        match result {
            Ok((state, history)) => {
                let version = state.id;
                self.state.store(Some(Arc::new(state)));
                tracing::info!(%task, %version, elapsed_ms, "modelizer.train.completed");
                Ok(history)
            }
            Err(e) => {
                tracing::warn!(%task, error = %e, elapsed_ms, "modelizer.train.failed");
                Err(e)
            }
        }
    }

    fn build_state(&self, task: TaskType) -> Result<(ModelState<T::Model>, TrainingHistory), MonitorError> {
        let data = generate(self.config.dataset(task));
        let split = train_test_split(&data, self.config.test_size, self.config.split_seed).map_err(failure)?;
        let scaler = StandardScaler::fit(&split.train.features).map_err(failure)?;
        let x_train = scaler.transform(&split.train.features).map_err(failure)?;
        let x_test = scaler.transform(&split.test.features).map_err(failure)?;
        let trained = self.trainer.train(task, &x_train, &split.train.labels)?;
        let state = ModelState::new(task, trained.model, scaler, x_test, split.test.labels)?;
        Ok((state, trained.history))
    }

    /// The published state, if any.
    #[must_use]
    pub fn current(&self) -> Option<Arc<ModelState<T::Model>>> {
        self.state.load_full()
    }

    fn published(&self) -> Result<Arc<ModelState<T::Model>>, MonitorError> {
        self.current().ok_or(MonitorError::NotReady)
    }

    /// Score the published model and stamp the result with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::NotReady`] before the first successful training.
    pub fn get_metrics(&self) -> Result<MetricSnapshot, MonitorError> {
        self.current_metrics().map(MetricSnapshot::now)
    }

    /// Sample up to `n` distinct test rows with their predictions.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::NotReady`] before the first successful training.
    pub fn get_prediction_sample(&self, n: usize) -> Result<PredictionBatch, MonitorError> {
        let state = self.published()?;
        let mut rng = self.rng.lock();
        sampler::sample(&state, n, &mut *rng)
    }

    /// Architecture summary of the published model.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::NotReady`] before the first successful training.
    pub fn get_model_info(&self) -> Result<ModelInfo, MonitorError> {
        let state = self.published()?;
        let layers = state.model.layers();
        Ok(ModelInfo {
            model_type: state.task,
            total_params: layers.iter().map(|l| l.param_count).sum(),
            layers,
        })
    }

    /// `true` while a training run holds the training lock.
    #[must_use]
    pub fn is_training(&self) -> bool {
        self.training.is_locked()
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }
}

impl<T: Trainer> MetricsSource for ModelManager<T> {
    fn current_metrics(&self) -> Result<Metrics, MonitorError> {
        let state = self.published()?;
        metrics::compute(&state)
    }
}

// ---------------------------------------------------------------------------
// Test support
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use domain::{LayerSummary, ModelError, TrainedModel, TrainerError};

    /// Uniform class probabilities, or the constant `1.0` for a single output.
    #[derive(Debug)]
    pub(crate) struct ConstantModel {
        width: usize,
    }

    impl ConstantModel {
        pub(crate) fn new(width: usize) -> Self {
            Self { width }
        }
    }

    impl Model for ConstantModel {
        fn predict(&self, features: &Array2<f64>) -> Result<Array2<f64>, ModelError> {
            Ok(Array2::from_elem((features.nrows(), self.width), 1.0 / self.width as f64))
        }

        fn output_dim(&self) -> usize {
            self.width
        }

        fn layers(&self) -> Vec<LayerSummary> {
            vec![LayerSummary {
                name: "dense".to_owned(),
                layer_type: "Dense".to_owned(),
                output_shape: format!("(None, {})", self.width),
                param_count: 21 * self.width,
            }]
        }
    }

    /// Trainer that instantly returns a [`ConstantModel`] of the right width.
    #[derive(Debug)]
    pub(crate) struct ConstantTrainer;

    impl Trainer for ConstantTrainer {
        type Model = ConstantModel;

        fn train(
            &self,
            task: TaskType,
            _features: &Array2<f64>,
            _labels: &Array1<f64>,
        ) -> Result<TrainedModel<ConstantModel>, TrainerError> {
            let width = if task == TaskType::Classification { 3 } else { 1 };
            let mut history = TrainingHistory::new();
            history.push("loss", 1.0);
            Ok(TrainedModel { model: ConstantModel::new(width), history })
        }
    }

    /// State over `rows` synthetic test rows with 4 features.
    pub(crate) fn state(task: TaskType, model: ConstantModel, rows: usize) -> ModelState<ConstantModel> {
        let features = Array2::from_shape_fn((rows, 4), |(i, j)| (i * 4 + j) as f64);
        let labels = Array1::from_shape_fn(rows, |i| match task {
            TaskType::Classification => (i % 3) as f64,
            TaskType::Regression => i as f64 * 0.5,
        });
        let scaler = StandardScaler::fit(&features).unwrap();
        ModelState::new(task, model, scaler, features, labels).unwrap()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
