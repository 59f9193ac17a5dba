// Rust guideline compliant 2026-10-18

//! Feed-forward network trainer for the live model monitor.
//!
//! [`NetworkTrainer`] implements the `domain::Trainer` port: it builds a small
//! dense network with dropout, fits it with Adam on mini-batches, and records a
//! per-epoch training curve. The fitted [`Network`] implements `domain::Model`.
//! Configuration via [`TrainerConfig::builder`].

mod layers;
mod objective;
mod optimizer;

pub use layers::{Activation, Network};

use domain::{TaskType, TrainedModel, Trainer, TrainerError, TrainingHistory};
use ndarray::{Array1, Array2, Axis, s};
use rand::seq::SliceRandom as _;
use rand::{SeedableRng, rngs::StdRng};

use objective::Objective;
use optimizer::Adam;

// ---------------------------------------------------------------------------
// TrainerConfig + builder
// ---------------------------------------------------------------------------

/// Hyperparameters shared by both tasks.
///
/// Construct via [`TrainerConfig::builder`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrainerConfig {
    /// Full passes over the training rows.
    pub epochs: usize,
    /// Rows per gradient step.
    pub batch_size: usize,
    /// Fraction of the training rows, taken from the tail, held out for validation.
    pub validation_split: f64,
    /// Dropout rate after every hidden layer.
    pub dropout: f64,
    /// Hidden layer widths, input side first.
    pub hidden: Vec<usize>,
    /// Adam step size.
    pub learning_rate: f64,
    /// Output width of the classification head.
    pub n_classes: usize,
    /// Optional RNG seed for weights, shuffling and dropout. `None` seeds from the OS.
    pub seed: Option<u64>,
}

/// Builder for [`TrainerConfig`].
///
/// Obtain via [`TrainerConfig::builder`]; finalize with [`build`](Self::build).
#[derive(Debug)]
pub struct TrainerConfigBuilder {
    config: TrainerConfig,
}

impl TrainerConfig {
    /// Create a builder with the default hyperparameters.
    ///
    /// Default values: `epochs = 50`, `batch_size = 32`, `validation_split = 0.2`,
    /// `dropout = 0.3`, `hidden = [64, 32]`, `learning_rate = 0.001`,
    /// `n_classes = 3`, `seed = None`.
    #[must_use]
    pub fn builder() -> TrainerConfigBuilder {
        TrainerConfigBuilder {
            config: Self {
                epochs: 50,
                batch_size: 32,
                validation_split: 0.2,
                dropout: 0.3,
                hidden: vec![64, 32],
                learning_rate: 0.001,
                n_classes: 3,
                seed: None,
            },
        }
    }
}

impl TrainerConfigBuilder {
    /// Override the epoch count.
    #[must_use]
    pub fn epochs(mut self, epochs: usize) -> Self {
        self.config.epochs = epochs;
        self
    }

    /// Override the mini-batch size.
    #[must_use]
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    /// Override the validation fraction; `0` disables the validation curves.
    #[must_use]
    pub fn validation_split(mut self, fraction: f64) -> Self {
        self.config.validation_split = fraction;
        self
    }

    /// Override the dropout rate.
    #[must_use]
    pub fn dropout(mut self, rate: f64) -> Self {
        self.config.dropout = rate;
        self
    }

    /// Override the hidden layer widths.
    #[must_use]
    pub fn hidden(mut self, hidden: Vec<usize>) -> Self {
        self.config.hidden = hidden;
        self
    }

    /// Override the Adam learning rate.
    #[must_use]
    pub fn learning_rate(mut self, lr: f64) -> Self {
        self.config.learning_rate = lr;
        self
    }

    /// Override the classification head width.
    #[must_use]
    pub fn n_classes(mut self, n: usize) -> Self {
        self.config.n_classes = n;
        self
    }

    /// Fix the RNG seed for reproducible training (useful in tests).
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TrainerError::InvalidConfig`] when a count is zero or a rate
    /// is outside `[0, 1)`.
    #[must_use = "the Result must be checked; use ? or unwrap"]
    pub fn build(self) -> Result<TrainerConfig, TrainerError> {
        let c = self.config;
        let invalid = |reason: &str| Err(TrainerError::InvalidConfig { reason: reason.to_owned() });
        if c.epochs == 0 {
            return invalid("epochs must be >= 1");
        }
        if c.batch_size == 0 {
            return invalid("batch_size must be >= 1");
        }
        if !(0.0..1.0).contains(&c.validation_split) {
            return invalid("validation_split must be in [0, 1)");
        }
        if !(0.0..1.0).contains(&c.dropout) {
            return invalid("dropout must be in [0, 1)");
        }
        if c.hidden.contains(&0) {
            return invalid("hidden layer widths must be >= 1");
        }
        if !(c.learning_rate.is_finite() && c.learning_rate > 0.0) {
            return invalid("learning_rate must be finite and > 0");
        }
        if c.n_classes < 2 {
            return invalid("n_classes must be >= 2");
        }
        Ok(c)
    }
}

// ---------------------------------------------------------------------------
// NetworkTrainer
// ---------------------------------------------------------------------------

/// `Trainer` adapter producing a [`Network`].
#[derive(Debug, Clone)]
pub struct NetworkTrainer {
    config: TrainerConfig,
}

impl NetworkTrainer {
    /// Create a trainer from `config`.
    #[must_use]
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    /// Active hyperparameters.
    #[must_use]
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    fn validate(&self, task: TaskType, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), TrainerError> {
        let invalid = |reason: String| Err(TrainerError::InvalidInput { reason });
        if x.nrows() != y.len() {
            return invalid(format!("{} feature rows but {} labels", x.nrows(), y.len()));
        }
        if task == TaskType::Classification {
            let n = self.config.n_classes;
            if let Some(bad) = y.iter().find(|&&l| l.fract() != 0.0 || l < 0.0 || l >= n as f64) {
                return invalid(format!("label {bad} is not a class id in [0, {n})"));
            }
        }
        Ok(())
    }
}

impl Trainer for NetworkTrainer {
    type Model = Network;

    /// Fit a fresh network on `features`/`labels` and return it with its curve.
    ///
    /// The last `validation_split` of the rows is held out; the rest is
    /// reshuffled every epoch and consumed in mini-batches.
    ///
    /// # Errors
    ///
    /// Returns [`TrainerError::InvalidInput`] for mismatched or out-of-range
    /// inputs, and [`TrainerError::Diverged`] when the epoch loss is not finite.
    fn train(
        &self,
        task: TaskType,
        features: &Array2<f64>,
        labels: &Array1<f64>,
    ) -> Result<TrainedModel<Network>, TrainerError> {
        self.validate(task, features, labels)?;
        let c = &self.config;
        let n_train = (features.nrows() as f64 * (1.0 - c.validation_split)) as usize;
        if n_train == 0 {
            return Err(TrainerError::InvalidInput { reason: "no rows left for training".to_owned() });
        }
        let x_train = features.slice(s![..n_train, ..]).to_owned();
        let y_train = labels.slice(s![..n_train]).to_owned();
        let x_val = features.slice(s![n_train.., ..]).to_owned();
        let y_val = labels.slice(s![n_train..]).to_owned();

        let mut rng = match c.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let objective = Objective::for_task(task);
        let (output_dim, output_activation) = match task {
            TaskType::Classification => (c.n_classes, Activation::Softmax),
            TaskType::Regression => (1, Activation::Linear),
        };
        let mut net = Network::new(features.ncols(), &c.hidden, c.dropout, output_dim, output_activation, &mut rng);
        let mut adam = Adam::new(c.learning_rate, net.blocks());

        let metric = objective.metric_name();
        let val_metric = format!("val_{metric}");
        let mut history = TrainingHistory::new();
        let mut order: Vec<usize> = (0..n_train).collect();

        tracing::info!(%task, train_rows = n_train, val_rows = y_val.len(), epochs = c.epochs, "network.train.started");
        for epoch in 0..c.epochs {
            order.shuffle(&mut rng);
            let mut loss_sum = 0.0;
            let mut metric_sum = 0.0;
            for batch in order.chunks(c.batch_size) {
                let xb = x_train.select(Axis(0), batch);
                let yb = y_train.select(Axis(0), batch);
                let (out, caches) = net.forward_train(&xb, &mut rng);
                let rows = batch.len() as f64;
                loss_sum += objective.loss(&out, &yb) * rows;
                metric_sum += objective.metric(&out, &yb) * rows;
                let grads = net.backward(&caches, objective.output_delta(&out, &yb));
                adam.step(net.blocks_mut(), &grads);
            }
            let loss = loss_sum / n_train as f64;
            if !loss.is_finite() {
                tracing::warn!(epoch, "network.train.diverged");
                return Err(TrainerError::Diverged { epoch });
            }
            history.push("loss", loss);
            history.push(metric, metric_sum / n_train as f64);

            if !y_val.is_empty() {
                let out = net.forward(&x_val);
                history.push("val_loss", objective.loss(&out, &y_val));
                history.push(&val_metric, objective.metric(&out, &y_val));
            }
            tracing::debug!(epoch, loss, "network.epoch.completed");
        }
        tracing::info!(%task, "network.train.completed");
        Ok(TrainedModel { model: net, history })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
