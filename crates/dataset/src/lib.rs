// Rust guideline compliant 2026-10-18

//! Dataset component -- generates seeded synthetic datasets, splits them into
//! train/test partitions, and standardizes features.
//!
//! Entry points: [`generate`], [`train_test_split`], [`StandardScaler::fit`].
//! Configuration via [`DatasetConfig::builder`].

use domain::TaskType;
use ndarray::{Array1, Array2, Axis, s};
use rand::seq::SliceRandom as _;
use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::StandardNormal;

/// Gaussian clusters generated per class.
const CLUSTERS_PER_CLASS: usize = 2;

/// Half side length of the hypercube whose vertices hold the cluster centroids.
const CLASS_SEP: f64 = 1.0;

/// Fraction of classification labels reassigned at random.
const FLIP_Y: f64 = 0.01;

/// Regression ground-truth coefficients are drawn from `[0, COEF_SCALE)`.
const COEF_SCALE: f64 = 100.0;

// ---------------------------------------------------------------------------
// DatasetError
// ---------------------------------------------------------------------------

/// Errors that can occur while building, splitting or scaling a dataset.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DatasetError {
    /// The supplied configuration is invalid.
    #[error("invalid dataset configuration: {reason}")]
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
    /// A matrix has the wrong number of columns.
    #[error("expected {expected} feature columns, got {actual}")]
    ShapeMismatch {
        /// Column count the operation was fitted for.
        expected: usize,
        /// Column count supplied.
        actual: usize,
    },
    /// The input has no rows.
    #[error("dataset is empty")]
    Empty,
}

// ---------------------------------------------------------------------------
// DatasetConfig + builder
// ---------------------------------------------------------------------------

/// Shape and seed of a synthetic dataset.
///
/// Construct via [`DatasetConfig::builder`].
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetConfig {
    /// Which generator to run.
    pub task: TaskType,
    /// Number of rows.
    pub n_samples: usize,
    /// Total feature columns.
    pub n_features: usize,
    /// Columns carrying signal.
    pub n_informative: usize,
    /// Linear combinations of the informative columns (classification only).
    pub n_redundant: usize,
    /// Number of classes (classification only).
    pub n_classes: usize,
    /// Standard deviation of the Gaussian noise added to regression targets.
    pub noise: f64,
    /// RNG seed; the same seed always yields the same dataset.
    pub seed: u64,
}

/// Builder for [`DatasetConfig`].
///
/// Obtain via [`DatasetConfig::builder`]; finalize with [`build`](Self::build).
#[derive(Debug)]
pub struct DatasetConfigBuilder {
    config: DatasetConfig,
}

impl DatasetConfig {
    /// Create a builder pre-filled with the preset for `task`.
    ///
    /// Classification: 1000 rows, 20 features (15 informative, 5 redundant),
    /// 3 classes. Regression: 1000 rows, 20 features (10 informative), noise
    /// 0.1. Both use seed 42.
    #[must_use]
    pub fn builder(task: TaskType) -> DatasetConfigBuilder {
        let config = match task {
            TaskType::Classification => Self {
                task,
                n_samples: 1000,
                n_features: 20,
                n_informative: 15,
                n_redundant: 5,
                n_classes: 3,
                noise: 0.0,
                seed: 42,
            },
            TaskType::Regression => Self {
                task,
                n_samples: 1000,
                n_features: 20,
                n_informative: 10,
                n_redundant: 0,
                n_classes: 0,
                noise: 0.1,
                seed: 42,
            },
        };
        DatasetConfigBuilder { config }
    }
}

impl DatasetConfigBuilder {
    /// Override the row count.
    #[must_use]
    pub fn n_samples(mut self, n: usize) -> Self {
        self.config.n_samples = n;
        self
    }

    /// Override the total column count.
    #[must_use]
    pub fn n_features(mut self, n: usize) -> Self {
        self.config.n_features = n;
        self
    }

    /// Override the informative column count.
    #[must_use]
    pub fn n_informative(mut self, n: usize) -> Self {
        self.config.n_informative = n;
        self
    }

    /// Override the redundant column count.
    #[must_use]
    pub fn n_redundant(mut self, n: usize) -> Self {
        self.config.n_redundant = n;
        self
    }

    /// Override the class count.
    #[must_use]
    pub fn n_classes(mut self, n: usize) -> Self {
        self.config.n_classes = n;
        self
    }

    /// Override the regression noise level.
    #[must_use]
    pub fn noise(mut self, noise: f64) -> Self {
        self.config.noise = noise;
        self
    }

    /// Fix a different RNG seed.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::InvalidConfig`] when the counts are inconsistent
    /// or the noise level is negative.
    #[must_use = "the Result must be checked; use ? or unwrap"]
    pub fn build(self) -> Result<DatasetConfig, DatasetError> {
        let c = self.config;
        let invalid = |reason: &str| Err(DatasetError::InvalidConfig { reason: reason.to_owned() });
        if c.n_samples == 0 {
            return invalid("n_samples must be >= 1");
        }
        if c.n_informative == 0 {
            return invalid("n_informative must be >= 1");
        }
        if c.n_informative + c.n_redundant > c.n_features {
            return invalid("n_informative + n_redundant must be <= n_features");
        }
        if c.task == TaskType::Classification && c.n_classes < 2 {
            return invalid("n_classes must be >= 2");
        }
        if !c.noise.is_finite() || c.noise < 0.0 {
            return invalid("noise must be finite and >= 0");
        }
        Ok(c)
    }
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// Feature matrix with one label per row.
///
/// Labels are class ids stored as `f64` for classification, targets for regression.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Rows x features.
    pub features: Array2<f64>,
    /// One entry per row.
    pub labels: Array1<f64>,
}

impl Dataset {
    /// Number of rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.features.nrows()
    }

    /// Copy of the rows at `indices`, in that order.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            features: self.features.select(Axis(0), indices),
            labels: self.labels.select(Axis(0), indices),
        }
    }
}

/// Generate the dataset described by `config`.
///
/// Deterministic: equal configurations produce equal datasets.
#[must_use]
pub fn generate(config: &DatasetConfig) -> Dataset {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let dataset = match config.task {
        TaskType::Classification => make_classification(config, &mut rng),
        TaskType::Regression => make_regression(config, &mut rng),
    };
    tracing::debug!(
        task = %config.task,
        rows = dataset.rows(),
        features = config.n_features,
        "dataset.generated"
    );
    dataset
}

fn standard_normal(rng: &mut StdRng) -> f64 {
    rng.sample(StandardNormal)
}

/// Gaussian clusters around hypercube vertices, two clusters per class.
fn make_classification(c: &DatasetConfig, rng: &mut StdRng) -> Dataset {
    let n_inf = c.n_informative;
    let n_clusters = c.n_classes * CLUSTERS_PER_CLASS;
    let centroids: Vec<Array1<f64>> = (0..n_clusters)
        .map(|_| Array1::from_shape_fn(n_inf, |_| if rng.random::<bool>() { CLASS_SEP } else { -CLASS_SEP }))
        .collect();

    let mut features = Array2::zeros((c.n_samples, c.n_features));
    let mut labels = Array1::zeros(c.n_samples);
    let mut row = 0;
    for (k, centroid) in centroids.iter().enumerate() {
        let count = c.n_samples / n_clusters + usize::from(k < c.n_samples % n_clusters);
        // Random linear map gives every cluster its own covariance.
        let mixing = Array2::from_shape_fn((n_inf, n_inf), |_| rng.random_range(-1.0..1.0));
        for _ in 0..count {
            let z = Array1::from_shape_fn(n_inf, |_| standard_normal(rng));
            let x = z.dot(&mixing) + centroid;
            features.slice_mut(s![row, ..n_inf]).assign(&x);
            labels[row] = (k % c.n_classes) as f64;
            row += 1;
        }
    }

    if c.n_redundant > 0 {
        let combo = Array2::from_shape_fn((n_inf, c.n_redundant), |_| rng.random_range(-1.0..1.0));
        let redundant = features.slice(s![.., ..n_inf]).dot(&combo);
        features.slice_mut(s![.., n_inf..n_inf + c.n_redundant]).assign(&redundant);
    }
    for v in features.slice_mut(s![.., n_inf + c.n_redundant..]).iter_mut() {
        *v = standard_normal(rng);
    }

    for label in &mut labels {
        if rng.random::<f64>() < FLIP_Y {
            *label = rng.random_range(0..c.n_classes) as f64;
        }
    }

    shuffle_rows(Dataset { features, labels }, rng)
}

/// Linear ground truth over the informative columns plus Gaussian noise.
fn make_regression(c: &DatasetConfig, rng: &mut StdRng) -> Dataset {
    let features = Array2::from_shape_fn((c.n_samples, c.n_features), |_| standard_normal(rng));
    let mut coef = Array1::zeros(c.n_features);
    for w in coef.slice_mut(s![..c.n_informative]).iter_mut() {
        *w = COEF_SCALE * rng.random::<f64>();
    }
    let noise = Array1::from_shape_fn(c.n_samples, |_| c.noise * standard_normal(rng));
    let labels = features.dot(&coef) + noise;
    shuffle_rows(Dataset { features, labels }, rng)
}

fn shuffle_rows(dataset: Dataset, rng: &mut StdRng) -> Dataset {
    let mut order: Vec<usize> = (0..dataset.rows()).collect();
    order.shuffle(rng);
    dataset.select(&order)
}

// ---------------------------------------------------------------------------
// Train/test split
// ---------------------------------------------------------------------------

/// Disjoint train and test partitions of one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    /// Training rows.
    pub train: Dataset,
    /// Held-out rows; `ceil(test_size * n)` of them.
    pub test: Dataset,
}

/// Shuffle `dataset` with `seed` and hold out `ceil(test_size * rows)` rows.
///
/// # Errors
///
/// Returns [`DatasetError::InvalidConfig`] when `test_size` is outside `(0, 1)`
/// or either partition would be empty.
pub fn train_test_split(dataset: &Dataset, test_size: f64, seed: u64) -> Result<Split, DatasetError> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(DatasetError::InvalidConfig { reason: "test_size must be in (0, 1)".to_owned() });
    }
    let n = dataset.rows();
    let n_test = (test_size * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(DatasetError::InvalidConfig {
            reason: format!("cannot hold out {n_test} of {n} rows"),
        });
    }
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));
    let (test_idx, train_idx) = order.split_at(n_test);
    Ok(Split { train: dataset.select(train_idx), test: dataset.select(test_idx) })
}

// ---------------------------------------------------------------------------
// StandardScaler
// ---------------------------------------------------------------------------

/// Per-column z-score scaler: `(x - mean) / std`.
///
/// Columns with zero variance are scaled by 1 so they map to 0.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    /// Fit column means and population standard deviations on `features`.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Empty`] when `features` has no rows.
    pub fn fit(features: &Array2<f64>) -> Result<Self, DatasetError> {
        let mean = features.mean_axis(Axis(0)).ok_or(DatasetError::Empty)?;
        let scale = features
            .std_axis(Axis(0), 0.0)
            .mapv(|sd| if sd > 0.0 { sd } else { 1.0 });
        Ok(Self { mean, scale })
    }

    /// Standardize `features` with the fitted parameters.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::ShapeMismatch`] when the column count differs
    /// from the fitted one.
    pub fn transform(&self, features: &Array2<f64>) -> Result<Array2<f64>, DatasetError> {
        if features.ncols() != self.mean.len() {
            return Err(DatasetError::ShapeMismatch {
                expected: self.mean.len(),
                actual: features.ncols(),
            });
        }
        Ok((features - &self.mean) / &self.scale)
    }

    /// Fitted column means.
    #[must_use]
    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    /// Fitted column scales (standard deviations, 1 for constant columns).
    #[must_use]
    pub fn scale(&self) -> &Array1<f64> {
        &self.scale
    }

    /// Number of columns the scaler was fitted on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
