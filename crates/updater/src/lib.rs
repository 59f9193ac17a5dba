// Rust guideline compliant 2026-10-18

//! Background updater: periodically scores the published model, perturbs the
//! metrics with a small jitter and appends the result to the history.
//!
//! Entry points: [`Updater::tick_once`], [`Updater::run`].
//! Configuration via [`UpdaterConfig::builder`].

use std::time::Duration;

use domain::{History, MetricSnapshot, MetricsSource, MonitorError};
use parking_lot::Mutex;
use rand::Rng as _;
use rand::{SeedableRng, rngs::StdRng};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

// ---------------------------------------------------------------------------
// UpdaterError
// ---------------------------------------------------------------------------

/// Errors that can occur during updater operation.
#[derive(Debug, thiserror::Error)]
pub enum UpdaterError {
    /// The supplied configuration is invalid.
    #[error("invalid updater configuration: {reason}")]
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
    /// The metrics source could not produce metrics.
    #[error("metrics source error: {0}")]
    Source(#[from] MonitorError),
}

// ---------------------------------------------------------------------------
// UpdaterConfig + builder
// ---------------------------------------------------------------------------

/// Runtime configuration for an [`Updater`].
///
/// Construct via [`UpdaterConfig::builder`].
#[derive(Debug, Clone, PartialEq)]
pub struct UpdaterConfig {
    /// Delay between successive ticks.
    pub interval: Duration,
    /// Each metric moves by a uniform draw in `[-jitter, jitter]`.
    pub jitter: f64,
    /// Optional upper bound on the number of ticks. `None` means until shutdown.
    pub iterations: Option<u64>,
    /// Optional RNG seed for reproducible jitter. `None` seeds from the OS.
    pub seed: Option<u64>,
}

/// Builder for [`UpdaterConfig`].
///
/// Obtain via [`UpdaterConfig::builder`]; finalize with [`build`](Self::build).
#[derive(Debug)]
pub struct UpdaterConfigBuilder {
    config: UpdaterConfig,
}

impl UpdaterConfig {
    /// Create a builder.
    ///
    /// Default values: `interval = 5 s`, `jitter = 0.01`, `iterations = None`, `seed = None`.
    #[must_use]
    pub fn builder() -> UpdaterConfigBuilder {
        UpdaterConfigBuilder {
            config: Self {
                interval: Duration::from_secs(5),
                jitter: 0.01,
                iterations: None,
                seed: None,
            },
        }
    }
}

impl UpdaterConfigBuilder {
    /// Override the tick interval.
    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.interval = interval;
        self
    }

    /// Override the jitter amplitude.
    #[must_use]
    pub fn jitter(mut self, jitter: f64) -> Self {
        self.config.jitter = jitter;
        self
    }

    /// Set a finite tick count. Without this the updater runs until shutdown.
    #[must_use]
    pub fn iterations(mut self, n: u64) -> Self {
        self.config.iterations = Some(n);
        self
    }

    /// Fix the RNG seed for deterministic jitter (useful in tests).
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`UpdaterError::InvalidConfig`] when `interval` is zero or
    /// `jitter` is negative or not finite.
    #[must_use = "the Result must be checked; use ? or unwrap"]
    pub fn build(self) -> Result<UpdaterConfig, UpdaterError> {
        if self.config.interval.is_zero() {
            return Err(UpdaterError::InvalidConfig { reason: "interval must be > 0".to_owned() });
        }
        if !(self.config.jitter.is_finite() && self.config.jitter >= 0.0) {
            return Err(UpdaterError::InvalidConfig {
                reason: format!("jitter must be finite and >= 0, got {}", self.config.jitter),
            });
        }
        Ok(self.config)
    }
}

// ---------------------------------------------------------------------------
// Updater
// ---------------------------------------------------------------------------

/// Appends jittered metric snapshots of a `MetricsSource` to a `History`.
///
/// Dependencies are injected per call; the updater only owns its RNG.
#[derive(Debug)]
pub struct Updater {
    config: UpdaterConfig,
    rng: Mutex<StdRng>,
}

impl Updater {
    /// Create a new updater from `config`.
    ///
    /// Seeds the RNG from `config.seed` if set, otherwise from the OS.
    #[must_use]
    pub fn new(config: UpdaterConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { config, rng: Mutex::new(rng) }
    }

    /// Score `source` once, jitter the result and append it to `history`.
    ///
    /// Returns the appended snapshot. Classification metrics are clamped back
    /// into `[0, 1]` after jitter; regression metrics are left unclamped.
    ///
    /// # Errors
    ///
    /// Returns [`UpdaterError::Source`] when `source` fails, including
    /// `NotReady` before the first model is published. Nothing is appended then.
    pub fn tick_once<S, H>(&self, source: &S, history: &H) -> Result<MetricSnapshot, UpdaterError>
    where
        S: MetricsSource + ?Sized,
        H: History + ?Sized,
    {
        let metrics = source.current_metrics()?;
        let amplitude = self.config.jitter;
        let jittered = {
            let mut rng = self.rng.lock();
            metrics.jittered(|| rng.random_range(-amplitude..=amplitude))
        };
        let snapshot = MetricSnapshot::now(jittered);
        history.append(snapshot.clone());
        tracing::debug!(task = %snapshot.metrics.task(), "updater.tick.appended");
        Ok(snapshot)
    }

    /// Tick every `config.interval` until stopped; returns the number of
    /// snapshots appended.
    ///
    /// The first tick fires immediately. Stops cleanly when:
    /// - `shutdown` holds `true` or its sender is dropped, or
    /// - `config.iterations` ticks have run.
    ///
    /// Tick failures never stop the loop: `NotReady` is skipped at debug
    /// level, anything else is logged as a warning.
    pub async fn run<S, H>(&self, source: &S, history: &H, mut shutdown: watch::Receiver<bool>) -> u64
    where
        S: MetricsSource + ?Sized,
        H: History + ?Sized,
    {
        if *shutdown.borrow_and_update() {
            tracing::info!("updater.run.stopped: shutdown before start");
            return 0;
        }
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = 0u64;
        let mut appended = 0u64;
        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow_and_update() {
                        tracing::info!(ticks, appended, "updater.run.stopped: shutdown");
                        return appended;
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            match self.tick_once(source, history) {
                Ok(_) => appended += 1,
                Err(UpdaterError::Source(MonitorError::NotReady)) => {
                    tracing::debug!("updater.tick.skipped: no model published");
                }
                Err(e) => tracing::warn!(error = %e, "updater.tick.failed"),
            }

            ticks += 1;
            if let Some(max) = self.config.iterations
                && ticks >= max
            {
                tracing::info!(ticks, appended, "updater.run.stopped: iteration limit reached");
                return appended;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
