// Rust guideline compliant 2026-10-18

//! Loss functions paired with the reported training metric.

use domain::TaskType;
use ndarray::{Array1, Array2, ArrayView1, Axis};

/// Probabilities are clipped to `[EPSILON, 1]` before taking the log.
const EPSILON: f64 = 1e-7;

/// Loss and companion metric for one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Objective {
    /// Sparse categorical cross-entropy on soft-max outputs; metric: accuracy.
    SparseCategorical,
    /// Mean squared error on a single linear output; metric: mean absolute error.
    MeanSquared,
}

impl Objective {
    pub(crate) fn for_task(task: TaskType) -> Self {
        match task {
            TaskType::Classification => Self::SparseCategorical,
            TaskType::Regression => Self::MeanSquared,
        }
    }

    /// Curve name of the companion metric.
    pub(crate) fn metric_name(self) -> &'static str {
        match self {
            Self::SparseCategorical => "accuracy",
            Self::MeanSquared => "mae",
        }
    }

    /// Mean loss over the rows of `output`.
    pub(crate) fn loss(self, output: &Array2<f64>, y: &Array1<f64>) -> f64 {
        let n = y.len() as f64;
        match self {
            Self::SparseCategorical => {
                let total: f64 = output
                    .rows()
                    .into_iter()
                    .zip(y)
                    .map(|(p, &label)| -p[label as usize].clamp(EPSILON, 1.0).ln())
                    .sum();
                total / n
            }
            Self::MeanSquared => {
                output.column(0).iter().zip(y).map(|(o, t)| (o - t).powi(2)).sum::<f64>() / n
            }
        }
    }

    /// Mean companion metric over the rows of `output`.
    pub(crate) fn metric(self, output: &Array2<f64>, y: &Array1<f64>) -> f64 {
        let n = y.len() as f64;
        match self {
            Self::SparseCategorical => {
                let hits = output
                    .rows()
                    .into_iter()
                    .zip(y)
                    .filter(|(p, label)| argmax(p.view()) == **label as usize)
                    .count();
                hits as f64 / n
            }
            Self::MeanSquared => {
                output.column(0).iter().zip(y).map(|(o, t)| (o - t).abs()).sum::<f64>() / n
            }
        }
    }

    /// Gradient of the mean loss w.r.t. the output layer's pre-activation.
    pub(crate) fn output_delta(self, output: &Array2<f64>, y: &Array1<f64>) -> Array2<f64> {
        let n = y.len() as f64;
        match self {
            Self::SparseCategorical => {
                let mut delta = output.clone();
                for (mut row, &label) in delta.rows_mut().into_iter().zip(y) {
                    row[label as usize] -= 1.0;
                }
                delta / n
            }
            Self::MeanSquared => {
                let target = y.view().insert_axis(Axis(1));
                (output - &target) * (2.0 / n)
            }
        }
    }
}

/// Index of the largest value; first one wins on ties.
pub(crate) fn argmax(row: ArrayView1<'_, f64>) -> usize {
    row.iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(bi, bv), (i, &v)| if v > bv { (i, v) } else { (bi, bv) })
        .0
}
