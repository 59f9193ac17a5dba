// Rust guideline compliant 2026-10-18

//! Evaluation of a published [`ModelState`](crate::ModelState) on its test split.
//!
//! Classification scores use support-weighted averages over every class that
//! occurs in either the true or the predicted labels; a class with no
//! predictions (or no support) contributes 0 instead of dividing by zero.

use domain::{Metrics, Model, MonitorError, TaskType};
use ndarray::ArrayView1;

use crate::ModelState;

/// Run inference on the state's test rows and score it for its task.
///
/// # Errors
///
/// Returns [`MonitorError::Inference`] if the model rejects the test matrix.
pub fn compute<M: Model>(state: &ModelState<M>) -> Result<Metrics, MonitorError> {
    let output = state.model().predict(state.test_features())?;
    let labels = state.test_labels();
    Ok(match state.task() {
        TaskType::Classification => {
            let actual: Vec<usize> = labels.iter().map(|&l| l as usize).collect();
            let predicted: Vec<usize> = output.rows().into_iter().map(|r| predicted_class(r).0).collect();
            classification(&actual, &predicted)
        }
        TaskType::Regression => {
            regression(&labels.to_vec(), &output.column(0).to_vec())
        }
    })
}

/// Arg-max class of one probability row and its probability.
pub(crate) fn predicted_class(row: ArrayView1<'_, f64>) -> (usize, f64) {
    row.iter()
        .copied()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, p)| if p > best.1 { (i, p) } else { best })
}

/// Accuracy plus weighted precision, recall and F1.
#[must_use]
pub fn classification(actual: &[usize], predicted: &[usize]) -> Metrics {
    let n = actual.len();
    if n == 0 {
        return Metrics::Classification { accuracy: 0.0, precision: 0.0, recall: 0.0, f1_score: 0.0 };
    }
    let n_classes = actual.iter().chain(predicted).max().map_or(0, |&c| c + 1);
    let mut tp = vec![0usize; n_classes];
    let mut pred_count = vec![0usize; n_classes];
    let mut support = vec![0usize; n_classes];
    for (&a, &p) in actual.iter().zip(predicted) {
        support[a] += 1;
        pred_count[p] += 1;
        if a == p {
            tp[a] += 1;
        }
    }
    let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
    let (mut precision, mut recall, mut f1) = (0.0, 0.0, 0.0);
    for c in 0..n_classes {
        let weight = support[c] as f64 / n as f64;
        let p = ratio(tp[c], pred_count[c]);
        let r = ratio(tp[c], support[c]);
        let f = if p + r > 0.0 { 2.0 * p * r / (p + r) } else { 0.0 };
        precision += weight * p;
        recall += weight * r;
        f1 += weight * f;
    }
    Metrics::Classification {
        accuracy: ratio(tp.iter().sum(), n),
        precision,
        recall,
        f1_score: f1,
    }
}

/// MSE, RMSE, R² and MAE.
///
/// R² is 1 for a perfect fit of constant targets and 0 for an imperfect one.
#[must_use]
pub fn regression(actual: &[f64], predicted: &[f64]) -> Metrics {
    let n = actual.len();
    if n == 0 {
        return Metrics::Regression { mse: 0.0, rmse: 0.0, r2_score: 0.0, mae: 0.0 };
    }
    let nf = n as f64;
    let mean = actual.iter().sum::<f64>() / nf;
    let (mut ss_res, mut ss_tot, mut abs) = (0.0, 0.0, 0.0);
    for (&a, &p) in actual.iter().zip(predicted) {
        ss_res += (a - p).powi(2);
        ss_tot += (a - mean).powi(2);
        abs += (a - p).abs();
    }
    let mse = ss_res / nf;
    let r2_score = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else if ss_res == 0.0 {
        1.0
    } else {
        0.0
    };
    Metrics::Regression { mse, rmse: mse.sqrt(), r2_score, mae: abs / nf }
}
