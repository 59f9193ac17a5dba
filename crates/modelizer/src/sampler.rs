// Rust guideline compliant 2026-10-18

//! Random sample of test-set predictions.

use domain::{Label, Model, MonitorError, PredictionBatch, TaskType};
use ndarray::Axis;
use rand::Rng;

use crate::ModelState;
use crate::metrics::predicted_class;

/// Regression has no confidence measure; every row reports this constant.
pub const REGRESSION_CONFIDENCE: f64 = 1.0;

/// Draw `min(n, test rows)` distinct test rows and pair each with its true
/// label, the model's prediction and a confidence value.
///
/// # Errors
///
/// Returns [`MonitorError::Inference`] if the model rejects the sampled rows.
pub fn sample<M: Model, R: Rng + ?Sized>(
    state: &ModelState<M>,
    n: usize,
    rng: &mut R,
) -> Result<PredictionBatch, MonitorError> {
    let rows = state.test_labels().len();
    let indices = rand::seq::index::sample(rng, rows, n.min(rows)).into_vec();
    let output = state.model().predict(&state.test_features().select(Axis(0), &indices))?;
    let truth = state.test_labels();

    let mut batch = PredictionBatch {
        indices: Vec::with_capacity(indices.len()),
        actual: Vec::with_capacity(indices.len()),
        predicted: Vec::with_capacity(indices.len()),
        confidence: Vec::with_capacity(indices.len()),
        task: state.task(),
    };
    for (&idx, row) in indices.iter().zip(output.rows()) {
        let (actual, predicted, confidence) = match state.task() {
            TaskType::Classification => {
                let (class, prob) = predicted_class(row);
                (Label::Class(truth[idx] as usize), Label::Class(class), prob)
            }
            TaskType::Regression => (Label::Value(truth[idx]), Label::Value(row[0]), REGRESSION_CONFIDENCE),
        };
        batch.indices.push(idx);
        batch.actual.push(actual);
        batch.predicted.push(predicted);
        batch.confidence.push(confidence);
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ConstantModel, state};
    use rand::{SeedableRng, rngs::StdRng};
    use std::collections::HashSet;

    #[test]
    fn oversized_request_returns_every_row_once() {
        let s = state(TaskType::Classification, ConstantModel::new(3), 25);
        let batch = sample(&s, 1000, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(batch.len(), 25);
        let distinct: HashSet<_> = batch.indices.iter().copied().collect();
        assert_eq!(distinct.len(), 25);
        assert!(batch.indices.iter().all(|&i| i < 25));
    }

    #[test]
    fn zero_request_is_empty() {
        let s = state(TaskType::Regression, ConstantModel::new(1), 10);
        let batch = sample(&s, 0, &mut StdRng::seed_from_u64(1)).unwrap();
        assert!(batch.is_empty());
        assert!(batch.confidence.is_empty());
    }

    #[test]
    fn labels_follow_their_index() {
        let s = state(TaskType::Classification, ConstantModel::new(3), 30);
        let batch = sample(&s, 10, &mut StdRng::seed_from_u64(2)).unwrap();
        for (&idx, actual) in batch.indices.iter().zip(&batch.actual) {
            assert_eq!(*actual, Label::Class(s.test_labels()[idx] as usize));
        }
        assert!(batch.predicted.iter().all(|p| *p == Label::Class(0)));
        assert!(batch.confidence.iter().all(|&c| (c - 1.0 / 3.0).abs() < 1e-12));
        assert_eq!(batch.task, TaskType::Classification);
    }

    #[test]
    fn regression_reports_placeholder_confidence() {
        let s = state(TaskType::Regression, ConstantModel::new(1), 12);
        let batch = sample(&s, 5, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(batch.len(), 5);
        assert!(batch.confidence.iter().all(|&c| c == REGRESSION_CONFIDENCE));
        assert!(matches!(batch.predicted[0], Label::Value(_)));
    }

    #[test]
    fn seeded_samples_repeat() {
        let s = state(TaskType::Classification, ConstantModel::new(3), 50);
        let a = sample(&s, 8, &mut StdRng::seed_from_u64(9)).unwrap();
        let b = sample(&s, 8, &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(a.indices, b.indices);
    }
}
