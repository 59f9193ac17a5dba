// Rust guideline compliant 2026-10-18

//! Adam optimizer over the dense layers of a [`Network`](crate::Network).

use ndarray::{Array, Array1, Array2, Dimension, Zip};

use crate::layers::{Block, Gradient};

const BETA1: f64 = 0.9;
const BETA2: f64 = 0.999;
const EPSILON: f64 = 1e-7;

#[derive(Debug)]
struct Moments {
    m_w: Array2<f64>,
    v_w: Array2<f64>,
    m_b: Array1<f64>,
    v_b: Array1<f64>,
}

/// First/second moment estimates per dense layer plus the step counter.
#[derive(Debug)]
pub(crate) struct Adam {
    learning_rate: f64,
    step: i32,
    moments: Vec<Moments>,
}

impl Adam {
    pub(crate) fn new(learning_rate: f64, blocks: &[Block]) -> Self {
        let moments = blocks
            .iter()
            .map(|b| Moments {
                m_w: Array2::zeros(b.dense.weights.raw_dim()),
                v_w: Array2::zeros(b.dense.weights.raw_dim()),
                m_b: Array1::zeros(b.dense.bias.len()),
                v_b: Array1::zeros(b.dense.bias.len()),
            })
            .collect();
        Self { learning_rate, step: 0, moments }
    }

    /// Apply one bias-corrected update; `grads` is in block order.
    pub(crate) fn step(&mut self, blocks: &mut [Block], grads: &[Gradient]) {
        self.step = self.step.saturating_add(1);
        let lr_t = self.learning_rate * (1.0 - BETA2.powi(self.step)).sqrt() / (1.0 - BETA1.powi(self.step));
        for ((block, m), (g_w, g_b)) in blocks.iter_mut().zip(&mut self.moments).zip(grads) {
            update(&mut block.dense.weights, &mut m.m_w, &mut m.v_w, g_w, lr_t);
            update(&mut block.dense.bias, &mut m.m_b, &mut m.v_b, g_b, lr_t);
        }
    }
}

fn update<D: Dimension>(
    param: &mut Array<f64, D>,
    m: &mut Array<f64, D>,
    v: &mut Array<f64, D>,
    grad: &Array<f64, D>,
    lr_t: f64,
) {
    Zip::from(param).and(m).and(v).and(grad).for_each(|p, m, v, &g| {
        *m = BETA1 * *m + (1.0 - BETA1) * g;
        *v = BETA2 * *v + (1.0 - BETA2) * g * g;
        *p -= lr_t * *m / (v.sqrt() + EPSILON);
    });
}
