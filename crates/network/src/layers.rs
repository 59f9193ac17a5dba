// Rust guideline compliant 2026-10-18

//! Sequential feed-forward network built from dense blocks.
//!
//! Each [`Block`] is a fully connected layer optionally followed by inverted
//! dropout. Dropout is only active in [`Network::forward_train`].

use domain::{LayerSummary, Model, ModelError};
use ndarray::{Array1, Array2, Axis};
use rand::Rng;

/// Element-wise activation applied after a dense layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// `max(0, z)`.
    Relu,
    /// Row-wise soft-max; only valid on the output layer.
    Softmax,
    /// Identity.
    Linear,
}

impl Activation {
    fn apply(self, mut z: Array2<f64>) -> Array2<f64> {
        match self {
            Self::Relu => z.mapv_inplace(|v| v.max(0.0)),
            Self::Linear => {}
            Self::Softmax => {
                for mut row in z.rows_mut() {
                    let max = row.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
                    row.mapv_inplace(|v| (v - max).exp());
                    let sum = row.sum();
                    row.mapv_inplace(|v| v / sum);
                }
            }
        }
        z
    }

    /// Derivative expressed through the activation output.
    ///
    /// Soft-max is always paired with cross-entropy on the output layer, whose
    /// combined gradient is computed by the objective, so it is never asked here.
    fn derivative(self, output: &Array2<f64>) -> Array2<f64> {
        match self {
            Self::Relu => output.mapv(|a| if a > 0.0 { 1.0 } else { 0.0 }),
            Self::Linear | Self::Softmax => Array2::ones(output.raw_dim()),
        }
    }
}

/// Fully connected layer.
#[derive(Debug, Clone)]
pub(crate) struct Dense {
    pub(crate) weights: Array2<f64>,
    pub(crate) bias: Array1<f64>,
    activation: Activation,
}

impl Dense {
    /// Glorot-uniform weights, zero bias.
    fn new<R: Rng>(n_in: usize, n_out: usize, activation: Activation, rng: &mut R) -> Self {
        let limit = (6.0 / (n_in + n_out) as f64).sqrt();
        let weights = Array2::from_shape_fn((n_in, n_out), |_| rng.random_range(-limit..limit));
        Self { weights, bias: Array1::zeros(n_out), activation }
    }

    fn forward(&self, input: &Array2<f64>) -> Array2<f64> {
        self.activation.apply(input.dot(&self.weights) + &self.bias)
    }

    fn units(&self) -> usize {
        self.bias.len()
    }

    fn param_count(&self) -> usize {
        self.weights.len() + self.bias.len()
    }
}

/// Dense layer plus optional dropout applied to its output.
#[derive(Debug, Clone)]
pub(crate) struct Block {
    pub(crate) dense: Dense,
    dropout: Option<f64>,
}

/// Intermediate values of one block, kept for back-propagation.
#[derive(Debug)]
pub(crate) struct BlockCache {
    input: Array2<f64>,
    /// Activation output before dropout.
    output: Array2<f64>,
    /// Scaled keep-mask, present when dropout ran.
    mask: Option<Array2<f64>>,
}

/// Gradient of one dense layer.
pub(crate) type Gradient = (Array2<f64>, Array1<f64>);

/// Sequential stack of dense blocks.
#[derive(Debug, Clone)]
pub struct Network {
    input_dim: usize,
    blocks: Vec<Block>,
}

impl Network {
    /// Build `input -> hidden[0] -> ... -> output` with ReLU hidden layers.
    ///
    /// Every hidden layer is followed by dropout with `dropout_rate` when it is
    /// positive; the output layer never is.
    pub fn new<R: Rng>(
        input_dim: usize,
        hidden: &[usize],
        dropout_rate: f64,
        output_dim: usize,
        output_activation: Activation,
        rng: &mut R,
    ) -> Self {
        let mut blocks = Vec::with_capacity(hidden.len() + 1);
        let mut n_in = input_dim;
        for &units in hidden {
            blocks.push(Block {
                dense: Dense::new(n_in, units, Activation::Relu, rng),
                dropout: (dropout_rate > 0.0).then_some(dropout_rate),
            });
            n_in = units;
        }
        blocks.push(Block {
            dense: Dense::new(n_in, output_dim, output_activation, rng),
            dropout: None,
        });
        Self { input_dim, blocks }
    }

    /// Width of the expected input rows.
    #[must_use]
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    /// Inference pass; dropout is disabled.
    #[must_use]
    pub fn forward(&self, x: &Array2<f64>) -> Array2<f64> {
        self.blocks
            .iter()
            .fold(x.clone(), |a, block| block.dense.forward(&a))
    }

    /// Training pass with dropout; returns the output and per-block caches.
    pub(crate) fn forward_train<R: Rng>(
        &self,
        x: &Array2<f64>,
        rng: &mut R,
    ) -> (Array2<f64>, Vec<BlockCache>) {
        let mut caches = Vec::with_capacity(self.blocks.len());
        let mut a = x.clone();
        for block in &self.blocks {
            let output = block.dense.forward(&a);
            let (next, mask) = match block.dropout {
                Some(rate) => {
                    let keep = 1.0 - rate;
                    let mask = output.mapv(|_| if rng.random::<f64>() < keep { 1.0 / keep } else { 0.0 });
                    (&output * &mask, Some(mask))
                }
                None => (output.clone(), None),
            };
            caches.push(BlockCache { input: a, output, mask });
            a = next;
        }
        (a, caches)
    }

    /// Back-propagate `delta`, the loss gradient w.r.t. the output layer's
    /// pre-activation, and return one gradient per block in forward order.
    pub(crate) fn backward(&self, caches: &[BlockCache], mut delta: Array2<f64>) -> Vec<Gradient> {
        let last = self.blocks.len() - 1;
        let mut grads = Vec::with_capacity(self.blocks.len());
        for (idx, (block, cache)) in self.blocks.iter().zip(caches).enumerate().rev() {
            if let Some(mask) = &cache.mask {
                delta = delta * mask;
            }
            if idx != last {
                delta = delta * block.dense.activation.derivative(&cache.output);
            }
            grads.push((cache.input.t().dot(&delta), delta.sum_axis(Axis(0))));
            if idx > 0 {
                delta = delta.dot(&block.dense.weights.t());
            }
        }
        grads.reverse();
        grads
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    pub(crate) fn blocks(&self) -> &[Block] {
        &self.blocks
    }
}

impl Model for Network {
    fn predict(&self, features: &Array2<f64>) -> Result<Array2<f64>, ModelError> {
        if features.ncols() != self.input_dim {
            return Err(ModelError::ShapeMismatch { expected: self.input_dim, actual: features.ncols() });
        }
        Ok(self.forward(features))
    }

    fn output_dim(&self) -> usize {
        self.blocks.last().map_or(0, |b| b.dense.units())
    }

    /// Names follow the `dense`, `dense_1`, ... convention, counted per layer kind.
    fn layers(&self) -> Vec<LayerSummary> {
        let suffix = |i: usize| if i == 0 { String::new() } else { format!("_{i}") };
        let mut out = Vec::new();
        let mut n_dropout = 0;
        for (i, block) in self.blocks.iter().enumerate() {
            let shape = format!("(None, {})", block.dense.units());
            out.push(LayerSummary {
                name: format!("dense{}", suffix(i)),
                layer_type: "Dense".to_owned(),
                output_shape: shape.clone(),
                param_count: block.dense.param_count(),
            });
            if block.dropout.is_some() {
                out.push(LayerSummary {
                    name: format!("dropout{}", suffix(n_dropout)),
                    layer_type: "Dropout".to_owned(),
                    output_shape: shape,
                    param_count: 0,
                });
                n_dropout += 1;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};

    fn network(output_dim: usize, activation: Activation) -> Network {
        let mut rng = StdRng::seed_from_u64(1);
        Network::new(20, &[64, 32], 0.3, output_dim, activation, &mut rng)
    }

    #[test]
    fn classification_architecture_summary() {
        let net = network(3, Activation::Softmax);
        let layers = net.layers();
        let names: Vec<_> = layers.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["dense", "dropout", "dense_1", "dropout_1", "dense_2"]);
        let params: Vec<_> = layers.iter().map(|l| l.param_count).collect();
        assert_eq!(params, [1344, 0, 2080, 0, 99]);
        assert_eq!(net.param_count(), 3523);
        assert_eq!(layers[1].layer_type, "Dropout");
        assert_eq!(layers[4].output_shape, "(None, 3)");
        assert_eq!(net.output_dim(), 3);
    }

    #[test]
    fn regression_head_has_single_output() {
        let net = network(1, Activation::Linear);
        assert_eq!(net.output_dim(), 1);
        assert_eq!(net.param_count(), 1344 + 2080 + 33);
    }

    #[test]
    fn softmax_rows_sum_to_one() {
        let net = network(3, Activation::Softmax);
        let x = Array2::from_shape_fn((5, 20), |(i, j)| (i as f64 - j as f64) / 10.0);
        let p = net.predict(&x).unwrap();
        for row in p.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
            assert!(row.iter().all(|&v| (0.0..=1.0).contains(&v)));
        }
    }

    #[test]
    fn predict_rejects_wrong_width() {
        let net = network(1, Activation::Linear);
        let result = net.predict(&array![[1.0, 2.0]]);
        assert_eq!(result, Err(ModelError::ShapeMismatch { expected: 20, actual: 2 }));
    }

    #[test]
    fn inference_is_deterministic() {
        let net = network(3, Activation::Softmax);
        let x = Array2::from_elem((4, 20), 0.5);
        assert_eq!(net.forward(&x), net.forward(&x));
    }

    #[test]
    fn backward_returns_one_gradient_per_block() {
        let net = network(1, Activation::Linear);
        let mut rng = StdRng::seed_from_u64(2);
        let x = Array2::from_elem((8, 20), 0.1);
        let (out, caches) = net.forward_train(&x, &mut rng);
        let grads = net.backward(&caches, Array2::ones(out.raw_dim()));
        assert_eq!(grads.len(), 3);
        assert_eq!(grads[0].0.dim(), (20, 64));
        assert_eq!(grads[2].1.len(), 1);
    }
}
