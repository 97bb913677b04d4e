//! Q-network
//!
//! Feed-forward action-value approximator with hidden widths 128/64/32,
//! ReLU activations and dropout after the first two hidden layers. The
//! backward pass, Adam optimizer, global gradient-norm clipping and the
//! soft target update are implemented directly over ndarray parameters.

use ndarray::{Array1, Array2, Axis, Zip};
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::strategy::NUM_ACTIONS;

/// Hidden layer widths between the input and the action head
pub const HIDDEN_DIMS: [usize; 3] = [128, 64, 32];

/// One fully connected layer
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DenseLayer {
    /// Weights, `[input, output]`
    weights: Array2<f64>,
    /// Biases, `[output]`
    bias: Array1<f64>,
}

impl DenseLayer {
    /// Xavier-normal initialization
    fn new(input: usize, output: usize, rng: &mut StdRng) -> Self {
        let std = (2.0 / (input + output) as f64).sqrt();
        let weights = Array2::from_shape_fn((input, output), |_| {
            std * rng.sample::<f64, _>(StandardNormal)
        });
        Self {
            weights,
            bias: Array1::zeros(output),
        }
    }

    fn forward(&self, x: &Array2<f64>) -> Array2<f64> {
        x.dot(&self.weights) + &self.bias
    }
}

/// Activations cached by a training forward pass
pub struct ForwardCache {
    /// Input to each layer (post-activation of the previous one)
    inputs: Vec<Array2<f64>>,
    /// ReLU outputs per hidden layer, for the activation derivative
    relu_outputs: Vec<Array2<f64>>,
    /// Dropout masks per hidden layer; entries hold 0 or 1/keep
    masks: Vec<Option<Array2<f64>>>,
}

/// Per-layer parameter gradients
pub struct Gradients {
    grads: Vec<(Array2<f64>, Array1<f64>)>,
}

impl Gradients {
    /// L2 norm over every weight and bias gradient
    pub fn global_norm(&self) -> f64 {
        self.grads
            .iter()
            .map(|(w, b)| {
                w.iter().map(|g| g * g).sum::<f64>() + b.iter().map(|g| g * g).sum::<f64>()
            })
            .sum::<f64>()
            .sqrt()
    }

    /// Scale all gradients down so the global norm is at most `max_norm`
    pub fn clip_norm(&mut self, max_norm: f64) {
        let norm = self.global_norm();
        if norm > max_norm {
            let scale = max_norm / norm;
            for (w, b) in &mut self.grads {
                w.mapv_inplace(|g| g * scale);
                b.mapv_inplace(|g| g * scale);
            }
        }
    }
}

/// Feed-forward action-value network
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QNetwork {
    layers: Vec<DenseLayer>,
    dropout: f64,
}

impl QNetwork {
    /// Build a network mapping `input_dim` features to action scores
    pub fn new(input_dim: usize, dropout: f64, rng: &mut StdRng) -> Self {
        let mut dims = vec![input_dim];
        dims.extend(HIDDEN_DIMS);
        dims.push(NUM_ACTIONS);

        let layers = dims
            .windows(2)
            .map(|pair| DenseLayer::new(pair[0], pair[1], rng))
            .collect();

        Self { layers, dropout }
    }

    fn hidden_count(&self) -> usize {
        self.layers.len() - 1
    }

    /// Dropout is applied after the first two hidden layers only
    fn has_dropout(&self, layer: usize) -> bool {
        layer < 2 && self.dropout > 0.0
    }

    /// Action scores for one state, deterministic (no dropout)
    pub fn predict(&self, state: &[f64]) -> Array1<f64> {
        let mut x = Array1::from_vec(state.to_vec());
        for (i, layer) in self.layers.iter().enumerate() {
            x = x.dot(&layer.weights) + &layer.bias;
            if i < self.hidden_count() {
                x.mapv_inplace(|v| v.max(0.0));
            }
        }
        x
    }

    /// Action scores for a batch of states, deterministic (no dropout)
    pub fn predict_batch(&self, states: &Array2<f64>) -> Array2<f64> {
        let mut x = states.clone();
        for (i, layer) in self.layers.iter().enumerate() {
            x = layer.forward(&x);
            if i < self.hidden_count() {
                x.mapv_inplace(|v| v.max(0.0));
            }
        }
        x
    }

    /// Training forward pass with dropout, caching what backward needs
    pub fn forward_train(
        &self,
        states: &Array2<f64>,
        rng: &mut StdRng,
    ) -> (Array2<f64>, ForwardCache) {
        let keep = 1.0 - self.dropout;
        let mut cache = ForwardCache {
            inputs: Vec::with_capacity(self.layers.len()),
            relu_outputs: Vec::with_capacity(self.hidden_count()),
            masks: Vec::with_capacity(self.hidden_count()),
        };

        let mut x = states.clone();
        for (i, layer) in self.layers.iter().enumerate() {
            cache.inputs.push(x.clone());
            x = layer.forward(&x);
            if i < self.hidden_count() {
                x.mapv_inplace(|v| v.max(0.0));
                cache.relu_outputs.push(x.clone());
                if self.has_dropout(i) {
                    let mask = Array2::from_shape_fn(x.dim(), |_| {
                        if rng.gen::<f64>() < self.dropout {
                            0.0
                        } else {
                            1.0 / keep
                        }
                    });
                    x = x * &mask;
                    cache.masks.push(Some(mask));
                } else {
                    cache.masks.push(None);
                }
            }
        }

        (x, cache)
    }

    /// Backpropagate `grad_output` (d loss / d scores) through the cache
    pub fn backward(&self, cache: &ForwardCache, grad_output: &Array2<f64>) -> Gradients {
        let mut grads: Vec<(Array2<f64>, Array1<f64>)> = Vec::with_capacity(self.layers.len());
        let mut grad = grad_output.clone();

        for l in (0..self.layers.len()).rev() {
            if l < self.hidden_count() {
                if let Some(mask) = &cache.masks[l] {
                    grad = grad * mask;
                }
                let relu_grad = cache.relu_outputs[l].mapv(|v| if v > 0.0 { 1.0 } else { 0.0 });
                grad = grad * &relu_grad;
            }
            let grad_w = cache.inputs[l].t().dot(&grad);
            let grad_b = grad.sum_axis(Axis(0));
            grad = grad.dot(&self.layers[l].weights.t());
            grads.push((grad_w, grad_b));
        }

        grads.reverse();
        Gradients { grads }
    }

    /// Blend this network's parameters toward `source`
    ///
    /// Polyak averaging: `self = tau * source + (1 - tau) * self`.
    pub fn soft_update(&mut self, source: &QNetwork, tau: f64) {
        for (own, src) in self.layers.iter_mut().zip(source.layers.iter()) {
            Zip::from(&mut own.weights)
                .and(&src.weights)
                .for_each(|t, &p| *t = tau * p + (1.0 - tau) * *t);
            Zip::from(&mut own.bias)
                .and(&src.bias)
                .for_each(|t, &p| *t = tau * p + (1.0 - tau) * *t);
        }
    }

    /// Sum of squared parameter distances to another network
    pub fn parameter_distance(&self, other: &QNetwork) -> f64 {
        self.layers
            .iter()
            .zip(other.layers.iter())
            .map(|(a, b)| {
                let dw: f64 = a
                    .weights
                    .iter()
                    .zip(b.weights.iter())
                    .map(|(x, y)| (x - y).powi(2))
                    .sum();
                let db: f64 = a
                    .bias
                    .iter()
                    .zip(b.bias.iter())
                    .map(|(x, y)| (x - y).powi(2))
                    .sum();
                dw + db
            })
            .sum()
    }

    /// Total number of trainable parameters
    pub fn num_parameters(&self) -> usize {
        self.layers
            .iter()
            .map(|l| l.weights.len() + l.bias.len())
            .sum()
    }
}

/// Adam optimizer bound to one network's parameters
#[derive(Debug, Clone)]
pub struct Adam {
    lr: f64,
    beta1: f64,
    beta2: f64,
    eps: f64,
    t: i32,
    moments: Vec<(Array2<f64>, Array1<f64>)>,
    velocities: Vec<(Array2<f64>, Array1<f64>)>,
}

impl Adam {
    /// Create optimizer state shaped after `network`
    pub fn new(network: &QNetwork, lr: f64) -> Self {
        let zeros = |net: &QNetwork| {
            net.layers
                .iter()
                .map(|l| {
                    (
                        Array2::zeros(l.weights.dim()),
                        Array1::zeros(l.bias.len()),
                    )
                })
                .collect::<Vec<_>>()
        };
        Self {
            lr,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
            t: 0,
            moments: zeros(network),
            velocities: zeros(network),
        }
    }

    /// Apply one Adam update to `network` in place
    pub fn step(&mut self, network: &mut QNetwork, grads: &Gradients) {
        self.t += 1;
        let bc1 = 1.0 - self.beta1.powi(self.t);
        let bc2 = 1.0 - self.beta2.powi(self.t);
        let (lr, b1, b2, eps) = (self.lr, self.beta1, self.beta2, self.eps);

        for (layer_idx, layer) in network.layers.iter_mut().enumerate() {
            let (gw, gb) = &grads.grads[layer_idx];
            let (mw, mb) = &mut self.moments[layer_idx];
            let (vw, vb) = &mut self.velocities[layer_idx];

            Zip::from(&mut layer.weights)
                .and(mw)
                .and(vw)
                .and(gw)
                .for_each(|w, m, v, &g| {
                    *m = b1 * *m + (1.0 - b1) * g;
                    *v = b2 * *v + (1.0 - b2) * g * g;
                    *w -= lr * (*m / bc1) / ((*v / bc2).sqrt() + eps);
                });
            Zip::from(&mut layer.bias)
                .and(mb)
                .and(vb)
                .and(gb)
                .for_each(|w, m, v, &g| {
                    *m = b1 * *m + (1.0 - b1) * g;
                    *v = b2 * *v + (1.0 - b2) * g * g;
                    *w -= lr * (*m / bc1) / ((*v / bc2).sqrt() + eps);
                });
        }
    }
}
