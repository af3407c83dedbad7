//! The feedforward network engine.
//!
//! A [`NeuralNetwork`] owns one weight matrix and one bias vector per layer
//! boundary, a seeded random stream and the matrix strategy its configuration
//! selected. Forward propagation folds an input column through every boundary
//! as `activate(W·x + b)`; training walks the boundaries back to front and
//! adjusts them by gradient descent.
//!
//! # Concurrency
//!
//! `guess` takes `&self` and may be called from several threads at once.
//! `train`, `mutate` and `set_activation_function` take `&mut self`, so a
//! single instance cannot be trained concurrently:
//!
//! ```compile_fail
//! use basic_neural::NetworkBuilder;
//!
//! let mut network = NetworkBuilder::new(2, 1).seed(1).build().unwrap();
//! std::thread::scope(|s| {
//!     let shared = &network;
//!     s.spawn(|| shared.train(&[0.0, 1.0], &[1.0]));
//!     s.spawn(|| shared.train(&[1.0, 0.0], &[1.0]));
//! });
//! ```
//!
//! Copies share the configuration, the random stream and the worker pool, but
//! own their matrices.

use core::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use tracing::debug;

use crate::activation::ActivationFunction;
use crate::backend::Backend;
use crate::config::{NetworkBuilder, NetworkConfiguration};
use crate::error::{Error, LayerSide, Result};
use crate::matrix::Matrix;
use crate::ops::{Dispatch, MatrixOps};

/// Ratio used by [`NeuralNetwork::merge`].
pub const DEFAULT_MERGE_RATIO: f64 = 0.5;

/// Scale applied to each Gaussian offset in [`NeuralNetwork::mutate`].
const MUTATION_SCALE: f64 = 0.5;

fn lock(rng: &Mutex<StdRng>) -> MutexGuard<'_, StdRng> {
    rng.lock().unwrap_or_else(PoisonError::into_inner)
}

fn check_probability(parameter: &'static str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::invalid(parameter, value))
    }
}

fn abs_sum(m: &Matrix) -> f64 {
    m.data().iter().map(|v| v.abs()).sum()
}

/// A dense feedforward neural network.
#[derive(Debug, Clone)]
pub struct NeuralNetwork {
    config: Arc<NetworkConfiguration>,
    weights: Vec<Matrix>,
    biases: Vec<Matrix>,
    rng: Arc<Mutex<StdRng>>,
    ops: Dispatch,
}

impl NeuralNetwork {
    /// Creates a network with weights and biases drawn uniformly from
    /// `[-1, 1]`, using `config.seed()` as is.
    ///
    /// # Errors
    /// - [`Error::InvalidParameter`] if the configuration is out of range
    /// - [`Error::WorkerPool`] if a requested worker pool cannot start
    pub fn new(config: NetworkConfiguration) -> Result<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed());
        let topology = config.topology();

        let mut weights = Vec::with_capacity(config.boundary_count());
        let mut biases = Vec::with_capacity(config.boundary_count());
        for pair in topology.windows(2) {
            let (nodes_in, nodes_out) = (pair[0], pair[1]);
            weights.push(Matrix::random(nodes_out, nodes_in, &mut rng));
            biases.push(Matrix::random(nodes_out, 1, &mut rng));
        }

        let backend = Backend::for_config(&config);
        let ops = Dispatch::for_backend(backend)?;
        debug!(
            ?topology,
            seed = config.seed(),
            activation = config.activation_function().name(),
            parallel = backend.is_parallel(),
            "constructed network"
        );
        Ok(Self {
            config: Arc::new(config),
            weights,
            biases,
            rng: Arc::new(Mutex::new(rng)),
            ops,
        })
    }

    /// A network without hidden layers and a random seed.
    ///
    /// # Errors
    /// See [`NetworkBuilder::build`].
    pub fn with_shape(input_nodes: usize, output_nodes: usize) -> Result<Self> {
        NetworkBuilder::new(input_nodes, output_nodes).build()
    }

    /// A network with one hidden layer of `hidden_nodes` and a random seed.
    ///
    /// # Errors
    /// See [`NetworkBuilder::build`].
    pub fn with_hidden(input_nodes: usize, hidden_nodes: usize, output_nodes: usize) -> Result<Self> {
        NetworkBuilder::new(input_nodes, output_nodes)
            .hidden_layers(1, hidden_nodes)
            .build()
    }

    /// A network with `hidden_layers` hidden layers of `hidden_nodes` each.
    ///
    /// # Errors
    /// See [`NetworkBuilder::build`].
    pub fn with_layers(
        input_nodes: usize,
        hidden_layers: usize,
        hidden_nodes: usize,
        output_nodes: usize,
    ) -> Result<Self> {
        NetworkBuilder::new(input_nodes, output_nodes)
            .hidden_layers(hidden_layers, hidden_nodes)
            .build()
    }

    /// Rebuilds a network from stored matrices.
    ///
    /// The random stream restarts from the configured seed and a fresh worker
    /// pool is started if the configuration asks for one.
    pub(crate) fn from_parts(
        config: NetworkConfiguration,
        weights: Vec<Matrix>,
        biases: Vec<Matrix>,
    ) -> Result<Self> {
        config.validate()?;
        if weights.len() != config.boundary_count() || biases.len() != config.boundary_count() {
            return Err(Error::InvalidModel(format!(
                "expected {} weight and bias matrices, found {} and {}",
                config.boundary_count(),
                weights.len(),
                biases.len()
            )));
        }
        for (i, pair) in config.topology().windows(2).enumerate() {
            let (nodes_in, nodes_out) = (pair[0], pair[1]);
            if weights[i].shape() != (nodes_out, nodes_in) {
                return Err(Error::InvalidModel(format!(
                    "weight matrix {i} is {:?}, expected {:?}",
                    weights[i].shape(),
                    (nodes_out, nodes_in)
                )));
            }
            if biases[i].shape() != (nodes_out, 1) {
                return Err(Error::InvalidModel(format!(
                    "bias vector {i} is {:?}, expected {:?}",
                    biases[i].shape(),
                    (nodes_out, 1)
                )));
            }
        }

        let ops = Dispatch::for_backend(Backend::for_config(&config))?;
        Ok(Self {
            rng: Arc::new(Mutex::new(StdRng::seed_from_u64(config.seed()))),
            config: Arc::new(config),
            weights,
            biases,
            ops,
        })
    }

    fn check_input(&self, input: &[f64]) -> Result<()> {
        if input.len() == self.config.input_nodes() {
            Ok(())
        } else {
            Err(Error::WrongDimension {
                layer: LayerSide::Input,
                expected: self.config.input_nodes(),
                actual: input.len(),
            })
        }
    }

    fn check_target(&self, target: &[f64]) -> Result<()> {
        if target.len() == self.config.output_nodes() {
            Ok(())
        } else {
            Err(Error::WrongDimension {
                layer: LayerSide::Output,
                expected: self.config.output_nodes(),
                actual: target.len(),
            })
        }
    }

    fn layer_output(&self, boundary: usize, input: &Matrix) -> Matrix {
        let activation = self.config.activation_function();
        let weighted = self.ops.multiply(&self.weights[boundary], input);
        let biased = self.ops.add(&weighted, &self.biases[boundary]);
        self.ops.apply(&biased, move |x| activation.activate(x))
    }

    /// Every layer's activation, input column first.
    fn feed_forward(&self, input: &[f64]) -> Vec<Matrix> {
        let mut layers = Vec::with_capacity(self.weights.len() + 1);
        layers.push(Matrix::from_column(input));
        for boundary in 0..self.weights.len() {
            let next = self.layer_output(boundary, &layers[boundary]);
            layers.push(next);
        }
        layers
    }

    /// Runs the input through the network and returns the output layer.
    ///
    /// # Errors
    /// [`Error::WrongDimension`] if `input` does not match the input layer.
    pub fn guess(&self, input: &[f64]) -> Result<Vec<f64>> {
        self.check_input(input)?;
        let mut current = Matrix::from_column(input);
        for boundary in 0..self.weights.len() {
            current = self.layer_output(boundary, &current);
        }
        Ok(current.column(0))
    }

    /// One step of backpropagation towards `target`.
    ///
    /// Returns the summed absolute size of every bias and weight adjustment
    /// made, which shrinks as the network converges.
    ///
    /// # Errors
    /// [`Error::WrongDimension`] naming the offending side. Nothing is updated
    /// in that case.
    pub fn train(&mut self, input: &[f64], target: &[f64]) -> Result<f64> {
        self.check_input(input)?;
        self.check_target(target)?;

        let activation = self.config.activation_function();
        let learning_rate = self.config.learning_rate();
        let layers = self.feed_forward(input);
        let ops = &self.ops;

        let mut target = Matrix::from_column(target);
        let mut adjustment = 0.0;
        for boundary in (0..self.weights.len()).rev() {
            let output = &layers[boundary + 1];
            let previous = &layers[boundary];

            let error = ops.subtract(&target, output);
            let slope = ops.apply(output, move |y| activation.derivative(y));
            let gradient = ops.apply(&ops.elementwise_multiply(&slope, &error), move |g| {
                g * learning_rate
            });
            let delta = ops.multiply(&gradient, &previous.transpose());
            let propagated = ops.multiply(&self.weights[boundary].transpose(), &error);

            adjustment += abs_sum(&gradient) + abs_sum(&delta);
            self.biases[boundary] = ops.add(&self.biases[boundary], &gradient);
            self.weights[boundary] = ops.add(&self.weights[boundary], &delta);
            target = ops.add(previous, &propagated);
        }
        Ok(adjustment)
    }

    /// Independent copy of this network.
    ///
    /// Matrices are deep-copied; configuration, random stream and worker pool
    /// are shared.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// [`merge_with_ratio`](Self::merge_with_ratio) with an even split.
    ///
    /// # Errors
    /// See [`merge_with_ratio`](Self::merge_with_ratio).
    pub fn merge(&self, other: &Self) -> Result<Self> {
        self.merge_with_ratio(other, DEFAULT_MERGE_RATIO)
    }

    /// Recombines two networks of the same topology.
    ///
    /// Every element of the child comes from `other` with probability `ratio`
    /// and from `self` otherwise, drawn independently per element from this
    /// network's random stream. The child shares this network's
    /// configuration, stream and worker pool.
    ///
    /// # Errors
    /// - [`Error::TopologyMismatch`] listing both topologies
    /// - [`Error::InvalidParameter`] if `ratio` is outside `[0, 1]`
    pub fn merge_with_ratio(&self, other: &Self, ratio: f64) -> Result<Self> {
        let (left, right) = (self.topology(), other.topology());
        if left != right {
            return Err(Error::TopologyMismatch { left, right });
        }
        check_probability("merge ratio", ratio)?;

        let mut rng = lock(&self.rng);
        let weights = self
            .weights
            .iter()
            .zip(&other.weights)
            .map(|(a, b)| Matrix::merge(a, b, ratio, &mut *rng))
            .collect::<Result<Vec<_>>>()?;
        let biases = self
            .biases
            .iter()
            .zip(&other.biases)
            .map(|(a, b)| Matrix::merge(a, b, ratio, &mut *rng))
            .collect::<Result<Vec<_>>>()?;
        drop(rng);

        debug!(topology = ?left, ratio, "merged networks");
        Ok(Self {
            config: Arc::clone(&self.config),
            weights,
            biases,
            rng: Arc::clone(&self.rng),
            ops: self.ops.clone(),
        })
    }

    /// Adds a Gaussian offset (standard deviation 0.5) to each element with
    /// the given probability.
    ///
    /// # Errors
    /// [`Error::InvalidParameter`] if `probability` is outside `[0, 1]`.
    pub fn mutate(&mut self, probability: f64) -> Result<()> {
        check_probability("mutation probability", probability)?;

        let mut rng = lock(&self.rng);
        let mut mutated = 0usize;
        for matrix in self.weights.iter_mut().chain(self.biases.iter_mut()) {
            for value in matrix.data_mut() {
                if rng.random::<f64>() < probability {
                    let offset: f64 = rng.sample(StandardNormal);
                    *value += offset * MUTATION_SCALE;
                    mutated += 1;
                }
            }
        }
        debug!(probability, mutated, "mutated network");
        Ok(())
    }

    /// Switches the activation function used from now on.
    pub fn set_activation_function(&mut self, activation_function: ActivationFunction) {
        self.config = Arc::new(self.config.with_activation_function(activation_function));
    }

    /// Releases this network's handle on its worker pool.
    ///
    /// Safe to call repeatedly. Later operations run sequentially and produce
    /// the same values. Dropping the network has the same effect.
    pub fn close(&mut self) {
        self.ops.close();
    }

    pub fn config(&self) -> &NetworkConfiguration {
        &self.config
    }

    pub fn input_nodes(&self) -> usize {
        self.config.input_nodes()
    }

    pub fn output_nodes(&self) -> usize {
        self.config.output_nodes()
    }

    /// Hidden-layer sizes.
    pub fn hidden_layers(&self) -> &[usize] {
        self.config.hidden_layers()
    }

    pub fn hidden_layer_count(&self) -> usize {
        self.config.hidden_layers().len()
    }

    /// Size of the first hidden layer, or 0 without hidden layers.
    pub fn hidden_nodes(&self) -> usize {
        self.config.hidden_layers().first().copied().unwrap_or(0)
    }

    pub fn learning_rate(&self) -> f64 {
        self.config.learning_rate()
    }

    pub fn activation_function(&self) -> ActivationFunction {
        self.config.activation_function()
    }

    pub fn seed(&self) -> u64 {
        self.config.seed()
    }

    /// `[input, hidden..., output]`
    pub fn topology(&self) -> Vec<usize> {
        self.config.topology()
    }

    /// Weight matrices, one per boundary, each `(nodes_out, nodes_in)`.
    pub fn weights(&self) -> &[Matrix] {
        &self.weights
    }

    /// Bias column vectors, one per boundary, each `(nodes_out, 1)`.
    pub fn biases(&self) -> &[Matrix] {
        &self.biases
    }

    pub fn is_parallel(&self) -> bool {
        self.ops.is_parallel()
    }

    /// Pool size, `None` for sequential networks.
    pub fn worker_count(&self) -> Option<usize> {
        self.ops.worker_count()
    }
}

impl PartialEq for NeuralNetwork {
    fn eq(&self, other: &Self) -> bool {
        self.config == other.config && self.weights == other.weights && self.biases == other.biases
    }
}

impl Eq for NeuralNetwork {}

impl Hash for NeuralNetwork {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.config.hash(state);
        self.weights.hash(state);
        self.biases.hash(state);
    }
}

impl Drop for NeuralNetwork {
    fn drop(&mut self) {
        self.close();
    }
}
