//! Network configuration and its builder.
//!
//! A [`NetworkConfiguration`] is immutable once built and is shared between a
//! network and its copies. [`NetworkBuilder`] supplies defaults, validates
//! parameters and resolves the random seed, so the engine itself only ever
//! sees a concrete seed.
//!
//! ```rust
//! use basic_neural::{ActivationFunction, NetworkBuilder};
//!
//! let config = NetworkBuilder::new(2, 1)
//!     .hidden_layers(1, 4)
//!     .learning_rate(0.2)
//!     .activation_function(ActivationFunction::Tanh)
//!     .seed(42)
//!     .configuration()
//!     .unwrap();
//!
//! assert_eq!(config.topology(), vec![2, 4, 1]);
//! assert_eq!(config.seed(), 42);
//! ```

use core::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::thread;

use serde::{Deserialize, Serialize};

use crate::activation::ActivationFunction;
use crate::error::{Error, Result};
use crate::network::NeuralNetwork;

/// Learning rate used when none is given.
pub const DEFAULT_LEARNING_RATE: f64 = 0.1;

/// Immutable description of a network.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfiguration {
    input_nodes: usize,
    output_nodes: usize,
    hidden_layers: Vec<usize>,
    learning_rate: f64,
    activation_function: ActivationFunction,
    seed: u64,
    parallel: bool,
    worker_count: usize,
}

impl NetworkConfiguration {
    pub fn input_nodes(&self) -> usize {
        self.input_nodes
    }

    pub fn output_nodes(&self) -> usize {
        self.output_nodes
    }

    /// Hidden-layer sizes, first to last.
    pub fn hidden_layers(&self) -> &[usize] {
        &self.hidden_layers
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn activation_function(&self) -> ActivationFunction {
        self.activation_function
    }

    /// Seed of the network's random stream.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Whether matrix operations run on a worker pool.
    pub fn parallel(&self) -> bool {
        self.parallel
    }

    /// Pool size used when [`parallel`](Self::parallel) is set.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Node counts of every layer: `[input, hidden..., output]`.
    pub fn topology(&self) -> Vec<usize> {
        let mut layers = Vec::with_capacity(self.hidden_layers.len() + 2);
        layers.push(self.input_nodes);
        layers.extend_from_slice(&self.hidden_layers);
        layers.push(self.output_nodes);
        layers
    }

    /// Number of weight matrices (and bias vectors).
    pub fn boundary_count(&self) -> usize {
        self.hidden_layers.len() + 1
    }

    /// Copy of this configuration with another activation function.
    pub fn with_activation_function(&self, activation_function: ActivationFunction) -> Self {
        Self {
            activation_function,
            ..self.clone()
        }
    }

    /// Checks every parameter range. The seed is not checked.
    ///
    /// # Errors
    /// [`Error::InvalidParameter`] naming the first offending parameter.
    pub fn validate(&self) -> Result<()> {
        if self.input_nodes == 0 {
            return Err(Error::invalid("input nodes", self.input_nodes));
        }
        if self.output_nodes == 0 {
            return Err(Error::invalid("output nodes", self.output_nodes));
        }
        if let Some(&size) = self.hidden_layers.iter().find(|&&size| size == 0) {
            return Err(Error::invalid("hidden layer size", size));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::invalid("learning rate", self.learning_rate));
        }
        if self.parallel && self.worker_count == 0 {
            return Err(Error::invalid("worker count", self.worker_count));
        }
        Ok(())
    }
}

impl PartialEq for NetworkConfiguration {
    fn eq(&self, other: &Self) -> bool {
        self.input_nodes == other.input_nodes
            && self.output_nodes == other.output_nodes
            && self.hidden_layers == other.hidden_layers
            && self.learning_rate.to_bits() == other.learning_rate.to_bits()
            && self.activation_function == other.activation_function
            && self.seed == other.seed
            && self.parallel == other.parallel
            && self.worker_count == other.worker_count
    }
}

impl Eq for NetworkConfiguration {}

impl Hash for NetworkConfiguration {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.input_nodes.hash(state);
        self.output_nodes.hash(state);
        self.hidden_layers.hash(state);
        self.learning_rate.to_bits().hash(state);
        self.activation_function.hash(state);
        self.seed.hash(state);
        self.parallel.hash(state);
        self.worker_count.hash(state);
    }
}

fn available_workers() -> usize {
    thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

/// Non-zero seed from the thread-local generator.
fn fresh_seed() -> u64 {
    loop {
        let seed = rand::random::<u64>();
        if seed != 0 {
            return seed;
        }
    }
}

/// Step-by-step construction of a [`NetworkConfiguration`] or a network.
#[derive(Debug, Clone)]
pub struct NetworkBuilder {
    input_nodes: usize,
    output_nodes: usize,
    hidden_layers: Vec<usize>,
    learning_rate: f64,
    activation_function: ActivationFunction,
    seed: u64,
    parallel: bool,
    worker_count: usize,
}

impl NetworkBuilder {
    /// Starts from a network with no hidden layers, sigmoid activation,
    /// learning rate 0.1, an unset seed and sequential execution.
    pub fn new(input_nodes: usize, output_nodes: usize) -> Self {
        Self {
            input_nodes,
            output_nodes,
            hidden_layers: Vec::new(),
            learning_rate: DEFAULT_LEARNING_RATE,
            activation_function: ActivationFunction::default(),
            seed: 0,
            parallel: false,
            worker_count: available_workers(),
        }
    }

    /// `count` hidden layers of `nodes` each.
    #[must_use]
    pub fn hidden_layers(mut self, count: usize, nodes: usize) -> Self {
        self.hidden_layers = vec![nodes; count];
        self
    }

    /// Hidden layers with individual sizes.
    #[must_use]
    pub fn hidden_layer_sizes(mut self, sizes: Vec<usize>) -> Self {
        self.hidden_layers = sizes;
        self
    }

    #[must_use]
    pub fn learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    #[must_use]
    pub fn activation_function(mut self, activation_function: ActivationFunction) -> Self {
        self.activation_function = activation_function;
        self
    }

    /// Fixes the seed. Zero means "pick one when building".
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Enables parallel execution on `workers` threads.
    #[must_use]
    pub fn parallel_training(mut self, workers: usize) -> Self {
        self.parallel = true;
        self.worker_count = workers;
        self
    }

    /// Enables parallel execution with one worker per available core.
    #[must_use]
    pub fn default_parallel_training(self) -> Self {
        self.parallel_training(available_workers())
    }

    #[must_use]
    pub fn sequential_training(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Validates the parameters and resolves an unset seed.
    ///
    /// # Errors
    /// [`Error::InvalidParameter`] if a parameter is out of range.
    pub fn configuration(&self) -> Result<NetworkConfiguration> {
        let config = NetworkConfiguration {
            input_nodes: self.input_nodes,
            output_nodes: self.output_nodes,
            hidden_layers: self.hidden_layers.clone(),
            learning_rate: self.learning_rate,
            activation_function: self.activation_function,
            seed: if self.seed == 0 { fresh_seed() } else { self.seed },
            parallel: self.parallel,
            worker_count: self.worker_count,
        };
        config.validate()?;
        Ok(config)
    }

    /// Builds a freshly initialised network.
    ///
    /// # Errors
    /// Parameter validation failures, or [`Error::WorkerPool`] if parallel
    /// execution was requested and the pool cannot start.
    pub fn build(&self) -> Result<NeuralNetwork> {
        NeuralNetwork::new(self.configuration()?)
    }
}
