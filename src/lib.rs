//! basic_neural: a small feedforward neural network engine.
//!
//! Dense layers, elementwise activation, gradient-descent training by
//! backpropagation, and genetic-style recombination (`merge` / `mutate`) of
//! trained networks.
//!
//! # Features
//!
//! - Every matrix primitive runs either sequentially or as a fork/join
//!   decomposition on a dedicated worker pool, with bit-identical results.
//! - Deterministic initialisation and mutation from a per-network seed.
//! - JSON persistence of the full network state.
//!
//! # Modules
//!
//! - [`matrix`]: dense row-major matrices and conversions.
//! - [`ops`]: the `MatrixOps` primitives and their two strategies.
//! - [`network`]: forward/backward propagation, copy, merge and mutate.
//! - [`config`]: immutable configuration and its builder.
//! - [`modelio`]: saving and loading networks.
//!
//! # Example
//!
//! ```rust
//! use basic_neural::NetworkBuilder;
//!
//! let mut network = NetworkBuilder::new(2, 1).seed(3).build().unwrap();
//! for _ in 0..2000 {
//!     network.train(&[0.0, 0.0], &[0.0]).unwrap();
//!     network.train(&[1.0, 1.0], &[1.0]).unwrap();
//! }
//! assert!(network.guess(&[1.0, 1.0]).unwrap()[0] > 0.5);
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::must_use_candidate,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::float_cmp,
    clippy::many_single_char_names
)]

pub mod activation;
pub mod backend;
pub mod config;
pub mod error;
pub mod matrix;
pub mod modelio;
pub mod network;
pub mod ops;

pub use activation::ActivationFunction;
pub use config::{NetworkBuilder, NetworkConfiguration};
pub use error::{Error, LayerSide, Result};
pub use matrix::Matrix;
pub use network::NeuralNetwork;
pub use ops::MatrixOps;
