//! Error types shared by the engine and its persistence layer.
//!
//! Every failure here is a local, synchronous validation failure. Nothing is
//! transient, so nothing is retried: each variant carries the expected and
//! actual values needed to rebuild a diagnostic.

use core::fmt;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Which side of the network a vector was checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerSide {
    /// The input layer (`guess` / `train` input vector).
    Input,
    /// The output layer (`train` target vector).
    Output,
}

impl fmt::Display for LayerSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("Input"),
            Self::Output => f.write_str("Output"),
        }
    }
}

/// Errors produced by network construction, training, recombination and I/O.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A vector handed to `guess` or `train` has the wrong length.
    #[error("Expected {expected} value(s) for {layer}-layer but got {actual}.")]
    WrongDimension {
        /// Side that was checked.
        layer: LayerSide,
        /// Node count from the configuration.
        expected: usize,
        /// Length of the vector that was passed in.
        actual: usize,
    },

    /// Two networks with different layer layouts were merged.
    #[error("The dimensions of these two neural networks don't match: {left:?}, {right:?}")]
    TopologyMismatch {
        /// Topology of the receiving network.
        left: Vec<usize>,
        /// Topology of the other network.
        right: Vec<usize>,
    },

    /// Two matrices of different shape were recombined.
    #[error("Dimensions don't match. ({}x{} vs {}x{})", .left.0, .left.1, .right.0, .right.1)]
    MatrixShapeMismatch {
        /// `(rows, cols)` of the first matrix.
        left: (usize, usize),
        /// `(rows, cols)` of the second matrix.
        right: (usize, usize),
    },

    /// A configuration value is out of range.
    #[error("invalid value for {parameter}: {value}")]
    InvalidParameter {
        /// Name of the offending parameter.
        parameter: &'static str,
        /// Rendered value that was rejected.
        value: String,
    },

    /// The worker pool could not be started.
    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// Reading or writing a stored network failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored network is not valid JSON or misses fields.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A network cannot be stored, or a stored one disagrees with its configuration.
    #[error("invalid stored network: {0}")]
    InvalidModel(String),
}

impl Error {
    pub(crate) fn invalid(parameter: &'static str, value: impl fmt::Display) -> Self {
        Self::InvalidParameter {
            parameter,
            value: value.to_string(),
        }
    }
}
