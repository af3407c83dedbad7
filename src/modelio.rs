//! Saving and loading of networks.
//!
//! # Stored Format
//!
//! A network is stored as one JSON document holding its configuration and
//! every weight and bias matrix as nested row-major arrays:
//!
//! ```text
//! {
//!   "configuration": {
//!     "inputNodes": 2, "outputNodes": 1, "hiddenLayers": [4],
//!     "learningRate": 0.1, "activationFunction": "SIGMOID",
//!     "seed": 42, "parallel": false, "workerCount": 8
//!   },
//!   "weights": [ [[..], [..], [..], [..]], [[.., .., .., ..]] ],
//!   "biases":  [ [[..], [..], [..], [..]], [[..]] ]
//! }
//! ```
//!
//! Output is pretty-printed; input may use any whitespace. Floats are written
//! so that they read back bit for bit.
//!
//! # Restoring
//!
//! Matrix shapes are checked against the stored configuration before a
//! network is produced. A restored network restarts its random stream from
//! the stored seed and starts a new worker pool if the configuration is
//! parallel.
//!
//! # Example
//!
//! ```rust
//! use basic_neural::NetworkBuilder;
//! use basic_neural::modelio::{from_json, to_json};
//!
//! let network = NetworkBuilder::new(2, 1).hidden_layers(1, 3).seed(7).build().unwrap();
//! let restored = from_json(&to_json(&network).unwrap()).unwrap();
//! assert_eq!(restored, network);
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::NetworkConfiguration;
use crate::error::{Error, Result};
use crate::matrix::Matrix;
use crate::network::NeuralNetwork;

type Rows = Vec<Vec<f64>>;

/// On-disk representation of a network.
#[derive(Debug, Serialize, Deserialize)]
struct StoredNetwork {
    configuration: NetworkConfiguration,
    weights: Vec<Rows>,
    biases: Vec<Rows>,
}

impl StoredNetwork {
    fn capture(network: &NeuralNetwork) -> Result<Self> {
        check_finite("weight", network.weights())?;
        check_finite("bias", network.biases())?;
        Ok(Self {
            configuration: network.config().clone(),
            weights: network.weights().iter().map(Matrix::to_rows).collect(),
            biases: network.biases().iter().map(Matrix::to_rows).collect(),
        })
    }

    fn restore(self) -> Result<NeuralNetwork> {
        let weights = to_matrices("weight", &self.weights)?;
        let biases = to_matrices("bias", &self.biases)?;
        NeuralNetwork::from_parts(self.configuration, weights, biases)
    }
}

/// JSON has no NaN or infinity, so a diverged network could not be read back.
fn check_finite(kind: &str, matrices: &[Matrix]) -> Result<()> {
    match matrices
        .iter()
        .position(|m| m.data().iter().any(|v| !v.is_finite()))
    {
        Some(i) => Err(Error::InvalidModel(format!("non-finite value in {kind} matrix {i}"))),
        None => Ok(()),
    }
}

fn to_matrices(kind: &str, stored: &[Rows]) -> Result<Vec<Matrix>> {
    stored
        .iter()
        .enumerate()
        .map(|(i, rows)| {
            let cols = rows.first().map_or(0, Vec::len);
            if rows.iter().any(|row| row.len() != cols) {
                return Err(Error::InvalidModel(format!("{kind} matrix {i} has ragged rows")));
            }
            Ok(Matrix::from_rows(rows))
        })
        .collect()
}

/// Renders a network as pretty-printed JSON.
///
/// # Errors
/// [`Error::InvalidModel`] if a weight or bias is NaN or infinite,
/// [`Error::Json`] if serialization fails.
pub fn to_json(network: &NeuralNetwork) -> Result<String> {
    Ok(serde_json::to_string_pretty(&StoredNetwork::capture(network)?)?)
}

/// Parses a network from JSON text.
///
/// # Errors
/// [`Error::Json`] for malformed text, [`Error::InvalidModel`] or
/// [`Error::InvalidParameter`] for inconsistent content.
pub fn from_json(json: &str) -> Result<NeuralNetwork> {
    serde_json::from_str::<StoredNetwork>(json)?.restore()
}

/// Writes a network to any writer.
///
/// # Errors
/// [`Error::InvalidModel`] for non-finite values, [`Error::Json`] or
/// [`Error::Io`] if writing fails. Nothing is written on a non-finite value.
pub fn write_network<W: Write>(network: &NeuralNetwork, writer: W) -> Result<()> {
    write_stored(&StoredNetwork::capture(network)?, writer)
}

fn write_stored<W: Write>(stored: &StoredNetwork, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, stored)?;
    writer.flush()?;
    Ok(())
}

/// Reads a network from any reader, e.g. a bundled resource.
///
/// # Errors
/// See [`from_json`].
pub fn read_network<R: Read>(reader: R) -> Result<NeuralNetwork> {
    serde_json::from_reader::<_, StoredNetwork>(reader)?.restore()
}

/// Saves a network to `path`, replacing any existing file.
///
/// # Errors
/// [`Error::InvalidModel`] for non-finite values, in which case no file is
/// created. [`Error::Io`] if the file cannot be created or written.
pub fn save_network(network: &NeuralNetwork, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let stored = StoredNetwork::capture(network)?;
    write_stored(&stored, BufWriter::new(File::create(path)?))?;
    info!(path = %path.display(), topology = ?network.topology(), "saved network");
    Ok(())
}

/// Loads a network previously written by [`save_network`].
///
/// # Errors
/// [`Error::Io`] if the file cannot be opened, otherwise see [`from_json`].
pub fn load_network(path: impl AsRef<Path>) -> Result<NeuralNetwork> {
    let path = path.as_ref();
    let network = read_network(BufReader::new(File::open(path)?))?;
    info!(path = %path.display(), topology = ?network.topology(), "loaded network");
    Ok(network)
}
