//! Elementwise activation functions.
//!
//! Each variant supplies the forward map and its derivative. The derivative is
//! written in terms of the *activated output* `y = f(x)`, because
//! backpropagation only keeps layer outputs around:
//!
//! | Variant      | `f(x)`                 | `f'` as a function of `y`  |
//! |--------------|------------------------|----------------------------|
//! | `Sigmoid`    | `1 / (1 + e^-x)`       | `y * (1 - y)`              |
//! | `Tanh`       | `tanh(x)`              | `1 - y^2`                  |
//! | `Relu`       | `max(0, x)`            | `1` if `y > 0`, else `0`   |
//! | `LeakyRelu`  | `x` or `0.01 x`        | `1` if `y > 0`, else `0.01`|
//!
//! The engine only ever calls these through
//! [`MatrixOps::apply`](crate::ops::MatrixOps::apply).

use serde::{Deserialize, Serialize};

const LEAKY_SLOPE: f64 = 0.01;

/// Activation applied after every affine transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivationFunction {
    /// Logistic sigmoid (default).
    #[default]
    Sigmoid,
    /// Hyperbolic tangent.
    Tanh,
    /// Rectified linear unit.
    Relu,
    /// ReLU with a small negative slope.
    LeakyRelu,
}

impl ActivationFunction {
    /// Forward map.
    #[must_use]
    pub fn activate(self, x: f64) -> f64 {
        match self {
            Self::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Self::Tanh => x.tanh(),
            Self::Relu => {
                if x > 0.0 {
                    x
                } else {
                    0.0
                }
            }
            Self::LeakyRelu => {
                if x > 0.0 {
                    x
                } else {
                    LEAKY_SLOPE * x
                }
            }
        }
    }

    /// Derivative, evaluated at an already activated value `y`.
    #[must_use]
    pub fn derivative(self, y: f64) -> f64 {
        match self {
            Self::Sigmoid => y * (1.0 - y),
            Self::Tanh => 1.0 - y * y,
            Self::Relu => {
                if y > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Self::LeakyRelu => {
                if y > 0.0 {
                    1.0
                } else {
                    LEAKY_SLOPE
                }
            }
        }
    }

    /// Upper-case identifier, as used in stored networks.
    pub fn name(self) -> &'static str {
        match self {
            Self::Sigmoid => "SIGMOID",
            Self::Tanh => "TANH",
            Self::Relu => "RELU",
            Self::LeakyRelu => "LEAKY_RELU",
        }
    }
}
