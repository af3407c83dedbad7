//! # Matrix Operation Layer
//!
//! This module defines the primitive numeric operations the engine needs and
//! the two strategies that execute them.
//!
//! ## Submodules
//!
//! - [`sequential`]: direct single-threaded loops
//! - [`parallel`]: fork/join decomposition over a `rayon` worker pool
//! - [`dispatch`]: the per-network choice between the two
//!
//! ## Contract
//!
//! Every primitive takes its operands by reference and returns a fresh matrix;
//! inputs are never mutated. Shapes are the caller's responsibility: the
//! engine validates vectors at its public entry points, so the kernels only
//! assert and panic on misuse.
//!
//! Both strategies keep the per-element summation order of the plain triple
//! loop, so they agree bit for bit rather than within a tolerance.
//!
//! ## Example
//! ```rust
//! use basic_neural::matrix;
//! use basic_neural::ops::{MatrixOps, SequentialOps};
//!
//! let a = matrix!([[1.0, 2.0], [3.0, 4.0]]);
//! let b = matrix!([[5.0, 6.0], [7.0, 8.0]]);
//! let product = SequentialOps.multiply(&a, &b);
//! assert_eq!(product, matrix!([[19.0, 22.0], [43.0, 50.0]]));
//! ```

pub mod dispatch;
pub mod parallel;
pub mod sequential;

pub use dispatch::Dispatch;
pub use parallel::ParallelOps;
pub use sequential::SequentialOps;

use crate::matrix::Matrix;

/// Elementwise binary operation on two equally shaped matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Elementwise {
    Add,
    Subtract,
    Multiply,
}

impl Elementwise {
    #[inline]
    pub(crate) fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Self::Add => a + b,
            Self::Subtract => a - b,
            Self::Multiply => a * b,
        }
    }
}

/// Primitive matrix operations used by forward and backward propagation.
pub trait MatrixOps {
    /// Standard matrix product `a · b`.
    ///
    /// # Panics
    /// Panics if `a.cols() != b.rows()`.
    fn multiply(&self, a: &Matrix, b: &Matrix) -> Matrix;

    /// Elementwise `a + b`.
    ///
    /// # Panics
    /// Panics if the shapes differ.
    fn add(&self, a: &Matrix, b: &Matrix) -> Matrix;

    /// Elementwise `a - b`.
    ///
    /// # Panics
    /// Panics if the shapes differ.
    fn subtract(&self, a: &Matrix, b: &Matrix) -> Matrix;

    /// Elementwise (Hadamard) product `a ⊙ b`.
    ///
    /// # Panics
    /// Panics if the shapes differ.
    fn elementwise_multiply(&self, a: &Matrix, b: &Matrix) -> Matrix;

    /// Maps `f` over every element.
    fn apply<F>(&self, input: &Matrix, f: F) -> Matrix
    where
        F: Fn(f64) -> f64 + Sync + Send;

    /// Releases background resources. A no-op for strategies that own none,
    /// and for strategies that were already released.
    fn close(&mut self) {}
}

pub(crate) fn assert_same_shape(a: &Matrix, b: &Matrix) {
    assert_eq!(
        a.shape(),
        b.shape(),
        "elementwise shape mismatch: {:?} vs {:?}",
        a.shape(),
        b.shape()
    );
}

pub(crate) fn assert_multipliable(a: &Matrix, b: &Matrix) {
    assert_eq!(
        a.cols(),
        b.rows(),
        "multiply shape mismatch: {:?} · {:?}",
        a.shape(),
        b.shape()
    );
}
