//! Operation Dispatch Layer
//!
//! Every network owns exactly one [`Dispatch`], chosen from its
//! [`Backend`] at construction time. Each primitive matches on the variant and
//! forwards to the sequential or parallel kernels.
//!
//! # Example
//! ```rust
//! use basic_neural::backend::Backend;
//! use basic_neural::matrix;
//! use basic_neural::ops::{Dispatch, MatrixOps};
//!
//! let ops = Dispatch::for_backend(Backend::Parallel { workers: 2 }).unwrap();
//! let a = matrix!([[1.0, 2.0]]);
//! assert_eq!(ops.add(&a, &a), matrix!([[2.0, 4.0]]));
//! ```

use super::{MatrixOps, ParallelOps, SequentialOps};
use crate::backend::Backend;
use crate::error::Result;
use crate::matrix::Matrix;

/// The strategy a network computes with.
#[derive(Debug, Clone)]
pub enum Dispatch {
    /// Single-threaded loops.
    Sequential(SequentialOps),
    /// Fork/join over a worker pool.
    Parallel(ParallelOps),
}

impl Dispatch {
    /// Builds the strategy for `backend`, starting a pool if it asks for one.
    ///
    /// # Errors
    /// Propagates [`ParallelOps::new`] failures.
    pub fn for_backend(backend: Backend) -> Result<Self> {
        Ok(match backend {
            Backend::Sequential => Self::Sequential(SequentialOps),
            Backend::Parallel { workers } => Self::Parallel(ParallelOps::new(workers)?),
        })
    }

    /// `true` for the parallel strategy, closed or not.
    pub fn is_parallel(&self) -> bool {
        matches!(self, Self::Parallel(_))
    }

    /// Worker count of the parallel strategy, `None` when sequential.
    pub fn worker_count(&self) -> Option<usize> {
        match self {
            Self::Sequential(_) => None,
            Self::Parallel(ops) => Some(ops.workers()),
        }
    }
}

impl Default for Dispatch {
    fn default() -> Self {
        Self::Sequential(SequentialOps)
    }
}

impl MatrixOps for Dispatch {
    fn multiply(&self, a: &Matrix, b: &Matrix) -> Matrix {
        match self {
            Self::Sequential(ops) => ops.multiply(a, b),
            Self::Parallel(ops) => ops.multiply(a, b),
        }
    }

    fn add(&self, a: &Matrix, b: &Matrix) -> Matrix {
        match self {
            Self::Sequential(ops) => ops.add(a, b),
            Self::Parallel(ops) => ops.add(a, b),
        }
    }

    fn subtract(&self, a: &Matrix, b: &Matrix) -> Matrix {
        match self {
            Self::Sequential(ops) => ops.subtract(a, b),
            Self::Parallel(ops) => ops.subtract(a, b),
        }
    }

    fn elementwise_multiply(&self, a: &Matrix, b: &Matrix) -> Matrix {
        match self {
            Self::Sequential(ops) => ops.elementwise_multiply(a, b),
            Self::Parallel(ops) => ops.elementwise_multiply(a, b),
        }
    }

    fn apply<F>(&self, input: &Matrix, f: F) -> Matrix
    where
        F: Fn(f64) -> f64 + Sync + Send,
    {
        match self {
            Self::Sequential(ops) => ops.apply(input, f),
            Self::Parallel(ops) => ops.apply(input, f),
        }
    }

    fn close(&mut self) {
        if let Self::Parallel(ops) = self {
            ops.close();
        }
    }
}
