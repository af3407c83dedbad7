//! Fork/join CPU kernels on a dedicated `rayon` pool.
//!
//! Work is split recursively in halves with [`rayon::join`] until a piece is
//! small enough for the sequential kernels. Leaves write into disjoint slices
//! of one output buffer (elementwise ops) or return owned blocks that are
//! concatenated in order (multiply, apply), so no two tasks ever touch the
//! same element.
//!
//! Small operands skip the pool entirely.

use core::ops::Range;
use std::sync::Arc;

use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, trace};

use super::sequential::{SequentialOps, map_slice, multiply_block, zip_into};
use super::{Elementwise, MatrixOps, assert_multipliable, assert_same_shape};
use crate::error::{Error, Result};
use crate::matrix::Matrix;

/// Below this many elements, elementwise ops and `apply` run sequentially.
pub const MIN_ELEMENTS_FOR_PARALLEL: usize = 1000;

/// `multiply` forks only when `len(a) * len(b)` exceeds this.
pub const MIN_PRODUCT_FOR_PARALLEL: usize = 1_000_000;

/// Row count at which a multiply task stops splitting.
pub const MULTIPLY_ROW_THRESHOLD: usize = 64;

/// Element count at which an elementwise or map task stops splitting.
pub const ELEMENTWISE_SPLIT_THRESHOLD: usize = 1000;

/// Parallel implementation of [`MatrixOps`].
///
/// Owns a handle to a fixed-size worker pool. Clones share the pool; the
/// threads exit once the last handle is closed or dropped. After
/// [`close`](MatrixOps::close) every operation falls back to the sequential
/// kernels, producing the same values.
#[derive(Debug, Clone)]
pub struct ParallelOps {
    pool: Option<Arc<ThreadPool>>,
    workers: usize,
}

impl ParallelOps {
    /// Starts a pool with `workers` threads.
    ///
    /// # Errors
    /// - [`Error::InvalidParameter`] if `workers` is zero
    /// - [`Error::WorkerPool`] if the threads cannot be spawned
    pub fn new(workers: usize) -> Result<Self> {
        Self::with_builder(workers, ThreadPoolBuilder::new())
    }

    /// Starts a pool from a partially configured builder. Thread count and
    /// names are always set here.
    pub(crate) fn with_builder(workers: usize, builder: ThreadPoolBuilder) -> Result<Self> {
        if workers == 0 {
            return Err(Error::invalid("worker count", workers));
        }
        let pool = builder
            .num_threads(workers)
            .thread_name(|i| format!("matrix-worker-{i}"))
            .build()?;
        debug!(workers, "started matrix worker pool");
        Ok(Self {
            pool: Some(Arc::new(pool)),
            workers,
        })
    }

    /// Configured worker count. Unchanged by `close`.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// `true` until this handle has been closed.
    pub fn is_open(&self) -> bool {
        self.pool.is_some()
    }

    fn zip(&self, a: &Matrix, b: &Matrix, op: Elementwise) -> Matrix {
        assert_same_shape(a, b);
        let mut out = vec![0.0; a.len()];
        match &self.pool {
            Some(pool) if a.len() > MIN_ELEMENTS_FOR_PARALLEL => {
                trace!(elements = a.len(), ?op, "forking elementwise op");
                pool.install(|| zip_split(a.data(), b.data(), &mut out, op));
            }
            _ => zip_into(a.data(), b.data(), &mut out, op),
        }
        Matrix::new(a.rows(), a.cols(), out)
    }
}

fn multiply_rows(a: &Matrix, b: &Matrix, rows: Range<usize>) -> Vec<f64> {
    if rows.len() <= MULTIPLY_ROW_THRESHOLD {
        return multiply_block(a, b, rows);
    }
    let mid = rows.start + rows.len() / 2;
    let (mut top, bottom) = rayon::join(
        || multiply_rows(a, b, rows.start..mid),
        || multiply_rows(a, b, mid..rows.end),
    );
    top.extend(bottom);
    top
}

fn zip_split(a: &[f64], b: &[f64], out: &mut [f64], op: Elementwise) {
    if out.len() <= ELEMENTWISE_SPLIT_THRESHOLD {
        zip_into(a, b, out, op);
        return;
    }
    let mid = out.len() / 2;
    let (a_lo, a_hi) = a.split_at(mid);
    let (b_lo, b_hi) = b.split_at(mid);
    let (out_lo, out_hi) = out.split_at_mut(mid);
    rayon::join(
        || zip_split(a_lo, b_lo, out_lo, op),
        || zip_split(a_hi, b_hi, out_hi, op),
    );
}

fn map_split<F>(input: &[f64], f: &F) -> Vec<f64>
where
    F: Fn(f64) -> f64 + Sync + Send,
{
    if input.len() <= ELEMENTWISE_SPLIT_THRESHOLD {
        return map_slice(input, f);
    }
    let (lo, hi) = input.split_at(input.len() / 2);
    let (left, right) = rayon::join(|| map_split(lo, f), || map_split(hi, f));
    let mut out = Vec::with_capacity(input.len());
    out.extend(left);
    out.extend(right);
    out
}

impl MatrixOps for ParallelOps {
    fn multiply(&self, a: &Matrix, b: &Matrix) -> Matrix {
        assert_multipliable(a, b);
        match &self.pool {
            Some(pool) if a.len().saturating_mul(b.len()) > MIN_PRODUCT_FOR_PARALLEL => {
                trace!(lhs = ?a.shape(), rhs = ?b.shape(), "forking multiply");
                let data = pool.install(|| multiply_rows(a, b, 0..a.rows()));
                Matrix::new(a.rows(), b.cols(), data)
            }
            _ => SequentialOps.multiply(a, b),
        }
    }

    fn add(&self, a: &Matrix, b: &Matrix) -> Matrix {
        self.zip(a, b, Elementwise::Add)
    }

    fn subtract(&self, a: &Matrix, b: &Matrix) -> Matrix {
        self.zip(a, b, Elementwise::Subtract)
    }

    fn elementwise_multiply(&self, a: &Matrix, b: &Matrix) -> Matrix {
        self.zip(a, b, Elementwise::Multiply)
    }

    fn apply<F>(&self, input: &Matrix, f: F) -> Matrix
    where
        F: Fn(f64) -> f64 + Sync + Send,
    {
        let data = match &self.pool {
            Some(pool) if input.len() > MIN_ELEMENTS_FOR_PARALLEL => {
                trace!(elements = input.len(), "forking apply");
                pool.install(|| map_split(input.data(), &f))
            }
            _ => map_slice(input.data(), &f),
        };
        Matrix::new(input.rows(), input.cols(), data)
    }

    fn close(&mut self) {
        if let Some(pool) = self.pool.take() {
            debug!(
                workers = self.workers,
                remaining_handles = Arc::strong_count(&pool) - 1,
                "released matrix worker pool handle"
            );
        }
    }
}

impl Drop for ParallelOps {
    fn drop(&mut self) {
        self.close();
    }
}
