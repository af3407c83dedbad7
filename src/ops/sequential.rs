//! Sequential CPU kernels.
//!
//! These are the reference loops. [`ParallelOps`](super::ParallelOps) calls
//! the same block kernels at the leaves of its recursion, which is what keeps
//! the two strategies bit-identical.

use core::ops::Range;

use super::{Elementwise, MatrixOps, assert_multipliable, assert_same_shape};
use crate::matrix::Matrix;

/// Direct, single-threaded implementation of [`MatrixOps`].
///
/// Stateless: any value is as good as any other, and `close` is a no-op.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequentialOps;

/// Computes rows `rows` of `a · b` with the standard triple loop.
///
/// Returns a row-major block of `rows.len() * b.cols()` elements.
pub(crate) fn multiply_block(a: &Matrix, b: &Matrix, rows: Range<usize>) -> Vec<f64> {
    let k = a.cols();
    let n = b.cols();
    let a_data = a.data();
    let b_data = b.data();

    let mut out = vec![0.0; rows.len() * n];
    for (block_row, i) in rows.enumerate() {
        for j in 0..n {
            let mut sum = 0.0;
            for l in 0..k {
                sum += a_data[i * k + l] * b_data[l * n + j];
            }
            out[block_row * n + j] = sum;
        }
    }
    out
}

/// Writes `op(a[i], b[i])` into `out[i]` for every index.
pub(crate) fn zip_into(a: &[f64], b: &[f64], out: &mut [f64], op: Elementwise) {
    for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
        *o = op.apply(x, y);
    }
}

pub(crate) fn map_slice<F: Fn(f64) -> f64>(input: &[f64], f: &F) -> Vec<f64> {
    input.iter().map(|&x| f(x)).collect()
}

impl SequentialOps {
    fn zip(a: &Matrix, b: &Matrix, op: Elementwise) -> Matrix {
        assert_same_shape(a, b);
        let mut out = vec![0.0; a.len()];
        zip_into(a.data(), b.data(), &mut out, op);
        Matrix::new(a.rows(), a.cols(), out)
    }
}

impl MatrixOps for SequentialOps {
    fn multiply(&self, a: &Matrix, b: &Matrix) -> Matrix {
        assert_multipliable(a, b);
        Matrix::new(a.rows(), b.cols(), multiply_block(a, b, 0..a.rows()))
    }

    fn add(&self, a: &Matrix, b: &Matrix) -> Matrix {
        Self::zip(a, b, Elementwise::Add)
    }

    fn subtract(&self, a: &Matrix, b: &Matrix) -> Matrix {
        Self::zip(a, b, Elementwise::Subtract)
    }

    fn elementwise_multiply(&self, a: &Matrix, b: &Matrix) -> Matrix {
        Self::zip(a, b, Elementwise::Multiply)
    }

    fn apply<F>(&self, input: &Matrix, f: F) -> Matrix
    where
        F: Fn(f64) -> f64 + Sync + Send,
    {
        Matrix::new(input.rows(), input.cols(), map_slice(input.data(), &f))
    }
}
