//! Dense matrix storage and conversion utilities.
//!
//! # Core Matrix Utilities
//!
//! This module defines the two-dimensional value the engine computes with, and
//! the small set of conversions needed around it:
//!
//! - Construction from row-major data, nested rows, or a flat column vector
//! - Extraction of a column back into a flat vector
//! - Transposition
//! - Uniform random initialisation in `[-1, 1]`
//! - Per-element recombination of two equally shaped matrices
//!
//! ## Design Highlights
//! - Storage is a flat `Vec<f64>` in row-major order, so element `i` of the
//!   flat view is `(i / cols, i % cols)`
//! - Equality and hashing compare the bit pattern of every element: no
//!   tolerance, and `-0.0 != 0.0`
//! - The `matrix!` macro builds small matrices from nested literals
//!
//! Arithmetic lives in [`crate::ops`], not here.
//!
//! ## Example
//!
//! ```rust
//! use basic_neural::matrix::Matrix;
//! let m = Matrix::new(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
//! assert_eq!(m.shape(), (2, 3));
//! assert_eq!(m.get(1, 0), 4.0);
//! ```

use core::hash::{Hash, Hasher};

use rand::Rng;

use crate::error::{Error, Result};

/// A real-valued matrix with row-major storage.
#[derive(Debug, Clone)]
pub struct Matrix {
    num_rows: usize,
    num_cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Creates a matrix from row-major data.
    ///
    /// # Panics
    /// Panics if `data.len() != rows * cols`.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        assert_eq!(
            rows * cols,
            data.len(),
            "shape {rows}x{cols} is incompatible with {} data elements",
            data.len()
        );
        Self {
            num_rows: rows,
            num_cols: cols,
            data,
        }
    }

    /// Builds a matrix from nested rows.
    ///
    /// # Panics
    /// Panics if the rows are ragged.
    pub fn from_rows(rows: &[Vec<f64>]) -> Self {
        let cols = rows.first().map_or(0, Vec::len);
        assert!(
            rows.iter().all(|r| r.len() == cols),
            "ragged matrix literal (rows have mismatched lengths)"
        );
        let data = rows.iter().flatten().copied().collect();
        Self::new(rows.len(), cols, data)
    }

    /// Turns a flat vector into a column matrix of shape `(len, 1)`.
    pub fn from_column(values: &[f64]) -> Self {
        Self::new(values.len(), 1, values.to_vec())
    }

    /// A matrix whose elements are drawn uniformly from `[-1, 1]`.
    pub fn random<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Self {
        let data = (0..rows * cols)
            .map(|_| rng.random_range(-1.0..=1.0))
            .collect();
        Self::new(rows, cols, data)
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.num_rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.num_cols
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.num_rows, self.num_cols)
    }

    /// Total element count.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// `true` if the matrix holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Element at `(row, col)`.
    ///
    /// # Panics
    /// Panics if the position is out of bounds.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        assert!(row < self.num_rows && col < self.num_cols, "index out of bounds");
        self.data[row * self.num_cols + col]
    }

    /// Overwrites the element at `(row, col)`.
    ///
    /// # Panics
    /// Panics if the position is out of bounds.
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        assert!(row < self.num_rows && col < self.num_cols, "index out of bounds");
        self.data[row * self.num_cols + col] = value;
    }

    /// Row-major view of all elements.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Mutable row-major view of all elements.
    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Copies one column out as a flat vector.
    ///
    /// # Panics
    /// Panics if `col` is out of bounds.
    pub fn column(&self, col: usize) -> Vec<f64> {
        assert!(col < self.num_cols, "column {col} out of bounds");
        (0..self.num_rows).map(|r| self.get(r, col)).collect()
    }

    /// Copies the matrix out as nested rows.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        if self.num_cols == 0 {
            return vec![Vec::new(); self.num_rows];
        }
        self.data.chunks(self.num_cols).map(<[f64]>::to_vec).collect()
    }

    /// Returns the transpose.
    pub fn transpose(&self) -> Self {
        let mut out = Vec::with_capacity(self.data.len());
        for c in 0..self.num_cols {
            for r in 0..self.num_rows {
                out.push(self.data[r * self.num_cols + c]);
            }
        }
        Self::new(self.num_cols, self.num_rows, out)
    }

    /// Recombines two equally shaped matrices element by element.
    ///
    /// Each element of the result is taken from `b` with probability
    /// `probability` and from `a` otherwise. Draws come from `rng`, one per
    /// element, in row-major order.
    ///
    /// # Errors
    /// [`Error::MatrixShapeMismatch`] if the shapes differ.
    pub fn merge<R: Rng>(a: &Self, b: &Self, probability: f64, rng: &mut R) -> Result<Self> {
        if a.shape() != b.shape() {
            return Err(Error::MatrixShapeMismatch {
                left: a.shape(),
                right: b.shape(),
            });
        }
        let data = a
            .data
            .iter()
            .zip(&b.data)
            .map(|(&x, &y)| if rng.random::<f64>() < probability { y } else { x })
            .collect();
        Ok(Self::new(a.num_rows, a.num_cols, data))
    }

    /// Elementwise bit-exact comparison.
    pub fn is_identical(&self, other: &Self) -> bool {
        self.shape() == other.shape()
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(x, y)| x.to_bits() == y.to_bits())
    }
}

impl PartialEq for Matrix {
    fn eq(&self, other: &Self) -> bool {
        self.is_identical(other)
    }
}

impl Eq for Matrix {}

impl Hash for Matrix {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.num_rows.hash(state);
        self.num_cols.hash(state);
        for value in &self.data {
            value.to_bits().hash(state);
        }
    }
}

/// Defines a matrix from nested literal rows.
///
/// # Example
/// ```
/// use basic_neural::matrix;
/// let m = matrix!([[1.0, 2.0], [3.0, 4.0]]);
/// assert_eq!(m.shape(), (2, 2));
/// ```
#[macro_export]
macro_rules! matrix {
    ([ $( [ $( $value:expr ),* $(,)? ] ),+ $(,)? ]) => {
        $crate::matrix::Matrix::from_rows(&[ $( vec![ $( $value as f64 ),* ] ),+ ])
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn from_column_is_a_single_column() {
        let m = Matrix::from_column(&[3.0, 5.0]);
        assert_eq!(m.shape(), (2, 1));
        assert_eq!(m.get(0, 0), 3.0);
        assert_eq!(m.get(1, 0), 5.0);
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn to_rows_keeps_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut m = Matrix::random(2, 3, &mut rng);
        m.set(0, 0, 5.0);
        let rows = m.to_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 3);
        assert_eq!(rows[0][0], 5.0);
    }

    #[test]
    fn column_extraction() {
        let m = matrix!([[5.0, 1.0], [2.0, 9.0]]);
        assert_eq!(m.column(0), vec![5.0, 2.0]);
        assert_eq!(m.column(1), vec![1.0, 9.0]);
    }

    #[test]
    fn transpose_swaps_axes() {
        let m = matrix!([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        let t = m.transpose();
        assert_eq!(t.shape(), (3, 2));
        assert_eq!(t, matrix!([[1.0, 4.0], [2.0, 5.0], [3.0, 6.0]]));
    }

    #[test]
    fn random_stays_in_unit_interval() {
        let mut rng = StdRng::seed_from_u64(99);
        let m = Matrix::random(20, 20, &mut rng);
        assert!(m.data().iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn merge_rejects_mismatched_shapes() {
        let mut rng = StdRng::seed_from_u64(1);
        let a = Matrix::random(2, 3, &mut rng);
        let b = Matrix::random(1, 2, &mut rng);
        let err = Matrix::merge(&a, &b, 0.5, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            Error::MatrixShapeMismatch {
                left: (2, 3),
                right: (1, 2)
            }
        ));
    }

    #[test]
    fn merge_picks_from_either_parent() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut a = Matrix::random(2, 2, &mut rng);
        a.set(0, 0, 5.0);
        let mut b = Matrix::random(2, 2, &mut rng);
        b.set(0, 0, 3.0);

        let merged = Matrix::merge(&a, &b, 0.5, &mut rng).unwrap();
        let value = merged.get(0, 0);
        assert!(value == 5.0 || value == 3.0);
    }

    #[test]
    fn merge_extremes_copy_one_parent() {
        let mut rng = StdRng::seed_from_u64(11);
        let a = Matrix::random(4, 4, &mut rng);
        let b = Matrix::random(4, 4, &mut rng);
        assert_eq!(Matrix::merge(&a, &b, 0.0, &mut rng).unwrap(), a);
        assert_eq!(Matrix::merge(&a, &b, 1.0, &mut rng).unwrap(), b);
    }

    #[test]
    fn equality_is_bitwise() {
        let a = matrix!([[0.0]]);
        let b = matrix!([[-0.0]]);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    #[should_panic(expected = "incompatible")]
    fn new_rejects_bad_length() {
        let _ = Matrix::new(2, 2, vec![1.0, 2.0, 3.0]);
    }
}
