//! Dense row-major `f64` matrix and the numeric primitives the feature
//! pipeline is built on.
//!
//! Shape preconditions are programmer errors and panic; every operation
//! documents them under `# Panics`.

use serde::{Deserialize, Serialize};

/// Dense row-major matrix of `f64`.
///
/// Rows always share one length, so a `Matrix` is rectangular by construction.
///
/// # Example
/// ```
/// use mf_core::matrix::Matrix;
/// let m = Matrix::from_rows(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
/// assert_eq!((m.rows(), m.cols()), (2, 3));
/// assert_eq!(m.transpose().row(2), &[3.0, 6.0]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Zero-filled `rows × cols` matrix.
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Wrap a row-major buffer.
    ///
    /// # Panics
    /// Panics if `data.len() != rows * cols`.
    #[must_use]
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        assert_eq!(data.len(), rows * cols, "buffer length must equal rows × cols");
        Self { rows, cols, data }
    }

    /// Build from nested rows.
    ///
    /// # Panics
    /// Panics if the rows do not all have the same length.
    #[must_use]
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Self {
        let cols = rows.first().map_or(0, Vec::len);
        let n = rows.len();
        let mut data = Vec::with_capacity(n * cols);
        for row in rows {
            assert_eq!(row.len(), cols, "all rows must have the same length");
            data.extend(row);
        }
        Self {
            rows: n,
            cols,
            data,
        }
    }

    /// Number of rows.
    #[inline]
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `true` when the matrix holds no element.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row `i` as a slice.
    ///
    /// # Panics
    /// Panics if `i >= rows`.
    #[inline]
    #[must_use]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Row `i` as a mutable slice.
    ///
    /// # Panics
    /// Panics if `i >= rows`.
    #[inline]
    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Element at `(i, j)`.
    ///
    /// # Panics
    /// Panics if the index is out of bounds.
    #[inline]
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(j < self.cols, "column index out of bounds");
        self.data[i * self.cols + j]
    }

    /// Iterate over rows.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact(0) panics; an empty matrix yields `rows` empty slices instead.
        (0..self.rows).map(move |i| self.row(i))
    }

    /// Row-major view of every element.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable row-major view of every element.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Convert into nested rows.
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.iter_rows().map(<[f64]>::to_vec).collect()
    }

    /// `true` if no element is NaN or infinite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }

    /// Row/column-swapped copy.
    #[must_use]
    pub fn transpose(&self) -> Self {
        let mut out = Self::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                out.data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }
        out
    }

    /// Matrix product `self × rhs`.
    ///
    /// Each dot product is accumulated with compensated summation, so long
    /// reduction dimensions (hundreds of spectrum bins) do not drift.
    ///
    /// # Panics
    /// Panics if `self.cols() != rhs.rows()`.
    ///
    /// # Example
    /// ```
    /// use mf_core::matrix::Matrix;
    /// let a = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    /// let b = Matrix::from_rows(vec![vec![5.0], vec![6.0]]);
    /// assert_eq!(a.matmul(&b).as_slice(), &[17.0, 39.0]);
    /// ```
    #[must_use]
    pub fn matmul(&self, rhs: &Self) -> Self {
        assert_eq!(
            self.cols, rhs.rows,
            "matmul: left columns must equal right rows"
        );
        let mut out = Self::zeros(self.rows, rhs.cols);
        for i in 0..self.rows {
            let lhs_row = self.row(i);
            for j in 0..rhs.cols {
                let mut acc = NeumaierSum::default();
                for (k, &a) in lhs_row.iter().enumerate() {
                    acc.add(a * rhs.data[k * rhs.cols + j]);
                }
                out.data[i * rhs.cols + j] = acc.total();
            }
        }
        out
    }

    /// Subtract `v` from every row in place: `m[i][j] -= v[j]`.
    ///
    /// # Panics
    /// Panics if `v.len() != self.cols()`.
    pub fn sub_row_vector(&mut self, v: &[f64]) {
        assert_eq!(v.len(), self.cols, "vector length must equal column count");
        for i in 0..self.rows {
            for (x, &s) in self.row_mut(i).iter_mut().zip(v) {
                *x -= s;
            }
        }
    }

    /// Replace exact zeros with `f64::EPSILON` so a following logarithm is finite.
    pub fn stabilize(&mut self) {
        for v in &mut self.data {
            if *v == 0.0 {
                *v = f64::EPSILON;
            }
        }
    }

    /// Mean of every column over all rows. Zero-row matrices yield zeros.
    ///
    /// # Example
    /// ```
    /// use mf_core::matrix::Matrix;
    /// let m = Matrix::from_rows(vec![vec![1.0, 10.0], vec![3.0, 20.0]]);
    /// assert_eq!(m.column_means(), vec![2.0, 15.0]);
    /// ```
    #[must_use]
    pub fn column_means(&self) -> Vec<f64> {
        if self.rows == 0 {
            return vec![0.0; self.cols];
        }
        let mut sums = vec![NeumaierSum::default(); self.cols];
        for row in self.iter_rows() {
            for (acc, &v) in sums.iter_mut().zip(row) {
                acc.add(v);
            }
        }
        let n = self.rows as f64;
        sums.into_iter().map(|s| s.total() / n).collect()
    }

    /// Global `(min, max)`, or `None` for an empty matrix.
    #[must_use]
    pub fn min_max(&self) -> Option<(f64, f64)> {
        let first = *self.data.first()?;
        Some(
            self.data
                .iter()
                .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
        )
    }

    /// Affinely map every element from the observed `[min, max]` into `[lo, hi]`.
    ///
    /// A constant matrix has no range to stretch; every element becomes `lo`.
    ///
    /// # Example
    /// ```
    /// use mf_core::matrix::Matrix;
    /// let mut m = Matrix::from_rows(vec![vec![-2.0, 0.0, 2.0]]);
    /// m.rescale(0.0, 1.0);
    /// assert_eq!(m.as_slice(), &[0.0, 0.5, 1.0]);
    /// ```
    pub fn rescale(&mut self, lo: f64, hi: f64) {
        let Some((min, max)) = self.min_max() else {
            return;
        };
        let range = max - min;
        if range <= 0.0 || !range.is_finite() {
            log::warn!("Matrice constante ({min}) : remise à l'échelle vers {lo}");
            self.data.fill(lo);
            return;
        }
        let scale = (hi - lo) / range;
        for v in &mut self.data {
            *v = lo + (*v - min) * scale;
        }
    }
}

/// `n` evenly spaced values from `low` to `high` inclusive.
///
/// The last element is forced to exactly `high`.
///
/// # Example
/// ```
/// use mf_core::matrix::linspace;
/// assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
/// assert_eq!(linspace(3.0, 7.0, 1), vec![7.0]);
/// ```
#[must_use]
pub fn linspace(low: f64, high: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![high],
        _ => {
            let step = (high - low) / (n - 1) as f64;
            let mut points: Vec<f64> = (0..n).map(|i| low + i as f64 * step).collect();
            points[n - 1] = high;
            points
        }
    }
}

/// Compensated (Neumaier) running sum.
#[derive(Clone, Copy, Debug, Default)]
struct NeumaierSum {
    sum: f64,
    compensation: f64,
}

impl NeumaierSum {
    #[inline]
    fn add(&mut self, v: f64) {
        let t = self.sum + v;
        if self.sum.abs() >= v.abs() {
            self.compensation += (self.sum - t) + v;
        } else {
            self.compensation += (v - t) + self.sum;
        }
        self.sum = t;
    }

    #[inline]
    fn total(self) -> f64 {
        self.sum + self.compensation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transpose_swaps_shape() {
        let m = Matrix::from_rows(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        let t = m.transpose();
        assert_eq!((t.rows(), t.cols()), (3, 2));
        assert_eq!(t.to_rows(), vec![vec![1.0, 4.0], vec![2.0, 5.0], vec![3.0, 6.0]]);
        assert_eq!(t.transpose(), m);
    }

    #[test]
    fn transpose_of_rowless_matrix_keeps_columns() {
        let m = Matrix::zeros(0, 4);
        let t = m.transpose();
        assert_eq!((t.rows(), t.cols()), (4, 0));
    }

    #[test]
    #[should_panic(expected = "same length")]
    fn ragged_rows_panic() {
        let _ = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0]]);
    }

    #[test]
    #[should_panic(expected = "matmul")]
    fn matmul_shape_mismatch_panics() {
        let a = Matrix::zeros(2, 3);
        let b = Matrix::zeros(2, 3);
        let _ = a.matmul(&b);
    }

    #[test]
    fn matmul_matches_hand_computation() {
        let a = Matrix::from_rows(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        let b = Matrix::from_rows(vec![vec![7.0, 8.0], vec![9.0, 10.0], vec![11.0, 12.0]]);
        let c = a.matmul(&b);
        assert_eq!(c.to_rows(), vec![vec![58.0, 64.0], vec![139.0, 154.0]]);
    }

    #[test]
    fn compensated_sum_keeps_small_terms() {
        // 1e16 + 1 + 1 - 1e16 loses both ones with naive summation.
        let a = Matrix::from_rows(vec![vec![1e16, 1.0, 1.0, -1e16]]);
        let b = Matrix::from_rows(vec![vec![1.0], vec![1.0], vec![1.0], vec![1.0]]);
        assert!((a.matmul(&b).get(0, 0) - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sub_row_vector_broadcasts() {
        let mut m = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        m.sub_row_vector(&[1.0, 2.0]);
        assert_eq!(m.as_slice(), &[0.0, 0.0, 2.0, 2.0]);
    }

    #[test]
    fn stabilize_replaces_only_exact_zeros() {
        let mut m = Matrix::from_rows(vec![vec![0.0, -0.0, 1e-300, -1.0]]);
        m.stabilize();
        assert_eq!(m.as_slice(), &[f64::EPSILON, f64::EPSILON, 1e-300, -1.0]);
    }

    #[test]
    fn column_means_after_subtraction_are_zero() {
        let mut m = Matrix::from_rows(vec![vec![1.0, -3.0], vec![2.0, 5.0], vec![6.0, 7.0]]);
        let means = m.column_means();
        m.sub_row_vector(&means);
        for mean in m.column_means() {
            assert!(mean.abs() < 1e-12);
        }
    }

    #[test]
    fn linspace_is_inclusive_and_even() {
        let pts = linspace(0.0, 2840.0, 28);
        assert_eq!(pts.len(), 28);
        assert_eq!(pts[0], 0.0);
        assert_eq!(pts[27], 2840.0);
        let step = pts[1] - pts[0];
        for w in pts.windows(2) {
            assert!((w[1] - w[0] - step).abs() < 1e-9);
        }
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn rescale_maps_extremes_and_constant_input() {
        let mut m = Matrix::from_rows(vec![vec![10.0, 20.0], vec![30.0, 50.0]]);
        m.rescale(-1.0, 1.0);
        assert_eq!(m.min_max(), Some((-1.0, 1.0)));
        assert!((m.get(0, 1) + 0.5).abs() < 1e-12);

        let mut flat = Matrix::from_rows(vec![vec![3.0, 3.0]]);
        flat.rescale(0.0, 255.0);
        assert_eq!(flat.as_slice(), &[0.0, 0.0]);

        let mut empty = Matrix::zeros(0, 0);
        empty.rescale(0.0, 1.0);
        assert!(empty.is_empty());
    }
}
