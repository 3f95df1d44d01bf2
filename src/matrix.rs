//! Contact matrix operations: diagonal-band masking, expected-matrix
//! synthesis, and observed/expected normalization.
//!
//! Matrices are dense, square, symmetric [`Array2`] arrays over the genomic
//! bins of a single chromosome. The missing-value marker is [`f64::NAN`];
//! masking and normalization produce it, and downstream reductions skip it.

use ndarray::{Array1, Array2};
use num_traits::Float;

use crate::error::IpaError;

/// Write the missing marker along both mirrors of diagonal offset `k`.
///
/// A no-op when `k` indexes past the matrix bound.
fn mask_offset(matrix: &mut Array2<f64>, k: usize) {
    let n = matrix.nrows();
    if k >= n {
        return;
    }
    for i in 0..(n - k) {
        matrix[[i, i + k]] = f64::NAN;
        matrix[[i + k, i]] = f64::NAN;
    }
}

/// Mask out all diagonals below `min_diag` and above `max_diag`, in place.
///
/// Entries with diagonal offset `|i - j| < min_diag` are replaced with the
/// missing marker, removing very-short-range interactions; entries with
/// offset `> max_diag` are likewise removed when `max_diag` is `Some`.
/// Offsets strictly inside the band are left untouched.
///
/// `min_diag == 0` masks nothing at all: the main diagonal is only reached
/// by the explicit `k == 0` branch, which requires `min_diag >= 1`. Callers
/// rely on this to express "no minimum distance restriction". Bounds past
/// the matrix size silently mask nothing further.
pub fn mask_diagonal_band(matrix: &mut Array2<f64>, min_diag: usize, max_diag: Option<usize>) {
    let n = matrix.nrows();

    for k in 0..min_diag.min(n) {
        if k == 0 {
            for i in 0..n {
                matrix[[i, i]] = f64::NAN;
            }
        } else {
            mask_offset(matrix, k);
        }
    }

    if let Some(max_diag) = max_diag {
        for k in max_diag.saturating_add(1)..n {
            mask_offset(matrix, k);
        }
    }
}

/// Expand a per-offset expected vector into a symmetric band matrix.
///
/// Returns the `n x n` matrix `M` with `M[i][j] = expected[|i - j|]`: every
/// diagonal offset `k` is filled with the constant `expected[k]`, turning a
/// 1-D "average contact strength by distance" curve into a per-pixel
/// normalization baseline. Missing entries in the vector fill their whole
/// diagonal. The output element type matches the input vector's.
pub fn expected_matrix<T: Float>(expected: &Array1<T>) -> Array2<T> {
    let n = expected.len();
    let mut matrix = Array2::zeros((n, n));
    for k in 0..n {
        let value = expected[k];
        for i in 0..(n - k) {
            matrix[[i, i + k]] = value;
            matrix[[i + k, i]] = value;
        }
    }
    matrix
}

/// Element-wise observed/expected ratio.
///
/// Standard floating-point semantics apply: division by zero yields an
/// infinity or NaN depending on the numerator, and missing expected values
/// propagate. Neither is an error; downstream consumers treat all
/// non-finite entries as "no data". Shape mismatch indicates a caller bug
/// and is surfaced as an `Err`.
pub fn observed_over_expected(
    observed: &Array2<f64>,
    expected: &Array2<f64>,
) -> Result<Array2<f64>, IpaError> {
    if observed.dim() != expected.dim() {
        let (onr, onc) = observed.dim();
        let (enr, enc) = expected.dim();
        return Err(IpaError::MatrixShapeMismatch(onr, onc, enr, enc));
    }
    Ok(observed / expected)
}

/// Reduce a masked (optionally normalized) matrix to one value per bin.
///
/// Each row is summed over its *defined* entries; NaNs and infinities are
/// skipped uniformly. A row whose defined sum is exactly zero (including
/// rows that are entirely masked) maps to the missing marker rather than a
/// numeric zero, so "no signal" is distinguishable downstream from a bin
/// that was simply never observed.
pub fn reduce_rows(matrix: &Array2<f64>) -> Array1<f64> {
    let n = matrix.nrows();
    let mut sums = Array1::zeros(n);
    for (i, row) in matrix.rows().into_iter().enumerate() {
        let total: f64 = row.iter().filter(|value| value.is_finite()).sum();
        sums[i] = if total == 0.0 { f64::NAN } else { total };
    }
    sums
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn ones(n: usize) -> Array2<f64> {
        Array2::from_elem((n, n), 1.0)
    }

    fn count_nan(matrix: &Array2<f64>) -> usize {
        matrix.iter().filter(|v| v.is_nan()).count()
    }

    #[test]
    fn test_mask_noop_when_unbounded() {
        let mut matrix = ones(5);
        mask_diagonal_band(&mut matrix, 0, None);
        assert_eq!(count_nan(&matrix), 0);
    }

    #[test]
    fn test_mask_min_diag_one_hits_main_diagonal_only() {
        let mut matrix = ones(4);
        mask_diagonal_band(&mut matrix, 1, None);
        assert_eq!(count_nan(&matrix), 4);
        for i in 0..4 {
            assert!(matrix[[i, i]].is_nan());
        }
    }

    #[test]
    fn test_mask_min_diag_two() {
        // N=4, min_diag=2: offsets 0 and 1 go missing -- 4 + 2*3 = 10 entries.
        let mut matrix = ones(4);
        mask_diagonal_band(&mut matrix, 2, None);
        assert_eq!(count_nan(&matrix), 10);
        // offset >= 2 preserved
        assert_eq!(matrix[[0, 2]], 1.0);
        assert_eq!(matrix[[3, 0]], 1.0);
    }

    #[test]
    fn test_mask_max_diag() {
        // N=4, max_diag=2: only offset 3 (the two corners) goes missing.
        let mut matrix = ones(4);
        mask_diagonal_band(&mut matrix, 0, Some(2));
        assert_eq!(count_nan(&matrix), 2);
        assert!(matrix[[0, 3]].is_nan());
        assert!(matrix[[3, 0]].is_nan());
    }

    #[test]
    fn test_mask_band() {
        let mut matrix = ones(6);
        mask_diagonal_band(&mut matrix, 2, Some(3));
        for i in 0usize..6 {
            for j in 0usize..6 {
                let offset = i.abs_diff(j);
                if (2..=3).contains(&offset) {
                    assert_eq!(matrix[[i, j]], 1.0, "offset {} should survive", offset);
                } else {
                    assert!(matrix[[i, j]].is_nan(), "offset {} should be masked", offset);
                }
            }
        }
    }

    #[test]
    fn test_mask_bounds_past_matrix_size() {
        let mut matrix = ones(3);
        mask_diagonal_band(&mut matrix, 10, Some(100));
        // min_diag >= N masks everything, max_diag past the end adds nothing
        assert_eq!(count_nan(&matrix), 9);

        let mut matrix = ones(3);
        mask_diagonal_band(&mut matrix, 0, Some(usize::MAX));
        assert_eq!(count_nan(&matrix), 0);
    }

    #[test]
    fn test_expected_matrix_symmetric() {
        let expected = array![10.0, 5.0, 2.0];
        let matrix = expected_matrix(&expected);
        assert_eq!(matrix.dim(), (3, 3));
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(matrix[[i, j]], expected[i.abs_diff(j)]);
                assert_eq!(matrix[[i, j]], matrix[[j, i]]);
            }
        }
    }

    #[test]
    fn test_expected_matrix_propagates_missing() {
        let expected = array![1.0, f64::NAN, 3.0];
        let matrix = expected_matrix(&expected);
        assert!(matrix[[0, 1]].is_nan());
        assert!(matrix[[1, 0]].is_nan());
        assert!(matrix[[2, 1]].is_nan());
        assert_eq!(matrix[[0, 2]], 3.0);
    }

    #[test]
    fn test_observed_over_expected_pointwise() {
        let observed = array![[4.0, 2.0], [2.0, 8.0]];
        let expected = array![[2.0, 2.0], [2.0, 2.0]];
        let ratio = observed_over_expected(&observed, &expected).unwrap();
        assert_eq!(ratio, array![[2.0, 1.0], [1.0, 4.0]]);
    }

    #[test]
    fn test_observed_over_expected_division_by_zero() {
        // symmetric input gives symmetric markers
        let observed = array![[0.0, 3.0], [3.0, 0.0]];
        let expected = array![[0.0, 0.0], [0.0, 1.0]];
        let ratio = observed_over_expected(&observed, &expected).unwrap();
        assert!(ratio[[0, 0]].is_nan());
        assert_eq!(ratio[[0, 1]], f64::INFINITY);
        assert_eq!(ratio[[1, 0]], f64::INFINITY);
        assert_eq!(ratio[[1, 1]], 0.0);
    }

    #[test]
    fn test_observed_over_expected_shape_mismatch() {
        let observed = ones(3);
        let expected = ones(2);
        let result = observed_over_expected(&observed, &expected);
        assert!(matches!(result, Err(IpaError::MatrixShapeMismatch(3, 3, 2, 2))));
    }

    #[test]
    fn test_reduce_rows_skips_missing() {
        let matrix = array![[1.0, f64::NAN, 2.0], [f64::NAN, f64::NAN, f64::NAN], [1.0, 1.0, 1.0]];
        let sums = reduce_rows(&matrix);
        assert_eq!(sums[0], 3.0);
        assert!(sums[1].is_nan());
        assert_eq!(sums[2], 3.0);
    }

    #[test]
    fn test_reduce_rows_zero_is_missing() {
        let matrix = array![[0.0, 0.0], [0.0, 1.0]];
        let sums = reduce_rows(&matrix);
        assert!(sums[0].is_nan());
        assert_eq!(sums[1], 1.0);
    }

    #[test]
    fn test_reduce_rows_skips_infinities() {
        let matrix = array![[f64::INFINITY, 2.0], [2.0, f64::NEG_INFINITY]];
        let sums = reduce_rows(&matrix);
        assert_eq!(sums[0], 2.0);
        assert_eq!(sums[1], 2.0);
    }
}
