//! The stackup signal aggregator: per-region binned profiles with flanks
//! and strand-aware orientation correction.

use ndarray::{s, Array1, Array2};

use crate::error::IpaError;
use crate::regions::RoiSet;
use crate::track::BinnedSignal;
use crate::{Position, PositionOffset};

fn reversed(values: &Array1<f64>) -> Array1<f64> {
    values.slice(s![..;-1]).to_owned()
}

/// Build the `N x 3B` stackup matrix for a track and a region list.
///
/// For each region, three `B`-bin profiles are queried from the track: the
/// left flank `[start - flank, start)`, the region body `[start, end)`
/// resampled to `B` bins, and the right flank `[end, end + flank)`.
/// Reverse-strand rows are orientation-corrected before concatenation: the
/// body is reversed, and the flanks are swapped and each reversed, since
/// reversing orientation turns upstream into downstream. Rows with unknown
/// strand behave as forward.
///
/// Blocks concatenate along the bin axis as `[left | body | right]`, so
/// every row has width `3 * nbins` regardless of the region's genomic
/// length, and row `i` always corresponds to region `i`. An empty region
/// set yields a well-defined `(0, 3 * nbins)` matrix.
pub fn stackup<S: BinnedSignal>(
    track: &S,
    rois: &RoiSet,
    flank: Position,
    nbins: usize,
) -> Result<Array2<f64>, IpaError> {
    let mut matrix = Array2::from_elem((rois.len(), 3 * nbins), f64::NAN);
    let flank = PositionOffset::from(flank);

    for (i, roi) in rois.iter().enumerate() {
        let start = PositionOffset::from(roi.start);
        let end = PositionOffset::from(roi.end);

        let left = track.binned_values(&roi.seqname, start - flank, start, nbins)?;
        let body = track.binned_values(&roi.seqname, start, end, nbins)?;
        let right = track.binned_values(&roi.seqname, end, end + flank, nbins)?;

        let (left, body, right) = if roi.strand.is_reverse() {
            (reversed(&right), reversed(&body), reversed(&left))
        } else {
            (left, body, right)
        };

        matrix.slice_mut(s![i, 0..nbins]).assign(&left);
        matrix.slice_mut(s![i, nbins..2 * nbins]).assign(&body);
        matrix.slice_mut(s![i, 2 * nbins..3 * nbins]).assign(&right);
    }
    Ok(matrix)
}

/// Column-wise mean over the defined entries of a stackup matrix.
///
/// Columns with no defined entries (including every column, when the
/// matrix has zero rows) yield the missing marker.
pub fn mean_profile(matrix: &Array2<f64>) -> Array1<f64> {
    let ncols = matrix.ncols();
    let mut profile = Array1::from_elem(ncols, f64::NAN);
    for (j, column) in matrix.columns().into_iter().enumerate() {
        let mut total = 0.0;
        let mut defined = 0usize;
        for value in column.iter() {
            if value.is_finite() {
                total += value;
                defined += 1;
            }
        }
        if defined > 0 {
            profile[j] = total / defined as f64;
        }
    }
    profile
}
