//! The Interaction Pattern Aggregation (IPA) pipeline: per-chromosome
//! masking, optional observed/expected normalization, and reduction of
//! contact matrices into a whole-genome track.
//!
//! Contact matrices arrive through the [`ContactSource`] seam and expected
//! vectors through the [`ExpectedEstimator`] seam, so the numeric pipeline
//! is independent of whatever container format backs them. Chromosomes are
//! processed as independent tasks on a worker pool; each writes only its
//! own disjoint slice of the output track, and each matrix is dropped as
//! soon as its track contribution is extracted.

use indexmap::IndexMap;
use log::info;
use ndarray::{Array1, Array2};
use rayon::prelude::*;

use crate::error::IpaError;
use crate::matrix::{expected_matrix, mask_diagonal_band, observed_over_expected, reduce_rows};
use crate::regions::warn_chrom_names;
use crate::track::{bin_count, GenomeTrack};
use crate::Position;

/// A per-chromosome supplier of dense, symmetric contact matrices.
///
/// The matrix for a chromosome is square over its ordered genomic bins,
/// with entry `(i, j)` the observed interaction strength between bins `i`
/// and `j`; missing observations are NaN.
pub trait ContactSource {
    /// The fixed bin width, in basepairs.
    fn resolution(&self) -> Position;

    /// The ordered chromosome names and lengths.
    fn seqlens(&self) -> &IndexMap<String, Position>;

    /// Fetch one chromosome's dense contact matrix.
    fn fetch(&self, seqname: &str) -> Result<Array2<f64>, IpaError>;
}

/// An estimator of the average contact strength per diagonal offset.
///
/// Implementations return one value per offset (length = matrix size);
/// offset 0 is the main-diagonal average. The first `ignore_diags` offsets
/// are excluded from estimation and reported as missing.
pub trait ExpectedEstimator {
    fn expected_cis(
        &self,
        seqname: &str,
        observed: &Array2<f64>,
        ignore_diags: usize,
    ) -> Result<Array1<f64>, IpaError>;
}

/// The default expected estimator: the mean of the defined entries along
/// each diagonal offset of the observed matrix.
///
/// Offsets are estimated independently and in parallel on the calling
/// worker pool.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiagonalMeans;

impl DiagonalMeans {
    pub fn new() -> Self {
        Self
    }
}

impl ExpectedEstimator for DiagonalMeans {
    fn expected_cis(
        &self,
        _seqname: &str,
        observed: &Array2<f64>,
        ignore_diags: usize,
    ) -> Result<Array1<f64>, IpaError> {
        let n = observed.nrows();
        let means: Vec<f64> = (0..n)
            .into_par_iter()
            .map(|k| {
                if k < ignore_diags {
                    return f64::NAN;
                }
                let mut total = 0.0;
                let mut defined = 0usize;
                for i in 0..(n - k) {
                    let value = observed[[i, i + k]];
                    if value.is_finite() {
                        total += value;
                        defined += 1;
                    }
                }
                if defined > 0 {
                    total / defined as f64
                } else {
                    f64::NAN
                }
            })
            .collect();
        Ok(Array1::from_vec(means))
    }
}

/// Parameters of the IPA track computation.
#[derive(Clone, Debug)]
pub struct IpaParams {
    /// Minimum distance in basepairs between two loci to consider, e.g.
    /// the minimum loop size; `None` applies no restriction.
    pub min_dist: Option<Position>,
    /// Maximum distance in basepairs between two loci to consider; `None`
    /// applies no restriction.
    pub max_dist: Option<Position>,
    /// Worker count for per-chromosome tasks and expected estimation.
    pub nproc: usize,
}

impl Default for IpaParams {
    fn default() -> Self {
        Self {
            min_dist: Some(40_000),
            max_dist: Some(100_000),
            nproc: 4,
        }
    }
}

impl IpaParams {
    /// Convert the basepair distance thresholds to diagonal-offset bounds.
    ///
    /// The lower bound rounds down and the upper bound rounds up, so the
    /// masked band never clips an interaction inside the requested
    /// distance window. Absent `min_dist` maps to offset 0 (which masks
    /// nothing); absent `max_dist` maps to no upper masking.
    pub fn diagonal_bounds(&self, resolution: Position) -> (usize, Option<usize>) {
        let min_diag = self
            .min_dist
            .map_or(0, |dist| (dist / resolution) as usize);
        let max_diag = self.max_dist.map(|dist| dist.div_ceil(resolution) as usize);
        (min_diag, max_diag)
    }
}

/// Reduce one chromosome's contact matrix to its per-bin IPA values.
///
/// Masks the diagonal band in place, optionally normalizes by the expected
/// vector, and sums each row's defined entries. Consumes the matrix, so
/// peak memory stays bounded by one chromosome.
pub fn ipa_chromosome(
    mut matrix: Array2<f64>,
    min_diag: usize,
    max_diag: Option<usize>,
    expected: Option<&Array1<f64>>,
) -> Result<Array1<f64>, IpaError> {
    mask_diagonal_band(&mut matrix, min_diag, max_diag);

    let matrix = match expected {
        Some(vector) => {
            if vector.len() != matrix.nrows() {
                return Err(IpaError::ExpectedLengthMismatch(
                    vector.len(),
                    matrix.nrows(),
                ));
            }
            observed_over_expected(&matrix, &expected_matrix(vector))?
        }
        None => matrix,
    };

    Ok(reduce_rows(&matrix))
}

/// Compute the whole-genome IPA track.
///
/// Each chromosome is an independent task: fetch, expected estimation when
/// an estimator is given, band masking, normalization, and row reduction
/// run on a pool of `params.nproc` workers, and every chromosome writes
/// only its own slice of the genome track.
pub fn ipa_genome_track<S, E>(
    source: &S,
    estimator: Option<&E>,
    params: &IpaParams,
) -> Result<GenomeTrack, IpaError>
where
    S: ContactSource + Sync,
    E: ExpectedEstimator + Sync,
{
    let resolution = source.resolution();
    let seqlens = source.seqlens().clone();
    warn_chrom_names(seqlens.keys().map(|name| name.as_str()), "contact source");
    let (min_diag, max_diag) = params.diagonal_bounds(resolution);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(params.nproc)
        .build()?;

    let seqnames: Vec<String> = seqlens.keys().cloned().collect();
    let reduced: Vec<(String, Array1<f64>)> = pool.install(|| {
        seqnames
            .par_iter()
            .map(|seqname| {
                let matrix = source.fetch(seqname)?;
                let expected = match estimator {
                    Some(est) => Some(est.expected_cis(seqname, &matrix, min_diag)?),
                    None => None,
                };
                let values = ipa_chromosome(matrix, min_diag, max_diag, expected.as_ref())?;
                Ok((seqname.clone(), values))
            })
            .collect::<Result<Vec<_>, IpaError>>()
    })?;

    let mut track = GenomeTrack::new(&seqlens, resolution)?;
    for (seqname, values) in reduced {
        track.set_chromosome(&seqname, &values)?;
    }
    info!(
        "reduced {} chromosomes ({} bins) at resolution {}",
        seqlens.len(),
        track.bins().total_bins(),
        resolution
    );
    Ok(track)
}

/// An in-memory [`ContactSource`], useful as a collaborator stand-in.
#[derive(Clone, Debug)]
pub struct MemoryContacts {
    resolution: Position,
    seqlens: IndexMap<String, Position>,
    matrices: IndexMap<String, Array2<f64>>,
}

impl MemoryContacts {
    pub fn new(seqlens: IndexMap<String, Position>, resolution: Position) -> Self {
        Self {
            resolution,
            seqlens,
            matrices: IndexMap::new(),
        }
    }

    /// Insert one chromosome's matrix, validating its shape against the
    /// chromosome's bin count.
    pub fn insert(&mut self, seqname: &str, matrix: Array2<f64>) -> Result<(), IpaError> {
        let length = *self
            .seqlens
            .get(seqname)
            .ok_or_else(|| IpaError::MissingSequence(seqname.to_string()))?;
        let n = bin_count(length, self.resolution);
        if matrix.nrows() != matrix.ncols() {
            return Err(IpaError::NonSquareMatrix(
                seqname.to_string(),
                matrix.nrows(),
                matrix.ncols(),
            ));
        }
        if matrix.nrows() != n {
            return Err(IpaError::ExpectedLengthMismatch(matrix.nrows(), n));
        }
        self.matrices.insert(seqname.to_string(), matrix);
        Ok(())
    }
}

impl ContactSource for MemoryContacts {
    fn resolution(&self) -> Position {
        self.resolution
    }

    fn seqlens(&self) -> &IndexMap<String, Position> {
        &self.seqlens
    }

    fn fetch(&self, seqname: &str) -> Result<Array2<f64>, IpaError> {
        self.matrices
            .get(seqname)
            .cloned()
            .ok_or_else(|| IpaError::MissingSequence(seqname.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seqlens;
    use ndarray::array;

    #[test]
    fn test_diagonal_bounds_rounding() {
        let params = IpaParams {
            min_dist: Some(25_000),
            max_dist: Some(95_000),
            nproc: 1,
        };
        // lower rounds down, upper rounds up
        assert_eq!(params.diagonal_bounds(10_000), (2, Some(10)));
        assert_eq!(params.diagonal_bounds(25_000), (1, Some(4)));
    }

    #[test]
    fn test_diagonal_bounds_absent() {
        let params = IpaParams {
            min_dist: None,
            max_dist: None,
            nproc: 1,
        };
        assert_eq!(params.diagonal_bounds(10_000), (0, None));
    }

    #[test]
    fn test_ipa_chromosome_masked_diagonal_gives_missing_track() {
        // 3-bin chromosome where only the main diagonal is nonzero;
        // min_diag = 1 masks it entirely, so every bin is missing.
        let matrix = array![[5.0, 0.0, 0.0], [0.0, 7.0, 0.0], [0.0, 0.0, 9.0]];
        let values = ipa_chromosome(matrix, 1, None, None).unwrap();
        assert!(values.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_ipa_chromosome_row_sums() {
        let matrix = array![[1.0, 2.0, 4.0], [2.0, 1.0, 8.0], [4.0, 8.0, 1.0]];
        // min_diag = 1 drops the main diagonal from each sum
        let values = ipa_chromosome(matrix, 1, None, None).unwrap();
        assert_eq!(values, array![6.0, 10.0, 12.0]);
    }

    #[test]
    fn test_ipa_chromosome_expected_length_check() {
        let matrix = array![[1.0, 2.0], [2.0, 1.0]];
        let expected = array![1.0, 1.0, 1.0];
        let result = ipa_chromosome(matrix, 0, None, Some(&expected));
        assert!(matches!(
            result,
            Err(IpaError::ExpectedLengthMismatch(3, 2))
        ));
    }

    #[test]
    fn test_diagonal_means() {
        let matrix = array![[1.0, 2.0, 6.0], [2.0, 3.0, 4.0], [6.0, 4.0, 5.0]];
        let means = DiagonalMeans::new()
            .expected_cis("chr1", &matrix, 0)
            .unwrap();
        assert_eq!(means[0], 3.0);
        assert_eq!(means[1], 3.0);
        assert_eq!(means[2], 6.0);
    }

    #[test]
    fn test_diagonal_means_ignores_low_offsets() {
        let matrix = array![[1.0, 2.0], [2.0, 1.0]];
        let means = DiagonalMeans::new()
            .expected_cis("chr1", &matrix, 1)
            .unwrap();
        assert!(means[0].is_nan());
        assert_eq!(means[1], 2.0);
    }

    fn two_chrom_source() -> MemoryContacts {
        let sl = seqlens!("chr1" => 30, "chr2" => 20);
        let mut source = MemoryContacts::new(sl, 10);
        source
            .insert(
                "chr1",
                array![[1.0, 2.0, 4.0], [2.0, 1.0, 8.0], [4.0, 8.0, 1.0]],
            )
            .unwrap();
        source
            .insert("chr2", array![[3.0, 5.0], [5.0, 3.0]])
            .unwrap();
        source
    }

    #[test]
    fn test_ipa_genome_track() {
        let source = two_chrom_source();
        let params = IpaParams {
            min_dist: Some(10),
            max_dist: None,
            nproc: 2,
        };
        let track =
            ipa_genome_track(&source, None::<&DiagonalMeans>, &params).unwrap();

        let chr1 = track.chromosome("chr1").unwrap();
        assert_eq!(chr1.values(), &[6.0, 10.0, 12.0]);
        let chr2 = track.chromosome("chr2").unwrap();
        assert_eq!(chr2.values(), &[5.0, 5.0]);
    }

    #[test]
    fn test_ipa_genome_track_normalized_is_flat_for_uniform_diagonals() {
        // each diagonal is constant, so observed/expected is 1 in the band
        let sl = seqlens!("chr1" => 30);
        let mut source = MemoryContacts::new(sl, 10);
        source
            .insert(
                "chr1",
                array![[9.0, 4.0, 2.0], [4.0, 9.0, 4.0], [2.0, 4.0, 9.0]],
            )
            .unwrap();
        let params = IpaParams {
            min_dist: Some(10),
            max_dist: None,
            nproc: 1,
        };
        let track =
            ipa_genome_track(&source, Some(&DiagonalMeans::new()), &params).unwrap();
        // row sums of ratio-1 entries: 2, 2, 2 off-diagonal counts per row
        let chr1 = track.chromosome("chr1").unwrap();
        assert_eq!(chr1.values(), &[2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_memory_contacts_shape_validation() {
        let sl = seqlens!("chr1" => 30);
        let mut source = MemoryContacts::new(sl, 10);
        let nonsquare = Array2::<f64>::zeros((3, 2));
        assert!(source.insert("chr1", nonsquare).is_err());
        let wrong_size = Array2::<f64>::zeros((2, 2));
        assert!(source.insert("chr1", wrong_size).is_err());
    }
}
