//! # ipa
//!
//! Compute Interaction Pattern Aggregation (IPA) tracks from chromatin
//! contact matrices, and aggregate genomic tracks over regions of interest
//! into fixed-width "stackup" matrices.
//!
//! The two numeric cores are:
//!
//! 1. [`matrix`]: diagonal-band masking and observed/expected normalization
//!    of a per-chromosome contact matrix, reduced per-bin into a
//!    whole-genome [`track::GenomeTrack`].
//! 2. [`stackup`]: flank-aware, strand-corrected binned signal aggregation
//!    over a region-of-interest list.
//!
//! File formats (genome files, BED-like ROI files, COO contact text files,
//! bedGraph tracks) are handled in [`io`]; they are deliberately simple
//! stand-ins for the specialized container formats used upstream.

pub mod commands;
pub mod error;
pub mod io;
pub mod ipa;
pub mod matrix;
pub mod regions;
pub mod reporting;
pub mod stackup;
pub mod test_utilities;
pub mod track;

/// The genomic coordinate type.
pub type Position = u32;

/// The type for signed genomic coordinate arithmetic, e.g. a flank
/// extending past the start of a chromosome.
pub type PositionOffset = i64;

/// Create an [`indexmap::IndexMap`] of sequence names and their lengths.
#[macro_export]
macro_rules! seqlens {
    ($($key:expr => $value:expr),* $(,)?) => {
        {
            let mut map: indexmap::IndexMap<String, $crate::Position> =
                indexmap::IndexMap::new();
            $(map.insert($key.to_string(), $value);)*
            map
        }
    };
}

pub mod prelude {
    pub use crate::error::IpaError;
    pub use crate::io::{read_seqlens, BedGraphTrackReader, CooContactFile, RoiIterator};
    pub use crate::ipa::{
        ipa_chromosome, ipa_genome_track, ContactSource, DiagonalMeans, ExpectedEstimator,
        IpaParams, MemoryContacts,
    };
    pub use crate::matrix::{expected_matrix, mask_diagonal_band, observed_over_expected};
    pub use crate::regions::{Roi, RoiSet, Strand};
    pub use crate::stackup::{mean_profile, stackup};
    pub use crate::track::{BinnedSignal, GenomeTrack};
    pub use crate::{seqlens, Position, PositionOffset};
}
