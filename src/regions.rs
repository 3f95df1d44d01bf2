//! Regions of interest: the [`Roi`] record, the ordered [`RoiSet`]
//! container, and size filtering.

use log::warn;

use crate::error::IpaError;
use crate::Position;

/// Nucleotide strand enum type.
///
/// `Unknown` covers both a missing strand column and the `'.'`
/// placeholder; everywhere in this crate it behaves as `Forward`, so
/// strand-less region files get no orientation correction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strand {
    #[default]
    Unknown,
    Forward,
    Reverse,
}

impl Strand {
    /// Whether rows with this strand get orientation-corrected.
    pub fn is_reverse(&self) -> bool {
        matches!(self, Strand::Reverse)
    }
}

impl std::fmt::Display for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
            Strand::Unknown => '.',
        };
        write!(f, "{}", symbol)
    }
}

/// A region of interest: a 0-indexed right-exclusive genomic range with an
/// optional strand.
#[derive(Clone, Debug, PartialEq)]
pub struct Roi {
    pub seqname: String,
    pub start: Position,
    pub end: Position,
    pub strand: Strand,
}

impl Roi {
    /// Create a new region, validating that `end > start`.
    pub fn new(
        seqname: impl Into<String>,
        start: Position,
        end: Position,
        strand: Strand,
    ) -> Result<Self, IpaError> {
        if end <= start {
            return Err(IpaError::InvalidGenomicRange(start, end));
        }
        Ok(Self {
            seqname: seqname.into(),
            start,
            end,
            strand,
        })
    }

    pub fn width(&self) -> Position {
        self.end - self.start
    }
}

/// An ordered collection of regions of interest.
///
/// Row order is load order and is preserved by every operation; row `i` of
/// a stackup matrix always corresponds to region `i` here.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RoiSet {
    rois: Vec<Roi>,
}

impl RoiSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, roi: Roi) {
        self.rois.push(roi)
    }

    pub fn len(&self) -> usize {
        self.rois.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rois.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Roi> {
        self.rois.iter()
    }

    pub fn get(&self, i: usize) -> Option<&Roi> {
        self.rois.get(i)
    }

    /// Whether any region carries a known strand.
    pub fn has_strand(&self) -> bool {
        self.rois.iter().any(|roi| roi.strand != Strand::Unknown)
    }

    /// Collect a [`RoiSet`] from a fallible record iterator.
    pub fn from_iter<I>(iter: I) -> Result<Self, IpaError>
    where
        I: Iterator<Item = Result<Roi, IpaError>>,
    {
        let mut set = Self::new();
        for roi in iter {
            set.push(roi?);
        }
        Ok(set)
    }

    /// Keep only regions whose width lies within the inclusive size bounds.
    ///
    /// An absent bound leaves that side unconstrained, so with both bounds
    /// absent this is the identity. Relative order is preserved and indices
    /// renumber contiguously from zero; filtering twice with the same
    /// bounds changes nothing further.
    pub fn filter_by_size(mut self, min_size: Option<Position>, max_size: Option<Position>) -> Self {
        self.rois.retain(|roi| {
            let width = roi.width();
            min_size.map_or(true, |min| width >= min)
                && max_size.map_or(true, |max| width <= max)
        });
        self
    }
}

impl<'a> IntoIterator for &'a RoiSet {
    type Item = &'a Roi;
    type IntoIter = std::slice::Iter<'a, Roi>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Warn when chromosome names do not carry the conventional `chr` prefix.
///
/// Advisory only: downstream correctness requires that the contact file,
/// track files, and region files all use *matching* names, which this crate
/// does not reconcile. Processing continues with the names as given.
pub fn warn_chrom_names<'a>(names: impl IntoIterator<Item = &'a str>, source: &str) {
    if names.into_iter().any(|name| !name.starts_with("chr")) {
        warn!(
            "some chromosome names in {} lack the 'chr' prefix; chromosome names \
             must match across the contact matrix, track, and region inputs",
            source
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roi(start: Position, end: Position) -> Roi {
        Roi::new("chr1", start, end, Strand::Unknown).unwrap()
    }

    fn test_set() -> RoiSet {
        let mut set = RoiSet::new();
        set.push(roi(0, 100));
        set.push(roi(200, 250));
        set.push(roi(300, 1000));
        set.push(roi(2000, 2010));
        set
    }

    #[test]
    fn test_roi_rejects_empty_range() {
        assert!(Roi::new("chr1", 10, 10, Strand::Unknown).is_err());
        assert!(Roi::new("chr1", 10, 5, Strand::Forward).is_err());
    }

    #[test]
    fn test_filter_no_bounds_is_identity() {
        let set = test_set();
        let filtered = set.clone().filter_by_size(None, None);
        assert_eq!(filtered, set);
    }

    #[test]
    fn test_filter_bounds_inclusive_and_ordered() {
        let filtered = test_set().filter_by_size(Some(50), Some(100));
        assert_eq!(filtered.len(), 2);
        // order preserved, indices renumbered from 0
        assert_eq!(filtered.get(0).unwrap().width(), 100);
        assert_eq!(filtered.get(1).unwrap().width(), 50);
    }

    #[test]
    fn test_filter_single_sided() {
        let filtered = test_set().filter_by_size(Some(100), None);
        assert_eq!(filtered.len(), 2);
        let filtered = test_set().filter_by_size(None, Some(50));
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_filter_idempotent() {
        let once = test_set().filter_by_size(Some(50), Some(700));
        let twice = once.clone().filter_by_size(Some(50), Some(700));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_filter_can_empty() {
        let filtered = test_set().filter_by_size(Some(10_000), None);
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_has_strand() {
        let mut set = test_set();
        assert!(!set.has_strand());
        set.push(Roi::new("chr2", 0, 10, Strand::Reverse).unwrap());
        assert!(set.has_strand());
    }
}
