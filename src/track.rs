//! Whole-genome binned tracks and the binned-query interface used by the
//! signal aggregator.
//!
//! A [`GenomeTrack`] stores one `f64` value per fixed-width genomic bin,
//! chromosome by chromosome. Chromosomes are kept in a
//! [`genomap::GenomeMap`], and a [`BinTable`] maps each chromosome to its
//! disjoint `[start, end)` slice of the whole-genome bin index, built once
//! per genome so per-bin writes never alias across chromosomes.
//!
//! The missing marker is [`f64::NAN`] throughout: a bin that was never
//! assigned, or whose reduced signal was explicitly missing, is NaN.

use std::io::Write;
use std::path::PathBuf;

use genomap::GenomeMap;
use indexmap::IndexMap;
use ndarray::Array1;

use crate::error::IpaError;
use crate::io::OutputFile;
use crate::{Position, PositionOffset};

/// Number of bins needed to cover `length` basepairs at `resolution`.
pub fn bin_count(length: Position, resolution: Position) -> usize {
    length.div_ceil(resolution) as usize
}

/// The binned values of a single chromosome.
#[derive(Clone, Debug)]
pub struct BinnedTrack {
    length: Position,
    resolution: Position,
    values: Vec<f64>,
}

impl BinnedTrack {
    /// Create a new track of missing values covering `length` basepairs.
    pub fn new(length: Position, resolution: Position) -> Self {
        Self {
            length,
            resolution,
            values: vec![f64::NAN; bin_count(length, resolution)],
        }
    }

    pub fn n_bins(&self) -> usize {
        self.values.len()
    }

    pub fn length(&self) -> Position {
        self.length
    }

    pub fn at_bin(&self, i: usize) -> f64 {
        self.values[i]
    }

    pub fn set_bin(&mut self, i: usize, value: f64) {
        self.values[i] = value;
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Replace this chromosome's values with a reduced per-bin vector.
    pub fn assign(&mut self, values: &Array1<f64>) -> Result<(), IpaError> {
        if values.len() != self.values.len() {
            return Err(IpaError::ExpectedLengthMismatch(
                values.len(),
                self.values.len(),
            ));
        }
        for (slot, value) in self.values.iter_mut().zip(values.iter()) {
            *slot = *value;
        }
        Ok(())
    }

    /// Query `nbins` evenly spaced aggregate values over `[start, end)`.
    ///
    /// Each output bin is the mean of the *defined* source bins it
    /// overlaps. Positions outside the chromosome contribute nothing, so
    /// flanks hanging off either end fill with the missing marker, as does
    /// any output bin overlapping only missing source bins.
    pub fn binned_values(
        &self,
        start: PositionOffset,
        end: PositionOffset,
        nbins: usize,
    ) -> Array1<f64> {
        let mut out = Array1::from_elem(nbins, f64::NAN);
        if end <= start || nbins == 0 {
            return out;
        }
        let width = (end - start) as f64;
        let res = f64::from(self.resolution);
        let n_src = self.values.len();

        for (b, slot) in out.iter_mut().enumerate() {
            let sub_start = start as f64 + width * b as f64 / nbins as f64;
            let sub_end = start as f64 + width * (b + 1) as f64 / nbins as f64;

            let lo = (sub_start / res).floor().max(0.0) as usize;
            let hi = ((sub_end / res).ceil().max(0.0) as usize).min(n_src);

            let mut total = 0.0;
            let mut defined = 0usize;
            for i in lo..hi {
                let bin_start = i as f64 * res;
                if bin_start + res <= sub_start || bin_start >= sub_end {
                    continue;
                }
                let value = self.values[i];
                if value.is_finite() {
                    total += value;
                    defined += 1;
                }
            }
            if defined > 0 {
                *slot = total / defined as f64;
            }
        }
        out
    }
}

/// The whole-genome "chromosome to bin-index slice" table.
///
/// Built once per genome; chromosome order follows the genome file. Each
/// chromosome owns the disjoint global index range `[start, end)`.
#[derive(Clone, Debug)]
pub struct BinTable {
    resolution: Position,
    ranges: IndexMap<String, (usize, usize)>,
    total_bins: usize,
}

impl BinTable {
    pub fn new(seqlens: &IndexMap<String, Position>, resolution: Position) -> Self {
        let mut ranges = IndexMap::new();
        let mut offset = 0usize;
        for (seqname, length) in seqlens.iter() {
            let n = bin_count(*length, resolution);
            ranges.insert(seqname.clone(), (offset, offset + n));
            offset += n;
        }
        Self {
            resolution,
            ranges,
            total_bins: offset,
        }
    }

    pub fn resolution(&self) -> Position {
        self.resolution
    }

    /// The global `[start, end)` bin-index range of a chromosome.
    pub fn bin_range(&self, seqname: &str) -> Option<(usize, usize)> {
        self.ranges.get(seqname).copied()
    }

    pub fn total_bins(&self) -> usize {
        self.total_bins
    }
}

/// A whole-genome binned signal track with explicit missing markers.
#[derive(Clone, Debug)]
pub struct GenomeTrack {
    resolution: Position,
    seqlens: IndexMap<String, Position>,
    bins: BinTable,
    tracks: GenomeMap<BinnedTrack>,
}

impl GenomeTrack {
    /// Create a track of all-missing bins over the given genome.
    pub fn new(
        seqlens: &IndexMap<String, Position>,
        resolution: Position,
    ) -> Result<Self, IpaError> {
        let mut tracks = GenomeMap::new();
        for (seqname, length) in seqlens.iter() {
            tracks.insert(seqname, BinnedTrack::new(*length, resolution))?;
        }
        Ok(Self {
            resolution,
            seqlens: seqlens.clone(),
            bins: BinTable::new(seqlens, resolution),
            tracks,
        })
    }

    pub fn resolution(&self) -> Position {
        self.resolution
    }

    pub fn seqnames(&self) -> Vec<String> {
        self.seqlens.keys().cloned().collect()
    }

    pub fn seqlens(&self) -> &IndexMap<String, Position> {
        &self.seqlens
    }

    pub fn bins(&self) -> &BinTable {
        &self.bins
    }

    pub fn chromosome(&self, seqname: &str) -> Option<&BinnedTrack> {
        self.tracks.get(seqname)
    }

    pub fn chromosome_mut(&mut self, seqname: &str) -> Option<&mut BinnedTrack> {
        self.tracks.get_mut(seqname)
    }

    /// Write one chromosome's reduced per-bin values into its slice.
    pub fn set_chromosome(
        &mut self,
        seqname: &str,
        values: &Array1<f64>,
    ) -> Result<(), IpaError> {
        let track = self
            .tracks
            .get_mut(seqname)
            .ok_or_else(|| IpaError::MissingSequence(seqname.to_string()))?;
        track.assign(values)
    }

    /// Write this track as bedGraph, in genome bin order.
    ///
    /// Missing bins are omitted, following bedGraph convention; reading the
    /// file back yields missing markers wherever no record covers a bin.
    pub fn to_bedgraph(&self, output: Option<impl Into<PathBuf>>) -> Result<(), IpaError> {
        let output = output.map_or(OutputFile::new_stdout(), OutputFile::new);
        let mut writer = output.writer()?;

        for (seqname, length) in self.seqlens.iter() {
            // seqlens and tracks are built together, so this always resolves
            let track = self
                .tracks
                .get(seqname)
                .ok_or_else(|| IpaError::MissingSequence(seqname.to_string()))?;
            for (i, value) in track.values().iter().enumerate() {
                if !value.is_finite() {
                    continue;
                }
                let start = i as Position * self.resolution;
                let end = std::cmp::min(start + self.resolution, *length);
                writeln!(writer, "{}\t{}\t{}\t{}", seqname, start, end, value)?;
            }
        }
        Ok(())
    }
}

/// The binned-query capability the signal aggregator runs against.
///
/// Implementors return `nbins` evenly spaced aggregate values between two
/// positions of a chromosome, resampling however their storage requires.
pub trait BinnedSignal {
    fn binned_values(
        &self,
        seqname: &str,
        start: PositionOffset,
        end: PositionOffset,
        nbins: usize,
    ) -> Result<Array1<f64>, IpaError>;
}

impl BinnedSignal for GenomeTrack {
    fn binned_values(
        &self,
        seqname: &str,
        start: PositionOffset,
        end: PositionOffset,
        nbins: usize,
    ) -> Result<Array1<f64>, IpaError> {
        let track = self
            .tracks
            .get(seqname)
            .ok_or_else(|| IpaError::MissingSequence(seqname.to_string()))?;
        Ok(track.binned_values(start, end, nbins))
    }
}
