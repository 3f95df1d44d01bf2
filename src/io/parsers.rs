//! Parsers for the plain-text input formats: TSV record streams, BED-like
//! region files, COO contact text files, and bedGraph tracks.

use csv::{DeserializeRecordsIntoIter, ReaderBuilder};
use indexmap::IndexMap;
use ndarray::Array2;
use serde::Deserialize;
use std::io::BufRead;
use std::path::PathBuf;

use crate::error::IpaError;
use crate::io::file::InputFile;
use crate::ipa::ContactSource;
use crate::regions::{Roi, Strand};
use crate::track::{bin_count, GenomeTrack};
use crate::Position;

/// A TSV parser wrapping the [`csv`] crate's deserialization through
/// [`serde`], with transparent gzip support and `#` comment skipping.
pub struct TsvRecordIterator<T> {
    inner: DeserializeRecordsIntoIter<Box<dyn std::io::Read>, T>,
}

impl<T> std::fmt::Debug for TsvRecordIterator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TsvRecordIterator").finish_non_exhaustive()
    }
}

impl<T> TsvRecordIterator<T>
where
    for<'de> T: Deserialize<'de>,
{
    pub fn new(filepath: impl Into<PathBuf>) -> Result<Self, IpaError> {
        let input_file = InputFile::new(filepath);
        let stream: Box<dyn std::io::Read> = Box::new(input_file.reader()?);
        let reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .comment(Some(b'#'))
            .from_reader(stream);
        Ok(Self {
            inner: reader.into_deserialize(),
        })
    }
}

impl<T> Iterator for TsvRecordIterator<T>
where
    for<'de> T: Deserialize<'de>,
{
    type Item = Result<T, IpaError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|res| res.map_err(|e| IpaError::IOError(e.into())))
    }
}

fn parse_strand(symbol: &str, line: &str) -> Result<Strand, IpaError> {
    match symbol {
        "+" => Ok(Strand::Forward),
        "-" => Ok(Strand::Reverse),
        "." => Ok(Strand::Unknown),
        _ => Err(IpaError::InvalidStrand(line.to_string())),
    }
}

/// An iterator over BED-like region-of-interest files.
///
/// The first three columns must be sequence name, start, and end; a file
/// without them is a fatal parse error. Columns four and five (feature
/// name and score) are tolerated and ignored, and a sixth column is
/// parsed as the strand. Files with no strand column yield regions with
/// [`Strand::Unknown`].
pub struct RoiIterator {
    lines: std::io::Lines<std::io::BufReader<Box<dyn std::io::Read>>>,
}

impl RoiIterator {
    pub fn new(filepath: impl Into<PathBuf>) -> Result<Self, IpaError> {
        let input_file = InputFile::new(filepath);
        Ok(Self {
            lines: input_file.reader()?.lines(),
        })
    }

    fn parse_line(line: &str) -> Result<Roi, IpaError> {
        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() < 3 {
            return Err(IpaError::RoiTooFewColumns(line.to_string()));
        }
        let seqname = columns[0];
        let start: Position = columns[1].parse()?;
        let end: Position = columns[2].parse()?;
        let strand = if columns.len() >= 6 {
            parse_strand(columns[5].trim(), line)?
        } else {
            Strand::Unknown
        };
        Roi::new(seqname, start, end, strand)
    }
}

impl Iterator for RoiIterator {
    type Item = Result<Roi, IpaError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(err) => return Some(Err(err.into())),
            };
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            return Some(Self::parse_line(&line));
        }
    }
}

/// One contact record loaded from a COO text file.
#[derive(Clone, Debug)]
struct CooRecord {
    bin_i: usize,
    bin_j: usize,
    value: f64,
}

/// A contact-matrix source backed by a COO ("coordinate list") text file.
///
/// Each line is `seqname  bin_i  bin_j  count` with an optional fifth
/// column of balanced counts; bin indices are chromosome-local. When a
/// balancing column selector is given, the fifth column supplies the
/// values and a line without one is an error. Fetching densifies one
/// chromosome at a time: unlisted pairs are zero, and both mirrors of
/// each listed pair are set.
#[derive(Clone, Debug)]
pub struct CooContactFile {
    resolution: Position,
    seqlens: IndexMap<String, Position>,
    records: IndexMap<String, Vec<CooRecord>>,
}

impl CooContactFile {
    /// Load a COO contact file against a genome.
    ///
    /// `weight_column` is the opaque balancing selector: `None` reads raw
    /// counts, `Some(name)` reads the balanced column.
    pub fn open(
        filepath: impl Into<PathBuf>,
        seqlens: IndexMap<String, Position>,
        resolution: Position,
        weight_column: Option<&str>,
    ) -> Result<Self, IpaError> {
        let input_file = InputFile::new(filepath);
        let mut records: IndexMap<String, Vec<CooRecord>> = seqlens
            .keys()
            .map(|seqname| (seqname.clone(), Vec::new()))
            .collect();

        for result in input_file.reader()?.lines() {
            let line = result?;
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let columns: Vec<&str> = line.split('\t').collect();
            if columns.len() < 4 {
                return Err(IpaError::ContactTooFewColumns(line.to_string()));
            }
            let seqname = columns[0];
            let bin_i: usize = columns[1].parse()?;
            let bin_j: usize = columns[2].parse()?;
            let value: f64 = match weight_column {
                None => columns[3].parse()?,
                Some(name) => columns
                    .get(4)
                    .ok_or_else(|| {
                        IpaError::MissingWeightColumn(name.to_string(), line.clone())
                    })?
                    .parse()?,
            };

            let length = *seqlens
                .get(seqname)
                .ok_or_else(|| IpaError::MissingSequence(seqname.to_string()))?;
            let n = bin_count(length, resolution);
            let largest = bin_i.max(bin_j);
            if largest >= n {
                return Err(IpaError::BinOutOfBounds(largest, seqname.to_string(), n));
            }
            // unwrap is safe: records was seeded from seqlens above
            records
                .get_mut(seqname)
                .unwrap()
                .push(CooRecord { bin_i, bin_j, value });
        }

        Ok(Self {
            resolution,
            seqlens,
            records,
        })
    }
}

impl ContactSource for CooContactFile {
    fn resolution(&self) -> Position {
        self.resolution
    }

    fn seqlens(&self) -> &IndexMap<String, Position> {
        &self.seqlens
    }

    fn fetch(&self, seqname: &str) -> Result<Array2<f64>, IpaError> {
        let length = *self
            .seqlens
            .get(seqname)
            .ok_or_else(|| IpaError::MissingSequence(seqname.to_string()))?;
        let n = bin_count(length, self.resolution);
        let mut matrix = Array2::zeros((n, n));
        if let Some(records) = self.records.get(seqname) {
            for record in records {
                matrix[[record.bin_i, record.bin_j]] = record.value;
                matrix[[record.bin_j, record.bin_i]] = record.value;
            }
        }
        Ok(matrix)
    }
}

/// A bedGraph record: a range and its signal value.
#[derive(Clone, Debug, Deserialize)]
struct BedGraphRecord {
    seqname: String,
    start: Position,
    end: Position,
    value: f64,
}

/// Reads a bedGraph file into a [`GenomeTrack`].
///
/// Bins not covered by any record keep the missing marker, so a track
/// written with missing bins omitted round-trips its missingness.
#[derive(Clone, Debug)]
pub struct BedGraphTrackReader {
    filepath: PathBuf,
}

impl BedGraphTrackReader {
    pub fn new(filepath: impl Into<PathBuf>) -> Self {
        Self {
            filepath: filepath.into(),
        }
    }

    pub fn read(
        &self,
        seqlens: &IndexMap<String, Position>,
        resolution: Position,
    ) -> Result<GenomeTrack, IpaError> {
        let mut track = GenomeTrack::new(seqlens, resolution)?;
        let iter = TsvRecordIterator::<BedGraphRecord>::new(&self.filepath)?;
        for result in iter {
            let record = result?;
            let chrom = track
                .chromosome_mut(&record.seqname)
                .ok_or_else(|| IpaError::MissingSequence(record.seqname.clone()))?;
            let first = (record.start / resolution) as usize;
            let last = bin_count(record.end, resolution).min(chrom.n_bins());
            for i in first..last {
                chrom.set_bin(i, record.value);
            }
        }
        Ok(track)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regions::RoiSet;
    use crate::seqlens;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_roi_iterator_bed3() {
        let dir = tempdir().unwrap();
        let path = write_file(&dir, "rois.bed", "chr1\t0\t100\nchr2\t50\t250\n");
        let rois = RoiSet::from_iter(RoiIterator::new(&path).unwrap()).unwrap();
        assert_eq!(rois.len(), 2);
        assert_eq!(rois.get(0).unwrap().strand, Strand::Unknown);
        assert_eq!(rois.get(1).unwrap().width(), 200);
    }

    #[test]
    fn test_roi_iterator_bed6_strand() {
        let dir = tempdir().unwrap();
        let path = write_file(
            &dir,
            "rois.bed",
            "chr1\t0\t100\tgene1\t0\t+\nchr1\t200\t300\tgene2\t0\t-\nchr1\t400\t500\tgene3\t0\t.\n",
        );
        let rois = RoiSet::from_iter(RoiIterator::new(&path).unwrap()).unwrap();
        assert_eq!(rois.get(0).unwrap().strand, Strand::Forward);
        assert_eq!(rois.get(1).unwrap().strand, Strand::Reverse);
        assert_eq!(rois.get(2).unwrap().strand, Strand::Unknown);
    }

    #[test]
    fn test_roi_iterator_too_few_columns_is_fatal() {
        let dir = tempdir().unwrap();
        let path = write_file(&dir, "rois.bed", "chr1\t100\n");
        let result = RoiSet::from_iter(RoiIterator::new(&path).unwrap());
        assert!(matches!(result, Err(IpaError::RoiTooFewColumns(_))));
    }

    #[test]
    fn test_roi_iterator_invalid_strand() {
        let dir = tempdir().unwrap();
        let path = write_file(&dir, "rois.bed", "chr1\t0\t100\tgene\t0\tx\n");
        let result = RoiSet::from_iter(RoiIterator::new(&path).unwrap());
        assert!(matches!(result, Err(IpaError::InvalidStrand(_))));
    }

    #[test]
    fn test_coo_contact_file() {
        let dir = tempdir().unwrap();
        let path = write_file(
            &dir,
            "contacts.coo",
            "chr1\t0\t1\t4.0\nchr1\t1\t2\t2.0\nchr1\t0\t0\t9.0\n",
        );
        let sl = seqlens!("chr1" => 30);
        let source = CooContactFile::open(&path, sl, 10, None).unwrap();
        let matrix = source.fetch("chr1").unwrap();
        assert_eq!(matrix[[0, 1]], 4.0);
        assert_eq!(matrix[[1, 0]], 4.0);
        assert_eq!(matrix[[0, 0]], 9.0);
        assert_eq!(matrix[[0, 2]], 0.0);
    }

    #[test]
    fn test_coo_contact_file_weight_column() {
        let dir = tempdir().unwrap();
        let path = write_file(&dir, "contacts.coo", "chr1\t0\t1\t4.0\t0.5\n");
        let sl = seqlens!("chr1" => 20);
        let source = CooContactFile::open(&path, sl.clone(), 10, Some("weight")).unwrap();
        let matrix = source.fetch("chr1").unwrap();
        assert_eq!(matrix[[0, 1]], 0.5);

        // selecting a weight column on a file without one is an error
        let path = write_file(&dir, "raw.coo", "chr1\t0\t1\t4.0\n");
        let result = CooContactFile::open(&path, sl, 10, Some("weight"));
        assert!(matches!(result, Err(IpaError::MissingWeightColumn(_, _))));
    }

    #[test]
    fn test_coo_contact_file_out_of_bounds_bin() {
        let dir = tempdir().unwrap();
        let path = write_file(&dir, "contacts.coo", "chr1\t0\t5\t4.0\n");
        let sl = seqlens!("chr1" => 30);
        let result = CooContactFile::open(&path, sl, 10, None);
        assert!(matches!(result, Err(IpaError::BinOutOfBounds(5, _, 3))));
    }

    #[test]
    fn test_bedgraph_roundtrip_preserves_missing() {
        let dir = tempdir().unwrap();
        let sl = seqlens!("chr1" => 40);
        let mut track = GenomeTrack::new(&sl, 10).unwrap();
        track
            .set_chromosome("chr1", &ndarray::array![1.0, f64::NAN, 3.0, f64::NAN])
            .unwrap();

        let path = dir.path().join("track.bedgraph");
        track.to_bedgraph(Some(&path)).unwrap();

        let reread = BedGraphTrackReader::new(&path).read(&sl, 10).unwrap();
        let values = reread.chromosome("chr1").unwrap().values();
        assert_eq!(values[0], 1.0);
        assert!(values[1].is_nan());
        assert_eq!(values[2], 3.0);
        assert!(values[3].is_nan());
    }

    #[test]
    fn test_bedgraph_unknown_sequence() {
        let dir = tempdir().unwrap();
        let path = write_file(&dir, "track.bedgraph", "chrX\t0\t10\t1.0\n");
        let sl = seqlens!("chr1" => 40);
        let result = BedGraphTrackReader::new(&path).read(&sl, 10);
        assert!(matches!(result, Err(IpaError::MissingSequence(_))));
    }
}
