//! The command functions behind the `ipa` command line tool.

use std::io::Write;
use std::path::{Path, PathBuf};

use log::warn;
use ndarray_npy::write_npy;

use crate::error::IpaError;
use crate::io::{read_seqlens, BedGraphTrackReader, CooContactFile, OutputFile, RoiIterator};
use crate::ipa::{ipa_genome_track, DiagonalMeans, IpaParams};
use crate::regions::{warn_chrom_names, RoiSet};
use crate::reporting::{CommandOutput, Report};
use crate::stackup::{mean_profile, stackup};
use crate::Position;

/// Options of the stackup step shared by [`ipa_stackup`] and [`ipa_run`].
#[derive(Clone, Debug)]
pub struct StackupOptions {
    pub flank: Position,
    pub nbins: usize,
    pub min_roi_size: Option<Position>,
    pub max_roi_size: Option<Position>,
}

impl Default for StackupOptions {
    fn default() -> Self {
        Self {
            flank: 100_000,
            nbins: 50,
            min_roi_size: None,
            max_roi_size: None,
        }
    }
}

/// Compute the whole-genome IPA track from a COO contact file and write it
/// as bedGraph.
pub fn ipa_track(
    contacts: &PathBuf,
    genome: &PathBuf,
    resolution: Position,
    output: Option<&PathBuf>,
    expected: bool,
    weight_column: Option<&str>,
    params: &IpaParams,
) -> Result<CommandOutput<()>, IpaError> {
    let seqlens = read_seqlens(genome)?;
    let source = CooContactFile::open(contacts, seqlens, resolution, weight_column)?;

    let estimator = DiagonalMeans::new();
    let track = if expected {
        ipa_genome_track(&source, Some(&estimator), params)?
    } else {
        ipa_genome_track(&source, None::<&DiagonalMeans>, params)?
    };

    track.to_bedgraph(output)?;
    Ok(CommandOutput::new((), Report::new()))
}

/// Load a region list, apply the size filter, and report what was removed.
fn load_regions(
    roi_path: &PathBuf,
    min_roi_size: Option<Position>,
    max_roi_size: Option<Position>,
    report: &mut Report,
) -> Result<RoiSet, IpaError> {
    let rois = RoiSet::from_iter(RoiIterator::new(roi_path)?)?;
    warn_chrom_names(
        rois.iter().map(|roi| roi.seqname.as_str()),
        &roi_path.display().to_string(),
    );

    let total = rois.len();
    let rois = rois.filter_by_size(min_roi_size, max_roi_size);
    let removed = total - rois.len();
    if removed > 0 {
        report.add_issue(format!(
            "{} of {} regions were removed by the size bounds",
            removed, total
        ));
    }
    if rois.is_empty() {
        report.add_issue("no regions remain after size filtering; outputs are empty".to_string());
    }
    Ok(rois)
}

/// Aggregate a bedGraph track over a region list into a stackup matrix.
///
/// Writes the `N x 3B` matrix as `.npy` and, optionally, the NaN-aware
/// column mean profile as TSV.
#[allow(clippy::too_many_arguments)]
pub fn ipa_stackup(
    track_path: &PathBuf,
    genome: &PathBuf,
    resolution: Position,
    roi_path: &PathBuf,
    output: &PathBuf,
    profile_output: Option<&PathBuf>,
    options: &StackupOptions,
) -> Result<CommandOutput<()>, IpaError> {
    let seqlens = read_seqlens(genome)?;
    let track = BedGraphTrackReader::new(track_path).read(&seqlens, resolution)?;

    let mut report = Report::new();
    let rois = load_regions(roi_path, options.min_roi_size, options.max_roi_size, &mut report)?;

    let matrix = stackup(&track, &rois, options.flank, options.nbins)?;
    write_npy(output, &matrix)?;

    if let Some(profile_path) = profile_output {
        let profile = mean_profile(&matrix);
        let output = OutputFile::new(profile_path);
        let mut writer = output.writer()?;
        for (bin, value) in profile.iter().enumerate() {
            writeln!(writer, "{}\t{}", bin, value)?;
        }
    }

    Ok(CommandOutput::new((), report))
}

/// Run the full analysis: the IPA track step, then the stackup step
/// against the track it produced.
///
/// Outputs (`ipa_track.bedgraph`, `stackup.npy`, `profile.tsv`) are
/// written into `output_dir`, which is created if absent.
#[allow(clippy::too_many_arguments)]
pub fn ipa_run(
    contacts: &PathBuf,
    genome: &PathBuf,
    resolution: Position,
    roi_path: &PathBuf,
    output_dir: &Path,
    expected: bool,
    weight_column: Option<&str>,
    params: &IpaParams,
    options: &StackupOptions,
) -> Result<CommandOutput<()>, IpaError> {
    if output_dir.is_dir() {
        warn!(
            "directory {} already exists; its contents may be overwritten",
            output_dir.display()
        );
    } else {
        std::fs::create_dir_all(output_dir)?;
    }

    let track_path = output_dir.join("ipa_track.bedgraph");
    let track_output = ipa_track(
        contacts,
        genome,
        resolution,
        Some(&track_path),
        expected,
        weight_column,
        params,
    )?;

    let stackup_path = output_dir.join("stackup.npy");
    let profile_path = output_dir.join("profile.tsv");
    let stackup_output = ipa_stackup(
        &track_path,
        genome,
        resolution,
        roi_path,
        &stackup_path,
        Some(&profile_path),
        options,
    )?;

    let mut report = Report::new();
    for entry in track_output
        .report
        .entries()
        .iter()
        .chain(stackup_output.report.entries())
    {
        report.add_issue(entry.clone());
    }
    Ok(CommandOutput::new((), report))
}
