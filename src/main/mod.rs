use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ipa::{
    commands::{ipa_run, ipa_stackup, ipa_track, StackupOptions},
    ipa::IpaParams,
    prelude::IpaError,
    Position,
};

const INFO: &str = "\
ipa: Interaction Pattern Aggregation for chromatin contact matrices
usage: ipa [--help] <subcommand>

Subcommands:

  track: reduce a contact matrix to a whole-genome IPA track (bedGraph).
  stackup: aggregate a track over regions of interest into a stackup matrix.
  run: the track step followed by the stackup step.

";

#[derive(Parser)]
#[clap(name = "ipa")]
#[clap(about = INFO)]
struct Cli {
    #[arg(short, long, action = clap::ArgAction::Count)]
    debug: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the IPA track from a COO contact file and write it as bedGraph.
    Track {
        /// a COO contact file (seqname, bin_i, bin_j, count[, balanced])
        #[arg(long, required = true)]
        contacts: PathBuf,

        /// a TSV genome file of chromosome names and their lengths
        #[arg(long, required = true)]
        genome: PathBuf,

        /// the bin width of the contact matrix, in basepairs
        #[arg(long, required = true)]
        resolution: Position,

        /// an optional output file (standard output will be used if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// normalize by the expected contact strength per diagonal
        #[arg(long)]
        expected: bool,

        /// the balancing-weight column selector; raw counts if not specified
        #[arg(long)]
        weight_column: Option<String>,

        /// minimum distance between loci in basepairs, e.g. the minimum loop size
        #[arg(long, default_value_t = 40_000)]
        min_dist: Position,

        /// maximum distance between loci in basepairs; no restriction if not given
        #[arg(long)]
        max_dist: Option<Position>,

        /// number of worker threads
        #[arg(long, default_value_t = 4)]
        nproc: usize,
    },
    /// Aggregate a bedGraph track over regions of interest.
    Stackup {
        /// a bedGraph track file
        #[arg(long, required = true)]
        track: PathBuf,

        /// a TSV genome file of chromosome names and their lengths
        #[arg(long, required = true)]
        genome: PathBuf,

        /// the track's bin width, in basepairs
        #[arg(long, required = true)]
        resolution: Position,

        /// a BED-like file of regions of interest (strand in column six)
        #[arg(long, required = true)]
        roi: PathBuf,

        /// the output .npy stackup matrix
        #[arg(long, required = true)]
        output: PathBuf,

        /// an optional TSV output of the stackup's column mean profile
        #[arg(long)]
        profile: Option<PathBuf>,

        /// flank size in basepairs
        #[arg(long, default_value_t = 100_000)]
        flank: Position,

        /// number of bins each region and flank is resampled to
        #[arg(long, default_value_t = 50)]
        nbins: usize,

        /// drop regions smaller than this many basepairs
        #[arg(long)]
        min_roi_size: Option<Position>,

        /// drop regions larger than this many basepairs
        #[arg(long)]
        max_roi_size: Option<Position>,
    },
    /// Run the track step, then the stackup step against its output.
    Run {
        /// a COO contact file (seqname, bin_i, bin_j, count[, balanced])
        #[arg(long, required = true)]
        contacts: PathBuf,

        /// a TSV genome file of chromosome names and their lengths
        #[arg(long, required = true)]
        genome: PathBuf,

        /// the bin width of the contact matrix, in basepairs
        #[arg(long, required = true)]
        resolution: Position,

        /// a BED-like file of regions of interest (strand in column six)
        #[arg(long, required = true)]
        roi: PathBuf,

        /// the output directory
        #[arg(long, required = true)]
        output_dir: PathBuf,

        /// normalize by the expected contact strength per diagonal
        #[arg(long)]
        expected: bool,

        /// the balancing-weight column selector; raw counts if not specified
        #[arg(long)]
        weight_column: Option<String>,

        /// minimum distance between loci in basepairs, e.g. the minimum loop size
        #[arg(long, default_value_t = 40_000)]
        min_dist: Position,

        /// maximum distance between loci in basepairs; no restriction if not given
        #[arg(long)]
        max_dist: Option<Position>,

        /// number of worker threads
        #[arg(long, default_value_t = 4)]
        nproc: usize,

        /// flank size in basepairs
        #[arg(long, default_value_t = 100_000)]
        flank: Position,

        /// number of bins each region and flank is resampled to
        #[arg(long, default_value_t = 50)]
        nbins: usize,

        /// drop regions smaller than this many basepairs
        #[arg(long)]
        min_roi_size: Option<Position>,

        /// drop regions larger than this many basepairs
        #[arg(long)]
        max_roi_size: Option<Position>,
    },
}

fn run() -> Result<(), IpaError> {
    let cli = Cli::parse();
    let result = match &cli.command {
        Some(Commands::Track {
            contacts,
            genome,
            resolution,
            output,
            expected,
            weight_column,
            min_dist,
            max_dist,
            nproc,
        }) => {
            let params = IpaParams {
                min_dist: Some(*min_dist),
                max_dist: *max_dist,
                nproc: *nproc,
            };
            ipa_track(
                contacts,
                genome,
                *resolution,
                output.as_ref(),
                *expected,
                weight_column.as_deref(),
                &params,
            )
        }
        Some(Commands::Stackup {
            track,
            genome,
            resolution,
            roi,
            output,
            profile,
            flank,
            nbins,
            min_roi_size,
            max_roi_size,
        }) => {
            let options = StackupOptions {
                flank: *flank,
                nbins: *nbins,
                min_roi_size: *min_roi_size,
                max_roi_size: *max_roi_size,
            };
            ipa_stackup(
                track,
                genome,
                *resolution,
                roi,
                output,
                profile.as_ref(),
                &options,
            )
        }
        Some(Commands::Run {
            contacts,
            genome,
            resolution,
            roi,
            output_dir,
            expected,
            weight_column,
            min_dist,
            max_dist,
            nproc,
            flank,
            nbins,
            min_roi_size,
            max_roi_size,
        }) => {
            let params = IpaParams {
                min_dist: Some(*min_dist),
                max_dist: *max_dist,
                nproc: *nproc,
            };
            let options = StackupOptions {
                flank: *flank,
                nbins: *nbins,
                min_roi_size: *min_roi_size,
                max_roi_size: *max_roi_size,
            };
            ipa_run(
                contacts,
                genome,
                *resolution,
                roi,
                output_dir,
                *expected,
                weight_column.as_deref(),
                &params,
                &options,
            )
        }
        None => {
            println!("{}\n", INFO);
            std::process::exit(1);
        }
    };
    let output = result?;
    for entry in output.report.entries() {
        eprintln!("{}", entry);
    }
    Ok(())
}

fn main() {
    env_logger::init();
    match run() {
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
