//! The [`IpaError`] `enum` definition and error messages.

use crate::Position;
use genomap::GenomeMapError;
use std::num::{ParseFloatError, ParseIntError};
use thiserror::Error;

/// The [`IpaError`] defines the standard set of errors that should
/// be passed to the user.
#[derive(Debug, Error)]
pub enum IpaError {
    // IO related errors
    #[error("File reading error: {0}")]
    IOError(#[from] std::io::Error),

    // File parsing related errors
    #[error("Integer parsing error: {0}")]
    ParseIntError(#[from] ParseIntError),
    #[error("Float parsing error: {0}")]
    ParseFloatError(#[from] ParseFloatError),
    #[error("Region file has too few columns; the first three columns must be sequence name, start, and end positions.\nLine: {0}")]
    RoiTooFewColumns(String),
    #[error("Contact file has too few columns; expected sequence name, bin indices, and a count.\nLine: {0}")]
    ContactTooFewColumns(String),
    #[error("Contact record is missing the '{0}' balance column.\nLine: {1}")]
    MissingWeightColumn(String, String),
    #[error("Invalid strand: must be either '+', '-', or '.'\nLine: {0}")]
    InvalidStrand(String),
    #[error("Genome file is invalid: {0}")]
    InvalidGenomeFile(String),

    // Invalid genomic range errors
    #[error("Range invalid: end ({1}) must be greater than start ({0})")]
    InvalidGenomicRange(Position, Position),
    #[error("Sequence name '{0}' is not in the genome")]
    MissingSequence(String),
    #[error("Error encountered in genomap::GenomeMap")]
    GenomeMapError(#[from] GenomeMapError),

    // Matrix errors
    #[error("Contact matrix for '{0}' is not square: {1} x {2}")]
    NonSquareMatrix(String, usize, usize),
    #[error("Matrix shapes differ: {0}x{1} vs {2}x{3}")]
    MatrixShapeMismatch(usize, usize, usize, usize),
    #[error("Expected vector length ({0}) does not match matrix size ({1})")]
    ExpectedLengthMismatch(usize, usize),
    #[error("Bin index {0} out of bounds for '{1}' ({2} bins)")]
    BinOutOfBounds(usize, String, usize),

    // Worker pool errors
    #[error("Worker pool error: {0}")]
    ThreadPoolError(#[from] rayon::ThreadPoolBuildError),

    // Output errors
    #[error("NumPy output error: {0}")]
    NpyWriteError(#[from] ndarray_npy::WriteNpyError),

    // Command line tool related errors
    #[error("Command line argument error: {0}")]
    ArgumentError(#[from] clap::error::Error),
}
