//! Test cases and test utility functions.

use indexmap::IndexMap;
use ndarray::{Array1, Array2};
use rand::{thread_rng, Rng};

use crate::regions::{Roi, RoiSet, Strand};
use crate::Position;

// Stochastic test defaults: big enough to catch stochastic errors,
// small enough to keep test time down.
pub const NRANDOM_ROIS: usize = 100;

// region length
pub const MIN_LEN: Position = 1;
pub const MAX_LEN: Position = 10_000;

// chromosome size
pub const MIN_CHROM_LEN: Position = 100_000;
pub const MAX_CHROM_LEN: Position = 1_000_000;

/// Build a random symmetric `n x n` contact matrix with positive entries.
pub fn random_contact_matrix(n: usize) -> Array2<f64> {
    let mut rng = thread_rng();
    let mut matrix = Array2::zeros((n, n));
    for i in 0..n {
        for j in i..n {
            let value = rng.gen_range(0.0..100.0);
            matrix[[i, j]] = value;
            matrix[[j, i]] = value;
        }
    }
    matrix
}

/// Build a random per-bin track signal.
pub fn random_signal(n: usize) -> Array1<f64> {
    let mut rng = thread_rng();
    Array1::from_iter((0..n).map(|_| rng.gen_range(-10.0..10.0)))
}

/// Build a random sequence length.
pub fn random_seqlen() -> Position {
    let mut rng = thread_rng();
    rng.gen_range(MIN_CHROM_LEN..=MAX_CHROM_LEN)
}

/// Build a random range start/end on a sequence of `chrom_len`.
/// 0-indexed, right exclusive.
pub fn random_range(chrom_len: Position) -> (Position, Position) {
    let mut rng = thread_rng();
    let len = rng.gen_range(MIN_LEN..MAX_LEN);
    let start = rng.gen_range(0..chrom_len - len + 1);
    (start, start + len)
}

/// Build a random strand, including unknown.
pub fn random_strand() -> Strand {
    let mut rng = thread_rng();
    match rng.gen_range(0..3) {
        0 => Strand::Forward,
        1 => Strand::Reverse,
        _ => Strand::Unknown,
    }
}

/// Build a random [`RoiSet`] of `n` regions on the given genome.
pub fn random_roi_set(seqlens: &IndexMap<String, Position>, n: usize) -> RoiSet {
    let mut rng = thread_rng();
    let seqnames: Vec<&String> = seqlens.keys().collect();
    let mut rois = RoiSet::new();
    for _ in 0..n {
        let seqname = seqnames[rng.gen_range(0..seqnames.len())];
        let (start, end) = random_range(seqlens[seqname]);
        // unwrap is safe: random_range always returns end > start
        rois.push(Roi::new(seqname, start, end, random_strand()).unwrap());
    }
    rois
}
