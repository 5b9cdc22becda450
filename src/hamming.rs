//! Bit-parallel Hamming distance kernel.
//!
//! Distances are exact bit counts over equal-length byte strings:
//! the kernel XORs 64-bit words over the aligned prefix and popcounts
//! each result, then finishes the 1–7 byte tail at byte granularity.
//!
//! Three operators are built on the kernel:
//!
//! - [`hamming`]: one pair
//! - [`batch_distance`]: one probe against many signatures
//! - [`find_similar_pairs`]: all pairs within a threshold
//!
//! The batch and all-pairs operators fan out over the worker pool
//! configured via [`crate::threads`]; every comparison is independent, so
//! ordering across workers is unspecified. With a single worker,
//! `find_similar_pairs` emits pairs in lexicographic `(i, j)` order.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{NeardupError, Result};
use crate::popcount::popcount64;
use crate::threads;

/// Outer-loop rows handed to a worker at a time. Small, because the inner
/// loop shrinks with the row index and coarse chunks would imbalance.
const PAIR_CHUNK: usize = 16;

#[inline(always)]
fn load_u64(chunk: &[u8]) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(chunk);
    u64::from_le_bytes(word)
}

/// Hamming distance between two equal-length byte strings.
///
/// Internal form: callers guarantee `a.len() == b.len()`. Public entry
/// points validate and return [`NeardupError::LengthMismatch`] instead.
#[inline]
pub(crate) fn distance(a: &[u8], b: &[u8]) -> u32 {
    debug_assert_eq!(a.len(), b.len());

    let mut dist = 0u32;

    let mut a_words = a.chunks_exact(8);
    let mut b_words = b.chunks_exact(8);
    for (wa, wb) in (&mut a_words).zip(&mut b_words) {
        dist += popcount64(load_u64(wa) ^ load_u64(wb));
    }

    for (&xa, &xb) in a_words.remainder().iter().zip(b_words.remainder()) {
        dist += (xa ^ xb).count_ones();
    }

    dist
}

/// Hamming distance between two byte strings of equal length.
///
/// # Errors
///
/// [`NeardupError::LengthMismatch`] if the operands differ in length.
pub fn hamming(a: &[u8], b: &[u8]) -> Result<u32> {
    if a.len() != b.len() {
        return Err(NeardupError::LengthMismatch {
            expected: a.len(),
            got: b.len(),
        });
    }
    Ok(distance(a, b))
}

/// Distance from `target` to each signature, in input order.
///
/// Comparisons are pairwise independent and run across the worker pool;
/// each output slot is written by exactly one worker.
///
/// # Errors
///
/// [`NeardupError::LengthMismatch`] if any signature's length differs
/// from the target's.
pub fn batch_distance<S>(target: &[u8], signatures: &[S]) -> Result<Vec<u32>>
where
    S: AsRef<[u8]> + Sync,
{
    for sig in signatures {
        if sig.as_ref().len() != target.len() {
            return Err(NeardupError::LengthMismatch {
                expected: target.len(),
                got: sig.as_ref().len(),
            });
        }
    }

    match threads::current_pool() {
        Some(pool) if pool.current_num_threads() > 1 => Ok(pool.install(|| {
            signatures
                .par_iter()
                .map(|sig| distance(target, sig.as_ref()))
                .collect()
        })),
        _ => Ok(signatures
            .iter()
            .map(|sig| distance(target, sig.as_ref()))
            .collect()),
    }
}

/// One qualifying pair from [`find_similar_pairs`]: `i < j` and
/// `dist <= threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarPair {
    pub i: u32,
    pub j: u32,
    pub dist: u32,
}

/// Every pair of signatures within `threshold`, up to `max_pairs`.
///
/// `max_pairs` defaults to `n·(n−1)/2`, i.e. unbounded. If more than
/// `max_pairs` pairs qualify, exactly `max_pairs` are returned and the
/// rest are dropped. Each unordered pair appears at most once.
///
/// Ordering: unspecified under parallel execution (workers accumulate
/// into local buffers that are concatenated afterwards); lexicographic
/// `(i, j)` when the pool has a single worker. Set the thread count to 1
/// for deterministic output.
///
/// # Errors
///
/// [`NeardupError::LengthMismatch`] if the signatures do not all share
/// one length.
pub fn find_similar_pairs<S>(
    signatures: &[S],
    threshold: u32,
    max_pairs: Option<usize>,
) -> Result<Vec<SimilarPair>>
where
    S: AsRef<[u8]> + Sync,
{
    let n = signatures.len();
    if n < 2 {
        return Ok(Vec::new());
    }

    let sig_len = signatures[0].as_ref().len();
    for sig in signatures {
        if sig.as_ref().len() != sig_len {
            return Err(NeardupError::LengthMismatch {
                expected: sig_len,
                got: sig.as_ref().len(),
            });
        }
    }

    let cap = max_pairs.unwrap_or(n * (n - 1) / 2);
    if cap == 0 {
        return Ok(Vec::new());
    }

    match threads::current_pool() {
        Some(pool) if pool.current_num_threads() > 1 => {
            // Workers fill disjoint local buffers; a sequential merge
            // concatenates up to `cap` pairs.
            let buffers: Vec<Vec<SimilarPair>> = pool.install(|| {
                (0..n)
                    .into_par_iter()
                    .with_min_len(PAIR_CHUNK)
                    .fold(Vec::new, |mut local, i| {
                        let sig_i = signatures[i].as_ref();
                        for (j, sig_j) in signatures.iter().enumerate().skip(i + 1) {
                            let dist = distance(sig_i, sig_j.as_ref());
                            if dist <= threshold {
                                local.push(SimilarPair {
                                    i: i as u32,
                                    j: j as u32,
                                    dist,
                                });
                            }
                        }
                        local
                    })
                    .collect()
            });

            let mut out = Vec::new();
            for buffer in buffers {
                for pair in buffer {
                    if out.len() == cap {
                        return Ok(out);
                    }
                    out.push(pair);
                }
            }
            Ok(out)
        }
        _ => {
            let mut out = Vec::new();
            for i in 0..n {
                let sig_i = signatures[i].as_ref();
                for (j, sig_j) in signatures.iter().enumerate().skip(i + 1) {
                    let dist = distance(sig_i, sig_j.as_ref());
                    if dist <= threshold {
                        out.push(SimilarPair {
                            i: i as u32,
                            j: j as u32,
                            dist,
                        });
                        if out.len() == cap {
                            return Ok(out);
                        }
                    }
                }
            }
            Ok(out)
        }
    }
}
