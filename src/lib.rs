//! neardup: near-duplicate detection over binary signatures.
//!
//! Signatures are opaque fixed-length byte strings (typically 64 bytes /
//! 512 bits, as produced by SimHash-like fingerprinters); similarity is
//! exact Hamming distance. Two query shapes are supported at scale:
//!
//! - **Range queries**: given a probe and a radius, return every indexed
//!   signature within that Hamming distance: [`lsh::Registry::query`].
//! - **All-pairs similarity**: given N signatures, return every pair
//!   within a threshold: [`find_similar_pairs`].
//!
//! Two subsystems do the work:
//!
//! | Subsystem | Module | Role |
//! |-----------|--------|------|
//! | Hamming kernel | [`hamming`] | exact distances: single-pair, batch, all-pairs, parallelised over [`threads`]' worker pool |
//! | Banded LSH | [`lsh`] | probabilistic candidate recall, verified exactly by the kernel |
//!
//! Distances are always exact integers; the LSH layer narrows the
//! candidate set, it never approximates the metric.
//!
//! # Example
//!
//! ```rust
//! use neardup::lsh::{LSHParams, Registry};
//!
//! let mut registry = Registry::new();
//! let handle = registry.create_index(LSHParams::default()).unwrap();
//!
//! let sig = [0u8; 64];
//! let id = registry.add(handle, &sig).unwrap();
//!
//! let hits = registry.query(handle, &sig, 3).unwrap();
//! assert_eq!(hits, vec![(id, 0)]);
//! ```

pub mod error;
pub mod hamming;
pub mod lsh;
pub mod popcount;
pub mod threads;

// Re-exports
pub use error::{NeardupError, Result};
pub use hamming::{batch_distance, find_similar_pairs, hamming, SimilarPair};
pub use lsh::{IndexStats, LSHIndex, LSHParams, Registry, SignatureStore};
pub use threads::{get_thread_count, set_thread_count};
