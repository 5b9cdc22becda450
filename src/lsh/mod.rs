//! Banded LSH for near-duplicate signature lookup.
//!
//! Each signature is partitioned into `num_bands` contiguous slices of
//! `bits_per_band` bits. A signature is inserted into one bucket per
//! band, keyed by that band's bits; a probe's candidate set is the union
//! of its bucket memberships across bands ("OR over bands"). Candidates
//! are then verified with exact Hamming distance, so the banding costs
//! recall only, never precision: a near-neighbor is missed only if it
//! disagrees with the probe on *every* band, which becomes likely only as
//! distance grows.
//!
//! # Components
//!
//! - [`LSHIndex`]: per-band bucket maps and candidate generation
//! - [`SignatureStore`]: owned payloads, addressed by dense ID
//! - [`Registry`]: handle-keyed (index, store) pairs with matched
//!   lifetimes
//!
//! # References
//!
//! - Indyk & Motwani (1998): "Approximate nearest neighbors: towards
//!   removing the curse of dimensionality"
//! - Manku et al. (2007): "Detecting near-duplicates for web crawling"

mod index;
mod registry;
mod store;

pub use index::{IndexStats, LSHIndex, LSHParams};
pub use registry::Registry;
pub use store::SignatureStore;
