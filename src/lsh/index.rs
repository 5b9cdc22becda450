//! Banded LSH index over binary signatures.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{NeardupError, Result};
use crate::hamming::distance;
use crate::lsh::store::SignatureStore;

/// IDs collide in a bucket only when their band bits agree, so most
/// posting lists stay short enough to live inline.
type PostingList = SmallVec<[u32; 4]>;

/// Banding parameters: `num_bands` contiguous slices of `bits_per_band`
/// bits each.
///
/// More bands raise recall (a candidate needs to agree on only one band);
/// wider bands raise precision (agreement on a band is harder). The
/// defaults, 32 bands of 16 bits, cover a 512-bit signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LSHParams {
    /// Number of bands. Must be at least 1.
    pub num_bands: u32,
    /// Bits per band. Must be in `[1, 64]`.
    pub bits_per_band: u32,
}

impl Default for LSHParams {
    fn default() -> Self {
        Self {
            num_bands: 32,
            bits_per_band: 16,
        }
    }
}

/// Bucket occupancy statistics for an [`LSHIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of signatures accepted by `add` (short signatures are not
    /// counted; each accepted add contributes exactly one entry to band 0).
    pub num_signatures: usize,
    /// As constructed.
    pub num_bands: u32,
    /// As constructed.
    pub bits_per_band: u32,
    /// Distinct band-hash keys summed over all bands.
    pub total_buckets: usize,
    /// Mean posting-list length over populated buckets; 0.0 when empty.
    pub avg_bucket_size: f64,
    /// Largest posting-list length across all bands.
    pub max_bucket_size: usize,
}

/// Banded LSH index: one bucket map per band, mapping band-hash to the
/// posting list of signature IDs inserted with that hash.
///
/// A probe's candidate set is the union of its posting lists across all
/// bands: an ID qualifies by agreeing with the probe on at least one
/// full band. Candidates are then verified with exact Hamming distance
/// against a [`SignatureStore`].
///
/// The index stores IDs only; signature payloads live in the store, with
/// lifetimes matched by the owning [`Registry`](crate::lsh::Registry).
#[derive(Debug)]
pub struct LSHIndex {
    params: LSHParams,
    bytes_per_band: usize,
    required_bytes: usize,
    buckets: Vec<HashMap<u64, PostingList>>,
}

impl LSHIndex {
    /// Create an index with the given banding parameters.
    ///
    /// # Errors
    ///
    /// [`NeardupError::InvalidParameter`] if `num_bands` is 0 or
    /// `bits_per_band` is outside `[1, 64]`.
    pub fn new(params: LSHParams) -> Result<Self> {
        if params.num_bands == 0 {
            return Err(NeardupError::InvalidParameter(
                "num_bands must be at least 1".to_string(),
            ));
        }
        if params.bits_per_band == 0 || params.bits_per_band > 64 {
            return Err(NeardupError::InvalidParameter(format!(
                "bits_per_band must be in [1, 64], got {}",
                params.bits_per_band
            )));
        }

        let required_bits = params.num_bands as u64 * params.bits_per_band as u64;
        Ok(Self {
            params,
            bytes_per_band: params.bits_per_band.div_ceil(8) as usize,
            required_bytes: required_bits.div_ceil(8) as usize,
            buckets: (0..params.num_bands).map(|_| HashMap::new()).collect(),
        })
    }

    /// The banding parameters this index was constructed with.
    pub fn params(&self) -> LSHParams {
        self.params
    }

    /// Minimum signature length (in bytes) consulted by the bands.
    ///
    /// Shorter signatures are silently skipped by [`add`](Self::add) and
    /// produce empty candidate sets; longer ones have their excess bytes
    /// ignored by the bands (verification still compares them).
    pub fn required_bytes(&self) -> usize {
        self.required_bytes
    }

    /// Band-hash for band `band`: the little-endian value of the byte
    /// window covering the band's bits, masked to the band width.
    ///
    /// The window is anchored on the byte containing the band's first
    /// bit, with no intra-byte shift, so when `bits_per_band` is not a
    /// multiple of 8, adjacent bands read overlapping windows. Identical
    /// signatures still hash identically in every band.
    fn extract_band_hash(&self, sig: &[u8], band: u32) -> u64 {
        let bit_offset = band as usize * self.params.bits_per_band as usize;
        let byte_offset = bit_offset / 8;
        let window = self.bytes_per_band.min(8);

        let mut hash = 0u64;
        for (i, &byte) in sig[byte_offset..byte_offset + window].iter().enumerate() {
            hash |= u64::from(byte) << (8 * i);
        }

        if self.params.bits_per_band < 64 {
            hash &= (1u64 << self.params.bits_per_band) - 1;
        }
        hash
    }

    /// Insert `id` into every band's bucket for `sig`.
    ///
    /// Silently skips signatures shorter than
    /// [`required_bytes`](Self::required_bytes). Adding the same `id`
    /// twice produces duplicate posting entries; callers mint each ID
    /// once.
    pub fn add(&mut self, id: u32, sig: &[u8]) {
        if sig.len() < self.required_bytes {
            return;
        }
        for band in 0..self.params.num_bands {
            let hash = self.extract_band_hash(sig, band);
            self.buckets[band as usize].entry(hash).or_default().push(id);
        }
    }

    /// IDs agreeing with the probe on at least one full band.
    ///
    /// Empty when the probe is shorter than
    /// [`required_bytes`](Self::required_bytes).
    pub fn find_candidates(&self, sig: &[u8]) -> HashSet<u32> {
        let mut candidates = HashSet::new();
        if sig.len() < self.required_bytes {
            return candidates;
        }
        for band in 0..self.params.num_bands {
            let hash = self.extract_band_hash(sig, band);
            if let Some(ids) = self.buckets[band as usize].get(&hash) {
                candidates.extend(ids.iter().copied());
            }
        }
        candidates
    }

    /// Candidates verified by exact Hamming distance against the store.
    ///
    /// Each candidate is compared over the shorter of the two payload
    /// lengths. Results are `(id, dist)` with `dist <= threshold`, sorted
    /// ascending by distance; tie order follows candidate iteration and
    /// is not part of the contract.
    pub fn query_similar(
        &self,
        sig: &[u8],
        store: &SignatureStore,
        threshold: u32,
    ) -> Vec<(u32, u32)> {
        let mut results: Vec<(u32, u32)> = self
            .find_candidates(sig)
            .into_iter()
            .filter_map(|id| {
                let stored = store.get(id)?;
                let len = sig.len().min(stored.len());
                let dist = distance(&sig[..len], &stored[..len]);
                (dist <= threshold).then_some((id, dist))
            })
            .collect();

        results.sort_by_key(|&(_, dist)| dist);
        results
    }

    /// Empty every bucket map in place, preserving the band topology.
    ///
    /// The signature store is not touched; it is cleared only by
    /// destroying the owning pair.
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
    }

    /// Bucket occupancy statistics.
    pub fn stats(&self) -> IndexStats {
        let mut total_buckets = 0usize;
        let mut total_postings = 0usize;
        let mut max_bucket_size = 0usize;

        for bucket in &self.buckets {
            total_buckets += bucket.len();
            for ids in bucket.values() {
                total_postings += ids.len();
                max_bucket_size = max_bucket_size.max(ids.len());
            }
        }

        // Each accepted add lands exactly once in band 0.
        let num_signatures = self.buckets[0].values().map(|ids| ids.len()).sum();

        IndexStats {
            num_signatures,
            num_bands: self.params.num_bands,
            bits_per_band: self.params.bits_per_band,
            total_buckets,
            avg_bucket_size: if total_buckets > 0 {
                total_postings as f64 / total_buckets as f64
            } else {
                0.0
            },
            max_bucket_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(num_bands: u32, bits_per_band: u32) -> LSHIndex {
        LSHIndex::new(LSHParams {
            num_bands,
            bits_per_band,
        })
        .unwrap()
    }

    #[test]
    fn test_rejects_invalid_params() {
        assert!(LSHIndex::new(LSHParams {
            num_bands: 0,
            bits_per_band: 16
        })
        .is_err());
        assert!(LSHIndex::new(LSHParams {
            num_bands: 4,
            bits_per_band: 0
        })
        .is_err());
        assert!(LSHIndex::new(LSHParams {
            num_bands: 4,
            bits_per_band: 65
        })
        .is_err());
    }

    #[test]
    fn test_required_bytes() {
        assert_eq!(index(32, 16).required_bytes(), 64);
        assert_eq!(index(3, 9).required_bytes(), 4); // 27 bits
        assert_eq!(index(1, 64).required_bytes(), 8);
    }

    #[test]
    fn test_band_hash_little_endian() {
        let ix = index(2, 16);
        let sig = [0xab, 0xcd, 0x12, 0x34];
        assert_eq!(ix.extract_band_hash(&sig, 0), 0xcdab);
        assert_eq!(ix.extract_band_hash(&sig, 1), 0x3412);
    }

    #[test]
    fn test_band_hash_masks_to_width() {
        let ix = index(2, 4);
        let sig = [0xab];
        // Band 0 and band 1 both anchor on byte 0; the mask keeps the low
        // nibble for each.
        assert_eq!(ix.extract_band_hash(&sig, 0), 0x0b);
        assert_eq!(ix.extract_band_hash(&sig, 1), 0x0b);
    }

    #[test]
    fn test_band_hash_full_width_band() {
        let ix = index(1, 64);
        let sig = [0xff; 8];
        assert_eq!(ix.extract_band_hash(&sig, 0), u64::MAX);
    }

    #[test]
    fn band_windows_overlap_for_non_byte_aligned_widths() {
        // W = 12: band 1 starts at bit 12, so its window is anchored on
        // byte 1 and re-reads byte 1's high nibble that band 0 consumed.
        let ix = index(2, 12);
        let sig = [0x21, 0x43, 0x65];
        assert_eq!(ix.extract_band_hash(&sig, 0), 0x321);
        assert_eq!(ix.extract_band_hash(&sig, 1), 0x543);
    }

    #[test]
    fn test_add_and_find_candidates() {
        let mut ix = index(4, 8);
        let sig = [0x11, 0x22, 0x33, 0x44];
        ix.add(0, &sig);

        let candidates = ix.find_candidates(&sig);
        assert_eq!(candidates, [0].into_iter().collect());

        // Agreement on a single band is enough.
        let partial = [0x11, 0xff, 0xff, 0xff];
        assert_eq!(ix.find_candidates(&partial), [0].into_iter().collect());

        // No band agrees.
        let disjoint = [0xaa, 0xbb, 0xcc, 0xdd];
        assert!(ix.find_candidates(&disjoint).is_empty());
    }

    #[test]
    fn test_short_signature_is_skipped() {
        let mut ix = index(4, 8);
        ix.add(0, &[0x11, 0x22, 0x33]); // needs 4 bytes
        assert_eq!(ix.stats().num_signatures, 0);
        assert!(ix.find_candidates(&[0x11, 0x22, 0x33]).is_empty());
    }

    #[test]
    fn test_query_similar_verifies_and_sorts() {
        let mut ix = index(4, 8);
        let mut store = SignatureStore::default();

        let base = [0x11, 0x22, 0x33, 0x44];
        let mut near = base;
        near[1] ^= 0x03; // dist 2, still agrees on bands 0, 2, 3
        let far = [0x11, 0xff, 0xff, 0xff]; // agrees on band 0, dist is large

        for sig in [&base, &near, &far] {
            let id = store.push(sig.as_slice());
            ix.add(id, sig.as_slice());
        }

        let results = ix.query_similar(&base, &store, 2);
        assert_eq!(results, vec![(0, 0), (1, 2)]);

        let exact = ix.query_similar(&base, &store, 0);
        assert_eq!(exact, vec![(0, 0)]);
    }

    #[test]
    fn test_clear_preserves_topology() {
        let mut ix = index(4, 8);
        let sig = [1, 2, 3, 4];
        ix.add(0, &sig);
        ix.clear();

        let stats = ix.stats();
        assert_eq!(stats.num_signatures, 0);
        assert_eq!(stats.total_buckets, 0);
        assert_eq!(stats.num_bands, 4);

        // Still usable after clear.
        ix.add(7, &sig);
        assert_eq!(ix.find_candidates(&sig), [7].into_iter().collect());
    }

    #[test]
    fn test_stats_formulas() {
        let mut ix = index(2, 8);
        // Two signatures sharing band 0, differing on band 1.
        ix.add(0, &[0xaa, 0x01]);
        ix.add(1, &[0xaa, 0x02]);

        let stats = ix.stats();
        assert_eq!(stats.num_signatures, 2);
        // Band 0: one bucket of size 2. Band 1: two buckets of size 1.
        assert_eq!(stats.total_buckets, 3);
        assert_eq!(stats.max_bucket_size, 2);
        assert!((stats.avg_bucket_size - 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_stats_empty_index() {
        let stats = index(4, 8).stats();
        assert_eq!(stats.num_signatures, 0);
        assert_eq!(stats.total_buckets, 0);
        assert_eq!(stats.avg_bucket_size, 0.0);
        assert_eq!(stats.max_bucket_size, 0);
    }
}
