//! Handle-keyed registry of live LSH indices.

use std::collections::HashMap;

use crate::error::{NeardupError, Result};
use crate::lsh::index::{IndexStats, LSHIndex, LSHParams};
use crate::lsh::store::SignatureStore;

#[derive(Debug)]
struct IndexEntry {
    index: LSHIndex,
    store: SignatureStore,
}

/// Registry pairing each handle with one [`LSHIndex`] and its
/// [`SignatureStore`], with matched lifetimes.
///
/// Callers hold only handle integers; the registry exclusively owns both
/// components and frees them together on [`destroy`](Self::destroy).
/// Handles are minted monotonically starting at 1 and never reused.
///
/// The registry is a plain owned value; embedders that need process-wide
/// state keep one behind their own synchronization.
#[derive(Debug)]
pub struct Registry {
    entries: HashMap<u32, IndexEntry>,
    next_handle: u32,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_handle: 1,
        }
    }

    /// Create an LSH index and return its handle.
    ///
    /// # Errors
    ///
    /// [`NeardupError::InvalidParameter`] if the parameters are out of
    /// range (see [`LSHIndex::new`]).
    pub fn create_index(&mut self, params: LSHParams) -> Result<u32> {
        let index = LSHIndex::new(params)?;
        let handle = self.next_handle;
        self.next_handle += 1;
        self.entries.insert(
            handle,
            IndexEntry {
                index,
                store: SignatureStore::new(),
            },
        );
        Ok(handle)
    }

    fn entry(&self, handle: u32) -> Result<&IndexEntry> {
        self.entries
            .get(&handle)
            .ok_or(NeardupError::InvalidHandle(handle))
    }

    fn entry_mut(&mut self, handle: u32) -> Result<&mut IndexEntry> {
        self.entries
            .get_mut(&handle)
            .ok_or(NeardupError::InvalidHandle(handle))
    }

    /// Copy `sig` into the index's store and bands; returns the minted ID.
    ///
    /// IDs are dense and strictly increasing per handle. The payload is
    /// always stored and the ID always minted, even when the signature is
    /// too short for the bands (the index silently skips it, see
    /// [`LSHIndex::add`]).
    ///
    /// # Errors
    ///
    /// [`NeardupError::InvalidHandle`] if `handle` is not live.
    pub fn add(&mut self, handle: u32, sig: &[u8]) -> Result<u32> {
        let entry = self.entry_mut(handle)?;
        let id = entry.store.push(sig);
        entry.index.add(id, sig);
        Ok(id)
    }

    /// Sequential [`add`](Self::add) for each signature; IDs in input
    /// order.
    ///
    /// # Errors
    ///
    /// [`NeardupError::InvalidHandle`] if `handle` is not live.
    pub fn add_batch<S>(&mut self, handle: u32, sigs: &[S]) -> Result<Vec<u32>>
    where
        S: AsRef<[u8]>,
    {
        let entry = self.entry_mut(handle)?;
        let mut ids = Vec::with_capacity(sigs.len());
        for sig in sigs {
            let sig = sig.as_ref();
            let id = entry.store.push(sig);
            entry.index.add(id, sig);
            ids.push(id);
        }
        Ok(ids)
    }

    /// LSH candidate generation plus exact verification against the
    /// handle's store: `(id, dist)` with `dist <= threshold`, ascending
    /// by distance.
    ///
    /// # Errors
    ///
    /// [`NeardupError::InvalidHandle`] if `handle` is not live.
    pub fn query(&self, handle: u32, sig: &[u8], threshold: u32) -> Result<Vec<(u32, u32)>> {
        let entry = self.entry(handle)?;
        Ok(entry.index.query_similar(sig, &entry.store, threshold))
    }

    /// Unverified candidate IDs for `sig`, deduplicated and sorted
    /// ascending.
    ///
    /// # Errors
    ///
    /// [`NeardupError::InvalidHandle`] if `handle` is not live.
    pub fn candidates(&self, handle: u32, sig: &[u8]) -> Result<Vec<u32>> {
        let entry = self.entry(handle)?;
        let mut ids: Vec<u32> = entry.index.find_candidates(sig).into_iter().collect();
        ids.sort_unstable();
        Ok(ids)
    }

    /// Bucket occupancy statistics for the handle's index.
    ///
    /// # Errors
    ///
    /// [`NeardupError::InvalidHandle`] if `handle` is not live.
    pub fn stats(&self, handle: u32) -> Result<IndexStats> {
        Ok(self.entry(handle)?.index.stats())
    }

    /// Remove the handle's index and store, freeing both.
    ///
    /// # Errors
    ///
    /// [`NeardupError::InvalidHandle`] if `handle` is not live.
    pub fn destroy(&mut self, handle: u32) -> Result<()> {
        self.entries
            .remove(&handle)
            .map(|_| ())
            .ok_or(NeardupError::InvalidHandle(handle))
    }

    /// Number of live indices.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry holds no live indices.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
