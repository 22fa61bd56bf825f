//! The immutable in-memory symbol index.
//!
//! A [`SymbolIndex`] maps normalized keys to the ordered entries documented under
//! them. It is produced by the [`IndexLoader`](crate::IndexLoader), never mutated
//! afterwards, and shared between readers through `Arc`.

use serde::{Deserialize, Serialize};

use crate::config::IndexConfig;
use crate::keys::{IndexKey, KeyNormalizer};

/// One documentation location for a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Human-readable name, possibly decorated with a parameter list.
    pub display_name: String,
    /// Opaque locator of the documentation page fragment.
    pub anchor: String,
    /// Fully-qualified scope, empty when the producer did not supply one.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub container_name: String,
}

impl Entry {
    pub fn new(
        display_name: impl Into<String>,
        anchor: impl Into<String>,
        container_name: impl Into<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            anchor: anchor.into(),
            container_name: container_name.into(),
        }
    }
}

/// Where an entry came from: the fragment number within the load sequence and
/// the entry's position within that fragment, counted across all its records.
///
/// The derived ordering (fragment first, then ordinal) is the stable secondary
/// sort key used by search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Origin {
    pub fragment: u32,
    pub ordinal: u32,
}

/// An entry together with its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedEntry {
    pub entry: Entry,
    pub origin: Origin,
}

/// All entries sharing one normalized key, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBucket {
    pub(crate) key: IndexKey,
    pub(crate) entries: Vec<IndexedEntry>,
}

impl KeyBucket {
    /// The key as first seen, normalized but in its original case.
    pub fn display_key(&self) -> &str {
        &self.key.display
    }

    /// The collation-folded key used for matching.
    pub fn match_key(&self) -> &str {
        &self.key.folded
    }

    pub fn entries(&self) -> &[IndexedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Immutable mapping from normalized key to ordered entries.
///
/// Buckets are kept sorted by match key, which makes exact and prefix lookups a
/// binary search and keeps iteration order independent of hashing.
#[derive(Debug, Clone)]
pub struct SymbolIndex {
    pub(crate) config: IndexConfig,
    pub(crate) normalizer: KeyNormalizer,
    pub(crate) buckets: Vec<KeyBucket>,
    pub(crate) fragment_count: u32,
}

impl SymbolIndex {
    /// Creates an index with no keys.
    pub fn empty(config: IndexConfig) -> symdex_common::Result<Self> {
        let normalizer = config.create_normalizer()?;
        Ok(Self {
            config,
            normalizer,
            buckets: Vec::new(),
            fragment_count: 0,
        })
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &KeyNormalizer {
        &self.normalizer
    }

    /// Number of distinct keys.
    pub fn key_count(&self) -> usize {
        self.buckets.len()
    }

    /// Total number of entries across all keys.
    pub fn entry_count(&self) -> usize {
        self.buckets.iter().map(KeyBucket::len).sum()
    }

    /// Number of fragments merged into this index so far.
    pub fn fragment_count(&self) -> u32 {
        self.fragment_count
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Iterates over all buckets in match-key order.
    pub fn buckets(&self) -> impl Iterator<Item = &KeyBucket> {
        self.buckets.iter()
    }

    /// Looks up the bucket of a raw key after normalizing it.
    pub fn lookup(&self, raw_key: &str) -> Option<&KeyBucket> {
        let key = self.normalizer.normalize(raw_key)?;
        self.bucket_by_match_key(&key.folded)
    }

    pub(crate) fn bucket_by_match_key(&self, folded: &str) -> Option<&KeyBucket> {
        self.buckets
            .binary_search_by(|bucket| bucket.key.folded.as_str().cmp(folded))
            .ok()
            .map(|pos| &self.buckets[pos])
    }

    /// Buckets whose match key starts with `folded`, the exact match included,
    /// in match-key order.
    pub(crate) fn buckets_with_prefix<'a, 'b>(
        &'a self,
        folded: &'b str,
    ) -> impl Iterator<Item = &'a KeyBucket> {
        let start = self
            .buckets
            .partition_point(|bucket| bucket.key.folded.as_str() < folded);
        self.buckets[start..]
            .iter()
            .take_while(move |bucket| bucket.key.folded.starts_with(folded))
    }
}
