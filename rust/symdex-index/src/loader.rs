//! Index loader: merges fragments into a [`SymbolIndex`].
//!
//! Loading is a two-phase process, mirroring how the index is used:
//! 1. **Collection**: every fragment is normalized record by record and merged into
//!    per-key buckets, in fragment order, while duplicates are dropped.
//! 2. **Freezing**: [`IndexLoader::finish`] sorts the buckets by match key and
//!    produces the immutable index.
//!
//! The loader holds no process-wide state; identical inputs yield identical indexes.
//! A failed [`IndexLoader::add_fragment`] leaves the loader in an unspecified state,
//! so a failed load is all-or-nothing: the loader must be discarded.

use ahash::AHashMap;
use symdex_common::{Result, error::Error};

use crate::config::IndexConfig;
use crate::fragment::Fragment;
use crate::index::{Entry, IndexedEntry, KeyBucket, Origin, SymbolIndex};
use crate::keys::{IndexKey, KeyNormalizer};

/// Loads `fragments` in order into a new index.
///
/// # Errors
///
/// Returns a `MalformedFragment` error when a record has no raw key, a raw key
/// normalizes to nothing, an entry has no anchor, or an anchor already present
/// under a key arrives with a different display name.
pub fn load<I>(config: IndexConfig, fragments: I) -> Result<SymbolIndex>
where
    I: IntoIterator<Item = Fragment>,
{
    let mut loader = IndexLoader::new(config)?;
    for fragment in fragments {
        loader.add_fragment(fragment)?;
    }
    Ok(loader.finish())
}

/// Counters describing the merge of one fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FragmentStats {
    /// Number of the fragment within the load sequence.
    pub fragment: u32,
    pub records: usize,
    pub entries_added: usize,
    pub duplicates_skipped: usize,
}

/// Incremental index builder.
pub struct IndexLoader {
    config: IndexConfig,
    normalizer: KeyNormalizer,
    /// Buckets by match key.
    buckets: AHashMap<String, BucketBuilder>,
    next_fragment: u32,
}

impl IndexLoader {
    pub fn new(config: IndexConfig) -> Result<Self> {
        let normalizer = config.create_normalizer()?;
        Ok(Self {
            config,
            normalizer,
            buckets: AHashMap::new(),
            next_fragment: 0,
        })
    }

    /// Continues loading on top of an existing index (partial rebuild).
    ///
    /// Fragments added to the returned loader are numbered after the ones already
    /// merged into `index`, so they order after them in search results.
    pub fn from_index(index: &SymbolIndex) -> Self {
        let buckets = index
            .buckets()
            .map(|bucket| {
                let builder = BucketBuilder::from_bucket(bucket);
                (bucket.match_key().to_string(), builder)
            })
            .collect();
        Self {
            config: index.config().clone(),
            normalizer: index.normalizer().clone(),
            buckets,
            next_fragment: index.fragment_count(),
        }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Merges one fragment. The fragment is consumed.
    pub fn add_fragment(&mut self, fragment: Fragment) -> Result<FragmentStats> {
        let fragment_no = self.next_fragment;
        let mut stats = FragmentStats {
            fragment: fragment_no,
            records: fragment.len(),
            ..Default::default()
        };
        let mut ordinal = 0u32;

        for (record_no, record) in fragment.into_records().into_iter().enumerate() {
            let raw_key = record
                .raw_key
                .as_deref()
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .ok_or_else(|| {
                    Error::malformed_fragment(
                        fragment_no as usize,
                        format!("record {record_no}"),
                        "missing raw key",
                    )
                })?;
            let key = self.normalizer.normalize(raw_key).ok_or_else(|| {
                Error::malformed_fragment(
                    fragment_no as usize,
                    format!("record {record_no}"),
                    format!("raw key '{raw_key}' normalizes to an empty key"),
                )
            })?;

            for (entry_no, raw) in record.entries.into_iter().enumerate() {
                let origin = Origin {
                    fragment: fragment_no,
                    ordinal,
                };
                ordinal += 1;

                let location = || format!("record {record_no}, entry {entry_no}");
                let anchor = raw
                    .anchor
                    .filter(|anchor| !anchor.trim().is_empty())
                    .ok_or_else(|| {
                        Error::malformed_fragment(
                            fragment_no as usize,
                            location(),
                            "missing anchor",
                        )
                    })?;
                let display_name = raw
                    .display_name
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| raw_key.to_string());
                let entry = Entry {
                    display_name,
                    anchor,
                    container_name: raw.container_name.unwrap_or_default(),
                };

                let bucket = self
                    .buckets
                    .entry(key.folded.clone())
                    .or_insert_with(|| BucketBuilder::new(key.clone()));
                match bucket.insert(entry, origin) {
                    Insert::Added => stats.entries_added += 1,
                    Insert::Duplicate => {
                        log::trace!(
                            "fragment #{fragment_no}: skipping duplicate entry under '{}'",
                            key.display
                        );
                        stats.duplicates_skipped += 1;
                    }
                    Insert::Conflict { anchor, existing } => {
                        return Err(Error::malformed_fragment(
                            fragment_no as usize,
                            location(),
                            format!(
                                "anchor '{anchor}' under key '{}' is already bound to '{existing}'",
                                key.display
                            ),
                        ));
                    }
                }
            }
        }

        self.next_fragment += 1;
        log::debug!(
            "merged fragment #{}: {} records, {} entries added, {} duplicates skipped",
            stats.fragment,
            stats.records,
            stats.entries_added,
            stats.duplicates_skipped
        );
        Ok(stats)
    }

    /// Freezes the collected buckets into an immutable index.
    pub fn finish(self) -> SymbolIndex {
        let mut buckets: Vec<KeyBucket> = self
            .buckets
            .into_values()
            .map(BucketBuilder::finish)
            .collect();
        buckets.sort_by(|a, b| a.key.folded.cmp(&b.key.folded));

        let index = SymbolIndex {
            config: self.config,
            normalizer: self.normalizer,
            buckets,
            fragment_count: self.next_fragment,
        };
        log::debug!(
            "index built: {} fragments, {} keys, {} entries",
            index.fragment_count(),
            index.key_count(),
            index.entry_count()
        );
        index
    }
}

enum Insert {
    Added,
    Duplicate,
    Conflict { anchor: String, existing: String },
}

struct BucketBuilder {
    key: IndexKey,
    entries: Vec<IndexedEntry>,
    /// Anchor to position in `entries`.
    anchors: AHashMap<String, usize>,
}

impl BucketBuilder {
    fn new(key: IndexKey) -> Self {
        Self {
            key,
            entries: Vec::new(),
            anchors: AHashMap::new(),
        }
    }

    fn from_bucket(bucket: &KeyBucket) -> Self {
        let anchors = bucket
            .entries()
            .iter()
            .enumerate()
            .map(|(pos, indexed)| (indexed.entry.anchor.clone(), pos))
            .collect();
        Self {
            key: bucket.key.clone(),
            entries: bucket.entries().to_vec(),
            anchors,
        }
    }

    fn insert(&mut self, entry: Entry, origin: Origin) -> Insert {
        if let Some(&pos) = self.anchors.get(&entry.anchor) {
            let existing = &self.entries[pos].entry;
            return if existing.display_name == entry.display_name {
                Insert::Duplicate
            } else {
                Insert::Conflict {
                    anchor: entry.anchor,
                    existing: existing.display_name.clone(),
                }
            };
        }
        self.anchors.insert(entry.anchor.clone(), self.entries.len());
        self.entries.push(IndexedEntry { entry, origin });
        Insert::Added
    }

    fn finish(self) -> KeyBucket {
        KeyBucket {
            key: self.key,
            entries: self.entries,
        }
    }
}
