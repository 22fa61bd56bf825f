//! Query engine: tiered exact, prefix and substring matching over a [`SymbolIndex`].

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;
use symdex_common::{Result, error::Error};

use crate::index::{Entry, KeyBucket, Origin, SymbolIndex};

/// How a result's key relates to the query.
///
/// Tiers order the results: every exact match precedes every prefix match, which
/// precedes every substring match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchTier {
    /// The key equals the query.
    Exact,
    /// The key starts with the query and is longer.
    Prefix,
    /// The key contains the query, but not at its start.
    Substring,
}

impl MatchTier {
    pub const fn name(&self) -> &'static str {
        match self {
            MatchTier::Exact => "exact",
            MatchTier::Prefix => "prefix",
            MatchTier::Substring => "substring",
        }
    }
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Search query with builder-style options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    /// Maximum number of results; `None` falls back to the index's default limit.
    pub limit: Option<usize>,
}

impl SearchQuery {
    pub fn text(query: impl Into<String>) -> Self {
        Self {
            text: query.into(),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// One search result borrowing from the index it was produced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchHit<'a> {
    pub entry: &'a Entry,
    /// Display key of the bucket the entry was found under.
    pub key: &'a str,
    pub tier: MatchTier,
    pub origin: Origin,
}

impl SearchHit<'_> {
    pub fn to_result(&self) -> SearchResult {
        SearchResult {
            entry: self.entry.clone(),
            key: self.key.to_string(),
            tier: self.tier,
        }
    }
}

/// Owned search result, detached from any index snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub entry: Entry,
    pub key: String,
    pub tier: MatchTier,
}

/// Runs `query` against `index`.
///
/// Results are ordered by tier, then by origin (earlier fragment first, then
/// position within the fragment), then by container name and anchor. The limit
/// is applied after ordering, so a limited result is always a prefix of the
/// unlimited one.
///
/// # Errors
///
/// Returns an `InvalidQuery` error when the query text is empty or normalizes to
/// an empty key.
pub fn execute_search<'a>(
    index: &'a SymbolIndex,
    query: &SearchQuery,
) -> Result<Vec<SearchHit<'a>>> {
    if query.text.trim().is_empty() {
        return Err(Error::invalid_query(&query.text, "query is empty"));
    }
    let key = index.normalizer().normalize(&query.text).ok_or_else(|| {
        Error::invalid_query(&query.text, "query is empty after normalization")
    })?;
    let needle = key.folded.as_str();

    let limit = query.limit.or(index.config().default_limit);
    if limit == Some(0) {
        return Ok(Vec::new());
    }

    let mut hits = Vec::new();
    for bucket in index.buckets_with_prefix(needle) {
        let tier = if bucket.match_key() == needle {
            MatchTier::Exact
        } else {
            MatchTier::Prefix
        };
        push_bucket(&mut hits, bucket, tier);
    }
    for bucket in index.buckets() {
        let match_key = bucket.match_key();
        if !match_key.starts_with(needle) && match_key.contains(needle) {
            push_bucket(&mut hits, bucket, MatchTier::Substring);
        }
    }

    hits.sort_by(compare_hits);
    if let Some(limit) = limit {
        hits.truncate(limit);
    }
    log::trace!(
        "query '{}' (key '{needle}'): {} results",
        query.text,
        hits.len()
    );
    Ok(hits)
}

fn push_bucket<'a>(hits: &mut Vec<SearchHit<'a>>, bucket: &'a KeyBucket, tier: MatchTier) {
    hits.extend(bucket.entries().iter().map(|indexed| SearchHit {
        entry: &indexed.entry,
        key: bucket.display_key(),
        tier,
        origin: indexed.origin,
    }));
}

fn compare_hits(a: &SearchHit, b: &SearchHit) -> Ordering {
    a.tier
        .cmp(&b.tier)
        .then_with(|| a.origin.cmp(&b.origin))
        .then_with(|| a.entry.container_name.cmp(&b.entry.container_name))
        .then_with(|| a.entry.anchor.cmp(&b.entry.anchor))
}

impl SymbolIndex {
    /// Searches for `query`, returning at most `limit` results.
    ///
    /// See [`execute_search`] for the ordering rules.
    pub fn search(&self, query: &str, limit: Option<usize>) -> Result<Vec<SearchHit<'_>>> {
        let query = SearchQuery {
            text: query.to_string(),
            limit,
        };
        execute_search(self, &query)
    }
}
