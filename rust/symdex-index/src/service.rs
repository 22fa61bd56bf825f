//! Shared access to the current index.
//!
//! Readers take a snapshot (`Arc<SymbolIndex>`) and query it without locking; a
//! writer builds a complete new index off to the side and publishes it with a
//! single atomic pointer swap. A reader therefore observes either the old index or
//! the new one, never a partially loaded state. Writers are serialized by a mutex.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arc_swap::ArcSwap;
use symdex_common::Result;

use crate::config::IndexConfig;
use crate::fragment::Fragment;
use crate::index::SymbolIndex;
use crate::loader::{IndexLoader, load};
use crate::query::{SearchQuery, SearchResult, execute_search};

pub struct IndexService {
    current: ArcSwap<SymbolIndex>,
    writer: Mutex<()>,
}

impl IndexService {
    /// Creates a service holding an empty index.
    pub fn new(config: IndexConfig) -> Result<Self> {
        Ok(Self::with_index(SymbolIndex::empty(config)?))
    }

    pub fn with_index(index: SymbolIndex) -> Self {
        Self {
            current: ArcSwap::from_pointee(index),
            writer: Mutex::new(()),
        }
    }

    /// The currently published index. The snapshot stays valid and unchanged for
    /// as long as the caller holds it, regardless of later publishes.
    pub fn snapshot(&self) -> Arc<SymbolIndex> {
        self.current.load_full()
    }

    /// Replaces the published index, returning the previous one.
    pub fn publish(&self, index: SymbolIndex) -> Arc<SymbolIndex> {
        let _guard = self.lock_writer();
        self.swap(Arc::new(index))
    }

    /// Rebuilds the index from scratch with the current configuration.
    ///
    /// The configuration is read under the writer lock, so a concurrent
    /// `reload_with` is never undone. Nothing is published if any fragment fails
    /// to load.
    pub fn reload<I>(&self, fragments: I) -> Result<Arc<SymbolIndex>>
    where
        I: IntoIterator<Item = Fragment>,
    {
        let _guard = self.lock_writer();
        let config = self.current.load().config().clone();
        self.rebuild(config, fragments)
    }

    /// Rebuilds the index from scratch with a new configuration.
    pub fn reload_with<I>(&self, config: IndexConfig, fragments: I) -> Result<Arc<SymbolIndex>>
    where
        I: IntoIterator<Item = Fragment>,
    {
        let _guard = self.lock_writer();
        self.rebuild(config, fragments)
    }

    /// Merges additional fragments on top of the current index and publishes the
    /// result. Nothing is published if any fragment fails to load.
    pub fn extend<I>(&self, fragments: I) -> Result<Arc<SymbolIndex>>
    where
        I: IntoIterator<Item = Fragment>,
    {
        let _guard = self.lock_writer();
        let mut loader = IndexLoader::from_index(&self.current.load());
        for fragment in fragments {
            loader.add_fragment(fragment)?;
        }
        let index = Arc::new(loader.finish());
        self.swap(index.clone());
        Ok(index)
    }

    /// Runs `query` against the current snapshot.
    pub fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        let snapshot = self.snapshot();
        let hits = execute_search(&snapshot, query)?;
        Ok(hits.iter().map(|hit| hit.to_result()).collect())
    }

    /// Loads and publishes a fresh index. The caller holds the writer lock.
    fn rebuild<I>(&self, config: IndexConfig, fragments: I) -> Result<Arc<SymbolIndex>>
    where
        I: IntoIterator<Item = Fragment>,
    {
        let index = Arc::new(load(config, fragments)?);
        self.swap(index.clone());
        Ok(index)
    }

    fn swap(&self, index: Arc<SymbolIndex>) -> Arc<SymbolIndex> {
        log::debug!(
            "publishing index: {} keys, {} entries",
            index.key_count(),
            index.entry_count()
        );
        self.current.swap(index)
    }

    fn lock_writer(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Entry;

    fn fragment(key: &str, anchor: &str) -> Fragment {
        Fragment::new().with_record(key, vec![Entry::new(key, anchor, "")])
    }

    #[test]
    fn test_new_service_is_empty() {
        let service = IndexService::new(IndexConfig::default()).unwrap();
        assert!(service.snapshot().is_empty());
        assert!(service.search(&SearchQuery::text("close")).unwrap().is_empty());
    }

    #[test]
    fn test_snapshot_survives_publish() {
        let service = IndexService::new(IndexConfig::default()).unwrap();
        service.reload(vec![fragment("close", "a.html")]).unwrap();
        let before = service.snapshot();

        service.reload(vec![fragment("open", "b.html")]).unwrap();
        assert!(before.lookup("close").is_some());
        assert!(service.snapshot().lookup("close").is_none());
        assert!(service.snapshot().lookup("open").is_some());
    }

    #[test]
    fn test_failed_reload_keeps_index() {
        let service = IndexService::new(IndexConfig::default()).unwrap();
        service.reload(vec![fragment("close", "a.html")]).unwrap();

        let bad = Fragment::new().with_record("", vec![Entry::new("x", "x.html", "")]);
        let err = service
            .reload(vec![fragment("open", "b.html"), bad])
            .unwrap_err();
        assert!(err.is_malformed_fragment());
        assert!(service.snapshot().lookup("close").is_some());
        assert!(service.snapshot().lookup("open").is_none());
    }

    #[test]
    fn test_extend() {
        let service = IndexService::new(IndexConfig::default()).unwrap();
        service.reload(vec![fragment("close", "a.html")]).unwrap();
        let extended = service
            .extend(vec![fragment("closeAll", "b.html")])
            .unwrap();
        assert_eq!(extended.key_count(), 2);
        assert_eq!(extended.fragment_count(), 2);

        let results = service.search(&SearchQuery::text("close")).unwrap();
        let anchors: Vec<&str> = results.iter().map(|r| r.entry.anchor.as_str()).collect();
        assert_eq!(anchors, vec!["a.html", "b.html"]);

        let bad = Fragment::new().with_record("()", vec![Entry::new("x", "x.html", "")]);
        assert!(service.extend(vec![bad]).is_err());
        assert_eq!(service.snapshot().key_count(), 2);
    }

    #[test]
    fn test_publish_returns_previous() {
        let service = IndexService::new(IndexConfig::default()).unwrap();
        let index = load(IndexConfig::default(), vec![fragment("close", "a.html")]).unwrap();
        let previous = service.publish(index);
        assert!(previous.is_empty());
        assert_eq!(service.snapshot().key_count(), 1);
    }

    #[test]
    fn test_reload_with_new_config() {
        let service = IndexService::new(IndexConfig::default()).unwrap();
        let config = IndexConfig::default().with_collation("unicode-case-preserving");
        service
            .reload_with(config, vec![fragment("Close", "a.html")])
            .unwrap();
        assert!(service.snapshot().lookup("close").is_none());
        assert!(service.snapshot().lookup("Close").is_some());
    }

    #[test]
    fn test_reload_keeps_latest_config() {
        let service = IndexService::new(IndexConfig::default()).unwrap();
        let config = IndexConfig::default().with_collation("unicode-case-preserving");
        service
            .reload_with(config, vec![fragment("Close", "a.html")])
            .unwrap();

        let index = service.reload(vec![fragment("Open", "b.html")]).unwrap();
        assert_eq!(index.config().collation, "unicode-case-preserving");
        assert!(service.snapshot().lookup("open").is_none());
        assert!(service.snapshot().lookup("Open").is_some());
    }
}
