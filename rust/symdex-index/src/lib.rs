//! In-memory symbol search index.
//!
//! This crate builds a searchable index over the symbol tables emitted by a
//! documentation generator and answers name queries against it.
//!
//! # Overview
//!
//! Symbol tables arrive as [`Fragment`]s: batches of `(rawKey, entries)` records,
//! read either from the JSON fragment format or from Doxygen `searchData` files.
//! The index is used in two phases:
//!
//! 1. **Loading**: the [`IndexLoader`] normalizes raw keys (entity decoding,
//!    decoration stripping, case folding) and merges the fragments, in order, into
//!    an immutable [`SymbolIndex`].
//! 2. **Querying**: [`execute_search`] normalizes the query the same way and returns
//!    the exact matches, then the prefix matches, then the substring matches.
//!
//! [`IndexService`] publishes indexes for concurrent readers and swaps them
//! atomically on reload.
//!
//! # Quick Start
//!
//! ```rust
//! use symdex_index::{Entry, Fragment, IndexConfig, MatchTier, load};
//!
//! let fragment = Fragment::new().with_record(
//!     "close",
//!     vec![Entry::new("close()", "CFile.html#a1", "limes::files::CFile")],
//! );
//! let index = load(IndexConfig::default(), vec![fragment]).unwrap();
//!
//! let hits = index.search("CLO", None).unwrap();
//! assert_eq!(hits[0].tier, MatchTier::Prefix);
//! assert_eq!(hits[0].entry.anchor, "CFile.html#a1");
//! ```

pub mod collation;
mod config;
mod fragment;
mod index;
pub mod keys;
mod loader;
mod query;
pub mod searchdata;
mod service;

pub use collation::{Collation, CollationKind, create_collation};
pub use config::IndexConfig;
pub use fragment::{
    Fragment, FragmentFormat, RawEntry, RawRecord, read_fragment_file, read_fragment_files,
};
pub use index::{Entry, IndexedEntry, KeyBucket, Origin, SymbolIndex};
pub use keys::{IndexKey, KeyNormalizer};
pub use loader::{FragmentStats, IndexLoader, load};
pub use query::{MatchTier, SearchHit, SearchQuery, SearchResult, execute_search};
pub use service::IndexService;
