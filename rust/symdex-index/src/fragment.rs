//! Fragments: batches of raw `(rawKey, entries)` records supplied by a documentation
//! generator, and the readers for the on-disk formats they come in.
//!
//! A fragment is consumed exactly once by the loader. Fields are optional at this
//! level so that incomplete producer output can be reported precisely by the loader
//! instead of failing deserialization with a generic message.

use std::path::Path;

use serde::{Deserialize, Serialize};
use symdex_common::{Result, error::Error};

use crate::index::{Entry, SymbolIndex};
use crate::searchdata;

/// One entry record as supplied by the producer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEntry {
    /// Defaults to the record's raw key when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,
}

impl From<Entry> for RawEntry {
    fn from(entry: Entry) -> Self {
        RawEntry {
            display_name: Some(entry.display_name),
            anchor: Some(entry.anchor),
            container_name: (!entry.container_name.is_empty()).then_some(entry.container_name),
        }
    }
}

/// A raw key with the entries documented under it.
///
/// Serialized as a two-element array `[rawKey, [entry, ...]]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "(Option<String>, Vec<RawEntry>)",
    into = "(Option<String>, Vec<RawEntry>)"
)]
pub struct RawRecord {
    /// Required.
    pub raw_key: Option<String>,
    pub entries: Vec<RawEntry>,
}

impl From<(Option<String>, Vec<RawEntry>)> for RawRecord {
    fn from((raw_key, entries): (Option<String>, Vec<RawEntry>)) -> Self {
        RawRecord { raw_key, entries }
    }
}

impl From<RawRecord> for (Option<String>, Vec<RawEntry>) {
    fn from(record: RawRecord) -> Self {
        (record.raw_key, record.entries)
    }
}

/// One batch of raw records, in producer order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fragment {
    records: Vec<RawRecord>,
}

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<RawRecord>) -> Self {
        Self { records }
    }

    /// Appends a record; builder-style convenience for tests and producers.
    pub fn with_record<E>(mut self, raw_key: impl Into<String>, entries: E) -> Self
    where
        E: IntoIterator,
        E::Item: Into<RawEntry>,
    {
        self.push(RawRecord {
            raw_key: Some(raw_key.into()),
            entries: entries.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn push(&mut self, record: RawRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<RawRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total number of entry records across all raw records.
    pub fn entry_count(&self) -> usize {
        self.records.iter().map(|r| r.entries.len()).sum()
    }

    /// Parses the JSON fragment format.
    pub fn from_json_str(text: &str) -> Result<Fragment> {
        serde_json::from_str(text).map_err(|e| {
            Error::malformed_fragment(
                0,
                format!("line {} column {}", e.line(), e.column()),
                e.to_string(),
            )
        })
    }

    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(self).expect("fragment serialization is infallible")
    }

    /// Re-emits an index as a single fragment: one record per key in match-key order,
    /// entries in bucket order.
    pub fn from_index(index: &SymbolIndex) -> Fragment {
        let records = index
            .buckets()
            .map(|bucket| RawRecord {
                raw_key: Some(bucket.display_key().to_string()),
                entries: bucket
                    .entries()
                    .iter()
                    .map(|indexed| RawEntry::from(indexed.entry.clone()))
                    .collect(),
            })
            .collect();
        Fragment { records }
    }
}

/// The on-disk formats a fragment can be read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentFormat {
    /// `[[rawKey, [{displayName, anchor, containerName}, ...]], ...]`
    Json,
    /// Doxygen `var searchData=[...];` JavaScript files.
    SearchData,
}

impl TryFrom<&str> for FragmentFormat {
    type Error = symdex_common::error::Error;

    fn try_from(name: &str) -> Result<Self> {
        match name {
            "json" => Ok(FragmentFormat::Json),
            "searchdata" | "doxygen" | "js" => Ok(FragmentFormat::SearchData),
            _ => Err(Error::invalid_arg(
                "format",
                format!("Unrecognized fragment format: {name}"),
            )),
        }
    }
}

impl FragmentFormat {
    pub const fn name(&self) -> &'static str {
        match self {
            FragmentFormat::Json => "json",
            FragmentFormat::SearchData => "searchdata",
        }
    }

    /// Picks the format from the file extension: `.js` is Doxygen search data,
    /// `.json` is the JSON fragment format.
    pub fn detect(path: &Path) -> Option<FragmentFormat> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "js" => Some(FragmentFormat::SearchData),
            "json" => Some(FragmentFormat::Json),
            _ => None,
        }
    }

    pub fn parse(&self, text: &str) -> Result<Fragment> {
        match self {
            FragmentFormat::Json => Fragment::from_json_str(text),
            FragmentFormat::SearchData => searchdata::parse_search_data(text),
        }
    }
}

/// Reads one fragment file. When `format` is `None` it is detected from the extension.
pub fn read_fragment_file(path: &Path, format: Option<FragmentFormat>) -> Result<Fragment> {
    let format = match format.or_else(|| FragmentFormat::detect(path)) {
        Some(format) => format,
        None => {
            return Err(Error::invalid_arg(
                "path",
                format!("cannot detect fragment format of {}", path.display()),
            ));
        }
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::io(path.display().to_string(), e))?;
    let fragment = format.parse(&text)?;
    log::debug!(
        "read {} fragment {}: {} records",
        format.name(),
        path.display(),
        fragment.len()
    );
    Ok(fragment)
}

/// Reads fragment files in order; a malformed file is reported with its position
/// in `paths` as the fragment number.
pub fn read_fragment_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Fragment>> {
    paths
        .iter()
        .enumerate()
        .map(|(i, path)| read_fragment_file(path.as_ref(), None).map_err(|e| e.with_fragment(i)))
        .collect()
}
