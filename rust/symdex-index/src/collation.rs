//! Text collation strategies for symbol key matching.
//!
//! A collation decides which raw symbol names fall into the same index bucket and
//! how query strings are compared with index keys. Every key is *folded* once at
//! load time; queries are folded with the same collation at search time, after which
//! exact, prefix and substring tests are plain string operations on folded text.
//!
//! # Available Collations
//!
//! - **Unicode Case Insensitive**: folds every character through a full case round trip
//! - **Unicode Case Preserving**: leaves text unchanged, matching is case-sensitive
//!
//! The collation must remain consistent between loading and querying, which is why
//! a [`SymbolIndex`](crate::SymbolIndex) owns the collation it was built with.

use std::borrow::Cow;

use symdex_common::{Result, error::Error};

/// Trait defining how symbol text is folded for matching.
pub trait Collation: Send + Sync + 'static {
    /// Returns the collation kind for identification and configuration.
    fn kind(&self) -> CollationKind;

    /// Returns the human-readable name of this collation strategy.
    fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Creates a boxed clone of this collation for sharing across components.
    fn clone_boxed(&self) -> Box<dyn Collation>;

    /// Folds `text` into its match form.
    ///
    /// Two strings are considered equal under this collation iff their folded forms
    /// are byte-equal. Returns the input unchanged (borrowed) when folding is a no-op.
    fn fold<'a>(&self, text: &'a str) -> Cow<'a, str>;
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum CollationKind {
    /// Unicode collation that is case insensitive.
    UnicodeCaseInsensitive,
    /// Unicode collation that is case preserving.
    UnicodeCasePreserving,
}

/// Convert a string name to a CollationKind enum variant.
impl TryFrom<&str> for CollationKind {
    type Error = symdex_common::error::Error;

    fn try_from(name: &str) -> Result<Self> {
        match name {
            "unicode-case-insensitive" => Ok(CollationKind::UnicodeCaseInsensitive),
            "unicode-case-preserving" => Ok(CollationKind::UnicodeCasePreserving),
            _ => Err(Error::invalid_arg(
                "collation",
                format!("Unrecognized collation: {name}"),
            )),
        }
    }
}

impl CollationKind {
    /// Get the name of the collation kind as a static string.
    pub const fn name(&self) -> &'static str {
        match self {
            CollationKind::UnicodeCaseInsensitive => "unicode-case-insensitive",
            CollationKind::UnicodeCasePreserving => "unicode-case-preserving",
        }
    }
}

/// Creates a new collation instance based on the provided name.
///
/// # Arguments
/// - `name`: The name of the collation to create.
///
/// # Returns
/// Returns a `Result` containing a boxed `Collation` trait object if successful,
/// or an error if the name is invalid.
pub fn create_collation(name: &str) -> Result<Box<dyn Collation>> {
    match CollationKind::try_from(name)? {
        CollationKind::UnicodeCaseInsensitive => Ok(Box::new(UnicodeCaseInsensitiveCollation)),
        CollationKind::UnicodeCasePreserving => Ok(Box::new(UnicodeCasePreservingCollation)),
    }
}

/// Unicode case-insensitive collation that ignores case differences for all Unicode characters.
///
/// Each character is lowercased, uppercased and lowercased again, without context
/// rules. The folded forms of a string, its uppercase and its lowercase are equal,
/// so `ß`, `ẞ` and `SS` share a bucket, as do `ǅ`, `Ǆ` and `ǆ`, and `ı` and `I`.
/// Folding may change the number of characters.
pub struct UnicodeCaseInsensitiveCollation;

impl Collation for UnicodeCaseInsensitiveCollation {
    fn kind(&self) -> CollationKind {
        CollationKind::UnicodeCaseInsensitive
    }

    fn clone_boxed(&self) -> Box<dyn Collation> {
        Box::new(UnicodeCaseInsensitiveCollation)
    }

    fn fold<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if text.chars().all(is_folded) {
            Cow::Borrowed(text)
        } else {
            let mut folded = String::with_capacity(text.len());
            text.chars().for_each(|c| fold_char(c, &mut folded));
            Cow::Owned(folded)
        }
    }
}

/// Unicode case-preserving collation: matching is exact and case-sensitive.
pub struct UnicodeCasePreservingCollation;

impl Collation for UnicodeCasePreservingCollation {
    fn kind(&self) -> CollationKind {
        CollationKind::UnicodeCasePreserving
    }

    fn clone_boxed(&self) -> Box<dyn Collation> {
        Box::new(UnicodeCasePreservingCollation)
    }

    fn fold<'a>(&self, text: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(text)
    }
}

/// Appends the case-folded form of `c` to `out`.
fn fold_char(c: char, out: &mut String) {
    for lower in c.to_lowercase() {
        for upper in lower.to_uppercase() {
            out.extend(upper.to_lowercase());
        }
    }
}

/// Whether `c` folds to itself.
fn is_folded(c: char) -> bool {
    if c.is_ascii() {
        return !c.is_ascii_uppercase();
    }
    let mut folded = String::new();
    fold_char(c, &mut folded);
    let mut chars = folded.chars();
    chars.next() == Some(c) && chars.next().is_none()
}
