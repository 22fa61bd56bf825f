//! Index configuration.

use serde::{Deserialize, Serialize};
use symdex_common::{Result, error::Error, verify_arg};

use crate::collation::{self, CollationKind};
use crate::keys::{DEFAULT_MAX_KEY_LENGTH, KeyNormalizer};

/// Configuration parameters for loading and querying a symbol index.
///
/// Deserializable from JSON; absent fields take their defaults:
///
/// ```json
/// { "collation": "unicode-case-insensitive", "default_limit": 50, "max_key_length": 256 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexConfig {
    /// The name of the collation used to fold keys and queries.
    pub collation: String,

    /// Result limit applied when a query does not carry its own.
    /// `None` returns every match.
    pub default_limit: Option<usize>,

    /// Maximum length of a normalized key in bytes; longer keys and queries are
    /// truncated at a character boundary.
    pub max_key_length: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            collation: CollationKind::UnicodeCaseInsensitive.name().to_string(),
            default_limit: None,
            max_key_length: DEFAULT_MAX_KEY_LENGTH,
        }
    }
}

impl IndexConfig {
    pub fn with_collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = collation.into();
        self
    }

    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = Some(limit);
        self
    }

    pub fn validate(&self) -> Result<()> {
        verify_arg!(max_key_length, self.max_key_length > 0);
        CollationKind::try_from(self.collation.as_str())?;
        Ok(())
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: IndexConfig = serde_json::from_str(text)
            .map_err(|e| Error::invalid_arg("config", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn create_normalizer(&self) -> Result<KeyNormalizer> {
        self.validate()?;
        let collation = collation::create_collation(&self.collation)?;
        Ok(KeyNormalizer::new(collation, self.max_key_length))
    }
}
