//! Core types for reelzip

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{Error, Result};

/// Maximum accepted length of a collection id
const MAX_ID_LEN: usize = 64;

/// Short opaque token identifying a stored collection
///
/// Ids only ever contain ASCII alphanumerics, `-` and `_`, so they can be
/// embedded in archive filenames without further escaping.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct CollectionId(String);

impl CollectionId {
    /// Generate a fresh random id (8 lowercase hex characters)
    pub fn generate() -> Self {
        let value: u32 = rand::thread_rng().r#gen();
        Self(format!("{:08x}", value))
    }

    /// Parse and validate an id coming from a client
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() || raw.len() > MAX_ID_LEN {
            return Err(Error::Validation(format!(
                "collection id must be 1-{} characters",
                MAX_ID_LEN
            )));
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(Error::Validation(
                "collection id contains invalid characters".to_string(),
            ));
        }
        Ok(Self(raw.to_string()))
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CollectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CollectionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// One remote video reference inside a collection
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ItemRef {
    /// Remote URL of the file
    pub url: String,
    /// Name shown to the user and used to derive the archive entry name
    pub filename: String,
}

impl ItemRef {
    /// Create a new item reference
    pub fn new(url: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            filename: filename.into(),
        }
    }
}

/// A stored collection of items
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Collection {
    /// Collection id
    pub id: CollectionId,
    /// Ordered item list
    pub items: Vec<ItemRef>,
    /// When the collection was stored
    pub created_at: DateTime<Utc>,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_eight_hex_chars_and_parse_back() {
        for _ in 0..50 {
            let id = CollectionId::generate();
            assert_eq!(id.as_str().len(), 8);
            assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
            assert_eq!(CollectionId::parse(id.as_str()).unwrap(), id);
        }
    }

    #[test]
    fn parse_rejects_path_tricks() {
        for bad in ["", "../etc", "a/b", "a b", "a.zip", "x\\y", "ünï"] {
            assert!(CollectionId::parse(bad).is_err(), "{bad:?} should be rejected");
        }
        assert!(CollectionId::parse(&"a".repeat(65)).is_err());
        assert!(CollectionId::parse("V1StGXR8_Z").is_ok());
        assert!(CollectionId::parse("abc-123").is_ok());
    }

    #[test]
    fn collection_id_serializes_transparently() {
        let id = CollectionId::parse("ab12cd34").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"ab12cd34\"");
    }

    #[test]
    fn item_ref_uses_url_and_filename_keys() {
        let item: ItemRef =
            serde_json::from_str(r#"{"url": "https://cdn.test/a.mp4", "filename": "a.mp4"}"#)
                .unwrap();
        assert_eq!(item, ItemRef::new("https://cdn.test/a.mp4", "a.mp4"));
    }
}
