//! On-chain record types.

use std::fmt;

use serde::{Deserialize, Serialize};
use voxmint_storage::ContentHash;

/// The payload submitted on-chain for one published version: the content
/// hash plus title, description, visibility, and the derived tag set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainRecord {
    pub content_hash: ContentHash,
    pub title: String,
    pub description: String,
    pub is_public: bool,
    pub tags: Vec<String>,
}

/// Reference returned by a successful on-chain submission (transaction id or
/// relay receipt, depending on the path taken).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainReference(pub String);

impl ChainReference {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChainReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
