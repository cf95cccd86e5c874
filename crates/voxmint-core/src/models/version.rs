//! Audio version nodes: one immutable payload plus its derivation metadata.
//!
//! Versions form a parent-linked DAG rooted at the original recording. The
//! root carries the reserved nil id and is never deleted.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a version node. The root of every ledger is [`VersionId::ROOT`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct VersionId(pub Uuid);

impl VersionId {
    /// Reserved id of the original, unedited recording.
    pub const ROOT: VersionId = VersionId(Uuid::nil());

    pub fn new() -> Self {
        VersionId(Uuid::new_v4())
    }

    pub fn is_root(&self) -> bool {
        *self == Self::ROOT
    }
}

impl Default for VersionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// How a version was produced.
///
/// The source defines the transform *family* used for idempotency: at most
/// one direct child of a given parent may share a family. Voice conversion is
/// one family regardless of voice; dubbing is one family per target language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum VersionSource {
    Original,
    AiVoice { voice_id: String },
    Dub { language: String },
}

impl VersionSource {
    /// Display tag, e.g. `original`, `aiVoice-nova`, `dub-es`.
    pub fn tag(&self) -> String {
        match self {
            VersionSource::Original => "original".to_string(),
            VersionSource::AiVoice { voice_id } => format!("aiVoice-{}", voice_id),
            VersionSource::Dub { language } => format!("dub-{}", language),
        }
    }

    /// Idempotency family within one parent's direct children.
    pub fn family(&self) -> String {
        match self {
            VersionSource::Original => "original".to_string(),
            VersionSource::AiVoice { .. } => "aiVoice".to_string(),
            VersionSource::Dub { language } => format!("dub-{}", language),
        }
    }

    /// The step this source appends to the parent's transform chain.
    /// The root introduces no step.
    pub fn chain_step(&self) -> Option<String> {
        match self {
            VersionSource::Original => None,
            _ => Some(self.tag()),
        }
    }
}

impl fmt::Display for VersionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

/// Derivation metadata for a version.
///
/// `transform_chain` is append-only: a child's chain equals its parent's
/// chain plus the one step the child introduces, so its length equals the
/// node's depth from the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionMetadata {
    pub duration_secs: f64,
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_name: Option<String>,
    pub transform_chain: Vec<String>,
}

/// Caller-supplied fragment for a new version. The ledger never decodes
/// audio itself; duration and size come from whoever produced the payload.
#[derive(Debug, Clone, Default)]
pub struct VersionMetadataFragment {
    pub duration_secs: f64,
    pub size_bytes: u64,
    pub voice_name: Option<String>,
    pub label: Option<String>,
}

/// One node of the version DAG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioVersion {
    pub id: VersionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<VersionId>,
    /// Exclusively owned payload; transforms always produce a fresh blob.
    #[serde(with = "blob_base64")]
    pub blob: Bytes,
    pub source: VersionSource,
    pub label: String,
    pub metadata: VersionMetadata,
    pub created_at: DateTime<Utc>,
}

impl AudioVersion {
    pub fn is_root(&self) -> bool {
        self.id.is_root()
    }

    /// Depth from the root, by the transform-chain invariant.
    pub fn depth(&self) -> usize {
        self.metadata.transform_chain.len()
    }
}

/// Base64 encoding for blobs inside JSON snapshots.
mod blob_base64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(blob: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(blob))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_tags() {
        assert_eq!(VersionSource::Original.tag(), "original");
        assert_eq!(
            VersionSource::AiVoice {
                voice_id: "nova".into()
            }
            .tag(),
            "aiVoice-nova"
        );
        assert_eq!(
            VersionSource::Dub {
                language: "es".into()
            }
            .tag(),
            "dub-es"
        );
    }

    #[test]
    fn family_collapses_voice_params() {
        let a = VersionSource::AiVoice {
            voice_id: "nova".into(),
        };
        let b = VersionSource::AiVoice {
            voice_id: "atlas".into(),
        };
        assert_eq!(a.family(), b.family());

        let es = VersionSource::Dub {
            language: "es".into(),
        };
        let fr = VersionSource::Dub {
            language: "fr".into(),
        };
        assert_ne!(es.family(), fr.family());
    }

    #[test]
    fn version_round_trips_through_json() {
        let version = AudioVersion {
            id: VersionId::new(),
            parent_id: Some(VersionId::ROOT),
            blob: Bytes::from_static(b"\x00\x01\x02audio"),
            source: VersionSource::Dub {
                language: "es".into(),
            },
            label: "Dub (es)".to_string(),
            metadata: VersionMetadata {
                duration_secs: 12.5,
                size_bytes: 8,
                language: Some("es".into()),
                voice_id: None,
                voice_name: None,
                transform_chain: vec!["dub-es".into()],
            },
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&version).unwrap();
        let back: AudioVersion = serde_json::from_str(&json).unwrap();
        assert_eq!(back, version);
    }
}
