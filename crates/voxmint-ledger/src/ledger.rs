//! The version ledger: an arena of audio versions keyed by id, with parent
//! links forming a DAG rooted at the original recording.
//!
//! All operations are synchronous and atomic: validation happens before any
//! state changes, so a rejected mutation leaves the ledger untouched. Every
//! successful mutation writes a full snapshot to the persistence store (no
//! partial writes). Mutations are expected to be serialized by the caller;
//! the ledger itself takes `&mut self` and does no locking.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use voxmint_core::models::{
    AudioVersion, VersionId, VersionMetadata, VersionMetadataFragment, VersionSource,
};

use crate::persistence::{PersistenceError, PersistenceStore, PersistenceStoreExt};

/// Key under which the ledger snapshot lives in the persistence store.
pub const LEDGER_SNAPSHOT_KEY: &str = "voxmint-ledger";

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Ledger already has a root version")]
    RootExists,

    #[error("Unknown parent version: {0}")]
    UnknownParent(VersionId),

    #[error("Unknown version: {0}")]
    UnknownVersion(VersionId),

    #[error("Parent {parent} already has a direct child in family '{family}'")]
    DuplicateTransform { parent: VersionId, family: String },

    #[error("The original recording cannot be deleted")]
    RootImmutable,

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Serialized form of the ledger. Round-trips byte-exactly against our own
/// persistence store; no third party consumes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    pub versions: Vec<AudioVersion>,
    pub active_version_id: Option<VersionId>,
}

/// Owns every [`AudioVersion`] of one recording session.
///
/// Insertion order is the canonical iteration order. `active_version_id`
/// points at the node currently presented to downstream tools.
pub struct VersionLedger {
    versions: Vec<AudioVersion>,
    index: HashMap<VersionId, usize>,
    active: Option<VersionId>,
    store: Arc<dyn PersistenceStore>,
}

impl VersionLedger {
    /// An empty ledger; it holds no versions until recording completes and
    /// [`seed_root`](Self::seed_root) is called.
    pub fn new(store: Arc<dyn PersistenceStore>) -> Self {
        Self {
            versions: Vec::new(),
            index: HashMap::new(),
            active: None,
            store,
        }
    }

    /// Rehydrate from the persisted snapshot, if one exists.
    pub fn restore(store: Arc<dyn PersistenceStore>) -> LedgerResult<Option<Self>> {
        let Some(snapshot) = store.load::<LedgerSnapshot>(LEDGER_SNAPSHOT_KEY)? else {
            return Ok(None);
        };
        let index = snapshot
            .versions
            .iter()
            .enumerate()
            .map(|(i, v)| (v.id, i))
            .collect();
        tracing::info!(versions = snapshot.versions.len(), "ledger restored");
        Ok(Some(Self {
            versions: snapshot.versions,
            index,
            active: snapshot.active_version_id,
            store,
        }))
    }

    /// Seed the root version from the just-stopped recording. The root gets
    /// the reserved nil id, an empty transform chain, and becomes active.
    pub fn seed_root(
        &mut self,
        blob: Bytes,
        fragment: VersionMetadataFragment,
    ) -> LedgerResult<VersionId> {
        if !self.versions.is_empty() {
            return Err(LedgerError::RootExists);
        }
        let root = AudioVersion {
            id: VersionId::ROOT,
            parent_id: None,
            blob,
            source: VersionSource::Original,
            label: fragment.label.unwrap_or_else(|| "Original".to_string()),
            metadata: VersionMetadata {
                duration_secs: fragment.duration_secs,
                size_bytes: fragment.size_bytes,
                language: None,
                voice_id: None,
                voice_name: fragment.voice_name,
                transform_chain: Vec::new(),
            },
            created_at: Utc::now(),
        };
        self.index.insert(root.id, 0);
        self.versions.push(root);
        self.active = Some(VersionId::ROOT);
        self.persist()?;
        tracing::info!("ledger seeded with root version");
        Ok(VersionId::ROOT)
    }

    /// Append a derived version under `parent_id`.
    ///
    /// The parent must exist, and the parent must not already have a direct
    /// child in the same transform family. The new version's chain is the
    /// parent's chain plus the step this source introduces, so its length
    /// equals the node's depth from the root. The active version is not
    /// changed.
    pub fn add_version(
        &mut self,
        blob: Bytes,
        source: VersionSource,
        parent_id: VersionId,
        mut fragment: VersionMetadataFragment,
    ) -> LedgerResult<VersionId> {
        let parent = self
            .get_version(parent_id)
            .ok_or(LedgerError::UnknownParent(parent_id))?;

        let family = source.family();
        let duplicate = self.versions.iter().any(|v| {
            v.parent_id == Some(parent_id) && v.source.family() == family
        });
        if duplicate {
            return Err(LedgerError::DuplicateTransform {
                parent: parent_id,
                family,
            });
        }

        let mut transform_chain = parent.metadata.transform_chain.clone();
        if let Some(step) = source.chain_step() {
            transform_chain.push(step);
        }

        let (language, voice_id) = match &source {
            VersionSource::Original => (None, None),
            VersionSource::AiVoice { voice_id } => (None, Some(voice_id.clone())),
            VersionSource::Dub { language } => (Some(language.clone()), None),
        };
        let label = match fragment.label.take() {
            Some(label) => label,
            None => default_label(&source, &fragment),
        };

        let version = AudioVersion {
            id: VersionId::new(),
            parent_id: Some(parent_id),
            blob,
            source,
            label,
            metadata: VersionMetadata {
                duration_secs: fragment.duration_secs,
                size_bytes: fragment.size_bytes,
                language,
                voice_id,
                voice_name: fragment.voice_name,
                transform_chain,
            },
            created_at: Utc::now(),
        };
        let id = version.id;
        self.index.insert(id, self.versions.len());
        self.versions.push(version);
        self.persist()?;
        tracing::info!(%id, %parent_id, "version added");
        Ok(id)
    }

    pub fn get_version(&self, id: VersionId) -> Option<&AudioVersion> {
        self.index.get(&id).map(|&i| &self.versions[i])
    }

    /// Point downstream tools at `id`. A no-op when `id` does not exist.
    pub fn set_active_version(&mut self, id: VersionId) -> LedgerResult<()> {
        if !self.index.contains_key(&id) {
            return Ok(());
        }
        self.active = Some(id);
        self.persist()
    }

    /// Remove `id` and every descendant reachable from it.
    ///
    /// The root is immutable with respect to deletion. If the active version
    /// was removed, the root becomes active. Returns the removed ids in
    /// insertion order.
    pub fn delete_version(&mut self, id: VersionId) -> LedgerResult<Vec<VersionId>> {
        if id.is_root() {
            return Err(LedgerError::RootImmutable);
        }
        if !self.index.contains_key(&id) {
            return Err(LedgerError::UnknownVersion(id));
        }

        // One reverse-adjacency pass per delete call; the cascade is then a
        // plain walk over the children map.
        let mut children: HashMap<VersionId, Vec<VersionId>> = HashMap::new();
        for v in &self.versions {
            if let Some(parent) = v.parent_id {
                children.entry(parent).or_default().push(v.id);
            }
        }

        let mut doomed: HashSet<VersionId> = HashSet::new();
        let mut queue = vec![id];
        while let Some(next) = queue.pop() {
            if doomed.insert(next) {
                if let Some(kids) = children.get(&next) {
                    queue.extend(kids.iter().copied());
                }
            }
        }

        let removed: Vec<VersionId> = self
            .versions
            .iter()
            .filter(|v| doomed.contains(&v.id))
            .map(|v| v.id)
            .collect();

        self.versions.retain(|v| !doomed.contains(&v.id));
        self.index = self
            .versions
            .iter()
            .enumerate()
            .map(|(i, v)| (v.id, i))
            .collect();

        if matches!(self.active, Some(active) if doomed.contains(&active)) {
            self.active = Some(VersionId::ROOT);
        }
        self.persist()?;
        tracing::info!(%id, cascade = removed.len(), "version deleted");
        Ok(removed)
    }

    /// Versions eligible as a transform source: all of them, in insertion
    /// order. Further filtering (e.g. "already has an AI-voice child") is the
    /// caller's business.
    pub fn transformable_versions(&self) -> impl Iterator<Item = &AudioVersion> {
        self.versions.iter()
    }

    /// Direct children of `id`, in insertion order.
    pub fn children_of(&self, id: VersionId) -> Vec<VersionId> {
        self.versions
            .iter()
            .filter(|v| v.parent_id == Some(id))
            .map(|v| v.id)
            .collect()
    }

    pub fn active_version_id(&self) -> Option<VersionId> {
        self.active
    }

    pub fn active_version(&self) -> Option<&AudioVersion> {
        self.active.and_then(|id| self.get_version(id))
    }

    pub fn root(&self) -> Option<&AudioVersion> {
        self.get_version(VersionId::ROOT)
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            versions: self.versions.clone(),
            active_version_id: self.active,
        }
    }

    fn persist(&self) -> LedgerResult<()> {
        self.store
            .store(LEDGER_SNAPSHOT_KEY, &self.snapshot())
            .map_err(LedgerError::from)
    }
}

fn default_label(source: &VersionSource, fragment: &VersionMetadataFragment) -> String {
    match source {
        VersionSource::Original => "Original".to_string(),
        VersionSource::AiVoice { voice_id } => {
            let voice = fragment.voice_name.as_deref().unwrap_or(voice_id);
            format!("AI Voice ({})", voice)
        }
        VersionSource::Dub { language } => format!("Dub ({})", language),
    }
}
