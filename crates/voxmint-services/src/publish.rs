//! The publish pipeline: selection -> quota check -> upload -> on-chain
//! commit -> result aggregation.
//!
//! The pipeline is pure orchestration over the ledger, the quota gate, and
//! the two external collaborators (content storage, chain client). It never
//! mutates ledger state and never spends quota; the caller increments the
//! save counter for versions reported as successful.
//!
//! Versions are processed strictly sequentially, never concurrently, so the
//! chosen commit path never interleaves nonces or sessions and upload
//! bandwidth stays predictable. Once a version has been dispatched there is
//! no cancellation; in-flight uploads and submissions run to completion.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use voxmint_chain::{
    ChainClient, ChainRecord, ChainReference, CommitStrategy, DelegatedSession, WalletConnector,
};
use voxmint_core::models::{AudioVersion, ResourceClass, VersionId};
use voxmint_core::{QuotaGate, Remaining};
use voxmint_ledger::VersionLedger;
use voxmint_storage::{publish_filename, ContentHash, ContentStorage, UploadOptions};

/// Batch-level failures: the whole attempt is rejected before any side
/// effects occur.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PublishError {
    #[error("No versions selected")]
    NoVersionsSelected,

    #[error("Weekly save quota exceeded: requested {requested}, remaining {remaining}")]
    QuotaExceeded { requested: u32, remaining: u32 },

    #[error("Wallet not connected")]
    WalletNotConnected,
}

/// Per-version failures: captured in the attempt, never aborting the batch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AttemptError {
    #[error("Version not found in ledger")]
    VersionNotFound,

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Chain submission failed: {0}")]
    ChainSubmissionFailed(String),
}

/// One publish batch.
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub selected: Vec<VersionId>,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub is_public: bool,
    /// When set, the batch is a single-version mission submission.
    pub mission: Option<MissionContext>,
}

/// External mission-submission context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionContext {
    pub mission_id: Uuid,
}

/// Collaborator notified when a mission submission's content is stored.
#[async_trait]
pub trait MissionReporter: Send + Sync {
    async fn mission_completed(
        &self,
        mission: &MissionContext,
        storage_hash: &ContentHash,
    ) -> anyhow::Result<()>;
}

/// Outcome of one version within a batch. Ephemeral; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishAttempt {
    pub version_id: VersionId,
    pub storage_hash: Option<ContentHash>,
    pub chain_reference: Option<ChainReference>,
    pub error: Option<AttemptError>,
}

impl PublishAttempt {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    fn failure(version_id: VersionId, error: AttemptError) -> Self {
        Self {
            version_id,
            storage_hash: None,
            chain_reference: None,
            error: Some(error),
        }
    }
}

/// Aggregated result of a batch: one attempt per selected version, whether
/// it succeeded or not.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishReport {
    pub attempts: Vec<PublishAttempt>,
}

impl PublishReport {
    pub fn succeeded(&self) -> usize {
        self.attempts.iter().filter(|a| a.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.attempts.len() - self.succeeded()
    }

    pub fn is_full_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn successful_version_ids(&self) -> Vec<VersionId> {
        self.attempts
            .iter()
            .filter(|a| a.succeeded())
            .map(|a| a.version_id)
            .collect()
    }

    /// Spend one save per successful attempt. The pipeline itself never
    /// touches the gate; callers invoke this after inspecting the report.
    pub fn record_quota_spend(&self, quota: &mut QuotaGate) {
        for _ in 0..self.succeeded() {
            quota.increment(ResourceClass::Save);
        }
    }
}

/// Orchestrates one publish batch over the storage and chain collaborators.
pub struct PublishPipeline {
    storage: Arc<dyn ContentStorage>,
    chain: Arc<dyn ChainClient>,
    missions: Option<Arc<dyn MissionReporter>>,
}

impl PublishPipeline {
    pub fn new(storage: Arc<dyn ContentStorage>, chain: Arc<dyn ChainClient>) -> Self {
        Self {
            storage,
            chain,
            missions: None,
        }
    }

    pub fn with_mission_reporter(mut self, reporter: Arc<dyn MissionReporter>) -> Self {
        self.missions = Some(reporter);
        self
    }

    /// Publish the selected versions as independent units.
    ///
    /// Batch preconditions (selection, quota, wallet) are checked before any
    /// network call; after that, each version is attempted in order and a
    /// single version's failure never blocks the next one's attempt.
    pub async fn publish(
        &self,
        ledger: &VersionLedger,
        quota: &mut QuotaGate,
        wallet: &dyn WalletConnector,
        delegated: Option<&DelegatedSession>,
        request: &PublishRequest,
    ) -> Result<PublishReport, PublishError> {
        if request.selected.is_empty() {
            return Err(PublishError::NoVersionsSelected);
        }

        let requested = request.selected.len() as u32;
        match quota.remaining(ResourceClass::Save) {
            Remaining::Unbounded => {}
            Remaining::Exact(remaining) => {
                // Guests never publish regardless of their counters.
                if !quota.can_use(ResourceClass::Save) || remaining < requested {
                    let remaining = if quota.can_use(ResourceClass::Save) {
                        remaining
                    } else {
                        0
                    };
                    return Err(PublishError::QuotaExceeded {
                        requested,
                        remaining,
                    });
                }
            }
        }

        let Some(address) = wallet.status().address().cloned() else {
            return Err(PublishError::WalletNotConnected);
        };

        // Chosen once per batch, never re-evaluated per version.
        let strategy = CommitStrategy::select(&address, delegated);
        tracing::info!(
            versions = request.selected.len(),
            strategy = strategy.name(),
            "publish batch started"
        );

        // Mission submissions are single-version batches: publish the first
        // selected version, forward its hash, and skip everything else.
        if let Some(mission) = &request.mission {
            let version_id = request.selected[0];
            let attempt = self.publish_one(ledger, version_id, request, &strategy).await;
            if let Some(hash) = attempt.storage_hash.as_ref().filter(|_| attempt.succeeded()) {
                match &self.missions {
                    Some(reporter) => {
                        if let Err(e) = reporter.mission_completed(mission, hash).await {
                            tracing::warn!(mission = %mission.mission_id, error = %e, "mission report failed");
                        }
                    }
                    None => {
                        tracing::warn!(mission = %mission.mission_id, "no mission reporter configured");
                    }
                }
            }
            return Ok(PublishReport {
                attempts: vec![attempt],
            });
        }

        let mut attempts = Vec::with_capacity(request.selected.len());
        for &version_id in &request.selected {
            attempts.push(self.publish_one(ledger, version_id, request, &strategy).await);
        }

        let report = PublishReport { attempts };
        tracing::info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "publish batch finished"
        );
        Ok(report)
    }

    async fn publish_one(
        &self,
        ledger: &VersionLedger,
        version_id: VersionId,
        request: &PublishRequest,
        strategy: &CommitStrategy,
    ) -> PublishAttempt {
        let Some(version) = ledger.get_version(version_id) else {
            tracing::warn!(%version_id, "selected version no longer in ledger");
            return PublishAttempt::failure(version_id, AttemptError::VersionNotFound);
        };

        let opts = UploadOptions {
            filename: publish_filename(&request.title, Utc::now()),
            content_type: "audio/mpeg".to_string(),
            duration_secs: Some(version.metadata.duration_secs),
        };
        let hash = match self.storage.upload(version.blob.clone(), &opts).await {
            Ok(hash) => hash,
            Err(e) => {
                tracing::warn!(%version_id, error = %e, "upload failed");
                return PublishAttempt::failure(
                    version_id,
                    AttemptError::UploadFailed(e.to_string()),
                );
            }
        };

        let record = ChainRecord {
            content_hash: hash.clone(),
            title: request.title.clone(),
            description: request.description.clone(),
            is_public: request.is_public,
            tags: derived_tags(version, &request.tags),
        };
        match strategy.commit(self.chain.as_ref(), &record).await {
            Ok(reference) => {
                tracing::info!(%version_id, %hash, %reference, "version published");
                PublishAttempt {
                    version_id,
                    storage_hash: Some(hash),
                    chain_reference: Some(reference),
                    error: None,
                }
            }
            Err(e) => {
                // Uploaded content is left in place; orphaned but harmless.
                tracing::warn!(%version_id, error = %e, "chain submission failed");
                PublishAttempt {
                    version_id,
                    storage_hash: Some(hash),
                    chain_reference: None,
                    error: Some(AttemptError::ChainSubmissionFailed(e.to_string())),
                }
            }
        }
    }
}

/// The version's derived tag set (transform chain, language, voice id)
/// unioned with the caller's tags, deduplicated in insertion order.
fn derived_tags(version: &AudioVersion, extra: &[String]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    let mut push = |tag: String| {
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    };
    for step in &version.metadata.transform_chain {
        push(step.clone());
    }
    if let Some(language) = &version.metadata.language {
        push(format!("lang-{}", language));
    }
    if let Some(voice_id) = &version.metadata.voice_id {
        push(format!("voice-{}", voice_id));
    }
    for tag in extra {
        push(tag.clone());
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use chrono::Utc;
    use voxmint_core::models::{VersionMetadata, VersionSource};

    fn version(source: VersionSource, chain: Vec<&str>) -> AudioVersion {
        let (language, voice_id) = match &source {
            VersionSource::Dub { language } => (Some(language.clone()), None),
            VersionSource::AiVoice { voice_id } => (None, Some(voice_id.clone())),
            VersionSource::Original => (None, None),
        };
        AudioVersion {
            id: VersionId::new(),
            parent_id: Some(VersionId::ROOT),
            blob: Bytes::from_static(b"x"),
            source,
            label: "v".to_string(),
            metadata: VersionMetadata {
                duration_secs: 1.0,
                size_bytes: 1,
                language,
                voice_id,
                voice_name: None,
                transform_chain: chain.into_iter().map(String::from).collect(),
            },
            created_at: Utc::now(),
        }
    }

    #[test]
    fn derived_tags_union_dedup() {
        let v = version(
            VersionSource::Dub {
                language: "es".into(),
            },
            vec!["aiVoice-nova", "dub-es"],
        );
        let tags = derived_tags(&v, &["podcast".to_string(), "dub-es".to_string()]);
        assert_eq!(tags, vec!["aiVoice-nova", "dub-es", "lang-es", "podcast"]);
    }

    #[test]
    fn derived_tags_for_root_are_caller_tags_only() {
        let mut v = version(VersionSource::Original, vec![]);
        v.parent_id = None;
        let tags = derived_tags(&v, &["first".to_string()]);
        assert_eq!(tags, vec!["first"]);
    }
}
