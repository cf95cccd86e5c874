//! AI transform collaborators and the orchestration that feeds their output
//! into the ledger.
//!
//! The services themselves (voice conversion, dubbing) are external black
//! boxes; these helpers gate them on quota, append the result as a new DAG
//! node under the chosen parent, and spend the counter only on success.
//! They are the only place the AI-voice and dubbing quota classes are spent.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use voxmint_core::models::{ResourceClass, VersionId, VersionMetadataFragment, VersionSource};
use voxmint_core::QuotaGate;
use voxmint_ledger::{LedgerError, VersionLedger};

/// Target voice for AI voice conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceParam {
    pub voice_id: String,
    pub voice_name: Option<String>,
}

/// Result of a dubbing call: the dubbed audio plus both transcripts.
#[derive(Debug, Clone)]
pub struct DubOutput {
    pub audio: Bytes,
    pub transcript: String,
    pub translated_transcript: String,
}

/// External AI transform service.
#[async_trait]
pub trait VoiceTransformService: Send + Sync {
    /// Convert the speaker's voice; returns a fresh audio payload.
    async fn transform_voice(&self, audio: Bytes, voice: &VoiceParam) -> anyhow::Result<Bytes>;

    /// Dub into `target_language`, optionally hinting the source language.
    async fn dub(
        &self,
        audio: Bytes,
        target_language: &str,
        source_language: Option<&str>,
    ) -> anyhow::Result<DubOutput>;
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Weekly {} quota exceeded", .0.as_str())]
    QuotaExceeded(ResourceClass),

    #[error("Source version not found: {0}")]
    SourceNotFound(VersionId),

    #[error("Transform service error: {0}")]
    Service(#[from] anyhow::Error),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// A dub appended to the ledger, with its transcripts for display.
#[derive(Debug, Clone)]
pub struct DubbedVersion {
    pub version_id: VersionId,
    pub transcript: String,
    pub translated_transcript: String,
}

/// Run AI voice conversion on `parent_id` and append the result.
///
/// Quota is checked before the service call and spent only after the new
/// version is in the ledger. Duration is carried over from the parent since
/// voice conversion preserves timing and the ledger never decodes audio.
pub async fn apply_voice_transform(
    service: &dyn VoiceTransformService,
    ledger: &mut VersionLedger,
    quota: &mut QuotaGate,
    parent_id: VersionId,
    voice: &VoiceParam,
) -> Result<VersionId, TransformError> {
    if !quota.can_use(ResourceClass::AiVoice) {
        return Err(TransformError::QuotaExceeded(ResourceClass::AiVoice));
    }
    let parent = ledger
        .get_version(parent_id)
        .ok_or(TransformError::SourceNotFound(parent_id))?;
    let audio = parent.blob.clone();
    let duration_secs = parent.metadata.duration_secs;

    tracing::info!(%parent_id, voice = %voice.voice_id, "voice transform started");
    let converted = service.transform_voice(audio, voice).await?;

    let fragment = VersionMetadataFragment {
        duration_secs,
        size_bytes: converted.len() as u64,
        voice_name: voice.voice_name.clone(),
        label: None,
    };
    let source = VersionSource::AiVoice {
        voice_id: voice.voice_id.clone(),
    };
    let id = ledger.add_version(converted, source, parent_id, fragment)?;
    quota.increment(ResourceClass::AiVoice);
    Ok(id)
}

/// Dub `parent_id` into `target_language` and append the result.
pub async fn apply_dub(
    service: &dyn VoiceTransformService,
    ledger: &mut VersionLedger,
    quota: &mut QuotaGate,
    parent_id: VersionId,
    target_language: &str,
    source_language: Option<&str>,
) -> Result<DubbedVersion, TransformError> {
    if !quota.can_use(ResourceClass::Dubbing) {
        return Err(TransformError::QuotaExceeded(ResourceClass::Dubbing));
    }
    let parent = ledger
        .get_version(parent_id)
        .ok_or(TransformError::SourceNotFound(parent_id))?;
    let audio = parent.blob.clone();
    let duration_secs = parent.metadata.duration_secs;

    tracing::info!(%parent_id, language = target_language, "dubbing started");
    let output = service.dub(audio, target_language, source_language).await?;

    let fragment = VersionMetadataFragment {
        duration_secs,
        size_bytes: output.audio.len() as u64,
        voice_name: None,
        label: None,
    };
    let source = VersionSource::Dub {
        language: target_language.to_string(),
    };
    let id = ledger.add_version(output.audio, source, parent_id, fragment)?;
    quota.increment(ResourceClass::Dubbing);
    Ok(DubbedVersion {
        version_id: id,
        transcript: output.transcript,
        translated_transcript: output.translated_transcript,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use voxmint_core::{FixedClock, QuotaLimits, Tier};
    use voxmint_ledger::MemoryStore;

    struct MockTransformService {
        voice_calls: AtomicUsize,
        dub_calls: AtomicUsize,
        fail: bool,
    }

    impl MockTransformService {
        fn new(fail: bool) -> Self {
            Self {
                voice_calls: AtomicUsize::new(0),
                dub_calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl VoiceTransformService for MockTransformService {
        async fn transform_voice(
            &self,
            audio: Bytes,
            voice: &VoiceParam,
        ) -> anyhow::Result<Bytes> {
            self.voice_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("voice service unavailable");
            }
            let mut out = audio.to_vec();
            out.extend_from_slice(voice.voice_id.as_bytes());
            Ok(Bytes::from(out))
        }

        async fn dub(
            &self,
            audio: Bytes,
            target_language: &str,
            _source_language: Option<&str>,
        ) -> anyhow::Result<DubOutput> {
            self.dub_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("dub service unavailable");
            }
            Ok(DubOutput {
                audio,
                transcript: "hello".to_string(),
                translated_transcript: format!("hello in {}", target_language),
            })
        }
    }

    fn quota(tier: Tier) -> QuotaGate {
        let monday = chrono::NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        QuotaGate::new(tier, QuotaLimits::default(), Arc::new(FixedClock::new(monday)))
    }

    fn seeded_ledger() -> VersionLedger {
        let mut ledger = VersionLedger::new(Arc::new(MemoryStore::new()));
        ledger
            .seed_root(
                Bytes::from_static(b"take"),
                VersionMetadataFragment {
                    duration_secs: 20.0,
                    size_bytes: 4,
                    ..Default::default()
                },
            )
            .unwrap();
        ledger
    }

    #[tokio::test]
    async fn voice_transform_appends_and_spends_quota() {
        let service = MockTransformService::new(false);
        let mut ledger = seeded_ledger();
        let mut quota = quota(Tier::Free);
        let voice = VoiceParam {
            voice_id: "nova".to_string(),
            voice_name: Some("Nova".to_string()),
        };

        let id = apply_voice_transform(&service, &mut ledger, &mut quota, VersionId::ROOT, &voice)
            .await
            .unwrap();

        let node = ledger.get_version(id).unwrap();
        assert_eq!(node.metadata.transform_chain, vec!["aiVoice-nova"]);
        assert_eq!(node.metadata.duration_secs, 20.0);
        assert_eq!(node.metadata.voice_name.as_deref(), Some("Nova"));
        assert_eq!(quota.state().ai_voice_used, 1);
    }

    #[tokio::test]
    async fn dub_returns_transcripts() {
        let service = MockTransformService::new(false);
        let mut ledger = seeded_ledger();
        let mut quota = quota(Tier::Free);

        let dubbed = apply_dub(
            &service,
            &mut ledger,
            &mut quota,
            VersionId::ROOT,
            "es",
            Some("en"),
        )
        .await
        .unwrap();

        assert_eq!(dubbed.translated_transcript, "hello in es");
        let node = ledger.get_version(dubbed.version_id).unwrap();
        assert_eq!(node.metadata.language.as_deref(), Some("es"));
        assert_eq!(quota.state().dubbing_used, 1);
    }

    #[tokio::test]
    async fn quota_exhaustion_blocks_before_service_call() {
        let service = MockTransformService::new(false);
        let mut ledger = seeded_ledger();
        let mut quota = quota(Tier::Free);
        for _ in 0..QuotaLimits::default().weekly_ai_voice {
            quota.increment(ResourceClass::AiVoice);
        }
        let voice = VoiceParam {
            voice_id: "nova".to_string(),
            voice_name: None,
        };

        let result =
            apply_voice_transform(&service, &mut ledger, &mut quota, VersionId::ROOT, &voice)
                .await;
        assert!(matches!(
            result,
            Err(TransformError::QuotaExceeded(ResourceClass::AiVoice))
        ));
        assert_eq!(service.voice_calls.load(Ordering::SeqCst), 0);
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn service_failure_spends_nothing() {
        let service = MockTransformService::new(true);
        let mut ledger = seeded_ledger();
        let mut quota = quota(Tier::Free);

        let result = apply_dub(&service, &mut ledger, &mut quota, VersionId::ROOT, "es", None)
            .await;
        assert!(matches!(result, Err(TransformError::Service(_))));
        assert_eq!(quota.state().dubbing_used, 0);
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn unknown_parent_is_source_not_found() {
        let service = MockTransformService::new(false);
        let mut ledger = seeded_ledger();
        let mut quota = quota(Tier::Free);
        let ghost = VersionId::new();
        let voice = VoiceParam {
            voice_id: "nova".to_string(),
            voice_name: None,
        };

        let result =
            apply_voice_transform(&service, &mut ledger, &mut quota, ghost, &voice).await;
        assert!(matches!(
            result,
            Err(TransformError::SourceNotFound(id)) if id == ghost
        ));
        assert_eq!(service.voice_calls.load(Ordering::SeqCst), 0);
    }
}
