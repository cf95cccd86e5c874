//! Voxmint Services
//!
//! The AI transform collaborators and the publish pipeline that turns
//! selected ledger versions into durably stored, on-chain-referenced
//! artifacts.

pub mod publish;
pub mod transform;

pub use publish::{
    AttemptError, MissionContext, MissionReporter, PublishAttempt, PublishError,
    PublishPipeline, PublishReport, PublishRequest,
};
pub use transform::{
    apply_dub, apply_voice_transform, DubOutput, DubbedVersion, TransformError, VoiceParam,
    VoiceTransformService,
};
