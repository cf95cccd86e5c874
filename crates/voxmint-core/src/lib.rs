//! Voxmint Core Library
//!
//! This crate provides the domain models, configuration, and the quota gate
//! that are shared across all Voxmint components.

pub mod clock;
pub mod config;
pub mod models;
pub mod quota_gate;

// Re-export commonly used types
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{QuotaLimits, StorageConfig};
pub use models::{
    AudioVersion, QuotaState, ResourceClass, Tier, VersionId, VersionMetadata,
    VersionMetadataFragment, VersionSource,
};
pub use quota_gate::{week_start, QuotaGate, Remaining};
