pub mod quota;
pub mod version;

pub use quota::{QuotaState, ResourceClass, Tier};
pub use version::{
    AudioVersion, VersionId, VersionMetadata, VersionMetadataFragment, VersionSource,
};
