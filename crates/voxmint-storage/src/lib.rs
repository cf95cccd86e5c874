//! Voxmint content-addressed storage
//!
//! The publish pipeline uploads audio payloads here and records the returned
//! content hash on-chain. Backends: local filesystem (sha256-addressed
//! objects) and in-memory (tests, guest sessions).

pub mod keys;
pub mod local;
pub mod memory;
pub mod traits;

pub use keys::{object_key, publish_filename};
pub use local::LocalContentStorage;
pub use memory::MemoryContentStorage;
pub use traits::{ContentHash, ContentStorage, StorageError, StorageResult, UploadOptions};
