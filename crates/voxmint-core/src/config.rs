//! Configuration module
//!
//! Environment-driven configuration for quota ceilings and storage paths.
//! Bad values fall back to defaults with a warning rather than failing startup.

use std::env;
use std::path::PathBuf;

use crate::models::ResourceClass;

// Free-tier weekly ceilings
const DEFAULT_WEEKLY_SAVES: u32 = 3;
const DEFAULT_WEEKLY_AI_VOICE: u32 = 5;
const DEFAULT_WEEKLY_DUBBING: u32 = 3;

const DEFAULT_STORAGE_PATH: &str = "./data/voxmint";

/// Weekly ceilings for the free tier, one per resource class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuotaLimits {
    pub weekly_saves: u32,
    pub weekly_ai_voice: u32,
    pub weekly_dubbing: u32,
}

impl Default for QuotaLimits {
    fn default() -> Self {
        Self {
            weekly_saves: DEFAULT_WEEKLY_SAVES,
            weekly_ai_voice: DEFAULT_WEEKLY_AI_VOICE,
            weekly_dubbing: DEFAULT_WEEKLY_DUBBING,
        }
    }
}

impl QuotaLimits {
    /// Load limits from environment, falling back to defaults per field.
    pub fn from_env() -> Self {
        Self {
            weekly_saves: env_u32("VOXMINT_WEEKLY_SAVES", DEFAULT_WEEKLY_SAVES),
            weekly_ai_voice: env_u32("VOXMINT_WEEKLY_AI_VOICE", DEFAULT_WEEKLY_AI_VOICE),
            weekly_dubbing: env_u32("VOXMINT_WEEKLY_DUBBING", DEFAULT_WEEKLY_DUBBING),
        }
    }

    /// The weekly ceiling for a resource class.
    pub fn ceiling(&self, class: ResourceClass) -> u32 {
        match class {
            ResourceClass::Save => self.weekly_saves,
            ResourceClass::AiVoice => self.weekly_ai_voice,
            ResourceClass::Dubbing => self.weekly_dubbing,
        }
    }
}

/// Local content storage configuration.
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub base_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from(DEFAULT_STORAGE_PATH),
        }
    }
}

impl StorageConfig {
    pub fn from_env() -> Self {
        let base_path = env::var("VOXMINT_STORAGE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORAGE_PATH));
        Self { base_path }
    }
}

fn env_u32(key: &str, default: u32) -> u32 {
    match env::var(key) {
        Ok(raw) => match raw.parse::<u32>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(%key, %raw, "invalid value, using default {}", default);
                default
            }
        },
        Err(_) => default,
    }
}
