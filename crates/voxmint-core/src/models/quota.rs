//! Quota tier and usage state.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Privilege level governing quota ceilings.
///
/// Ordered by privilege: `Guest < Free < Premium`. Premium bypasses all
/// counters; guests may only produce local artifacts and never publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Guest,
    Free,
    Premium,
}

impl Tier {
    pub fn is_unlimited(&self) -> bool {
        matches!(self, Tier::Premium)
    }
}

/// The three rate-limited resource classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceClass {
    Save,
    AiVoice,
    Dubbing,
}

impl ResourceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceClass::Save => "save",
            ResourceClass::AiVoice => "aiVoice",
            ResourceClass::Dubbing => "dubbing",
        }
    }
}

/// Snapshot of quota usage, persisted between sessions.
///
/// `window_start` is the most recent Monday 00:00 local time; counters are
/// only meaningful relative to that window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaState {
    pub tier: Tier,
    pub saves_used: u32,
    pub ai_voice_used: u32,
    pub dubbing_used: u32,
    pub window_start: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_ordering() {
        assert!(Tier::Guest < Tier::Free);
        assert!(Tier::Free < Tier::Premium);
        assert!(Tier::Premium.is_unlimited());
        assert!(!Tier::Free.is_unlimited());
    }

    #[test]
    fn state_round_trips_through_json() {
        let state = QuotaState {
            tier: Tier::Free,
            saves_used: 2,
            ai_voice_used: 0,
            dubbing_used: 1,
            window_start: chrono::NaiveDate::from_ymd_opt(2024, 3, 4)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        };
        let json = serde_json::to_string(&state).unwrap();
        let back: QuotaState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
