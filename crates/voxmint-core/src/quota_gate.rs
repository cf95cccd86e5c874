//! Tiered, weekly-windowed usage gate.
//!
//! The gate is consulted before publishing or invoking a paid transform. It
//! tracks three independent weekly counters (saves, AI voice, dubbing) and
//! rolls them over at the Monday 00:00 boundary as a precondition of every
//! read or increment, never via a background timer.
//!
//! The gate is a counter, not a guard: `increment` does not reject calls past
//! the ceiling. Callers are expected to check `can_use` first.

use std::sync::Arc;

use chrono::{NaiveDateTime, NaiveTime, Weekday};

use crate::clock::Clock;
use crate::config::QuotaLimits;
use crate::models::{QuotaState, ResourceClass, Tier};

/// Remaining allowance for a resource class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    Unbounded,
    Exact(u32),
}

impl Remaining {
    /// True when at least `n` more uses are allowed.
    pub fn allows(&self, n: u32) -> bool {
        match self {
            Remaining::Unbounded => true,
            Remaining::Exact(left) => *left >= n,
        }
    }
}

/// The start of the accounting week containing `now`: the most recent
/// Monday at 00:00.
pub fn week_start(now: NaiveDateTime) -> NaiveDateTime {
    now.date()
        .week(Weekday::Mon)
        .first_day()
        .and_time(NaiveTime::MIN)
}

/// Per-session usage gate. Constructed once per session and persisted
/// explicitly via [`QuotaGate::state`] / [`QuotaGate::from_state`].
pub struct QuotaGate {
    tier: Tier,
    limits: QuotaLimits,
    saves_used: u32,
    ai_voice_used: u32,
    dubbing_used: u32,
    window_start: NaiveDateTime,
    clock: Arc<dyn Clock>,
}

impl QuotaGate {
    pub fn new(tier: Tier, limits: QuotaLimits, clock: Arc<dyn Clock>) -> Self {
        let window_start = week_start(clock.now());
        Self {
            tier,
            limits,
            saves_used: 0,
            ai_voice_used: 0,
            dubbing_used: 0,
            window_start,
            clock,
        }
    }

    /// Rehydrate a gate from a persisted snapshot. A stale window is rolled
    /// on the next read, so restoring an old snapshot is safe.
    pub fn from_state(state: QuotaState, limits: QuotaLimits, clock: Arc<dyn Clock>) -> Self {
        Self {
            tier: state.tier,
            limits,
            saves_used: state.saves_used,
            ai_voice_used: state.ai_voice_used,
            dubbing_used: state.dubbing_used,
            window_start: state.window_start,
            clock,
        }
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Replace the tier. Counters are kept: switching tiers mid-week does
    /// not grant a fresh window.
    pub fn set_tier(&mut self, tier: Tier) {
        self.tier = tier;
    }

    /// Whether one more use of `class` is currently allowed.
    pub fn can_use(&mut self, class: ResourceClass) -> bool {
        self.roll_window();
        match (self.tier, class) {
            (Tier::Premium, _) => true,
            (Tier::Guest, ResourceClass::Save) => false,
            _ => self.used(class) < self.limits.ceiling(class),
        }
    }

    /// Record one use of `class`. No-op for premium.
    pub fn increment(&mut self, class: ResourceClass) {
        self.roll_window();
        if self.tier == Tier::Premium {
            return;
        }
        let used = self.used_mut(class);
        *used += 1;
        tracing::debug!(class = class.as_str(), used = *used, "quota incremented");
    }

    /// Ceiling minus used, floored at zero; unbounded for premium.
    pub fn remaining(&mut self, class: ResourceClass) -> Remaining {
        self.roll_window();
        if self.tier == Tier::Premium {
            return Remaining::Unbounded;
        }
        Remaining::Exact(self.limits.ceiling(class).saturating_sub(self.used(class)))
    }

    /// Snapshot for persistence. Rolls the window first so a stale snapshot
    /// is never written back out.
    pub fn state(&mut self) -> QuotaState {
        self.roll_window();
        QuotaState {
            tier: self.tier,
            saves_used: self.saves_used,
            ai_voice_used: self.ai_voice_used,
            dubbing_used: self.dubbing_used,
            window_start: self.window_start,
        }
    }

    fn used(&self, class: ResourceClass) -> u32 {
        match class {
            ResourceClass::Save => self.saves_used,
            ResourceClass::AiVoice => self.ai_voice_used,
            ResourceClass::Dubbing => self.dubbing_used,
        }
    }

    fn used_mut(&mut self, class: ResourceClass) -> &mut u32 {
        match class {
            ResourceClass::Save => &mut self.saves_used,
            ResourceClass::AiVoice => &mut self.ai_voice_used,
            ResourceClass::Dubbing => &mut self.dubbing_used,
        }
    }

    /// Window-reset precondition: if the clock has crossed into a new week
    /// relative to `window_start`, reset all counters and advance the window.
    fn roll_window(&mut self) {
        let current = week_start(self.clock.now());
        if current > self.window_start {
            tracing::info!(
                from = %self.window_start,
                to = %current,
                "quota window rolled, counters reset"
            );
            self.saves_used = 0;
            self.ai_voice_used = 0;
            self.dubbing_used = 0;
            self.window_start = current;
        }
    }
}
