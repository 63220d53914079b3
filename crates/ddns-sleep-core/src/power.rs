//! Power transition types
//!
//! The host dispatcher (systemd-sleep) runs the hook twice per sleep cycle:
//! once with `pre` before the machine goes down and once with `post` after
//! it comes back, each time naming the sleep variant (`suspend`,
//! `hibernate`, `hybrid-sleep`, `suspend-then-hibernate`, ...).
//!
//! Only the variants in [`RECOGNIZED_POWER_STATES`] are acted upon. Anything
//! else, including states the host may add in the future, is a no-op.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Power states that trigger a DNS mutation
///
/// Matching is exact and case-sensitive.
pub const RECOGNIZED_POWER_STATES: &[&str] = &["hibernate", "hybrid-sleep"];

/// Which side of the transition the hook is being called on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Before the machine suspends
    Pre,
    /// After the machine resumes
    Post,
}

impl Phase {
    /// Parse the dispatcher's phase argument
    ///
    /// Returns `None` for anything other than `pre` or `post`; callers treat
    /// that as a transition they do not handle.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pre" => Some(Phase::Pre),
            "post" => Some(Phase::Post),
            _ => None,
        }
    }

    /// The argument form of this phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Pre => "pre",
            Phase::Post => "post",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single power transition reported by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerTransitionEvent {
    /// Pre-suspend or post-resume
    pub phase: Phase,
    /// Free-form power state name supplied by the host
    pub power_state: String,
}

impl PowerTransitionEvent {
    /// Create a new power transition event
    pub fn new(phase: Phase, power_state: impl Into<String>) -> Self {
        Self {
            phase,
            power_state: power_state.into(),
        }
    }

    /// Whether the power state is on the allow-list
    pub fn is_recognized(&self) -> bool {
        is_recognized_power_state(&self.power_state)
    }
}

impl fmt::Display for PowerTransitionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.phase, self.power_state)
    }
}

/// Check a power state name against [`RECOGNIZED_POWER_STATES`]
pub fn is_recognized_power_state(power_state: &str) -> bool {
    RECOGNIZED_POWER_STATES.contains(&power_state)
}
