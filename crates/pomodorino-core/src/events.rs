//! Outbound broadcasts from the engine to display clients.
//!
//! Broadcasts are best-effort: the engine cannot know whether any client is
//! listening, so delivery failures are expected and ignored. Wire names
//! match the extension message contract the CLI renders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::SessionPhase;

/// Every state change the engine pushes to display clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action")]
pub enum Broadcast {
    /// Sent on every tick and on start: render the countdown.
    #[serde(rename = "updateTimerDisplay")]
    UpdateTimerDisplay {
        #[serde(rename = "secondsRemaining")]
        seconds_remaining: u64,
        #[serde(rename = "isActive")]
        is_active: bool,
        phase: SessionPhase,
        #[serde(rename = "totalSecondsForPhase")]
        total_seconds_for_phase: u64,
        at: DateTime<Utc>,
    },
    /// Sent once per completed Focus phase: clients re-read the persisted
    /// count.
    #[serde(rename = "updateCompletedPomodoros")]
    UpdateCompletedPomodoros {
        #[serde(rename = "completedFocusCount")]
        completed_focus_count: u32,
        at: DateTime<Utc>,
    },
    /// Sent after reset: clients re-read config and state from the store
    /// instead of trusting any attached payload.
    #[serde(rename = "queryStorageAndUpdateUI")]
    QueryStorageAndUpdateUi { at: DateTime<Utc> },
}
