//! Session phases and the engine's mutable state record.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::storage::keys;

/// Which interval of the Pomodoro cycle is (or will be) counting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    Focus,
    Break,
    LongBreak,
}

impl SessionPhase {
    pub fn is_focus(self) -> bool {
        self == SessionPhase::Focus
    }

    /// Display label for clients.
    pub fn label(self) -> &'static str {
        match self {
            SessionPhase::Focus => "Focus",
            SessionPhase::Break => "Break",
            SessionPhase::LongBreak => "Long Break",
        }
    }

    /// Badge color shown while this phase counts down.
    pub fn badge_color(self) -> &'static str {
        match self {
            SessionPhase::Focus => "#00FF00",
            SessionPhase::Break | SessionPhase::LongBreak => "#FA0000",
        }
    }

    /// Notification text fired when this phase's countdown expires.
    pub fn completion_message(self) -> &'static str {
        match self {
            SessionPhase::Focus => "Focus session complete!",
            SessionPhase::Break => "Break session complete!",
            SessionPhase::LongBreak => "Long Break session complete!",
        }
    }

    /// The break phase that follows a completed Focus phase.
    ///
    /// LongBreak iff the completed count is a positive multiple of
    /// `pomodoros_before_long_break`; otherwise Break.
    pub fn break_after(completed_focus_count: u32, pomodoros_before_long_break: u32) -> Self {
        let n = pomodoros_before_long_break.max(1);
        if completed_focus_count > 0 && completed_focus_count % n == 0 {
            SessionPhase::LongBreak
        } else {
            SessionPhase::Break
        }
    }

    /// Phase that follows this one in strict alternation.
    pub fn next(self, completed_focus_count: u32, pomodoros_before_long_break: u32) -> Self {
        match self {
            SessionPhase::Focus => {
                Self::break_after(completed_focus_count, pomodoros_before_long_break)
            }
            SessionPhase::Break | SessionPhase::LongBreak => SessionPhase::Focus,
        }
    }
}

/// The engine's mutable run-time record: the single source of truth for the
/// one process-wide session.
///
/// While running, `seconds_remaining` is derived from `deadline_epoch_ms`
/// against the wall clock, never from accumulated tick counts, so the state
/// is recoverable after the host sleeps arbitrarily long.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// A session (running or paused) exists.
    pub is_active: bool,
    /// The countdown is currently advancing. Implies `is_active`.
    pub is_running: bool,
    pub phase: SessionPhase,
    /// Incremented only when a Focus phase completes.
    pub completed_focus_count: u32,
    pub seconds_remaining: u64,
    /// Duration the current phase started with; drives display progress.
    pub total_seconds_for_phase: u64,
    /// Wall-clock time at which `seconds_remaining` reaches zero. Valid
    /// only while `is_running`.
    pub deadline_epoch_ms: u64,
}

impl SessionState {
    /// The canonical rest state entered at install and on reset.
    pub fn rest() -> Self {
        Self {
            is_active: false,
            is_running: false,
            phase: SessionPhase::Focus,
            completed_focus_count: 0,
            seconds_remaining: 0,
            total_seconds_for_phase: 0,
            deadline_epoch_ms: 0,
        }
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn progress(&self) -> f64 {
        if self.total_seconds_for_phase == 0 {
            return 0.0;
        }
        1.0 - (self.seconds_remaining as f64 / self.total_seconds_for_phase as f64)
    }

    /// Flat key-value entries for persistence.
    pub fn to_entries(&self) -> Vec<(&'static str, Value)> {
        vec![
            (keys::IS_ACTIVE, json!(self.is_active)),
            (keys::IS_RUNNING, json!(self.is_running)),
            (keys::PHASE, serde_json::to_value(self.phase).unwrap_or(json!("focus"))),
            (keys::COMPLETED_FOCUS_COUNT, json!(self.completed_focus_count)),
            (keys::SECONDS_REMAINING, json!(self.seconds_remaining)),
            (keys::DEADLINE_EPOCH_MS, json!(self.deadline_epoch_ms)),
        ]
    }

    /// Rebuild from flat key-value entries; missing or malformed keys fall
    /// back to the rest state's values.
    pub fn from_entries(entries: &HashMap<String, Value>) -> Self {
        let rest = Self::rest();
        let phase = entries
            .get(keys::PHASE)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or(rest.phase);
        let is_active = entries
            .get(keys::IS_ACTIVE)
            .and_then(Value::as_bool)
            .unwrap_or(rest.is_active);
        let is_running = entries
            .get(keys::IS_RUNNING)
            .and_then(Value::as_bool)
            .unwrap_or(rest.is_running);
        Self {
            is_active,
            // is_running implies is_active even if the stored flags disagree.
            is_running: is_running && is_active,
            phase,
            completed_focus_count: entries
                .get(keys::COMPLETED_FOCUS_COUNT)
                .and_then(Value::as_u64)
                .map(|v| v.min(u32::MAX as u64) as u32)
                .unwrap_or(rest.completed_focus_count),
            seconds_remaining: entries
                .get(keys::SECONDS_REMAINING)
                .and_then(Value::as_u64)
                .unwrap_or(rest.seconds_remaining),
            total_seconds_for_phase: 0,
            deadline_epoch_ms: entries
                .get(keys::DEADLINE_EPOCH_MS)
                .and_then(Value::as_u64)
                .unwrap_or(rest.deadline_epoch_ms),
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::rest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_serializes_with_wire_names() {
        assert_eq!(serde_json::to_value(SessionPhase::Focus).unwrap(), "focus");
        assert_eq!(serde_json::to_value(SessionPhase::Break).unwrap(), "break");
        assert_eq!(
            serde_json::to_value(SessionPhase::LongBreak).unwrap(),
            "longBreak"
        );
    }

    #[test]
    fn break_after_selects_long_break_on_multiples() {
        assert_eq!(SessionPhase::break_after(0, 4), SessionPhase::Break);
        assert_eq!(SessionPhase::break_after(1, 4), SessionPhase::Break);
        assert_eq!(SessionPhase::break_after(3, 4), SessionPhase::Break);
        assert_eq!(SessionPhase::break_after(4, 4), SessionPhase::LongBreak);
        assert_eq!(SessionPhase::break_after(5, 4), SessionPhase::Break);
        assert_eq!(SessionPhase::break_after(8, 4), SessionPhase::LongBreak);
    }

    #[test]
    fn breaks_always_return_to_focus() {
        assert_eq!(SessionPhase::Break.next(7, 4), SessionPhase::Focus);
        assert_eq!(SessionPhase::LongBreak.next(4, 4), SessionPhase::Focus);
    }

    #[test]
    fn rest_state_round_trips_through_entries() {
        let rest = SessionState::rest();
        let map: HashMap<String, Value> = rest
            .to_entries()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        assert_eq!(SessionState::from_entries(&map), rest);
    }

    #[test]
    fn running_flag_requires_active_flag() {
        let mut map = HashMap::new();
        map.insert(keys::IS_RUNNING.to_string(), json!(true));
        map.insert(keys::IS_ACTIVE.to_string(), json!(false));
        let state = SessionState::from_entries(&map);
        assert!(!state.is_running);
    }

    #[test]
    fn progress_is_elapsed_fraction() {
        let state = SessionState {
            seconds_remaining: 300,
            total_seconds_for_phase: 1500,
            ..SessionState::rest()
        };
        assert!((state.progress() - 0.8).abs() < f64::EPSILON);
    }
}
