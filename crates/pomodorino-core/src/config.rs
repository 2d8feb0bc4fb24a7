//! Session configuration.
//!
//! User preferences for the Pomodoro cycle: phase durations (fractional
//! minutes), how many focus phases precede a long break, and whether the
//! completion chime is muted. Persisted in the flat key-value layout
//! alongside session state, independently of it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::session::SessionPhase;
use crate::storage::keys;

/// User-controlled session configuration.
///
/// Mutated only via explicit setting updates; read by the engine when a
/// fresh (non-resumed) session starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_focus_duration")]
    pub focus_duration_minutes: f64,
    #[serde(default = "default_break_duration")]
    pub break_duration_minutes: f64,
    #[serde(default = "default_long_break_duration")]
    pub long_break_duration_minutes: f64,
    #[serde(default = "default_pomodoros_before_long_break")]
    pub pomodoros_before_long_break: u32,
    #[serde(default)]
    pub sound_off: bool,
}

fn default_focus_duration() -> f64 {
    25.0
}
fn default_break_duration() -> f64 {
    5.0
}
fn default_long_break_duration() -> f64 {
    15.0
}
fn default_pomodoros_before_long_break() -> u32 {
    4
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            focus_duration_minutes: default_focus_duration(),
            break_duration_minutes: default_break_duration(),
            long_break_duration_minutes: default_long_break_duration(),
            pomodoros_before_long_break: default_pomodoros_before_long_break(),
            sound_off: false,
        }
    }
}

/// Optional per-start configuration overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub focus_duration_minutes: Option<f64>,
    pub break_duration_minutes: Option<f64>,
    pub long_break_duration_minutes: Option<f64>,
    pub pomodoros_before_long_break: Option<u32>,
    pub sound_off: Option<bool>,
}

impl ConfigOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl SessionConfig {
    /// Duration of a phase, in whole seconds.
    pub fn duration_secs(&self, phase: SessionPhase) -> u64 {
        let minutes = match phase {
            SessionPhase::Focus => self.focus_duration_minutes,
            SessionPhase::Break => self.break_duration_minutes,
            SessionPhase::LongBreak => self.long_break_duration_minutes,
        };
        // Durations are validated on the way in, so this is always >= 1.
        (minutes * 60.0).round().max(1.0) as u64
    }

    /// Merge overrides, clamping invalid values back to the previous ones.
    ///
    /// A non-finite or non-positive duration never crashes the countdown;
    /// it is dropped in favor of the current value.
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(v) = overrides.focus_duration_minutes {
            if v.is_finite() && v > 0.0 {
                self.focus_duration_minutes = v;
            }
        }
        if let Some(v) = overrides.break_duration_minutes {
            if v.is_finite() && v > 0.0 {
                self.break_duration_minutes = v;
            }
        }
        if let Some(v) = overrides.long_break_duration_minutes {
            if v.is_finite() && v > 0.0 {
                self.long_break_duration_minutes = v;
            }
        }
        if let Some(v) = overrides.pomodoros_before_long_break {
            if v >= 1 {
                self.pomodoros_before_long_break = v;
            }
        }
        if let Some(v) = overrides.sound_off {
            self.sound_off = v;
        }
    }

    /// Flat key-value entries for persistence.
    pub fn to_entries(&self) -> Vec<(&'static str, Value)> {
        vec![
            (keys::FOCUS_DURATION_MINUTES, json!(self.focus_duration_minutes)),
            (keys::BREAK_DURATION_MINUTES, json!(self.break_duration_minutes)),
            (
                keys::LONG_BREAK_DURATION_MINUTES,
                json!(self.long_break_duration_minutes),
            ),
            (
                keys::POMODOROS_BEFORE_LONG_BREAK,
                json!(self.pomodoros_before_long_break),
            ),
            (keys::SOUND_OFF, json!(self.sound_off)),
        ]
    }

    /// Rebuild from flat key-value entries, falling back to defaults for
    /// missing or malformed keys.
    pub fn from_entries(entries: &HashMap<String, Value>) -> Self {
        let defaults = Self::default();
        let pos_f64 = |key: &str, fallback: f64| -> f64 {
            entries
                .get(key)
                .and_then(Value::as_f64)
                .filter(|v| v.is_finite() && *v > 0.0)
                .unwrap_or(fallback)
        };
        Self {
            focus_duration_minutes: pos_f64(
                keys::FOCUS_DURATION_MINUTES,
                defaults.focus_duration_minutes,
            ),
            break_duration_minutes: pos_f64(
                keys::BREAK_DURATION_MINUTES,
                defaults.break_duration_minutes,
            ),
            long_break_duration_minutes: pos_f64(
                keys::LONG_BREAK_DURATION_MINUTES,
                defaults.long_break_duration_minutes,
            ),
            pomodoros_before_long_break: entries
                .get(keys::POMODOROS_BEFORE_LONG_BREAK)
                .and_then(Value::as_u64)
                .filter(|v| *v >= 1)
                .map(|v| v.min(u32::MAX as u64) as u32)
                .unwrap_or(defaults.pomodoros_before_long_break),
            sound_off: entries
                .get(keys::SOUND_OFF)
                .and_then(Value::as_bool)
                .unwrap_or(defaults.sound_off),
        }
    }
}
