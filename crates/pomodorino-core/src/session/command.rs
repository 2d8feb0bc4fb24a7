//! Inbound commands and their acknowledgements.
//!
//! Wire-tagged with `action`, matching the message contract display clients
//! send: `startPomodoro`, `stopPomodoro`, `resetPomodoro`. Anything else is
//! answered with an "unknown action" status and changes no state.

use serde::{Deserialize, Serialize};

use crate::config::ConfigOverrides;
use crate::session::engine::StartOverrides;

/// A command sent by a display client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Command {
    #[serde(rename = "startPomodoro", rename_all = "camelCase")]
    StartPomodoro {
        #[serde(default)]
        is_focus: Option<bool>,
        #[serde(default)]
        focus_duration: Option<f64>,
        #[serde(default)]
        break_duration: Option<f64>,
        #[serde(default)]
        long_break_duration: Option<f64>,
        #[serde(default)]
        pomodoros_before_long_break: Option<u32>,
    },
    #[serde(rename = "stopPomodoro")]
    StopPomodoro,
    #[serde(rename = "resetPomodoro")]
    ResetPomodoro,
}

impl Command {
    pub fn start_overrides(&self) -> StartOverrides {
        match self {
            Command::StartPomodoro {
                is_focus,
                focus_duration,
                break_duration,
                long_break_duration,
                pomodoros_before_long_break,
            } => StartOverrides {
                is_focus: *is_focus,
                config: ConfigOverrides {
                    focus_duration_minutes: *focus_duration,
                    break_duration_minutes: *break_duration,
                    long_break_duration_minutes: *long_break_duration,
                    pomodoros_before_long_break: *pomodoros_before_long_break,
                    sound_off: None,
                },
            },
            _ => StartOverrides::default(),
        }
    }
}

/// Status acknowledgement returned for every command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    pub status: String,
}

impl Ack {
    pub const UNKNOWN_ACTION: &'static str = "unknown action";

    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
        }
    }

    pub fn unknown_action() -> Self {
        Self::new(Self::UNKNOWN_ACTION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn start_command_parses_wire_payload() {
        let cmd: Command = serde_json::from_value(json!({
            "action": "startPomodoro",
            "isFocus": true,
            "focusDuration": 25.0,
            "breakDuration": 5.0,
            "longBreakDuration": 15.0,
            "pomodorosBeforeLongBreak": 4,
        }))
        .unwrap();
        let overrides = cmd.start_overrides();
        assert_eq!(overrides.is_focus, Some(true));
        assert_eq!(overrides.config.focus_duration_minutes, Some(25.0));
        assert_eq!(overrides.config.pomodoros_before_long_break, Some(4));
    }

    #[test]
    fn bare_commands_parse() {
        assert_eq!(
            serde_json::from_value::<Command>(json!({"action": "stopPomodoro"})).unwrap(),
            Command::StopPomodoro
        );
        assert_eq!(
            serde_json::from_value::<Command>(json!({"action": "resetPomodoro"})).unwrap(),
            Command::ResetPomodoro
        );
    }

    #[test]
    fn unrecognized_action_fails_to_parse() {
        assert!(serde_json::from_value::<Command>(json!({"action": "fooBar"})).is_err());
    }
}
