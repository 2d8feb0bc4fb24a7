//! Session engine implementation.
//!
//! The engine is a wall-clock-based state machine. It does not schedule
//! itself - a driver (the [`SessionService`](super::SessionService) or a
//! test) calls `tick()` periodically while a countdown is running.
//!
//! ## State transitions
//!
//! ```text
//! Idle -> Running/Focus -> Running/(Break|LongBreak) -> Running/Focus -> ...
//!              |  \______ Paused (stop) ______/  |
//!              \_________ Idle (reset) __________/
//! ```
//!
//! Remaining time is always derived from an absolute deadline against the
//! injected clock, never from counting ticks, so a session survives the
//! host being suspended and restarted. Persistence and broadcasts are
//! fire-and-forget: a store failure or an absent listener never unwinds
//! into the countdown path.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::command::{Ack, Command};
use super::state::{SessionPhase, SessionState};
use crate::clock::Clock;
use crate::config::{ConfigOverrides, SessionConfig};
use crate::events::Broadcast;
use crate::notify::Notifier;
use crate::storage::{keys, Store};

/// All persisted keys, config and state together.
const ALL_KEYS: [&str; 11] = [
    keys::FOCUS_DURATION_MINUTES,
    keys::BREAK_DURATION_MINUTES,
    keys::LONG_BREAK_DURATION_MINUTES,
    keys::POMODOROS_BEFORE_LONG_BREAK,
    keys::COMPLETED_FOCUS_COUNT,
    keys::IS_ACTIVE,
    keys::IS_RUNNING,
    keys::DEADLINE_EPOCH_MS,
    keys::PHASE,
    keys::SECONDS_REMAINING,
    keys::SOUND_OFF,
];

/// Per-start overrides: an explicit phase plus config changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StartOverrides {
    /// `Some(true)` starts a Focus phase; `Some(false)` a break phase
    /// (which kind follows the long-break rule); `None` keeps the current
    /// phase.
    pub is_focus: Option<bool>,
    pub config: ConfigOverrides,
}

impl StartOverrides {
    pub fn phase(is_focus: bool) -> Self {
        Self {
            is_focus: Some(is_focus),
            ..Self::default()
        }
    }
}

/// Result of a `start` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A countdown is now running and needs a driver.
    Started,
    /// A countdown was already scheduled; the call was a no-op.
    AlreadyRunning,
}

/// Result of a `tick` call while a countdown is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Running {
        seconds_remaining: u64,
    },
    /// The phase expired; state has flipped to the next phase and the
    /// driver should auto-chain into it after a short settle delay.
    PhaseComplete {
        next_is_focus: bool,
    },
}

/// Read-only view of the engine for display clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub is_active: bool,
    pub is_running: bool,
    pub phase: SessionPhase,
    pub phase_label: &'static str,
    pub completed_focus_count: u32,
    pub seconds_remaining: u64,
    pub total_seconds_for_phase: u64,
    pub deadline_epoch_ms: u64,
    pub progress: f64,
}

/// Single authoritative owner of the session state.
///
/// Exactly one exists per process. All mutation funnels through the command
/// methods and `tick()`; display clients only observe via broadcasts and
/// snapshots.
pub struct SessionEngine {
    state: SessionState,
    config: SessionConfig,
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    events: broadcast::Sender<Broadcast>,
}

impl SessionEngine {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, notifier: Arc<dyn Notifier>) -> Self {
        let (events, _) = broadcast::channel(64);
        let config = match store.get(&ALL_KEYS) {
            Ok(entries) => SessionConfig::from_entries(&entries),
            Err(e) => {
                warn!(target: "pomodorino::engine", "config load failed, using defaults: {e}");
                SessionConfig::default()
            }
        };
        Self {
            state: SessionState::rest(),
            config,
            store,
            clock,
            notifier,
            events,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Broadcast> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            is_active: self.state.is_active,
            is_running: self.state.is_running,
            phase: self.state.phase,
            phase_label: self.state.phase.label(),
            completed_focus_count: self.state.completed_focus_count,
            seconds_remaining: self.state.seconds_remaining,
            total_seconds_for_phase: self.state.total_seconds_for_phase,
            deadline_epoch_ms: self.state.deadline_epoch_ms,
            progress: self.state.progress(),
        }
    }

    /// The persisted session as another process left it, with remaining
    /// time recovered from the stored deadline when it was running.
    pub fn persisted(&self) -> (SessionConfig, SessionState) {
        let entries = match self.store.get(&ALL_KEYS) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(target: "pomodorino::engine", "store read failed: {e}");
                Default::default()
            }
        };
        let config = SessionConfig::from_entries(&entries);
        let mut state = SessionState::from_entries(&entries);
        state.total_seconds_for_phase = config.duration_secs(state.phase);
        if state.is_running {
            state.seconds_remaining =
                round_secs(state.deadline_epoch_ms.saturating_sub(self.clock.now_ms()));
        }
        (config, state)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Message-level entry point. For `startPomodoro` the resume flag is
    /// decided here: resume iff this process has no active session but the
    /// store says one exists (the host restarted mid-session).
    pub fn handle(&mut self, command: Command) -> Ack {
        match &command {
            Command::StartPomodoro { .. } => {
                let resume = !self.state.is_active && self.persisted_is_active();
                match self.start(resume, command.start_overrides()) {
                    StartOutcome::Started if resume => Ack::new("Pomodoro resumed"),
                    StartOutcome::Started => Ack::new("Pomodoro started"),
                    StartOutcome::AlreadyRunning => Ack::new("Pomodoro already running"),
                }
            }
            Command::StopPomodoro => self.stop(),
            Command::ResetPomodoro => {
                self.reset();
                Ack::new("Pomodoro reset")
            }
        }
    }

    /// Start (or resume, or continue) the session.
    ///
    /// No-op when a countdown is already scheduled. A fresh start (no
    /// session in progress) applies `overrides`; a paused session in
    /// progress ignores them and simply continues - duplicate start
    /// commands are idempotent.
    pub fn start(&mut self, resume: bool, overrides: StartOverrides) -> StartOutcome {
        if self.state.is_running {
            return StartOutcome::AlreadyRunning;
        }

        if resume {
            let (config, mut state) = self.persisted();
            // The countdown is not scheduled in this process yet.
            state.is_running = false;
            self.config = config;
            self.state = state;
        } else if self.state.seconds_remaining == 0 {
            self.config.apply(&overrides.config);
            self.persist(&self.config.to_entries());
            match overrides.is_focus {
                Some(true) => self.state.phase = SessionPhase::Focus,
                Some(false) if self.state.phase.is_focus() => {
                    self.state.phase = SessionPhase::break_after(
                        self.state.completed_focus_count,
                        self.config.pomodoros_before_long_break,
                    );
                }
                _ => {}
            }
            self.state.total_seconds_for_phase = self.config.duration_secs(self.state.phase);
            self.state.seconds_remaining = self.state.total_seconds_for_phase;
        }

        if self.state.total_seconds_for_phase == 0 {
            // Paused by an earlier process; rebuild the display total.
            self.state.total_seconds_for_phase = self.config.duration_secs(self.state.phase);
        }

        self.state.is_active = true;
        self.state.is_running = true;
        self.state.deadline_epoch_ms = self
            .clock
            .now_ms()
            .saturating_add(self.state.seconds_remaining.saturating_mul(1000));
        self.persist(&self.state.to_entries());
        self.broadcast_display();
        StartOutcome::Started
    }

    /// Advance the countdown by recomputing remaining time from the
    /// deadline. Call roughly once per second while running.
    pub fn tick(&mut self) -> Option<TickOutcome> {
        if !self.state.is_running {
            return None;
        }
        let remaining = round_secs(
            self.state
                .deadline_epoch_ms
                .saturating_sub(self.clock.now_ms()),
        );
        self.state.seconds_remaining = remaining;
        self.persist(&[(keys::SECONDS_REMAINING, json!(remaining))]);
        self.broadcast_display();
        if remaining > 0 {
            return Some(TickOutcome::Running {
                seconds_remaining: remaining,
            });
        }

        // Countdown expired: the scheduled callback ends here.
        self.state.is_running = false;
        let finished = self.state.phase;
        if finished.is_focus() {
            self.state.completed_focus_count += 1;
            self.persist(&[(
                keys::COMPLETED_FOCUS_COUNT,
                json!(self.state.completed_focus_count),
            )]);
        }
        self.notify(finished.completion_message());
        if finished.is_focus() {
            self.broadcast(Broadcast::UpdateCompletedPomodoros {
                completed_focus_count: self.state.completed_focus_count,
                at: Utc::now(),
            });
        }
        self.state.phase = finished.next(
            self.state.completed_focus_count,
            self.config.pomodoros_before_long_break,
        );
        self.state.deadline_epoch_ms = 0;
        self.persist(&[
            (
                keys::PHASE,
                serde_json::to_value(self.state.phase).unwrap_or(json!("focus")),
            ),
            (keys::SECONDS_REMAINING, json!(0)),
            (keys::IS_RUNNING, json!(false)),
            (keys::DEADLINE_EPOCH_MS, json!(0)),
        ]);
        Some(TickOutcome::PhaseComplete {
            next_is_focus: self.state.phase.is_focus(),
        })
    }

    /// Pause the countdown, keeping the session resumable.
    ///
    /// Idempotent: stopping with no running countdown is a no-op.
    pub fn stop(&mut self) -> Ack {
        if !self.state.is_running {
            return Ack::new("Pomodoro not running");
        }
        self.state.seconds_remaining = round_secs(
            self.state
                .deadline_epoch_ms
                .saturating_sub(self.clock.now_ms()),
        );
        self.state.is_running = false;
        self.persist(&[
            (keys::SECONDS_REMAINING, json!(self.state.seconds_remaining)),
            (keys::IS_RUNNING, json!(false)),
        ]);
        Ack::new("Pomodoro stopped")
    }

    /// Return to the canonical rest state.
    ///
    /// Idempotent: resetting an idle session still re-broadcasts.
    pub fn reset(&mut self) {
        self.state = SessionState::rest();
        self.persist(&self.state.to_entries());
        self.broadcast_display();
        self.broadcast(Broadcast::QueryStorageAndUpdateUi { at: Utc::now() });
        self.notify("Pomodoro timer has been reset.");
    }

    /// Apply configuration changes outside of a start command.
    pub fn update_config(&mut self, overrides: &ConfigOverrides) {
        self.config.apply(overrides);
        self.persist(&self.config.to_entries());
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn persisted_is_active(&self) -> bool {
        match self.store.get(&[keys::IS_ACTIVE]) {
            Ok(entries) => entries
                .get(keys::IS_ACTIVE)
                .and_then(serde_json::Value::as_bool)
                .unwrap_or(false),
            Err(e) => {
                debug!(target: "pomodorino::engine", "store read failed: {e}");
                false
            }
        }
    }

    fn notify(&self, message: &str) {
        self.notifier.alert(message);
        if !self.config.sound_off {
            self.notifier.play_sound();
        }
    }

    /// Fire-and-forget write. In-memory state stays authoritative; a
    /// failed write only costs cross-restart recovery until the next one
    /// succeeds.
    fn persist(&self, entries: &[(&str, serde_json::Value)]) {
        if let Err(e) = self.store.set(entries) {
            warn!(target: "pomodorino::engine", "store write failed: {e}");
        }
    }

    fn broadcast_display(&self) {
        self.broadcast(Broadcast::UpdateTimerDisplay {
            seconds_remaining: self.state.seconds_remaining,
            is_active: self.state.is_active,
            phase: self.state.phase,
            total_seconds_for_phase: self.state.total_seconds_for_phase,
            at: Utc::now(),
        });
    }

    fn broadcast(&self, broadcast: Broadcast) {
        // A send error means no display client is listening, which is
        // expected whenever the popup is closed.
        let _ = self.events.send(broadcast);
    }
}

/// Milliseconds to whole seconds, rounded to nearest, floored at zero.
fn round_secs(ms: u64) -> u64 {
    (ms + 500) / 1000
}
