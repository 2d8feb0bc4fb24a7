//! Countdown driver for the session engine.
//!
//! The engine itself is tick-driven; this service owns the single
//! scheduled countdown task and the auto-chain handoff between phases.
//! At most one ticker exists at a time - a presence check on the stored
//! task handle prevents double-scheduling, and `stop`/`reset` abort
//! exactly the handle they find (tolerating its absence).

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

use super::command::{Ack, Command};
use super::engine::{SessionEngine, StartOutcome, TickOutcome};
use crate::events::Broadcast;

/// Cadence of the countdown callback.
const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Pause between a phase expiring and the next phase starting, so the
/// persistence write of the phase flip settles before the next
/// read-modify-write cycle begins.
const AUTO_CHAIN_DELAY: Duration = Duration::from_millis(500);

/// Drives a [`SessionEngine`] with a periodic tick task.
pub struct SessionService {
    engine: Arc<Mutex<SessionEngine>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl SessionService {
    pub fn new(engine: SessionEngine) -> Arc<Self> {
        Arc::new(Self {
            engine: Arc::new(Mutex::new(engine)),
            ticker: Mutex::new(None),
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Broadcast> {
        self.lock_engine().subscribe()
    }

    /// Run a closure against the engine, serialized with the ticker.
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut SessionEngine) -> R) -> R {
        f(&mut self.lock_engine())
    }

    /// Dispatch a raw wire message. Unrecognized actions are acknowledged
    /// with an "unknown action" status and change no state.
    pub fn dispatch(self: &Arc<Self>, request: &Value) -> Ack {
        match serde_json::from_value::<Command>(request.clone()) {
            Ok(command) => self.handle(command),
            Err(e) => {
                debug!(target: "pomodorino::service", "unrecognized message: {e}");
                Ack::unknown_action()
            }
        }
    }

    /// Handle a command, scheduling or cancelling the countdown as needed.
    pub fn handle(self: &Arc<Self>, command: Command) -> Ack {
        match command {
            Command::StartPomodoro { .. } => {
                let ack = self.lock_engine().handle(command);
                self.ensure_ticker();
                ack
            }
            Command::StopPomodoro => {
                let ack = self.lock_engine().handle(command);
                self.cancel_ticker();
                ack
            }
            Command::ResetPomodoro => {
                self.cancel_ticker();
                self.lock_engine().handle(command)
            }
        }
    }

    /// Whether a countdown task is currently scheduled.
    pub fn is_ticking(&self) -> bool {
        self.lock_ticker()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn lock_engine(&self) -> std::sync::MutexGuard<'_, SessionEngine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_ticker(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.ticker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Schedule the countdown task unless one is already scheduled.
    fn ensure_ticker(self: &Arc<Self>) {
        let mut slot = self.lock_ticker();
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }
        if !self.lock_engine().state().is_running {
            return;
        }

        let service = Arc::clone(self);
        *slot = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            // The immediate first fire would double up with the display
            // update `start` already broadcast.
            interval.tick().await;
            loop {
                interval.tick().await;
                let outcome = service.lock_engine().tick();
                match outcome {
                    None => break,
                    Some(TickOutcome::Running { .. }) => {}
                    Some(TickOutcome::PhaseComplete { next_is_focus }) => {
                        tokio::time::sleep(AUTO_CHAIN_DELAY).await;
                        let outcome = service.lock_engine().start(
                            false,
                            super::engine::StartOverrides::phase(next_is_focus),
                        );
                        if outcome != StartOutcome::Started {
                            break;
                        }
                        interval.reset();
                    }
                }
            }
        }));
    }

    fn cancel_ticker(&self) {
        if let Some(handle) = self.lock_ticker().take() {
            handle.abort();
        }
    }
}
