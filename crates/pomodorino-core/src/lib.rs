//! # Pomodorino Core Library
//!
//! This library provides the core business logic for the Pomodorino
//! Pomodoro timer. All operations are available to any host; the bundled
//! CLI binary is a thin display client over the same core library.
//!
//! ## Architecture
//!
//! - **Session Engine**: a wall-clock-based state machine owning the one
//!   process-wide session; remaining time is derived from an absolute
//!   deadline so it survives host suspension
//! - **Session Service**: schedules the 1-second countdown task and the
//!   auto-chain handoff between phases
//! - **Storage**: SQLite-backed flat key-value persistence, fire-and-forget
//!   from the engine's point of view
//! - **Events**: best-effort broadcasts that display clients render
//!
//! ## Key Components
//!
//! - [`SessionEngine`]: core session state machine
//! - [`SessionService`]: countdown scheduling and command dispatch
//! - [`Store`]: persistence capability (SQLite and in-memory)
//! - [`Notifier`]: user-visible alerts and the completion chime

pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod notify;
pub mod session;
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigOverrides, SessionConfig};
pub use error::{ConfigError, CoreError, StoreError};
pub use events::Broadcast;
pub use notify::{LogNotifier, Notifier};
pub use session::{
    Ack, Command, SessionEngine, SessionPhase, SessionService, SessionState, Snapshot,
    StartOutcome, StartOverrides, TickOutcome,
};
pub use storage::{MemoryStore, SqliteStore, Store};
