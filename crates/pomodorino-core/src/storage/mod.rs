//! Persistent key-value storage.
//!
//! Session state and configuration survive host restarts through a flat
//! key-value namespace. The engine treats the store as an external
//! capability with `get`/`set`/`clear` semantics and never blocks the
//! countdown on it: write failures are logged and swallowed.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::collections::HashMap;
use std::path::PathBuf;

use serde_json::Value;

use crate::error::StoreError;

/// Flat keys of the persisted layout. Wire names are the storage contract;
/// every key is independently readable and writable.
pub mod keys {
    pub const FOCUS_DURATION_MINUTES: &str = "focusDurationMinutes";
    pub const BREAK_DURATION_MINUTES: &str = "breakDurationMinutes";
    pub const LONG_BREAK_DURATION_MINUTES: &str = "longBreakDurationMinutes";
    pub const POMODOROS_BEFORE_LONG_BREAK: &str = "pomodorosBeforeLongBreak";
    pub const COMPLETED_FOCUS_COUNT: &str = "completedFocusCount";
    pub const IS_ACTIVE: &str = "isActive";
    pub const IS_RUNNING: &str = "isRunning";
    pub const DEADLINE_EPOCH_MS: &str = "deadlineEpochMs";
    pub const PHASE: &str = "phase";
    pub const SECONDS_REMAINING: &str = "secondsRemaining";
    pub const SOUND_OFF: &str = "soundOff";
}

/// Eventually-durable key-value store.
///
/// Writes are fire-and-forget from the engine's point of view; absent keys
/// are simply missing from the returned map.
pub trait Store: Send + Sync {
    fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>, StoreError>;
    fn set(&self, entries: &[(&str, Value)]) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

/// Returns `~/.config/pomodorino[-dev]/` based on POMODORINO_ENV.
///
/// Set POMODORINO_ENV=dev to use a development data directory, or
/// POMODORINO_DATA_DIR to point somewhere else entirely (tests).
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = if let Ok(explicit) = std::env::var("POMODORINO_DATA_DIR") {
        PathBuf::from(explicit)
    } else {
        let base_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config");
        let env = std::env::var("POMODORINO_ENV").unwrap_or_else(|_| "production".to_string());
        if env == "dev" {
            base_dir.join("pomodorino-dev")
        } else {
            base_dir.join("pomodorino")
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
