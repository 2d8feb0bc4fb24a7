mod command;
mod engine;
mod service;
mod state;

pub use command::{Ack, Command};
pub use engine::{SessionEngine, Snapshot, StartOutcome, StartOverrides, TickOutcome};
pub use service::SessionService;
pub use state::{SessionPhase, SessionState};
