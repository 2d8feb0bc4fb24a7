use std::sync::Arc;

use clap::Subcommand;
use pomodorino_core::{ConfigOverrides, LogNotifier, SessionEngine, SqliteStore, SystemClock};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the stored configuration as JSON
    Show,
    /// Update configuration values; invalid values are ignored
    Set {
        /// Focus duration in minutes
        #[arg(long)]
        focus_duration: Option<f64>,
        /// Break duration in minutes
        #[arg(long)]
        break_duration: Option<f64>,
        /// Long break duration in minutes
        #[arg(long)]
        long_break_duration: Option<f64>,
        /// Completed focus phases per long break
        #[arg(long)]
        pomodoros_before_long_break: Option<u32>,
        /// Mute the completion chime
        #[arg(long)]
        sound_off: Option<bool>,
    },
}

fn open_engine() -> Result<SessionEngine, Box<dyn std::error::Error>> {
    let store = Arc::new(SqliteStore::open()?);
    Ok(SessionEngine::new(
        store,
        Arc::new(SystemClock),
        Arc::new(LogNotifier),
    ))
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => {
            let engine = open_engine()?;
            let (config, _) = engine.persisted();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Set {
            focus_duration,
            break_duration,
            long_break_duration,
            pomodoros_before_long_break,
            sound_off,
        } => {
            let mut engine = open_engine()?;
            engine.update_config(&ConfigOverrides {
                focus_duration_minutes: focus_duration,
                break_duration_minutes: break_duration,
                long_break_duration_minutes: long_break_duration,
                pomodoros_before_long_break,
                sound_off,
            });
            println!("{}", serde_json::to_string_pretty(engine.config())?);
        }
    }
    Ok(())
}
