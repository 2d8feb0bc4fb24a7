use std::io::Write;
use std::sync::Arc;

use clap::{Args, Subcommand};
use pomodorino_core::{
    Broadcast, Command, SessionEngine, SessionService, Snapshot, SqliteStore, StartOverrides,
    SystemClock,
};

use crate::notifier::DesktopNotifier;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start or resume the session; the deadline is persisted so any later
    /// invocation recovers the remaining time
    Start {
        #[command(flatten)]
        args: StartArgs,
    },
    /// Drive the countdown in the foreground, rendering display updates
    /// until Ctrl-C
    Run {
        #[command(flatten)]
        args: StartArgs,
    },
    /// Pause the countdown, keeping the session resumable
    Stop,
    /// Return the timer to its rest state
    Reset,
    /// Print the persisted session state as JSON
    Status,
}

#[derive(Args)]
pub struct StartArgs {
    /// Start a focus phase
    #[arg(long)]
    focus: bool,
    /// Start a break phase
    #[arg(long = "break", conflicts_with = "focus")]
    break_: bool,
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
}

impl StartArgs {
    fn command(&self) -> Command {
        Command::StartPomodoro {
            is_focus: if self.focus {
                Some(true)
            } else if self.break_ {
                Some(false)
            } else {
                None
            },
            focus_duration: self.focus_duration,
            break_duration: self.break_duration,
            long_break_duration: self.long_break_duration,
            pomodoros_before_long_break: self.pomodoros_before_long_break,
        }
    }
}

fn open_engine() -> Result<SessionEngine, Box<dyn std::error::Error>> {
    let store = Arc::new(SqliteStore::open()?);
    Ok(SessionEngine::new(
        store,
        Arc::new(SystemClock),
        Arc::new(DesktopNotifier::new()),
    ))
}

/// Badge-style clock text, `M:SS`.
fn format_clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

fn persisted_snapshot(engine: &SessionEngine) -> Snapshot {
    let (_, state) = engine.persisted();
    Snapshot {
        is_active: state.is_active,
        is_running: state.is_running,
        phase: state.phase,
        phase_label: state.phase.label(),
        completed_focus_count: state.completed_focus_count,
        seconds_remaining: state.seconds_remaining,
        total_seconds_for_phase: state.total_seconds_for_phase,
        deadline_epoch_ms: state.deadline_epoch_ms,
        progress: state.progress(),
    }
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TimerAction::Start { args } => {
            let mut engine = open_engine()?;
            let ack = engine.handle(args.command());
            println!("{}", ack.status);
            println!("{}", serde_json::to_string_pretty(&engine.snapshot())?);
        }
        TimerAction::Run { args } => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(run_session(args))?;
        }
        TimerAction::Stop => {
            let mut engine = open_engine()?;
            let (_, state) = engine.persisted();
            if state.is_running {
                // Another invocation left the countdown armed; bring it
                // into this process so stop records the recovered time.
                engine.start(true, StartOverrides::default());
            }
            let ack = engine.handle(Command::StopPomodoro);
            println!("{}", ack.status);
        }
        TimerAction::Reset => {
            let mut engine = open_engine()?;
            let ack = engine.handle(Command::ResetPomodoro);
            println!("{}", ack.status);
        }
        TimerAction::Status => {
            let engine = open_engine()?;
            println!(
                "{}",
                serde_json::to_string_pretty(&persisted_snapshot(&engine))?
            );
        }
    }
    Ok(())
}

async fn run_session(args: StartArgs) -> Result<(), Box<dyn std::error::Error>> {
    let service = SessionService::new(open_engine()?);
    let mut events = service.subscribe();

    let ack = service.handle(args.command());
    println!("{}", ack.status);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                let ack = service.handle(Command::StopPomodoro);
                println!("\n{}", ack.status);
                break;
            }
            event = events.recv() => match event {
                Ok(Broadcast::UpdateTimerDisplay {
                    seconds_remaining,
                    phase,
                    total_seconds_for_phase,
                    is_active,
                    ..
                }) => {
                    if is_active {
                        let pct = if total_seconds_for_phase == 0 {
                            0.0
                        } else {
                            100.0 * (1.0 - seconds_remaining as f64 / total_seconds_for_phase as f64)
                        };
                        print!(
                            "\r[{}] {} ({pct:3.0}%)  ",
                            phase.label(),
                            format_clock(seconds_remaining)
                        );
                        let _ = std::io::stdout().flush();
                    }
                }
                Ok(Broadcast::UpdateCompletedPomodoros { completed_focus_count, .. }) => {
                    println!("\nCompleted pomodoros: {completed_focus_count}");
                }
                Ok(Broadcast::QueryStorageAndUpdateUi { .. }) => {
                    println!("\nTimer reset.");
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    }
    Ok(())
}
