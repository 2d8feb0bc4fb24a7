//! End-to-end session flows against simulated time.
//!
//! These drive the engine the way the countdown task does: advance the
//! clock one second, tick, repeat, and perform the auto-chain handoff by
//! hand when a phase completes.

use std::sync::Arc;

use pomodorino_core::{
    Broadcast, Command, ConfigOverrides, LogNotifier, ManualClock, MemoryStore, SessionEngine,
    SessionPhase, StartOverrides, TickOutcome,
};

fn engine(clock: &Arc<ManualClock>, store: &Arc<MemoryStore>) -> SessionEngine {
    SessionEngine::new(
        Arc::<MemoryStore>::clone(store),
        Arc::<ManualClock>::clone(clock),
        Arc::new(LogNotifier),
    )
}

fn classic() -> StartOverrides {
    StartOverrides {
        is_focus: Some(true),
        config: ConfigOverrides {
            focus_duration_minutes: Some(25.0),
            break_duration_minutes: Some(5.0),
            long_break_duration_minutes: Some(15.0),
            pomodoros_before_long_break: Some(4),
            sound_off: None,
        },
    }
}

/// Tick second-by-second until the phase completes, returning how many
/// seconds elapsed.
fn run_phase_to_completion(engine: &mut SessionEngine, clock: &ManualClock) -> u64 {
    let mut elapsed = 0;
    loop {
        clock.advance_secs(1);
        elapsed += 1;
        match engine.tick() {
            Some(TickOutcome::Running { .. }) => {}
            Some(TickOutcome::PhaseComplete { .. }) => return elapsed,
            None => panic!("countdown stopped unexpectedly"),
        }
    }
}

#[test]
fn scenario_a_focus_completes_into_break() {
    let clock = Arc::new(ManualClock::new(0));
    let store = Arc::new(MemoryStore::new());
    let mut engine = engine(&clock, &store);

    engine.start(false, classic());
    let elapsed = run_phase_to_completion(&mut engine, &clock);
    assert_eq!(elapsed, 1500);
    assert_eq!(engine.state().phase, SessionPhase::Break);
    assert_eq!(engine.state().completed_focus_count, 1);

    // Auto-chain into the break.
    engine.start(false, StartOverrides::phase(false));
    assert_eq!(engine.state().total_seconds_for_phase, 300);
    assert_eq!(engine.state().seconds_remaining, 300);
}

#[test]
fn scenario_b_fourth_focus_earns_the_long_break() {
    let clock = Arc::new(ManualClock::new(0));
    let store = Arc::new(MemoryStore::new());
    let mut engine = engine(&clock, &store);

    engine.start(false, classic());
    for cycle in 1..=4 {
        run_phase_to_completion(&mut engine, &clock);
        assert_eq!(engine.state().completed_focus_count, cycle);
        if cycle < 4 {
            assert_eq!(engine.state().phase, SessionPhase::Break);
            engine.start(false, StartOverrides::phase(false));
            run_phase_to_completion(&mut engine, &clock);
            engine.start(false, StartOverrides::phase(true));
        }
    }

    assert_eq!(engine.state().phase, SessionPhase::LongBreak);
    engine.start(false, StartOverrides::phase(false));
    assert_eq!(engine.state().total_seconds_for_phase, 900);
}

#[test]
fn scenario_c_reset_mid_focus() {
    let clock = Arc::new(ManualClock::new(0));
    let store = Arc::new(MemoryStore::new());
    let mut engine = engine(&clock, &store);
    let mut events = engine.subscribe();

    engine.start(false, classic());
    for _ in 0..100 {
        clock.advance_secs(1);
        engine.tick();
    }
    engine.reset();

    let state = engine.state();
    assert!(!state.is_active);
    assert!(!state.is_running);
    assert_eq!(state.phase, SessionPhase::Focus);
    assert_eq!(state.seconds_remaining, 0);
    assert_eq!(state.completed_focus_count, 0);

    let mut saw_resync = false;
    while let Ok(event) = events.try_recv() {
        if matches!(event, Broadcast::QueryStorageAndUpdateUi { .. }) {
            saw_resync = true;
        }
    }
    assert!(saw_resync, "reset must emit a queryStorageAndUpdateUI broadcast");
}

#[test]
fn scenario_d_stop_then_resume_continues_the_countdown() {
    let clock = Arc::new(ManualClock::new(0));
    let store = Arc::new(MemoryStore::new());
    let mut engine = engine(&clock, &store);

    engine.start(false, classic());
    for _ in 0..600 {
        clock.advance_secs(1);
        engine.tick();
    }
    engine.stop();
    assert_eq!(engine.state().seconds_remaining, 900);

    // Resume in a fresh process.
    let mut engine = self::engine(&clock, &store);
    engine.start(true, StartOverrides::default());
    assert_eq!(engine.state().seconds_remaining, 900);
    assert!(engine.state().is_running);

    clock.advance_secs(1);
    assert_eq!(
        engine.tick(),
        Some(TickOutcome::Running {
            seconds_remaining: 899
        })
    );
}

#[test]
fn deadline_recovery_ignores_the_last_persisted_tick() {
    let clock = Arc::new(ManualClock::new(0));
    let store = Arc::new(MemoryStore::new());
    let mut engine = engine(&clock, &store);

    engine.start(false, classic());
    // A few ticks persist secondsRemaining, then the host sleeps without
    // any further ticks.
    for _ in 0..10 {
        clock.advance_secs(1);
        engine.tick();
    }
    clock.advance_secs(700);

    // New process: recovered time comes from the deadline, not from the
    // stale persisted counter (1490).
    let mut engine = self::engine(&clock, &store);
    let ack = engine.handle(Command::StartPomodoro {
        is_focus: None,
        focus_duration: None,
        break_duration: None,
        long_break_duration: None,
        pomodoros_before_long_break: None,
    });
    assert_eq!(ack.status, "Pomodoro resumed");
    assert_eq!(engine.state().seconds_remaining, 1500 - 710);
}

#[test]
fn display_broadcasts_follow_every_tick() {
    let clock = Arc::new(ManualClock::new(0));
    let store = Arc::new(MemoryStore::new());
    let mut engine = engine(&clock, &store);
    let mut events = engine.subscribe();

    engine.start(
        false,
        StartOverrides {
            is_focus: Some(true),
            config: ConfigOverrides {
                focus_duration_minutes: Some(0.05),
                ..Default::default()
            },
        },
    );
    for _ in 0..3 {
        clock.advance_secs(1);
        engine.tick();
    }

    let mut remaining_seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let Broadcast::UpdateTimerDisplay {
            seconds_remaining, ..
        } = event
        {
            remaining_seen.push(seconds_remaining);
        }
    }
    assert_eq!(remaining_seen, vec![3, 2, 1, 0]);
}
