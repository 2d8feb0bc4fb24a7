//! Property tests for phase alternation and long-break selection.

use std::sync::Arc;

use proptest::prelude::*;

use pomodorino_core::{
    ConfigOverrides, LogNotifier, ManualClock, MemoryStore, SessionEngine, SessionPhase,
    StartOverrides, TickOutcome,
};

fn run_cycles(
    pomodoros_before_long_break: u32,
    cycles: u32,
) -> Vec<SessionPhase> {
    let clock = Arc::new(ManualClock::new(0));
    let store = Arc::new(MemoryStore::new());
    let mut engine =
        SessionEngine::new(
            Arc::<MemoryStore>::clone(&store),
            Arc::<ManualClock>::clone(&clock),
            Arc::new(LogNotifier),
        );

    let mut phases = Vec::new();
    engine.start(
        false,
        StartOverrides {
            is_focus: Some(true),
            config: ConfigOverrides {
                focus_duration_minutes: Some(1.0),
                break_duration_minutes: Some(1.0),
                long_break_duration_minutes: Some(1.0),
                pomodoros_before_long_break: Some(pomodoros_before_long_break),
                sound_off: None,
            },
        },
    );
    phases.push(engine.state().phase);

    // Each cycle is one natural expiration followed by the auto-chain.
    for _ in 0..cycles {
        loop {
            clock.advance_secs(1);
            match engine.tick() {
                Some(TickOutcome::Running { .. }) => {}
                Some(TickOutcome::PhaseComplete { next_is_focus }) => {
                    engine.start(false, StartOverrides::phase(next_is_focus));
                    phases.push(engine.state().phase);
                    break;
                }
                None => unreachable!("countdown stopped without completing"),
            }
        }
    }
    phases
}

proptest! {
    #[test]
    fn phases_strictly_alternate(n in 1u32..=8, cycles in 1u32..=24) {
        let phases = run_cycles(n, cycles);
        for pair in phases.windows(2) {
            match pair[0] {
                SessionPhase::Focus => prop_assert!(pair[1] != SessionPhase::Focus),
                SessionPhase::Break | SessionPhase::LongBreak => {
                    prop_assert_eq!(pair[1], SessionPhase::Focus)
                }
            }
        }
    }

    #[test]
    fn long_break_exactly_on_multiples(n in 1u32..=8, cycles in 1u32..=24) {
        let phases = run_cycles(n, cycles);
        let mut completed: u32 = 0;
        for pair in phases.windows(2) {
            if pair[0] == SessionPhase::Focus {
                completed += 1;
                let expected = if completed % n == 0 {
                    SessionPhase::LongBreak
                } else {
                    SessionPhase::Break
                };
                prop_assert_eq!(pair[1], expected);
            }
        }
    }

    #[test]
    fn countdown_never_goes_negative(seconds in 1u64..=120, overshoot in 0u64..=600) {
        let clock = Arc::new(ManualClock::new(0));
        let store = Arc::new(MemoryStore::new());
        let mut engine =
            SessionEngine::new(
            Arc::<MemoryStore>::clone(&store),
            Arc::<ManualClock>::clone(&clock),
            Arc::new(LogNotifier),
        );
        engine.start(
            false,
            StartOverrides {
                is_focus: Some(true),
                config: ConfigOverrides {
                    focus_duration_minutes: Some(seconds as f64 / 60.0),
                    ..Default::default()
                },
            },
        );

        // One giant suspension past the deadline: remaining floors at zero.
        clock.advance_secs(seconds + overshoot);
        engine.tick();
        prop_assert_eq!(engine.state().seconds_remaining, 0);
    }
}
