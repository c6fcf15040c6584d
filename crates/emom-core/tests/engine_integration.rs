//! Integration tests for the interval session engine.
//!
//! Drives the engine with a manual clock one tick at a time and checks the
//! round, phase and event guarantees a presentation layer relies on.

use std::time::Duration;

use emom_core::timer::EngineStatus;
use emom_core::{
    tick_period, ActiveTimerSettings, Clock, Event, IntervalEngine, ManualClock, Phase,
};
use proptest::prelude::*;

fn start(settings: ActiveTimerSettings) -> (IntervalEngine<ManualClock>, ManualClock) {
    let clock = ManualClock::default();
    let engine = IntervalEngine::start(settings, clock.clone()).unwrap();
    (engine, clock)
}

/// Tick once per `step` until the engine ends or `max_ticks` is reached.
fn run(
    engine: &mut IntervalEngine<ManualClock>,
    clock: &ManualClock,
    step: Duration,
    max_ticks: usize,
) -> (usize, Vec<Event>) {
    let mut events = Vec::new();
    let mut ticks = 0;
    while engine.outcome().is_none() && ticks < max_ticks {
        clock.advance(step);
        events.extend(engine.tick());
        ticks += 1;
    }
    (ticks, events)
}

fn count(events: &[Event], name: &str) -> usize {
    events.iter().filter(|e| e.name() == name).count()
}

#[test]
fn thirty_thirty_two_rounds_visits_phases_in_order() {
    let (mut engine, clock) = start(ActiveTimerSettings::new(30, 30, 2));
    let mut trace = Vec::new();
    let mut events = Vec::new();

    while engine.outcome().is_none() {
        clock.advance_secs(1);
        events.extend(engine.tick());
        trace.push((engine.current_round(), engine.phase(), engine.remaining_ms() / 1000));
    }

    assert_eq!(trace.len(), 120);
    // Counts down 29..1 within work, then reloads rest at the boundary.
    assert_eq!(trace[0], (1, Phase::Work, 29));
    assert_eq!(trace[28], (1, Phase::Work, 1));
    assert_eq!(trace[29], (1, Phase::Rest, 30));
    assert_eq!(trace[58], (1, Phase::Rest, 1));
    assert_eq!(trace[59], (2, Phase::Work, 30));
    assert_eq!(trace[89], (2, Phase::Rest, 30));
    assert_eq!(engine.status(), EngineStatus::Finished);

    let order: Vec<_> = events
        .iter()
        .map(|e| match e {
            Event::PhaseChanged { phase, round, .. } => format!("{phase:?}@{round}"),
            Event::RoundAdvanced { round, .. } => format!("round{round}"),
            other => other.name().to_string(),
        })
        .collect();
    assert_eq!(order, ["Rest@1", "round2", "Work@2", "Rest@2", "finished"]);
    assert_eq!(count(&events, "round_advanced"), 1);
    assert_eq!(count(&events, "finished"), 1);
}

#[test]
fn no_rest_split_finishes_after_rounds() {
    let (mut engine, clock) = start(ActiveTimerSettings::new(60, 0, 5));
    let (ticks, events) = run(&mut engine, &clock, Duration::from_secs(1), 10_000);
    assert_eq!(ticks, 300);
    assert_eq!(count(&events, "round_advanced"), 4);
    assert_eq!(count(&events, "phase_changed"), 0);
    assert!(matches!(
        events.last(),
        Some(Event::Finished { rounds_completed: 5, elapsed_ms: 300_000, .. })
    ));
}

#[test]
fn infinite_mode_never_finishes() {
    let (mut engine, clock) = start(ActiveTimerSettings::new(1, 1, 1).infinite());
    let (ticks, events) = run(&mut engine, &clock, Duration::from_secs(1), 10_000);
    assert_eq!(ticks, 10_000);
    assert!(engine.outcome().is_none());
    assert_eq!(count(&events, "finished"), 0);
    assert_eq!(engine.current_round(), 5_001);
}

#[test]
fn finish_event_is_emitted_once() {
    let (mut engine, clock) = start(ActiveTimerSettings::new(5, 0, 1));
    clock.advance_secs(5);
    assert_eq!(count(&engine.tick(), "finished"), 1);
    for _ in 0..10 {
        clock.advance_secs(1);
        assert!(engine.tick().is_empty());
    }
}

#[test]
fn speed_up_reaches_same_state_in_quarter_ticks() {
    let settings = ActiveTimerSettings::new(40, 20, 3);
    let (mut normal, normal_clock) = start(settings);
    let (mut fast, fast_clock) = start(settings.with_speed_multiplier(4));

    let (normal_ticks, _) = run(&mut normal, &normal_clock, Duration::from_secs(1), 10_000);
    let (fast_ticks, _) = run(&mut fast, &fast_clock, Duration::from_secs(1), 10_000);

    assert_eq!(fast_ticks * 4, normal_ticks);
    assert_eq!(fast.state(), normal.state());
    assert_eq!(fast.rounds_completed(), normal.rounds_completed());
    assert_eq!(fast.elapsed_ms(), normal.elapsed_ms());
}

#[test]
fn speed_up_at_shortened_period_is_four_times_faster_in_wall_time() {
    let settings = ActiveTimerSettings::new(30, 30, 2).with_speed_multiplier(4);
    let (mut engine, clock) = start(settings);
    let wall_start = clock.now();

    let period = tick_period(Duration::from_secs(1), 4);
    let (ticks, _) = run(&mut engine, &clock, period, 10_000);

    assert_eq!(ticks, 120);
    assert_eq!((clock.now() - wall_start).num_seconds(), 30);
    assert_eq!(engine.status(), EngineStatus::Finished);
}

#[test]
fn backgrounded_process_catches_up_on_next_tick() {
    let (mut engine, clock) = start(ActiveTimerSettings::new(30, 30, 3));
    clock.advance_secs(95);
    let events = engine.tick();
    assert_eq!(engine.current_round(), 2);
    assert_eq!(engine.phase(), Phase::Rest);
    assert_eq!(engine.remaining_ms(), 25_000);
    assert_eq!(count(&events, "round_advanced"), 1);

    clock.advance_secs(3_600);
    let events = engine.tick();
    assert_eq!(count(&events, "finished"), 1);
    assert_eq!(engine.elapsed_ms(), 180_000);
}

proptest! {
    #[test]
    fn finite_sessions_finish_after_exactly_total_rounds(
        work in 1u32..=60,
        rest in 0u32..=30,
        rounds in 1u32..=8,
    ) {
        let (mut engine, clock) = start(ActiveTimerSettings::new(work, rest, rounds));
        let (ticks, events) = run(&mut engine, &clock, Duration::from_secs(1), 100_000);

        prop_assert_eq!(engine.status(), EngineStatus::Finished);
        prop_assert_eq!(engine.rounds_completed(), rounds);
        prop_assert_eq!(ticks as u32, rounds * (work + rest));
        prop_assert_eq!(count(&events, "round_advanced") as u32, rounds - 1);
        prop_assert_eq!(count(&events, "finished"), 1);
        let expected_phase_changes = if rest > 0 { 2 * rounds - 1 } else { 0 };
        prop_assert_eq!(count(&events, "phase_changed") as u32, expected_phase_changes);
    }

    #[test]
    fn pause_freezes_and_resume_loses_no_time(
        before in 0u64..100,
        paused_ticks in 0usize..50,
        after in 0u64..100,
    ) {
        let settings = ActiveTimerSettings::new(45, 15, 10);
        let (mut engine, clock) = start(settings);
        let (mut reference, ref_clock) = start(settings);

        clock.advance_secs(before);
        engine.tick();
        engine.pause().unwrap();
        let frozen = (engine.current_round(), engine.phase(), engine.remaining_ms());

        for _ in 0..paused_ticks {
            clock.advance_secs(7);
            prop_assert!(engine.tick().is_empty());
        }
        prop_assert_eq!(
            (engine.current_round(), engine.phase(), engine.remaining_ms()),
            frozen
        );

        engine.resume().unwrap();
        clock.advance_secs(after);
        engine.tick();

        ref_clock.advance_secs(before + after);
        reference.tick();
        prop_assert_eq!(engine.state(), reference.state());
        prop_assert_eq!(engine.elapsed_ms(), reference.elapsed_ms());
    }
}
