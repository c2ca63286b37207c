use std::time::Duration;

use prefire_core::{AudioReadiness, BestStats, Command, Event, Phase, Quarter, TrialId};
use prefire_world::{self as world, query, Config, TimerKind, World};

fn run(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);
    events
}

fn tick(world: &mut World, millis: u64) -> Vec<Event> {
    run(
        world,
        Command::Tick {
            dt: Duration::from_millis(millis),
        },
    )
}

fn ready_world(seed: u64) -> World {
    let config = Config {
        rng_seed: seed,
        ..Config::default()
    };
    let mut world = World::new(config, BestStats::default());
    let _ = run(
        &mut world,
        Command::SetAudioReadiness {
            readiness: AudioReadiness::Ready,
        },
    );
    world
}

/// Finds a seed whose first trial targets the requested quarter, with the trial open.
fn world_with_first_quarter(quarter: Quarter) -> World {
    for seed in 0..256 {
        let mut world = ready_world(seed);
        let _ = tick(&mut world, 1);
        if query::trial(&world).map(|trial| trial.quarter) == Some(quarter) {
            return world;
        }
    }
    panic!("no seed opened a trial in {quarter}");
}

fn event_resolves(event: &Event, id: TrialId) -> bool {
    matches!(event, Event::TrialResolved { trial, .. } if *trial == id)
}

fn cue_window_deadline(world: &World) -> Option<Duration> {
    query::armed_timers(world)
        .into_iter()
        .find(|timer| timer.kind == TimerKind::CueWindowElapsed)
        .map(|timer| timer.deadline)
}

#[test]
fn pause_mid_cue_restarts_tones_and_full_window() {
    let quarter = Quarter::new(2).expect("valid quarter");
    let mut world = world_with_first_quarter(quarter);
    let _ = tick(&mut world, 2000);
    assert_eq!(query::phase(&world), Phase::WithinCuePhase);

    let _ = tick(&mut world, 3000);
    let paused = run(&mut world, Command::TogglePause);
    assert!(paused.contains(&Event::CueStopped));
    assert!(paused.contains(&Event::AudioSuspended));
    assert!(paused.contains(&Event::PauseChanged { paused: true }));
    assert!(
        query::armed_timers(&world).is_empty(),
        "pause clears every timer"
    );

    let snapshot = query::pause_snapshot(&world).expect("snapshot captured");
    assert!(snapshot.within_cue_phase);
    assert_eq!(snapshot.quarter, Some(quarter));

    let idle = tick(&mut world, 60_000);
    assert_eq!(idle.len(), 1, "a paused world only reports elapsed time");
    assert!(run(&mut world, Command::Fire).is_empty());

    let resumed = run(&mut world, Command::Resume);
    assert!(resumed.contains(&Event::CueStarted { quarter }));
    assert!(resumed.contains(&Event::AudioResumed));
    assert!(query::pause_snapshot(&world).is_none(), "snapshot consumed");
    assert_eq!(
        cue_window_deadline(&world),
        Some(query::clock(&world) + Duration::from_millis(4000)),
        "the window restarts from zero"
    );

    let _ = tick(&mut world, 3999);
    assert_eq!(query::phase(&world), Phase::WithinCuePhase);
    let spawned = tick(&mut world, 1);
    assert!(spawned.contains(&Event::AdversarySpawned { quarter }));
}

#[test]
fn repeated_pause_cycles_arm_a_single_window() {
    let mut world = ready_world(7);
    let _ = tick(&mut world, 1);
    let _ = tick(&mut world, 2000);

    for _ in 0..3 {
        let _ = run(&mut world, Command::TogglePause);
        let _ = run(&mut world, Command::TogglePause);
    }
    let timers = query::armed_timers(&world);
    assert_eq!(timers.len(), 1);
    assert_eq!(timers[0].kind, TimerKind::CueWindowElapsed);

    assert!(
        run(&mut world, Command::Resume).is_empty(),
        "resume without pause is ignored"
    );
    assert_eq!(query::armed_timers(&world).len(), 1);
}

#[test]
fn pause_during_pre_cue_abandons_and_restarts_trial() {
    let mut world = ready_world(11);
    let _ = tick(&mut world, 1);
    let first = query::trial(&world).expect("open trial").id;
    let _ = tick(&mut world, 500);

    let _ = run(&mut world, Command::TogglePause);
    let snapshot = query::pause_snapshot(&world).expect("snapshot captured");
    assert!(!snapshot.within_cue_phase);
    assert!(snapshot.had_reaction_waiting);

    let resumed = run(&mut world, Command::TogglePause);
    assert!(resumed.contains(&Event::TrialAbandoned { trial: first }));
    let second = query::trial(&world).expect("fresh trial").id;
    assert_ne!(first, second);
    assert_eq!(query::phase(&world), Phase::PreCueNoise);
    assert_eq!(
        query::session(&world).total_trials,
        0,
        "abandoned trials are not counted"
    );

    let mut log = tick(&mut world, 1999);
    assert_eq!(query::phase(&world), Phase::PreCueNoise);
    log.extend(tick(&mut world, 1));
    assert_eq!(query::phase(&world), Phase::WithinCuePhase);
    assert!(log
        .iter()
        .any(|event| matches!(event, Event::CueStarted { .. })));
}

#[test]
fn pause_during_feedback_folds_trial_exactly_once() {
    let mut world = ready_world(3);
    let _ = tick(&mut world, 1);
    let _ = tick(&mut world, 2000);
    let trial = query::trial(&world).expect("open trial");
    let _ = run(
        &mut world,
        Command::SelectQuarter {
            quarter: trial.quarter,
        },
    );
    let _ = run(&mut world, Command::Fire);
    assert_eq!(query::phase(&world), Phase::Resolving);

    let _ = run(&mut world, Command::TogglePause);
    let mut log = run(&mut world, Command::TogglePause);
    for _ in 0..100 {
        log.extend(tick(&mut world, 100));
    }

    let resolutions = log
        .iter()
        .filter(|event| event_resolves(event, trial.id))
        .count();
    assert_eq!(resolutions, 1);
    assert!(log.contains(&Event::TrialResolved {
        trial: trial.id,
        hit: true,
        total_trials: 1,
        correct_prefires: 1,
    }));
}

#[test]
fn pause_with_adversary_in_flight_resumes_descent() {
    let mut world = ready_world(5);
    let _ = tick(&mut world, 1);
    let _ = tick(&mut world, 2000);
    let _ = tick(&mut world, 4000);
    let before = query::adversary(&world).expect("adversary spawned");

    let _ = run(&mut world, Command::TogglePause);
    let snapshot = query::pause_snapshot(&world).expect("snapshot captured");
    assert!(!snapshot.within_cue_phase);
    assert!(!snapshot.had_reaction_waiting);

    let _ = tick(&mut world, 10_000);
    assert_eq!(
        query::adversary(&world),
        Some(before),
        "frozen while paused"
    );

    let resumed = run(&mut world, Command::TogglePause);
    assert!(!resumed
        .iter()
        .any(|event| matches!(event, Event::TrialAbandoned { .. })));
    assert_eq!(query::phase(&world), Phase::ReactionWindow);

    let _ = tick(&mut world, 16);
    let after = query::adversary(&world).expect("adversary still descending");
    assert!(after.position.y > before.position.y);
}
