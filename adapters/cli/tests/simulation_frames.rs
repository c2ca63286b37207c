use std::time::Duration;

use prefire_audio::{AudioOutput, Sample, SampleBank, ScheduledSound, VirtualAudioOutput};
use prefire_cli::Simulation;
use prefire_core::{AudioReadiness, SoundEffect, Voice};
use prefire_persistence::{BestStatsRecorder, MemoryStore, PersistenceGateway};
use prefire_rendering::{FrameControl, FrameInput, KeyLayout, Overlay, RawKey};
use prefire_world::query;

const FRAME: Duration = Duration::from_millis(16);
const USER: &str = "p01";

fn ready_output() -> VirtualAudioOutput {
    let frames: Vec<f32> = (0..4410).map(|n| (n as f32 * 0.06).sin()).collect();
    VirtualAudioOutput::with_bank(SampleBank::from_samples(vec![Sample {
        base_hz: 392.0,
        sample_rate: 44_100,
        frames: frames.into(),
    }]))
}

fn simulation(layout: KeyLayout) -> Simulation<VirtualAudioOutput, MemoryStore> {
    Simulation::new(
        prefire_world::Config::default(),
        prefire_system_tone_sequencer::Config::default(),
        ready_output(),
        BestStatsRecorder::new(MemoryStore::new(), USER),
        layout,
    )
}

fn press(sim: &mut Simulation<VirtualAudioOutput, MemoryStore>, keys: &[RawKey]) -> FrameControl {
    let input = FrameInput::with_keys(keys.iter().copied());
    sim.step(FRAME, &input)
}

fn idle(sim: &mut Simulation<VirtualAudioOutput, MemoryStore>, duration: Duration) {
    let frames = duration.as_millis() / FRAME.as_millis();
    for _ in 0..frames {
        let _ = press(sim, &[]);
    }
}

#[test]
fn experiment_waits_for_the_first_key_press() {
    let mut sim = simulation(KeyLayout::LeftHanded);
    assert!(matches!(sim.overlay(), Overlay::Welcome { .. }));

    idle(&mut sim, Duration::from_secs(3));
    assert!(!sim.is_unlocked());
    assert_eq!(query::clock(sim.world()), Duration::ZERO);
    assert!(query::trial(sim.world()).is_none());
    assert!(sim.audio().history().is_empty());

    let _ = press(&mut sim, &[RawKey::Other]);
    assert!(sim.is_unlocked());
    assert_eq!(sim.overlay(), &Overlay::None);
    assert!(query::trial(sim.world()).is_some());
    assert_eq!(query::audio_readiness(sim.world()), AudioReadiness::Ready);
    assert!(matches!(
        sim.audio().history().first(),
        Some(ScheduledSound::Effect {
            effect: SoundEffect::MaskingNoise { .. },
            ..
        })
    ));
}

#[test]
fn cue_tones_are_scheduled_after_the_masking_noise() {
    let mut sim = simulation(KeyLayout::LeftHanded);
    let _ = press(&mut sim, &[RawKey::Other]);
    idle(&mut sim, Duration::from_millis(1900));
    assert!(
        !sim.audio()
            .history()
            .iter()
            .any(|sound| matches!(sound, ScheduledSound::Tone(_))),
        "no cue during the masking noise"
    );

    idle(&mut sim, Duration::from_millis(1500));
    let piano: Vec<f64> = sim
        .audio()
        .history()
        .iter()
        .filter_map(|sound| match sound {
            ScheduledSound::Tone(tone) if tone.voice == Voice::Piano => Some(tone.start_time),
            _ => None,
        })
        .collect();
    assert!(piano.len() >= 2, "cue sequence is playing");
    for pair in piano.windows(2) {
        assert!((pair[1] - pair[0] - 0.6).abs() < 1e-6);
    }
    let now = sim.audio().current_time();
    assert!(piano
        .iter()
        .all(|&start| start > 1.9 && start <= now + 0.02));
}

#[test]
fn escape_opens_the_pause_menu_and_enter_resumes() {
    let mut sim = simulation(KeyLayout::LeftHanded);
    let _ = press(&mut sim, &[RawKey::Other]);
    idle(&mut sim, Duration::from_millis(500));

    let _ = press(&mut sim, &[RawKey::Escape]);
    assert_eq!(sim.overlay(), &Overlay::PauseMenu);
    assert!(query::is_paused(sim.world()));
    let frozen = sim.audio().current_time();
    idle(&mut sim, Duration::from_secs(2));
    assert!((sim.audio().current_time() - frozen).abs() < 1e-9);

    let _ = press(&mut sim, &[RawKey::Enter]);
    assert_eq!(sim.overlay(), &Overlay::None);
    assert!(!query::is_paused(sim.world()));
    let _ = press(&mut sim, &[]);
    assert!(sim.audio().current_time() > frozen);
}

#[test]
fn exiting_from_the_pause_menu_persists_best_stats() {
    let mut sim = simulation(KeyLayout::LeftHanded);
    let _ = press(&mut sim, &[RawKey::Other]);
    let _ = press(&mut sim, &[RawKey::C, RawKey::C, RawKey::C]);
    assert_eq!(query::streak(sim.world()).current(), 3);

    let _ = press(&mut sim, &[RawKey::Escape]);
    assert_eq!(
        press(&mut sim, &[RawKey::Backspace]),
        FrameControl::Continue
    );
    assert_eq!(sim.overlay(), &Overlay::Exited);

    let stored = sim
        .recorder()
        .gateway()
        .load_best_stats(USER)
        .expect("memory store");
    assert_eq!(stored.best_streak, 3);
    assert_eq!(sim.recorder().last_stored(), Some(stored));

    let _ = press(&mut sim, &[RawKey::R]);
    assert_eq!(sim.overlay(), &Overlay::None);
    assert_eq!(query::streak(sim.world()).current(), 0);
    assert_eq!(query::streak(sim.world()).best(), 3);
}

#[test]
fn backspace_on_the_exit_screen_closes_the_window() {
    let mut sim = simulation(KeyLayout::LeftHanded);
    let _ = press(&mut sim, &[RawKey::Other]);
    assert_eq!(
        press(&mut sim, &[RawKey::Backspace]),
        FrameControl::Continue
    );

    let _ = press(&mut sim, &[RawKey::Escape]);
    let _ = press(&mut sim, &[RawKey::Backspace]);
    assert_eq!(press(&mut sim, &[RawKey::Backspace]), FrameControl::Quit);
}

#[test]
fn right_handed_layout_moves_the_ship() {
    let mut sim = simulation(KeyLayout::RightHanded);
    let _ = press(&mut sim, &[RawKey::Other]);
    assert_eq!(query::player_quarter(sim.world()).index(), 1);

    let _ = press(&mut sim, &[RawKey::Backslash]);
    assert_eq!(query::player_quarter(sim.world()).index(), 3);

    let _ = press(&mut sim, &[RawKey::Digit1]);
    assert_eq!(
        query::player_quarter(sim.world()).index(),
        3,
        "left-hand keys are unbound"
    );

    let _ = press(&mut sim, &[RawKey::P]);
    assert_eq!(query::player_quarter(sim.world()).index(), 0);
}
