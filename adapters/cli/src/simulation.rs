//! Per-frame wiring of the world, the pure systems, and the collaborators.

use std::time::Duration;

use prefire_audio::AudioOutput;
use prefire_core::{AudioReadiness, Command, Event, ToneEvent};
use prefire_persistence::{BestStatsRecorder, PersistenceGateway};
use prefire_rendering::{FrameControl, FrameInput, KeyLayout, MenuKey, Overlay, RawKey};
use prefire_system_tone_sequencer::{AudioClock, ToneSequencer};
use prefire_world::{self as world, query, World};
use tracing::{info, warn};

/// Owns everything a running experiment needs and advances it frame by frame.
///
/// The world does not tick until the first key press unlocks audio, so the
/// first trial starts in the frame of that press.
#[derive(Debug)]
pub struct Simulation<A, G> {
    world: World,
    sequencer: ToneSequencer,
    audio: A,
    recorder: BestStatsRecorder<G>,
    layout: KeyLayout,
    unlocked: bool,
    reported_readiness: AudioReadiness,
    overlay: Overlay,
    commands: Vec<Command>,
    events: Vec<Event>,
    tones: Vec<ToneEvent>,
}

impl<A, G> Simulation<A, G>
where
    A: AudioOutput,
    G: PersistenceGateway,
{
    /// Creates a simulation seeded with the user's stored best statistics.
    pub fn new(
        world_config: world::Config,
        sequencer_config: prefire_system_tone_sequencer::Config,
        audio: A,
        recorder: BestStatsRecorder<G>,
        layout: KeyLayout,
    ) -> Self {
        let world = World::new(world_config, recorder.load());
        let overlay = Overlay::Welcome {
            banner: query::welcome_banner(&world).to_owned(),
        };
        Self {
            world,
            sequencer: ToneSequencer::new(sequencer_config),
            audio,
            recorder,
            layout,
            unlocked: false,
            reported_readiness: AudioReadiness::Pending,
            overlay,
            commands: Vec::new(),
            events: Vec::new(),
            tones: Vec::new(),
        }
    }

    /// Advances one frame and reports whether the window should stay open.
    pub fn step(&mut self, dt: Duration, input: &FrameInput) -> FrameControl {
        if !self.unlocked {
            if !input.any_pressed() {
                return FrameControl::Continue;
            }
            self.unlocked = true;
            self.overlay = Overlay::None;
            self.audio.unlock();
            info!("audio unlocked; experiment starting");
        }

        self.commands.clear();
        self.audio.advance(dt);
        let readiness = self.audio.readiness();
        if readiness != self.reported_readiness {
            self.reported_readiness = readiness;
            self.commands.push(Command::SetAudioReadiness { readiness });
        }
        for &key in &input.pressed {
            if self.translate(key) == FrameControl::Quit {
                self.shutdown();
                return FrameControl::Quit;
            }
        }
        self.commands.push(Command::Tick { dt });

        self.events.clear();
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.events);
        }

        self.dispatch_audio();
        self.schedule_tones();
        self.recorder.handle(&self.events);
        self.update_overlay();
        FrameControl::Continue
    }

    fn translate(&mut self, key: RawKey) -> FrameControl {
        if let Some(menu) = MenuKey::from_raw(key) {
            if self.overlay == Overlay::Exited && menu == MenuKey::Secondary {
                return FrameControl::Quit;
            }
            if let Some(command) = self.overlay.command_for(menu) {
                self.commands.push(command);
            }
            return FrameControl::Continue;
        }
        if let Some(action) = self.layout.resolve(key) {
            self.commands.push(action.into());
        }
        FrameControl::Continue
    }

    fn dispatch_audio(&mut self) {
        for event in &self.events {
            match event {
                Event::SoundRequested { effect } => self.audio.play_effect(*effect),
                Event::AudioSuspended => self.audio.suspend(),
                Event::AudioResumed => self.audio.resume(),
                _ => {}
            }
        }
    }

    fn schedule_tones(&mut self) {
        let clock = AudioClock::new(self.audio.current_time(), self.audio.readiness());
        self.tones.clear();
        self.sequencer.handle(&self.events, clock, &mut self.tones);
        for tone in self.tones.drain(..) {
            self.audio.schedule_tone(tone);
        }
    }

    fn update_overlay(&mut self) {
        for event in &self.events {
            match event {
                Event::RoundCompleted { summary } | Event::SessionCompleted { summary } => {
                    self.overlay = Overlay::Summary(summary.clone());
                }
                Event::PauseChanged { paused: true } => self.overlay = Overlay::PauseMenu,
                Event::PauseChanged { paused: false }
                | Event::RoundAdvanced { .. }
                | Event::SessionRestarted => self.overlay = Overlay::None,
                Event::Exited => self.overlay = Overlay::Exited,
                _ => {}
            }
        }
    }

    fn shutdown(&mut self) {
        if let Err(error) = self.audio.finish() {
            warn!(%error, "audio output did not finish cleanly");
        }
        info!("experiment closed");
    }

    /// Overlay to draw this frame.
    #[must_use]
    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    /// Experiment state.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Audio output the simulation drives.
    #[must_use]
    pub fn audio(&self) -> &A {
        &self.audio
    }

    /// Persistence recorder.
    #[must_use]
    pub fn recorder(&self) -> &BestStatsRecorder<G> {
        &self.recorder
    }

    /// Events produced during the most recent frame.
    #[must_use]
    pub fn last_events(&self) -> &[Event] {
        &self.events
    }

    /// Reports whether the first key press has been seen.
    #[must_use]
    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }
}
