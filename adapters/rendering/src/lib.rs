#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering and input contracts for Prefire adapters.
//!
//! The experiment screen stays blank on purpose; backends only clear the frame
//! and draw the text of whichever menu overlay is active. Physical keys are
//! resolved into logical actions here, before they reach the world.

use anyhow::Result as AnyResult;
use prefire_core::{Command, LogicalAction, Quarter, Summary};
use std::time::Duration;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Plain white, the experiment background.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }
}

/// Physical keys the experiment listens to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RawKey {
    /// `1` on the number row.
    Digit1,
    /// `2` on the number row.
    Digit2,
    /// `3` on the number row.
    Digit3,
    /// `4` on the number row.
    Digit4,
    /// `P`.
    P,
    /// `[`.
    LeftBracket,
    /// `]`.
    RightBracket,
    /// `\`.
    Backslash,
    /// `F`.
    F,
    /// `C`.
    C,
    /// `R`.
    R,
    /// `Esc`.
    Escape,
    /// `Enter`.
    Enter,
    /// `Backspace`.
    Backspace,
    /// Any key without a binding.
    Other,
}

/// Physical layout chosen for the quarter keys.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum KeyLayout {
    /// Quarters on `1` `2` `3` `4`.
    #[default]
    LeftHanded,
    /// Quarters on `P` `[` `]` `\`.
    RightHanded,
}

impl KeyLayout {
    /// Maps a physical key to its logical action, or `None` when unbound.
    #[must_use]
    pub fn resolve(self, key: RawKey) -> Option<LogicalAction> {
        if let Some(index) = self.quarter_index(key) {
            return Quarter::new(index).map(LogicalAction::SelectQuarter);
        }
        match key {
            RawKey::F => Some(LogicalAction::Fire),
            RawKey::C => Some(LogicalAction::DebugStreakIncrement),
            RawKey::Escape => Some(LogicalAction::TogglePause),
            RawKey::R => Some(LogicalAction::Restart),
            _ => None,
        }
    }

    fn quarter_index(self, key: RawKey) -> Option<u8> {
        match (self, key) {
            (Self::LeftHanded, RawKey::Digit1) | (Self::RightHanded, RawKey::P) => Some(0),
            (Self::LeftHanded, RawKey::Digit2) | (Self::RightHanded, RawKey::LeftBracket) => {
                Some(1)
            }
            (Self::LeftHanded, RawKey::Digit3) | (Self::RightHanded, RawKey::RightBracket) => {
                Some(2)
            }
            (Self::LeftHanded, RawKey::Digit4) | (Self::RightHanded, RawKey::Backslash) => Some(3),
            _ => None,
        }
    }
}

/// Menu buttons reachable from the keyboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MenuKey {
    /// Resume or continue.
    Primary,
    /// Back out to the exit screen.
    Secondary,
}

impl MenuKey {
    /// Maps a physical key to a menu button.
    #[must_use]
    pub const fn from_raw(key: RawKey) -> Option<Self> {
        match key {
            RawKey::Enter => Some(Self::Primary),
            RawKey::Backspace => Some(Self::Secondary),
            _ => None,
        }
    }
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameInput {
    /// Keys pressed during the frame, in press order.
    pub pressed: Vec<RawKey>,
}

impl FrameInput {
    /// Creates an input snapshot from pressed keys.
    #[must_use]
    pub fn with_keys(pressed: impl IntoIterator<Item = RawKey>) -> Self {
        Self {
            pressed: pressed.into_iter().collect(),
        }
    }

    /// Reports whether any key was pressed.
    #[must_use]
    pub fn any_pressed(&self) -> bool {
        !self.pressed.is_empty()
    }
}

/// Text panel drawn over the blank playfield.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Overlay {
    /// Nothing is shown.
    #[default]
    None,
    /// Shown until the first key press unlocks audio.
    Welcome {
        /// Greeting line.
        banner: String,
    },
    /// Pause menu with resume and back buttons.
    PauseMenu,
    /// Round or session summary with continue and exit buttons.
    Summary(Summary),
    /// Shown after exiting; offers a restart or closing the window.
    Exited,
}

impl Overlay {
    /// Lines of text making up the panel.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        match self {
            Self::None => Vec::new(),
            Self::Welcome { banner } => vec![banner.clone(), "Press any key to begin".to_owned()],
            Self::PauseMenu => vec![
                "Paused".to_owned(),
                "Enter: resume".to_owned(),
                "Backspace: back".to_owned(),
            ],
            Self::Summary(summary) => {
                let mut lines = vec![
                    summary.title.clone(),
                    format!("Correct: {} / {}", summary.correct, summary.total),
                    format!("Accuracy: {:.1}%", summary.accuracy_pct),
                    format!("Streak: {}", summary.streak),
                    format!("Best streak: {}", summary.best_streak),
                    "Enter: continue".to_owned(),
                ];
                // The final summary only offers continue.
                if !summary.is_final {
                    lines.push("Backspace: exit".to_owned());
                }
                lines
            }
            Self::Exited => vec![
                "Session closed".to_owned(),
                "R: restart".to_owned(),
                "Backspace: quit".to_owned(),
            ],
        }
    }

    /// Command issued by pressing `key` while this overlay is shown.
    #[must_use]
    pub fn command_for(&self, key: MenuKey) -> Option<Command> {
        match (self, key) {
            (Self::PauseMenu, MenuKey::Primary) => Some(Command::Resume),
            (Self::Summary(_), MenuKey::Primary) => Some(Command::Continue),
            (Self::PauseMenu, MenuKey::Secondary) => Some(Command::Exit),
            (Self::Summary(summary), MenuKey::Secondary) if !summary.is_final => {
                Some(Command::Exit)
            }
            _ => None,
        }
    }

    /// Reports whether a panel is drawn.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Scene description for one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    /// Menu currently drawn over the blank field.
    pub overlay: Overlay,
}

impl Scene {
    /// Creates a scene showing `overlay`.
    #[must_use]
    pub fn new(overlay: Overlay) -> Self {
        Self { overlay }
    }
}

/// Whether the backend should keep presenting frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FrameControl {
    /// Present another frame.
    #[default]
    Continue,
    /// Close the window.
    Quit,
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Prefire frames.
pub trait RenderingBackend {
    /// Runs the rendering backend until the update closure asks it to quit.
    ///
    /// The provided `update_scene` closure receives the frame delta, the keys
    /// pressed during the frame, and may mutate the scene before it is drawn.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) -> FrameControl + 'static;
}
