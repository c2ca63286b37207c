#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Prefire.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, so the crate depends on macroquad without its default `audio`
//! feature; sound goes through the dedicated audio adapter instead.
//!
//! Each frame clears to the presentation colour and, when a menu is active,
//! draws its text centred on screen. Nothing else is drawn.

mod overlay;

use anyhow::Result;
use macroquad::{
    color::BLACK,
    input::{get_last_key_pressed, is_key_pressed, KeyCode},
    text::{draw_text, measure_text},
};
use prefire_rendering::{
    Color, FrameControl, FrameInput, Presentation, RawKey, RenderingBackend, Scene,
};
use std::time::Duration;
use tracing::info;

pub use overlay::{layout_overlay, PlacedLine, BODY_FONT_SIZE, TITLE_FONT_SIZE};

const BOUND_KEYS: [KeyCode; 15] = [
    KeyCode::Key1,
    KeyCode::Key2,
    KeyCode::Key3,
    KeyCode::Key4,
    KeyCode::P,
    KeyCode::LeftBracket,
    KeyCode::RightBracket,
    KeyCode::Backslash,
    KeyCode::F,
    KeyCode::C,
    KeyCode::R,
    KeyCode::Escape,
    KeyCode::Enter,
    KeyCode::KpEnter,
    KeyCode::Backspace,
];

/// Translates a macroquad key code into the adapter-neutral key set.
#[must_use]
pub fn raw_key(code: KeyCode) -> RawKey {
    match code {
        KeyCode::Key1 => RawKey::Digit1,
        KeyCode::Key2 => RawKey::Digit2,
        KeyCode::Key3 => RawKey::Digit3,
        KeyCode::Key4 => RawKey::Digit4,
        KeyCode::P => RawKey::P,
        KeyCode::LeftBracket => RawKey::LeftBracket,
        KeyCode::RightBracket => RawKey::RightBracket,
        KeyCode::Backslash => RawKey::Backslash,
        KeyCode::F => RawKey::F,
        KeyCode::C => RawKey::C,
        KeyCode::R => RawKey::R,
        KeyCode::Escape => RawKey::Escape,
        KeyCode::Enter | KeyCode::KpEnter => RawKey::Enter,
        KeyCode::Backspace => RawKey::Backspace,
        _ => RawKey::Other,
    }
}

fn poll_frame_input() -> FrameInput {
    let mut pressed: Vec<RawKey> = BOUND_KEYS
        .into_iter()
        .filter(|&code| is_key_pressed(code))
        .map(raw_key)
        .collect();
    if pressed.is_empty() && get_last_key_pressed().is_some() {
        pressed.push(RawKey::Other);
    }
    FrameInput { pressed }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Clone, Copy, Debug)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    window_width: i32,
    window_height: i32,
}

impl Default for MacroquadBackend {
    fn default() -> Self {
        Self {
            swap_interval: None,
            window_width: 1200,
            window_height: 900,
        }
    }
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(mut self, enabled: bool) -> Self {
        self.swap_interval = Some(i32::from(enabled));
        self
    }

    /// Sets the initial window size in pixels.
    #[must_use]
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_width = i32::try_from(width).unwrap_or(i32::MAX);
        self.window_height = i32::try_from(height).unwrap_or(i32::MAX);
        self
    }
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}

fn draw_scene(scene: &Scene) {
    let width = macroquad::window::screen_width();
    let height = macroquad::window::screen_height();
    let placed = layout_overlay(&scene.overlay, width, height, |text, size| {
        measure_text(text, None, size, 1.0).width
    });
    for line in placed {
        let size = f32::from(line.font_size);
        draw_text(&line.text, line.x, line.baseline, size, BLACK);
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) -> FrameControl + 'static,
    {
        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: self.window_width,
            window_height: self.window_height,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = self.swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let background = to_macroquad_color(clear_color);

            loop {
                let frame_input = poll_frame_input();
                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));

                let control = update_scene(frame_dt, frame_input, &mut scene);

                macroquad::window::clear_background(background);
                draw_scene(&scene);

                if control == FrameControl::Quit {
                    info!("window closing");
                    break;
                }
                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}
