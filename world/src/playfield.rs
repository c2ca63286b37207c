//! Invisible playfield: the ship's quarter, the descending adversary and shots.

use std::time::Duration;

use glam::Vec2;
use prefire_core::{Quarter, PLAYFIELD_COLUMNS};

/// Geometry and kinematics of the playfield, in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayfieldConfig {
    /// Width of one column.
    pub cell_width: f32,
    /// Height of the field.
    pub field_height: f32,
    /// Height of the ship; its top edge is the threshold line.
    pub ship_height: f32,
    /// Vertical position the adversary spawns at.
    pub adversary_spawn_y: f32,
    /// Collision radius of the adversary.
    pub adversary_radius: f32,
    /// Descent speed of the adversary, in units per second.
    pub adversary_speed: f32,
    /// Collision radius of a shot.
    pub shot_radius: f32,
    /// Rise speed of a shot, in units per second.
    pub shot_speed: f32,
    /// Longest physics sub-step.
    pub max_step: Duration,
}

impl PlayfieldConfig {
    /// Vertical position of the threshold line.
    #[must_use]
    pub fn threshold_y(&self) -> f32 {
        self.field_height - self.ship_height
    }

    /// Horizontal centre of a column.
    #[must_use]
    pub fn column_centre(&self, column: u32) -> f32 {
        (column as f32 + 0.5) * self.cell_width
    }
}

impl Default for PlayfieldConfig {
    fn default() -> Self {
        Self {
            cell_width: 100.0,
            field_height: 900.0,
            ship_height: 125.0,
            adversary_spawn_y: -20.0,
            adversary_radius: 16.0,
            adversary_speed: 152.0,
            shot_radius: 4.0,
            shot_speed: 1080.0,
            max_step: Duration::from_micros(16_667),
        }
    }
}

/// Outcome of advancing the playfield.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Contact {
    /// A shot collided with the adversary.
    Destroyed,
    /// The adversary crossed the threshold line.
    ReachedThreshold,
}

/// Snapshot of the adversary for adapters and tests.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdversarySnapshot {
    /// Quarter the adversary descends in.
    pub quarter: Quarter,
    /// Centre of the adversary.
    pub position: Vec2,
}

#[derive(Clone, Copy, Debug)]
struct Body {
    position: Vec2,
}

#[derive(Clone, Debug)]
pub(crate) struct Playfield {
    config: PlayfieldConfig,
    player: Quarter,
    adversary: Option<(Quarter, Body)>,
    shots: Vec<Body>,
}

impl Playfield {
    pub(crate) fn new(config: PlayfieldConfig, player: Quarter) -> Self {
        Self {
            config,
            player,
            adversary: None,
            shots: Vec::new(),
        }
    }

    pub(crate) fn player(&self) -> Quarter {
        self.player
    }

    pub(crate) fn select(&mut self, quarter: Quarter) {
        self.player = quarter;
    }

    pub(crate) fn has_adversary(&self) -> bool {
        self.adversary.is_some()
    }

    pub(crate) fn spawn_adversary(&mut self, quarter: Quarter) {
        let position = Vec2::new(
            self.config.column_centre(quarter.spawn_column()),
            self.config.adversary_spawn_y,
        );
        self.adversary = Some((quarter, Body { position }));
    }

    pub(crate) fn remove_adversary(&mut self) {
        self.adversary = None;
    }

    /// Launches one shot per column around the player's quarter.
    pub(crate) fn fire_burst(&mut self) {
        let base = self.player.spawn_column();
        let first = base.saturating_sub(1);
        let last = (base + 1).min(PLAYFIELD_COLUMNS - 1);
        let y = self.config.threshold_y();
        for column in first..=last {
            self.shots.push(Body {
                position: Vec2::new(self.config.column_centre(column), y),
            });
        }
    }

    pub(crate) fn shot_count(&self) -> usize {
        self.shots.len()
    }

    pub(crate) fn adversary(&self) -> Option<AdversarySnapshot> {
        self.adversary.map(|(quarter, body)| AdversarySnapshot {
            quarter,
            position: body.position,
        })
    }

    pub(crate) fn clear(&mut self) {
        self.adversary = None;
        self.shots.clear();
    }

    /// Integrates motion in bounded sub-steps and reports the first contact.
    pub(crate) fn advance(&mut self, dt: Duration) -> Option<Contact> {
        let mut remaining = dt;
        while !remaining.is_zero() {
            let step = remaining.min(self.config.max_step);
            remaining -= step;
            if let Some(contact) = self.step(step.as_secs_f32()) {
                return Some(contact);
            }
        }
        None
    }

    fn step(&mut self, seconds: f32) -> Option<Contact> {
        let rise = Vec2::new(0.0, -self.config.shot_speed * seconds);
        for shot in &mut self.shots {
            shot.position += rise;
        }
        self.shots.retain(|shot| shot.position.y >= 0.0);

        let (_, body) = self.adversary.as_mut()?;
        body.position.y += self.config.adversary_speed * seconds;
        let centre = body.position;

        let reach = self.config.adversary_radius + self.config.shot_radius;
        if let Some(index) = self
            .shots
            .iter()
            .position(|shot| shot.position.distance(centre) < reach)
        {
            let _ = self.shots.swap_remove(index);
            self.adversary = None;
            return Some(Contact::Destroyed);
        }

        if centre.y + self.config.adversary_radius >= self.config.threshold_y() {
            self.adversary = None;
            return Some(Contact::ReachedThreshold);
        }
        None
    }
}
