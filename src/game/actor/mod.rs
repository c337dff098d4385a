//! Player and sidekick bodies.
//!
//! Character control proper lives outside the physics core; this module keeps
//! the state objects and the resolver read and write (position, velocity,
//! radii, air/ground flags, timers) plus a minimal integrator so levels can
//! run end to end without an input layer.

use bevy::prelude::*;

use crate::game::fixed_math::{add_velocity, apply_velocity, offset_coord, snap_coord, velocity, Coord, Pixels, Velocity};
use crate::game::simulation::SimConfig;
use crate::game::terrain::{ProbeDirection, TerrainQuery};

/// Recoil applied by [`ActorBody::hurt`].
pub const HURT_RECOIL_Y: Velocity = velocity(-0x400);
pub const HURT_RECOIL_X: i16 = 0x200;

/// Ground further below than this drops a grounded actor into the air.
const WALK_OFF_DISTANCE: i32 = 14;

/// Processing order: the player resolves before the sidekick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum ActorRole {
    #[default]
    Player,
    Sidekick,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    pub fn sign(self) -> i32 {
        match self {
            Facing::Left => -1,
            Facing::Right => 1,
        }
    }
}

#[derive(Component, Debug, Clone, PartialEq)]
pub struct ActorBody {
    pub x: Coord,
    pub y: Coord,
    pub vx: Velocity,
    pub vy: Velocity,
    pub x_radius: i32,
    pub y_radius: i32,
    pub facing: Facing,
    pub airborne: bool,
    /// Supported by an object rather than terrain.
    pub on_object: bool,
    /// Ticks left during which steering input is ignored.
    pub control_lock: u16,
    /// Ticks left during which hazards cannot hurt.
    pub invulnerable: u16,
    pub role: ActorRole,
}

impl Default for ActorBody {
    fn default() -> Self {
        Self {
            x: Coord::ZERO,
            y: Coord::ZERO,
            vx: Velocity::ZERO,
            vy: Velocity::ZERO,
            x_radius: 9,
            y_radius: 19,
            facing: Facing::Right,
            airborne: true,
            on_object: false,
            control_lock: 0,
            invulnerable: 0,
            role: ActorRole::Player,
        }
    }
}

impl ActorBody {
    pub fn new(role: ActorRole, x: i32, y: i32) -> Self {
        Self { role, x: snap_coord(x), y: snap_coord(y), ..default() }
    }

    pub fn pixel_x(&self) -> i32 {
        self.x.pixels()
    }

    pub fn pixel_y(&self) -> i32 {
        self.y.pixels()
    }

    /// Bottom edge in pixels.
    pub fn feet(&self) -> i32 {
        self.pixel_y() + self.y_radius
    }

    pub fn set_position(&mut self, x: i32, y: i32) {
        self.x = snap_coord(x);
        self.y = snap_coord(y);
    }

    /// Move by whole pixels, keeping subpixels.
    pub fn shift(&mut self, dx: i32, dy: i32) {
        self.x = offset_coord(self.x, dx);
        self.y = offset_coord(self.y, dy);
    }

    /// Place the feet on `top`, keeping the subpixel x.
    pub fn snap_feet_to(&mut self, top: i32) {
        self.y = snap_coord(top - self.y_radius);
    }

    pub fn set_velocity(&mut self, vx: Velocity, vy: Velocity) {
        self.vx = vx;
        self.vy = vy;
    }

    pub fn set_airborne(&mut self, airborne: bool) {
        self.airborne = airborne;
        if airborne {
            self.on_object = false;
        }
    }

    pub fn set_control_locked(&mut self, ticks: u16) {
        self.control_lock = ticks;
    }

    pub fn is_control_locked(&self) -> bool {
        self.control_lock > 0
    }

    /// Horizontal steering from an input layer; ignored while control is locked.
    pub fn steer(&mut self, vx: Velocity) -> bool {
        if self.is_control_locked() {
            return false;
        }
        self.vx = vx;
        true
    }

    /// Knock the actor away from `source_x`. Returns `false` while invulnerable.
    pub fn hurt(&mut self, source_x: i32, invulnerable_ticks: u16) -> bool {
        if self.invulnerable > 0 {
            return false;
        }
        let away = if self.pixel_x() < source_x { -HURT_RECOIL_X } else { HURT_RECOIL_X };
        self.vx = velocity(away);
        self.vy = HURT_RECOIL_Y;
        self.set_airborne(true);
        self.invulnerable = invulnerable_ticks;
        true
    }

    /// One tick of motion: move, fall, then meet terrain.
    pub fn integrate(&mut self, gravity: Velocity, max_fall: Velocity, terrain: &TerrainQuery) {
        self.control_lock = self.control_lock.saturating_sub(1);
        self.invulnerable = self.invulnerable.saturating_sub(1);

        if self.vx > Velocity::ZERO {
            self.facing = Facing::Right;
        } else if self.vx < Velocity::ZERO {
            self.facing = Facing::Left;
        }

        self.x = apply_velocity(self.x, self.vx);
        self.y = apply_velocity(self.y, self.vy);

        if self.airborne {
            self.vy = add_velocity(self.vy, gravity).min(max_fall);
            self.meet_terrain_airborne(terrain);
        } else if !self.on_object {
            self.follow_ground(terrain);
        }
    }

    fn meet_terrain_airborne(&mut self, terrain: &TerrainQuery) {
        if self.vy < Velocity::ZERO {
            let ceiling = terrain.probe(self.pixel_x(), self.pixel_y(), self.y_radius, ProbeDirection::Ceiling);
            if ceiling.has_collision {
                self.y = offset_coord(self.y, -ceiling.distance);
                self.vy = Velocity::ZERO;
            }
            return;
        }
        let floor = terrain.probe(self.pixel_x(), self.pixel_y(), self.y_radius, ProbeDirection::Floor);
        if floor.has_collision {
            self.snap_feet_to(self.feet() + floor.distance);
            self.vy = Velocity::ZERO;
            self.airborne = false;
        }
    }

    fn follow_ground(&mut self, terrain: &TerrainQuery) {
        let floor = terrain.probe(self.pixel_x(), self.pixel_y(), self.y_radius, ProbeDirection::Floor);
        if floor.distance > WALK_OFF_DISTANCE || (!floor.has_collision && floor.distance == terrain.probe_range()) {
            self.set_airborne(true);
        } else {
            self.snap_feet_to(self.feet() + floor.distance);
            self.vy = Velocity::ZERO;
        }
    }
}

pub fn integrate_actors(config: Res<SimConfig>, terrain: Res<TerrainQuery>, mut actors: Query<&mut ActorBody>) {
    for mut actor in actors.iter_mut() {
        actor.integrate(config.gravity, config.max_fall_speed, &terrain);
    }
}
