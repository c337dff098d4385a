//! Motion laws.
//!
//! Pure functions over fixed-point state. Behaviors combine them; none of
//! them touches the ECS.

use bevy::prelude::*;

use crate::game::fixed_math::{
    add_velocity, apply_velocity, scale_by_cosine, scale_by_sine, snap_coord, sub_velocity, Coord, Pixels, Velocity,
};
use crate::game::oscillation::OscillationTable;
use crate::game::terrain::{ProbeDirection, TerrainQuery};

/// Linear oscillation: `(sine(phase) * amplitude) >> 8` where the phase is the
/// oscillation byte at `offset`. Always within `[-amplitude, amplitude]`.
pub fn oscillate(table: &OscillationTable, offset: usize, amplitude: i32, flip: bool) -> i32 {
    let displacement = scale_by_sine(amplitude, table.read_byte(offset)).pixels();
    if flip {
        -displacement
    } else {
        displacement
    }
}

/// Wobble around a swing channel whose limit equals `amplitude`, clamped to
/// `[-amplitude, amplitude]`.
pub fn wobble(table: &OscillationTable, offset: usize, amplitude: i32, flip: bool) -> i32 {
    let displacement = (i32::from(table.read_byte(offset)) - amplitude).clamp(-amplitude, amplitude);
    if flip {
        -displacement
    } else {
        displacement
    }
}

/// Offset of a point orbiting at `radius` pixels.
pub fn orbit(radius: i32, angle: u8) -> IVec2 {
    IVec2::new(scale_by_cosine(radius, angle).pixels(), scale_by_sine(radius, angle).pixels())
}

/// Result of one [`approach`] step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Approach {
    pub position: Coord,
    pub velocity: Velocity,
    pub arrived: bool,
}

/// Accelerate toward `target` along one axis, capped at `max_speed`.
///
/// If the step would reach or cross the target the position snaps to it and
/// the velocity is zeroed in the same tick, so the mover never overshoots and
/// never oscillates around the rest point.
pub fn approach(position: Coord, velocity: Velocity, target: i32, accel: Velocity, max_speed: Velocity) -> Approach {
    let goal = snap_coord(target);
    if position == goal {
        return Approach { position: goal, velocity: Velocity::ZERO, arrived: true };
    }

    let forward = goal > position;
    let velocity = if forward {
        add_velocity(velocity, accel).min(max_speed)
    } else {
        sub_velocity(velocity, accel).max(-max_speed)
    };
    let next = apply_velocity(position, velocity);
    let crossed = if forward { next >= goal } else { next <= goal };

    if crossed {
        Approach { position: goal, velocity: Velocity::ZERO, arrived: true }
    } else {
        Approach { position: next, velocity, arrived: false }
    }
}

/// Move `position` up to `speed` pixels per axis toward the current waypoint,
/// advancing (and wrapping) the waypoint index on arrival.
pub fn follow_route(position: IVec2, route: &[IVec2], waypoint: &mut usize, speed: i32) -> IVec2 {
    if route.is_empty() {
        return position;
    }
    *waypoint %= route.len();
    let target = route[*waypoint];
    let delta = (target - position).clamp(IVec2::splat(-speed), IVec2::splat(speed));
    let next = position + delta;
    if next == target {
        *waypoint = (*waypoint + 1) % route.len();
    }
    next
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fall {
    pub y: Coord,
    pub vy: Velocity,
    /// Touched terrain this step; `y` has been snapped onto it.
    pub landed: bool,
}

/// One free-fall step: move, accelerate, then probe the floor under the
/// body's bottom edge.
pub fn fall_step(
    x: i32,
    y: Coord,
    vy: Velocity,
    half_height: i32,
    gravity: Velocity,
    max_fall: Velocity,
    terrain: &TerrainQuery,
) -> Fall {
    let y = apply_velocity(y, vy);
    let vy = add_velocity(vy, gravity).min(max_fall);
    let probe = terrain.probe(x, y.pixels(), half_height, ProbeDirection::Floor);
    if probe.has_collision {
        Fall { y: snap_coord(y.pixels() + probe.distance), vy: Velocity::ZERO, landed: true }
    } else {
        Fall { y, vy, landed: false }
    }
}
