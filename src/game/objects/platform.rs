/// Moving platform (0x01).
///
/// Subtype low nibble selects the mode, bits 4..=6 the size, bit 7 marks the
/// spawned half of a balance pair. Out-of-range values clamp to the last mode
/// and size.

use bevy::prelude::*;

use crate::game::fixed_math::{snap_coord, Pixels};
use crate::game::platform::motion::{approach, follow_route, oscillate, wobble};
use crate::game::platform::registry::{subtype_mode, subtype_size, table_entry};
use crate::game::platform::{BehaviorContext, PlatformMachine, PlatformParams, PlatformState, SpawnRecord};
use crate::game::simulation::SoundKind;
use crate::game::solid::{SolidBody, SolidVolume};

use super::{fall_tick, FallOutcome, CONVERGE_ACCEL, CONVERGE_MAX, PLATFORM};

pub const MODE_STATIC: u8 = 0;
pub const MODE_SWING_X: u8 = 1;
pub const MODE_SWING_Y: u8 = 2;
pub const MODE_FALL_ON_STAND: u8 = 3;
pub const MODE_RISE_ON_STAND: u8 = 4;
pub const MODE_ROUTE: u8 = 5;
pub const MODE_PROXIMITY_DROP: u8 = 6;
pub const MODE_BALANCE: u8 = 7;

/// `(half_width, half_height)` per size index.
pub const SIZES: [(i32, i32); 4] = [(32, 8), (16, 8), (48, 8), (24, 12)];

/// Oscillation bytes driving the swing modes.
pub const SWING_X_OFFSET: usize = 0x08;
pub const SWING_Y_OFFSET: usize = 0x1A;

const SWING_X_AMPLITUDE: i32 = 0x40;
const SWING_Y_AMPLITUDE: i32 = 0x18;
const RISE_HEIGHT: i32 = 0x20;
const ROUTE_SPAN: i32 = 0x40;
const PROXIMITY_DISTANCE: i32 = 0x40;
const BALANCE_DEPTH: i32 = 0x18;
/// Horizontal distance from a balance platform to its partner.
pub const BALANCE_SPACING: i32 = 0x60;
/// Subtype bit marking the spawned half of a balance pair.
pub const BALANCE_PARTNER: u8 = 0x80;

pub fn build(record: &SpawnRecord) -> (PlatformMachine, SolidBody) {
    let mode = subtype_mode(record.subtype_bits).min(usize::from(MODE_BALANCE)) as u8;
    let raw_size = subtype_size(record.subtype_bits);
    let (half_width, half_height) = table_entry(&SIZES, raw_size);
    let size_index = raw_size.min(SIZES.len() - 1);

    let (amplitude, osc_offset) = match mode {
        MODE_SWING_X => (SWING_X_AMPLITUDE, SWING_X_OFFSET),
        MODE_SWING_Y => (SWING_Y_AMPLITUDE, SWING_Y_OFFSET),
        MODE_RISE_ON_STAND => (RISE_HEIGHT, 0),
        MODE_ROUTE => (ROUTE_SPAN, 0),
        MODE_BALANCE => (BALANCE_DEPTH, 0),
        _ => (0, 0),
    };

    let params = PlatformParams {
        mode,
        size_index: size_index as u8,
        amplitude,
        speed: 1,
        osc_offset,
        flip_x: record.flip_x(),
        flip_y: record.flip_y(),
        trigger_distance: PROXIMITY_DISTANCE,
    };
    let state = match mode {
        MODE_SWING_X | MODE_SWING_Y | MODE_ROUTE => PlatformState::Active,
        _ => PlatformState::Idle,
    };

    (
        PlatformMachine::new(record.origin(), params).with_state(state),
        SolidBody::single(SolidVolume::top_solid(half_width, half_height)),
    )
}

pub fn update(ctx: &mut BehaviorContext) {
    match ctx.machine.params.mode {
        MODE_STATIC => {}
        MODE_SWING_X => swing_x(ctx),
        MODE_SWING_Y => swing_y(ctx),
        MODE_FALL_ON_STAND => fall_on_stand(ctx),
        MODE_RISE_ON_STAND => rise_on_stand(ctx),
        MODE_ROUTE => route(ctx),
        MODE_PROXIMITY_DROP => proximity_drop(ctx),
        _ => balance(ctx),
    }
}

fn swing_x(ctx: &mut BehaviorContext) {
    let params = ctx.machine.params;
    let dx = oscillate(ctx.oscillation, params.osc_offset, params.amplitude, params.flip_x);
    ctx.position.x = snap_coord(ctx.machine.base.x + dx);
}

fn swing_y(ctx: &mut BehaviorContext) {
    let params = ctx.machine.params;
    let dy = wobble(ctx.oscillation, params.osc_offset, params.amplitude, params.flip_y);
    ctx.position.y = snap_coord(ctx.machine.base.y + dy);
}

/// Shared tail of the two drop modes: count down, then fall.
fn drop_sequence(ctx: &mut BehaviorContext) {
    match ctx.state() {
        PlatformState::WaitTrigger => {
            if ctx.machine.tick_timer() {
                ctx.set_state(PlatformState::Active);
            }
        }
        PlatformState::Active => match fall_tick(ctx) {
            FallOutcome::Falling => {}
            FallOutcome::Landed => {
                ctx.play(SoundKind::Land);
                ctx.set_state(PlatformState::Done);
            }
            FallOutcome::OutOfRange => ctx.destroy(),
        },
        _ => {}
    }
}

fn fall_on_stand(ctx: &mut BehaviorContext) {
    if ctx.state() == PlatformState::Idle && ctx.stood_on() {
        let delay = ctx.config.fall_delay;
        ctx.machine.start_timer(delay);
        ctx.set_state(PlatformState::WaitTrigger);
        return;
    }
    drop_sequence(ctx);
}

fn proximity_drop(ctx: &mut BehaviorContext) {
    if ctx.state() == PlatformState::Idle && ctx.primary_within(ctx.machine.params.trigger_distance) {
        let delay = ctx.config.collapse_delay;
        ctx.machine.start_timer(delay);
        ctx.set_state(PlatformState::WaitTrigger);
        return;
    }
    drop_sequence(ctx);
}

/// Converge on `target_y`; `true` once there.
fn converge_y(ctx: &mut BehaviorContext, target_y: i32) -> bool {
    let step = approach(ctx.position.y, ctx.machine.motion.vy, target_y, CONVERGE_ACCEL, CONVERGE_MAX);
    ctx.position.y = step.position;
    ctx.machine.motion.vy = step.velocity;
    step.arrived
}

fn rise_on_stand(ctx: &mut BehaviorContext) {
    let base_y = ctx.machine.base.y;
    let top_y = base_y - ctx.machine.params.amplitude;

    if ctx.stood_on() {
        ctx.set_state(PlatformState::Active);
        converge_y(ctx, top_y);
        return;
    }
    match ctx.state() {
        PlatformState::Active => ctx.set_state(PlatformState::Return),
        PlatformState::Return => {
            if converge_y(ctx, base_y) {
                ctx.set_state(PlatformState::Idle);
            }
        }
        _ => {}
    }
}

/// Square loop: right, up, left, back down to the rest point.
fn route(ctx: &mut BehaviorContext) {
    let base = ctx.machine.base;
    let span = ctx.machine.params.amplitude;
    let dx = if ctx.machine.params.flip_x { -span } else { span };
    let points = [base, base + IVec2::new(dx, 0), base + IVec2::new(dx, -span), base + IVec2::new(0, -span)];

    let speed = i32::from(ctx.machine.params.speed);
    let mut waypoint = ctx.machine.motion.waypoint;
    let next = follow_route(ctx.pixel(), &points, &mut waypoint, speed);
    ctx.machine.motion.waypoint = waypoint;
    ctx.set_pixel(next);
}

/// Two linked platforms: standing on one sinks it and lifts the other.
fn balance(ctx: &mut BehaviorContext) {
    if ctx.machine.link.is_none() {
        if ctx.behavior.subtype & BALANCE_PARTNER == 0 {
            let base = ctx.machine.base;
            let record = SpawnRecord::new(PLATFORM, base.x + BALANCE_SPACING, base.y, ctx.behavior.subtype | BALANCE_PARTNER)
                .with_render_flags(ctx.behavior.render_flags);
            ctx.machine.link = ctx.spawn_child(record);
        } else {
            ctx.machine.link = ctx.parent;
        }
    }

    let depth = ctx.machine.params.amplitude;
    let offset = match (ctx.stood_on(), ctx.link_stood_on()) {
        (true, false) => depth,
        (false, true) => -depth,
        _ => 0,
    };
    let base_y = ctx.machine.base.y;
    let arrived = converge_y(ctx, base_y + offset);
    let next = match (offset, arrived) {
        (0, true) => PlatformState::Idle,
        (0, false) => PlatformState::Return,
        _ => PlatformState::Active,
    };
    ctx.machine.motion.travel = snap_coord(ctx.position.y.pixels() - base_y);
    ctx.set_state(next);
}
