/// Bumper (0x06): any touch launches the actor straight away from its centre.

use crate::game::fixed_math::{calc_angle, calc_sine, velocity};
use crate::game::platform::{BehaviorContext, ContactContext, PlatformMachine, PlatformParams, SpawnRecord};
use crate::game::simulation::SoundKind;
use crate::game::solid::{SolidBody, SolidVolume};

use super::{settle_animation, start_animation};

/// Launch speed, raw 8.8.
pub const BOUNCE_SPEED: i32 = 0x700;

pub fn build(record: &SpawnRecord) -> (PlatformMachine, SolidBody) {
    (
        PlatformMachine::new(record.origin(), PlatformParams::default()),
        SolidBody::single(SolidVolume::full(8, 8)),
    )
}

pub fn update(ctx: &mut BehaviorContext) {
    settle_animation(ctx);
}

/// Launch velocity for an actor at `(dx, dy)` from the bumper centre.
pub fn bounce_velocity(dx: i32, dy: i32) -> (i16, i16) {
    let (sin, cos) = calc_sine(calc_angle(dx, dy));
    (((cos * BOUNCE_SPEED) >> 8) as i16, ((sin * BOUNCE_SPEED) >> 8) as i16)
}

pub fn on_contact(ctx: &mut ContactContext) {
    if ctx.contact.is_empty() {
        return;
    }
    let center = ctx.pixel();
    let (vx, vy) = bounce_velocity(ctx.actor.pixel_x() - center.x, ctx.actor.pixel_y() - center.y);
    ctx.actor.set_velocity(velocity(vx), velocity(vy));
    ctx.actor.set_airborne(true);
    start_animation(ctx.machine, ctx.actor_entity);
    ctx.play(SoundKind::Bumper);
}
