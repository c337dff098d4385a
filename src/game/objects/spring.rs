/// Spring (0x05).
///
/// Subtype bits 4..=5 pick the direction (up, sideways, down; 3 clamps to
/// down), bit 1 selects the weak variant. The launch happens in the contact
/// hook, so it acts on the same resolver pass that detected the touch.

use bevy::prelude::*;

use crate::game::actor::ActorBody;
use crate::game::fixed_math::{velocity, Velocity};
use crate::game::platform::{BehaviorContext, ContactContext, PlatformMachine, PlatformParams, SpawnRecord};
use crate::game::simulation::SoundKind;
use crate::game::solid::{SolidBody, SolidVolume};

use super::{settle_animation, start_animation};

pub const DIRECTION_UP: u8 = 0;
pub const DIRECTION_SIDE: u8 = 1;
pub const DIRECTION_DOWN: u8 = 2;

pub const STRONG_POWER: i16 = 0x1000;
pub const WEAK_POWER: i16 = 0x0A00;
const WEAK_BIT: u8 = 0x02;

pub fn build(record: &SpawnRecord) -> (PlatformMachine, SolidBody) {
    let direction = ((record.subtype_bits >> 4) & 0x03).min(DIRECTION_DOWN);
    let power = if record.subtype_bits & WEAK_BIT != 0 { WEAK_POWER } else { STRONG_POWER };
    let volume = match direction {
        DIRECTION_SIDE => SolidVolume::full(8, 16),
        _ => SolidVolume::full(16, 8),
    };
    let params = PlatformParams {
        mode: direction,
        speed: power,
        flip_x: record.flip_x(),
        flip_y: record.flip_y(),
        ..Default::default()
    };
    (PlatformMachine::new(record.origin(), params), SolidBody::single(volume))
}

pub fn update(ctx: &mut BehaviorContext) {
    settle_animation(ctx);
}

pub fn on_contact(ctx: &mut ContactContext) {
    let power = velocity(ctx.machine.params.speed);
    let contact = ctx.contact;

    let launched = match ctx.machine.params.mode {
        DIRECTION_UP if contact.standing => {
            ctx.actor.vy = -power;
            ctx.actor.set_airborne(true);
            true
        }
        DIRECTION_DOWN if contact.touch_bottom => {
            ctx.actor.vy = power;
            true
        }
        DIRECTION_SIDE if contact.touch_side => {
            let push = if ctx.actor.pixel_x() < ctx.pixel().x { -power } else { power };
            ctx.actor.vx = push;
            ctx.actor.set_control_locked(ctx.config.spring_lock);
            true
        }
        _ => false,
    };

    if launched {
        start_animation(ctx.machine, ctx.actor_entity);
        ctx.play(SoundKind::Spring);
    }
}

/// The launched actor passes through while it is still moving up.
pub fn is_solid_for(machine: &PlatformMachine, actor_entity: Entity, actor: &ActorBody) -> bool {
    !(machine.subject == Some(actor_entity) && actor.vy < Velocity::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::objects::SPRING;

    #[test]
    fn direction_and_power_decode() {
        let (up, _) = build(&SpawnRecord::new(SPRING, 0, 0, 0x00));
        assert_eq!((up.params.mode, up.params.speed), (DIRECTION_UP, STRONG_POWER));

        let (side, body) = build(&SpawnRecord::new(SPRING, 0, 0, 0x12));
        assert_eq!((side.params.mode, side.params.speed), (DIRECTION_SIDE, WEAK_POWER));
        assert_eq!(body.volume(0).map(|v| v.half_width()), Some(8));

        let (clamped, _) = build(&SpawnRecord::new(SPRING, 0, 0, 0x30));
        assert_eq!(clamped.params.mode, DIRECTION_DOWN);
    }

    #[test]
    fn launched_actor_passes_through_while_rising() {
        let mut world = World::new();
        let actor_entity = world.spawn_empty().id();
        let other = world.spawn_empty().id();
        let (mut machine, _) = build(&SpawnRecord::new(SPRING, 0, 0, 0));
        start_animation(&mut machine, actor_entity);

        let mut actor = ActorBody::default();
        actor.vy = velocity(-0x400);
        assert!(!is_solid_for(&machine, actor_entity, &actor));
        assert!(is_solid_for(&machine, other, &actor));
        actor.vy = velocity(0x100);
        assert!(is_solid_for(&machine, actor_entity, &actor));
    }
}
