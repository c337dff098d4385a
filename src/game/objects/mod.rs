/// Object catalogue.
///
/// Each submodule provides a `build` decoder, an `update` state machine and,
/// where the object reacts to actors directly, contact and solidity hooks.
/// [`standard_registry`] wires them to their `object_type_id`.

use bevy::prelude::*;

use crate::game::fixed_math::{velocity, Pixels, Velocity};
use crate::game::platform::motion::fall_step;
use crate::game::platform::{BehaviorContext, BehaviorEntry, BehaviorRegistry, PlatformMachine, PlatformState};

pub mod bumper;
pub mod ledge;
pub mod platform;
pub mod rotor;
pub mod spikes;
pub mod spring;
pub mod staircase;

pub const PLATFORM: u8 = 0x01;
pub const LEDGE: u8 = 0x02;
pub const ROTOR: u8 = 0x03;
pub const STAIRCASE: u8 = 0x04;
pub const SPRING: u8 = 0x05;
pub const BUMPER: u8 = 0x06;
pub const SPIKES: u8 = 0x07;
pub const LEDGE_FRAGMENT: u8 = 0x12;

/// Acceleration used by objects converging on a rest or target position.
pub const CONVERGE_ACCEL: Velocity = velocity(0x10);
/// Speed cap for converging objects.
pub const CONVERGE_MAX: Velocity = velocity(0x100);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FallOutcome {
    Falling,
    Landed,
    /// Dropped past `fall_despawn_distance` below the rest position.
    OutOfRange,
}

/// One free-fall tick for an object whose first volume is its footprint.
pub fn fall_tick(ctx: &mut BehaviorContext) -> FallOutcome {
    let half_height = ctx.body.volume(0).map_or(0, |v| v.ground_half_height());
    let step = fall_step(
        ctx.pixel().x,
        ctx.position.y,
        ctx.machine.motion.vy,
        half_height,
        ctx.config.gravity,
        ctx.config.max_fall_speed,
        ctx.terrain,
    );
    ctx.position.y = step.y;
    ctx.machine.motion.vy = step.vy;

    if step.landed {
        ctx.machine.motion.landed = true;
        FallOutcome::Landed
    } else if step.y.pixels() > ctx.machine.base.y + ctx.config.fall_despawn_distance {
        FallOutcome::OutOfRange
    } else {
        FallOutcome::Falling
    }
}

/// Ticks a triggered spring or bumper shows its active frame.
pub const ANIMATION_TICKS: u16 = 8;

/// Count down a contact animation started by [`start_animation`].
pub fn settle_animation(ctx: &mut BehaviorContext) {
    if ctx.state() != PlatformState::Active {
        return;
    }
    if ctx.machine.tick_timer() {
        ctx.machine.frame = 0;
        ctx.machine.subject = None;
        ctx.set_state(PlatformState::Idle);
    }
}

pub fn start_animation(machine: &mut PlatformMachine, subject: Entity) {
    machine.subject = Some(subject);
    machine.frame = 1;
    machine.set_state(PlatformState::Active);
    machine.start_timer(ANIMATION_TICKS);
}

pub fn standard_registry() -> BehaviorRegistry {
    let mut registry = BehaviorRegistry::default();
    registry
        .register(PLATFORM, BehaviorEntry::new("platform", platform::build, platform::update))
        .register(LEDGE, BehaviorEntry::new("collapsing ledge", ledge::build, ledge::update))
        .register(LEDGE_FRAGMENT, BehaviorEntry::new("ledge fragment", ledge::build_fragment, ledge::update_fragment))
        .register(ROTOR, BehaviorEntry::new("rotor", rotor::build, rotor::update))
        .register(STAIRCASE, BehaviorEntry::new("staircase", staircase::build, staircase::update))
        .register(
            SPRING,
            BehaviorEntry::new("spring", spring::build, spring::update)
                .with_contact(spring::on_contact)
                .with_solid_for(spring::is_solid_for),
        )
        .register(BUMPER, BehaviorEntry::new("bumper", bumper::build, bumper::update).with_contact(bumper::on_contact))
        .register(SPIKES, BehaviorEntry::new("spikes", spikes::build, spikes::update).with_contact(spikes::on_contact));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::platform::SpawnRecord;

    #[test]
    fn standard_registry_covers_the_catalogue() {
        let registry = standard_registry();
        assert_eq!(registry.ids(), vec![PLATFORM, LEDGE, ROTOR, STAIRCASE, SPRING, BUMPER, SPIKES, LEDGE_FRAGMENT]);
        assert!(registry.get(SPRING).is_some_and(|e| e.on_contact.is_some() && e.solid_for.is_some()));
        assert!(registry.get(PLATFORM).is_some_and(|e| e.on_contact.is_none()));
    }

    /// Highest `(size_index, mode)` each decoder may produce.
    fn decode_limits(type_id: u8) -> (usize, u8) {
        match type_id {
            PLATFORM => (platform::SIZES.len() - 1, platform::MODE_BALANCE),
            LEDGE => (ledge::LEDGE_HALF_WIDTHS.len() - 1, 0),
            ROTOR => (rotor::RADII.len() - 1, 0),
            STAIRCASE => (0, staircase::TRIGGER_BUMP),
            SPRING => (0, spring::DIRECTION_DOWN),
            SPIKES => (0, spikes::POINT_SIDE),
            _ => (0, 0),
        }
    }

    #[test]
    fn every_spawn_byte_decodes_within_the_tables() {
        let registry = standard_registry();
        for type_id in registry.ids() {
            let (max_size, max_mode) = decode_limits(type_id);
            for subtype in 0..=u8::MAX {
                for render_flags in 0..=u8::MAX {
                    let record = SpawnRecord::new(type_id, 100, 100, subtype).with_render_flags(render_flags);
                    let bundle = registry.instantiate(&record, None).expect("registered type");
                    let params = bundle.machine.params;
                    assert!(usize::from(params.size_index) <= max_size, "type {type_id:#04x} subtype {subtype:#04x}");
                    assert!(params.mode <= max_mode, "type {type_id:#04x} subtype {subtype:#04x}");
                    assert!(bundle.body.volume_count() >= 1);
                    for piece in bundle.body.pieces() {
                        let v = piece.volume;
                        assert!(v.half_width() >= 1 && v.air_half_height() >= 1 && v.ground_half_height() >= 1);
                    }
                }
            }
        }
    }
}
