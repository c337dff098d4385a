/// Spikes (0x07): hurt an actor touching the pointed face. Subtype bit 4
/// turns them sideways.

use crate::game::platform::{BehaviorContext, ContactContext, PlatformMachine, PlatformParams, SpawnRecord};
use crate::game::simulation::SoundKind;
use crate::game::solid::{SolidBody, SolidVolume};

pub const POINT_UP: u8 = 0;
pub const POINT_SIDE: u8 = 1;

pub fn build(record: &SpawnRecord) -> (PlatformMachine, SolidBody) {
    let params = PlatformParams {
        mode: (record.subtype_bits >> 4) & 0x01,
        flip_x: record.flip_x(),
        flip_y: record.flip_y(),
        ..Default::default()
    };
    (PlatformMachine::new(record.origin(), params), SolidBody::single(SolidVolume::full(16, 16)))
}

pub fn update(_ctx: &mut BehaviorContext) {}

pub fn on_contact(ctx: &mut ContactContext) {
    let pointed = match ctx.machine.params.mode {
        POINT_UP => ctx.contact.standing,
        _ => ctx.contact.touch_side,
    };
    if !pointed {
        return;
    }
    let source_x = ctx.pixel().x;
    if ctx.actor.hurt(source_x, ctx.config.hurt_invulnerability) {
        ctx.play(SoundKind::Hurt);
    }
}
