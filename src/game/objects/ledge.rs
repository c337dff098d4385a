/// Collapsing ledge (0x02) and the fragments it breaks into (0x12).
///
/// A ledge that has been stood on waits `collapse_delay` ticks, then replaces
/// itself with 16 px fragments and remembers its spawn id so it does not come
/// back. Fragments fall one after another from left to right.

use crate::game::platform::registry::{subtype_size, table_entry};
use crate::game::platform::{BehaviorContext, PlatformMachine, PlatformParams, PlatformState, SpawnRecord};
use crate::game::simulation::SoundKind;
use crate::game::solid::{SolidBody, SolidVolume};

use super::{fall_tick, FallOutcome, LEDGE_FRAGMENT};

/// Ledge half widths per size index; always a multiple of the fragment width.
pub const LEDGE_HALF_WIDTHS: [i32; 3] = [32, 48, 64];
pub const LEDGE_HALF_HEIGHT: i32 = 8;

pub const FRAGMENT_WIDTH: i32 = 16;
/// Ticks between consecutive fragments starting to fall.
pub const FRAGMENT_STAGGER: u16 = 4;

pub fn build(record: &SpawnRecord) -> (PlatformMachine, SolidBody) {
    let raw_size = subtype_size(record.subtype_bits);
    let half_width = table_entry(&LEDGE_HALF_WIDTHS, raw_size);
    let params = PlatformParams {
        size_index: raw_size.min(LEDGE_HALF_WIDTHS.len() - 1) as u8,
        flip_x: record.flip_x(),
        flip_y: record.flip_y(),
        ..Default::default()
    };
    (
        PlatformMachine::new(record.origin(), params),
        SolidBody::single(SolidVolume::top_solid(half_width, LEDGE_HALF_HEIGHT)),
    )
}

pub fn update(ctx: &mut BehaviorContext) {
    match ctx.state() {
        PlatformState::Idle => {
            if ctx.stood_on() {
                let delay = ctx.config.collapse_delay;
                ctx.machine.start_timer(delay);
                ctx.set_state(PlatformState::WaitTrigger);
            }
        }
        PlatformState::WaitTrigger => {
            if ctx.machine.tick_timer() {
                collapse(ctx);
            }
        }
        _ => {}
    }
}

fn collapse(ctx: &mut BehaviorContext) {
    let half_width = ctx.body.volume(0).map_or(0, |v| v.half_width());
    let count = (half_width * 2 / FRAGMENT_WIDTH).max(1);
    let origin = ctx.pixel();
    let render_flags = ctx.behavior.render_flags;

    for index in 0..count {
        let x = origin.x - half_width + FRAGMENT_WIDTH / 2 + index * FRAGMENT_WIDTH;
        let record = SpawnRecord::new(LEDGE_FRAGMENT, x, origin.y, index.min(0xFF) as u8).with_render_flags(render_flags);
        ctx.spawn_child(record);
    }

    ctx.remember();
    ctx.play(SoundKind::Collapse);
    ctx.set_state(PlatformState::Done);
    ctx.destroy();
}

pub fn build_fragment(record: &SpawnRecord) -> (PlatformMachine, SolidBody) {
    let index = u16::from(record.subtype_bits);
    let mut machine = PlatformMachine::new(record.origin(), PlatformParams::default()).with_state(PlatformState::WaitTrigger);
    machine.start_timer(index.saturating_mul(FRAGMENT_STAGGER).saturating_add(1));
    (machine, SolidBody::single(SolidVolume::top_solid(FRAGMENT_WIDTH / 2, LEDGE_HALF_HEIGHT)))
}

pub fn update_fragment(ctx: &mut BehaviorContext) {
    match ctx.state() {
        PlatformState::WaitTrigger => {
            if ctx.machine.tick_timer() {
                ctx.set_state(PlatformState::Active);
            }
        }
        PlatformState::Active => match fall_tick(ctx) {
            FallOutcome::Falling => {}
            FallOutcome::Landed | FallOutcome::OutOfRange => {
                ctx.set_state(PlatformState::Done);
                ctx.destroy();
            }
        },
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::objects::LEDGE;

    #[test]
    fn fragments_start_staggered() {
        let (first, body) = build_fragment(&SpawnRecord::new(LEDGE_FRAGMENT, 0, 0, 0));
        let (third, _) = build_fragment(&SpawnRecord::new(LEDGE_FRAGMENT, 0, 0, 2));
        assert_eq!(first.timer, 1);
        assert_eq!(third.timer, 9);
        assert_eq!(first.state, PlatformState::WaitTrigger);
        assert_eq!(body.volume(0).map(|v| v.half_width()), Some(8));
    }

    #[test]
    fn ledge_size_clamps() {
        let (_, body) = build(&SpawnRecord::new(LEDGE, 0, 0, 0x70));
        assert_eq!(body.volume(0).map(|v| v.half_width()), Some(64));
    }
}
