/// Staircase (0x04): four solid blocks that slide apart into steps.
///
/// Bit 0 of the subtype picks the trigger: 0 starts the slide once anything
/// stands on any block, 1 once an actor bumps a block from below.

use bevy::prelude::*;

use crate::game::fixed_math::Pixels;
use crate::game::platform::motion::approach;
use crate::game::platform::{BehaviorContext, PlatformMachine, PlatformParams, PlatformState, SpawnRecord};
use crate::game::solid::{SolidBody, SolidPiece, SolidVolume};

use super::{CONVERGE_ACCEL, CONVERGE_MAX};

pub const STEP_COUNT: usize = 4;
pub const STEP_HALF_SIZE: i32 = 16;
pub const STEP_TRAVEL: i32 = 0x40;
pub const STEP_DELAY: u16 = 30;

pub const TRIGGER_STAND: u8 = 0;
pub const TRIGGER_BUMP: u8 = 1;

fn step_x(index: usize) -> i32 {
    index as i32 * STEP_HALF_SIZE * 2 - (STEP_COUNT as i32 - 1) * STEP_HALF_SIZE
}

/// Offsets for every block given the lead block's displacement. Block `i`
/// (counted from the lead) moves `(4 - i) / 4` of it.
pub fn step_offsets(master: i32, flip_x: bool) -> [IVec2; STEP_COUNT] {
    let mut offsets = [IVec2::ZERO; STEP_COUNT];
    for (index, offset) in offsets.iter_mut().enumerate() {
        let rank = if flip_x { STEP_COUNT - 1 - index } else { index };
        let share = (STEP_COUNT - rank) as i32;
        *offset = IVec2::new(step_x(index), (master * share) >> 2);
    }
    offsets
}

pub fn build(record: &SpawnRecord) -> (PlatformMachine, SolidBody) {
    let flip_y = record.flip_y();
    let params = PlatformParams {
        mode: record.subtype_bits & TRIGGER_BUMP,
        amplitude: if flip_y { -STEP_TRAVEL } else { STEP_TRAVEL },
        flip_x: record.flip_x(),
        flip_y,
        ..Default::default()
    };
    let pieces = step_offsets(0, params.flip_x).map(|offset| SolidPiece {
        offset,
        ..SolidPiece::new(SolidVolume::full(STEP_HALF_SIZE, STEP_HALF_SIZE))
    });
    (PlatformMachine::new(record.origin(), params), SolidBody::with_pieces(pieces))
}

pub fn update(ctx: &mut BehaviorContext) {
    match ctx.state() {
        PlatformState::Idle => {
            let triggered = match ctx.machine.params.mode {
                TRIGGER_BUMP => ctx.last_contact().touch_bottom,
                _ => ctx.stood_on(),
            };
            if triggered {
                ctx.machine.start_timer(STEP_DELAY);
                ctx.set_state(PlatformState::WaitTrigger);
            }
        }
        PlatformState::WaitTrigger => {
            if ctx.machine.tick_timer() {
                ctx.set_state(PlatformState::Active);
            }
        }
        PlatformState::Active => {
            let motion = ctx.machine.motion;
            let step = approach(motion.travel, motion.vy, ctx.machine.params.amplitude, CONVERGE_ACCEL, CONVERGE_MAX);
            ctx.machine.motion.travel = step.position;
            ctx.machine.motion.vy = step.velocity;
            if step.arrived {
                ctx.set_state(PlatformState::Done);
            }
        }
        _ => {}
    }

    let offsets = step_offsets(ctx.machine.motion.travel.pixels(), ctx.machine.params.flip_x);
    for (index, offset) in offsets.into_iter().enumerate() {
        ctx.body.set_offset(index, offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_follow_the_lead_in_quarters() {
        let offsets = step_offsets(0x40, false);
        let ys: Vec<i32> = offsets.iter().map(|o| o.y).collect();
        assert_eq!(ys, vec![0x40, 0x30, 0x20, 0x10]);
        let xs: Vec<i32> = offsets.iter().map(|o| o.x).collect();
        assert_eq!(xs, vec![-48, -16, 16, 48]);

        let flipped: Vec<i32> = step_offsets(0x40, true).iter().map(|o| o.y).collect();
        assert_eq!(flipped, vec![0x10, 0x20, 0x30, 0x40]);
    }

    #[test]
    fn flip_y_reverses_travel() {
        let (machine, body) = build(&SpawnRecord::new(0x04, 0, 0, 0).with_render_flags(SpawnRecord::FLIP_Y));
        assert_eq!(machine.params.amplitude, -STEP_TRAVEL);
        assert_eq!(body.volume_count(), STEP_COUNT);
        assert_eq!(machine.params.mode, TRIGGER_STAND);
    }

    #[test]
    fn bit_zero_selects_the_bump_trigger() {
        let (bump, _) = build(&SpawnRecord::new(0x04, 0, 0, 0xF1));
        let (stand, _) = build(&SpawnRecord::new(0x04, 0, 0, 0xFE));
        assert_eq!(bump.params.mode, TRIGGER_BUMP);
        assert_eq!(stand.params.mode, TRIGGER_STAND);
    }
}
