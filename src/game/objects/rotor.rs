/// Rotor (0x03): three platforms orbiting the spawn point, one volume each.
///
/// The shared angle comes from the byte phase oscillator at 0x10, so every
/// rotor in the level turns in step.

use crate::game::platform::motion::orbit;
use crate::game::platform::registry::{subtype_size, table_entry};
use crate::game::platform::{BehaviorContext, PlatformMachine, PlatformParams, PlatformState, SpawnRecord};
use crate::game::solid::{SolidBody, SolidPiece, SolidVolume};

pub const ARM_COUNT: usize = 3;
/// Angle between neighbouring arms (a third of a turn).
pub const ARM_SPACING: u8 = 0x55;
pub const RADII: [i32; 2] = [0x30, 0x40];
pub const ANGLE_OFFSET: usize = 0x10;

fn arm_angle(base: u8, arm: usize) -> u8 {
    base.wrapping_add(ARM_SPACING.wrapping_mul(arm as u8))
}

pub fn build(record: &SpawnRecord) -> (PlatformMachine, SolidBody) {
    let raw_size = subtype_size(record.subtype_bits);
    let radius = table_entry(&RADII, raw_size);
    let params = PlatformParams {
        size_index: raw_size.min(RADII.len() - 1) as u8,
        amplitude: radius,
        osc_offset: ANGLE_OFFSET,
        flip_x: record.flip_x(),
        flip_y: record.flip_y(),
        ..Default::default()
    };
    let pieces = (0..ARM_COUNT).map(|arm| SolidPiece {
        offset: orbit(radius, arm_angle(0, arm)),
        ..SolidPiece::new(SolidVolume::top_solid(16, 8))
    });
    (
        PlatformMachine::new(record.origin(), params).with_state(PlatformState::Active),
        SolidBody::with_pieces(pieces),
    )
}

pub fn update(ctx: &mut BehaviorContext) {
    let params = ctx.machine.params;
    let phase = ctx.oscillation.read_byte(params.osc_offset);
    let base = if params.flip_x { phase.wrapping_neg() } else { phase };

    for arm in 0..ARM_COUNT {
        ctx.body.set_offset(arm, orbit(params.amplitude, arm_angle(base, arm)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::objects::ROTOR;
    use bevy::prelude::IVec2;

    #[test]
    fn arms_start_a_third_of_a_turn_apart() {
        let (machine, body) = build(&SpawnRecord::new(ROTOR, 0, 0, 0x10));
        assert_eq!(machine.params.amplitude, 0x40);
        assert_eq!(body.volume_count(), ARM_COUNT);
        assert_eq!(body.piece(0).map(|p| p.offset), Some(IVec2::new(0x40, 0)));
        assert_eq!(arm_angle(0xF0, 2), 0x9A);
    }
}
