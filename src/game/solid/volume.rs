use bevy::prelude::*;
use smallvec::SmallVec;

use crate::game::fixed_math::Velocity;

/// Axis-aligned collision box centred on its owner's position (plus a piece
/// offset). Extents are in whole pixels and never below 1; the constructors
/// are the only way to build one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SolidVolume {
    half_width: i32,
    air_half_height: i32,
    ground_half_height: i32,
    top_solid_only: bool,
}

impl SolidVolume {
    pub fn new(half_width: i32, air_half_height: i32, ground_half_height: i32, top_solid_only: bool) -> Self {
        Self {
            half_width: half_width.max(1),
            air_half_height: air_half_height.max(1),
            ground_half_height: ground_half_height.max(1),
            top_solid_only,
        }
    }

    pub fn full(half_width: i32, half_height: i32) -> Self {
        Self::new(half_width, half_height, half_height, false)
    }

    pub fn top_solid(half_width: i32, half_height: i32) -> Self {
        Self::new(half_width, half_height, half_height, true)
    }

    pub fn half_width(&self) -> i32 {
        self.half_width
    }

    /// Used against an actor moving up.
    pub fn air_half_height(&self) -> i32 {
        self.air_half_height
    }

    /// Used against an actor standing or falling.
    pub fn ground_half_height(&self) -> i32 {
        self.ground_half_height
    }

    /// Only the top edge collides; actors pass through from below and the sides.
    pub fn is_top_solid(&self) -> bool {
        self.top_solid_only
    }

    pub fn half_height(&self, vy: Velocity) -> i32 {
        if vy < Velocity::ZERO {
            self.air_half_height
        } else {
            self.ground_half_height
        }
    }
}

/// One volume of a [`SolidBody`] and its offset from the owner position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SolidPiece {
    pub volume: SolidVolume,
    pub offset: IVec2,
    pub active: bool,
}

impl SolidPiece {
    pub fn new(volume: SolidVolume) -> Self {
        Self { volume, offset: IVec2::ZERO, active: true }
    }
}

/// All collision volumes of one object.
///
/// Most objects have a single piece; composite objects (rotors, staircases)
/// carry several and move them by rewriting offsets every tick.
#[derive(Component, Clone, Debug, PartialEq, Eq)]
pub struct SolidBody {
    pieces: SmallVec<[SolidPiece; 4]>,
    /// Cleared to make the whole object intangible.
    pub enabled: bool,
}

impl Default for SolidBody {
    fn default() -> Self {
        Self { pieces: SmallVec::new(), enabled: true }
    }
}

impl SolidBody {
    pub fn single(volume: SolidVolume) -> Self {
        Self::with_pieces([SolidPiece::new(volume)])
    }

    pub fn with_pieces(pieces: impl IntoIterator<Item = SolidPiece>) -> Self {
        Self { pieces: pieces.into_iter().collect(), enabled: true }
    }

    pub fn volume_count(&self) -> usize {
        self.pieces.len()
    }

    pub fn volume(&self, index: usize) -> Option<&SolidVolume> {
        self.pieces.get(index).map(|p| &p.volume)
    }

    pub fn piece(&self, index: usize) -> Option<&SolidPiece> {
        self.pieces.get(index)
    }

    pub fn pieces(&self) -> impl Iterator<Item = &SolidPiece> {
        self.pieces.iter()
    }

    pub fn set_offset(&mut self, index: usize, offset: IVec2) {
        if let Some(piece) = self.pieces.get_mut(index) {
            piece.offset = offset;
        }
    }

    pub fn set_active(&mut self, index: usize, active: bool) {
        if let Some(piece) = self.pieces.get_mut(index) {
            piece.active = active;
        }
    }

    /// Centre of piece `index` for an owner at `origin`.
    pub fn world_position(&self, index: usize, origin: IVec2) -> Option<IVec2> {
        self.pieces.get(index).map(|p| origin + p.offset)
    }
}
