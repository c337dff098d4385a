/// Component definitions for the simulation layer.
///
/// Object-side components shared by every behavior. Solid volumes live in
/// [`crate::game::solid`], the state machine in [`crate::game::platform`].

use bevy::prelude::*;

use crate::game::fixed_math::{snap_coord, Coord, Pixels};

// ============================================================================
// Position
// ============================================================================

/// Object position as a 16.16 world coordinate (pixel word + subpixel word).
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjectPosition {
    pub x: Coord,
    pub y: Coord,
}

impl ObjectPosition {
    pub fn from_pixels(x: i32, y: i32) -> Self {
        Self { x: snap_coord(x), y: snap_coord(y) }
    }

    pub fn pixel(&self) -> IVec2 {
        IVec2::new(self.x.pixels(), self.y.pixels())
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

/// Weak handle to the object that spawned this one. The parent may already be
/// gone; always look it up before use.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentLink(pub Entity);

/// Marked for removal at the end of the tick. Destroyed objects no longer
/// update, collide or render.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Destroyed;
