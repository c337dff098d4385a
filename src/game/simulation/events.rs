/// Messages into and out of the simulation.
///
/// Spawn requests and level teardown come in; render commands and sound cues
/// go out once per tick. Nothing in the tick path depends on anyone reading
/// the outgoing messages.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::game::platform::SpawnRecord;

// ============================================================================
// Input
// ============================================================================

/// Instantiate one object from its level placement. Requests carrying a
/// `spawn_id` found in [`RespawnMemory`](super::RespawnMemory) are dropped.
#[derive(Event, Message, Debug, Clone, Copy)]
pub struct SpawnObjectCommand {
    pub record: SpawnRecord,
    pub spawn_id: Option<u32>,
}

/// Remove every object and reset the shared services.
#[derive(Event, Message, Debug, Clone, Copy, Default)]
pub struct LevelTeardown;

// ============================================================================
// Output
// ============================================================================

/// One sprite to draw this tick, emitted after resolution.
#[derive(Event, Message, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RenderCommand {
    #[serde(skip)]
    pub entity: Entity,
    pub tick: u64,
    pub type_id: u8,
    pub x: i32,
    pub y: i32,
    pub frame: u8,
    pub render_flags: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundKind {
    Spring,
    Bumper,
    Hurt,
    Collapse,
    Land,
}

#[derive(Event, Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoundCue {
    pub kind: SoundKind,
    pub source: Entity,
    pub tick: u64,
}
