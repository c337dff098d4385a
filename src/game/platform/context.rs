use bevy::prelude::*;

use crate::game::actor::ActorBody;
use crate::game::fixed_math::{snap_coord, Pixels};
use crate::game::oscillation::OscillationTable;
use crate::game::simulation::{Destroyed, ObjectPosition, ParentLink, RespawnMemory, SimConfig, SoundCue, SoundKind};
use crate::game::solid::{ContactResult, ObjectContacts, RidingState, SolidBody};
use crate::game::terrain::TerrainQuery;

use super::registry::{Behavior, BehaviorRegistry, SpawnRecord};
use super::{PlatformMachine, PlatformState};

/// Everything one object may see and touch during its update.
///
/// Shared services are read-only. Contact data is the previous resolver
/// pass's.
pub struct BehaviorContext<'a, 'w, 's> {
    pub entity: Entity,
    pub tick: u64,
    pub behavior: &'a Behavior,
    pub machine: &'a mut PlatformMachine,
    pub position: &'a mut ObjectPosition,
    pub body: &'a mut SolidBody,
    pub contacts: &'a ObjectContacts,
    pub parent: Option<Entity>,
    pub oscillation: &'a OscillationTable,
    pub terrain: &'a TerrainQuery,
    pub riding: &'a RidingState,
    pub config: &'a SimConfig,
    pub registry: &'a BehaviorRegistry,
    /// Player actor, if one exists.
    pub primary: Option<&'a ActorBody>,
    pub commands: &'a mut Commands<'w, 's>,
    pub memory: &'a mut RespawnMemory,
    pub cues: &'a mut Vec<SoundCue>,
    pub log_transitions: bool,
}

impl BehaviorContext<'_, '_, '_> {
    pub fn state(&self) -> PlatformState {
        self.machine.state
    }

    pub fn set_state(&mut self, next: PlatformState) {
        let previous = self.machine.state;
        if self.machine.set_state(next) && self.log_transitions {
            debug!(
                "[OBJECT] tick {} {:?} type {:#04x}: {:?} -> {:?}",
                self.tick, self.entity, self.behavior.type_id, previous, next
            );
        }
    }

    /// Lagged standing signal for this object.
    pub fn stood_on(&self) -> bool {
        self.riding.was_stood_on(self.entity, self.tick)
    }

    /// What the previous resolver pass reported for this object, across all
    /// its volumes. Empty if the object was not resolved last tick.
    pub fn last_contact(&self) -> ContactResult {
        if self.contacts.tick.wrapping_add(1) == self.tick {
            self.contacts.aggregate()
        } else {
            ContactResult::NONE
        }
    }

    /// External trigger: the linked sibling was stood on.
    pub fn link_stood_on(&self) -> bool {
        self.machine.link.is_some_and(|link| self.riding.was_stood_on(link, self.tick))
    }

    /// Horizontal distance to the primary actor is at most `distance`.
    pub fn primary_within(&self, distance: i32) -> bool {
        self.primary
            .is_some_and(|actor| (actor.pixel_x() - self.position.x.pixels()).abs() <= distance)
    }

    pub fn pixel(&self) -> IVec2 {
        self.position.pixel()
    }

    pub fn set_pixel(&mut self, pixel: IVec2) {
        self.position.x = snap_coord(pixel.x);
        self.position.y = snap_coord(pixel.y);
    }

    /// Spawn a child object. It collides from this tick's resolver pass and
    /// first updates next tick.
    pub fn spawn_child(&mut self, record: SpawnRecord) -> Option<Entity> {
        let Some(bundle) = self.registry.instantiate(&record, None) else {
            warn!("Object {:?} requested unknown child type {:#04x}", self.entity, record.object_type_id);
            return None;
        };
        Some(self.commands.spawn((bundle, ParentLink(self.entity))).id())
    }

    /// Remove this object at the end of the tick; it stops colliding immediately.
    pub fn destroy(&mut self) {
        self.machine.request_destroy();
        self.commands.entity(self.entity).insert(Destroyed);
    }

    /// Keep this object's spawn entry from respawning.
    pub fn remember(&mut self) {
        if let Some(id) = self.behavior.spawn_id {
            self.memory.remember(id);
        }
    }

    pub fn play(&mut self, kind: SoundKind) {
        self.cues.push(SoundCue { kind, source: self.entity, tick: self.tick });
    }
}

/// Everything a contact hook may see and touch.
pub struct ContactContext<'a> {
    pub entity: Entity,
    pub tick: u64,
    pub machine: &'a mut PlatformMachine,
    pub position: &'a ObjectPosition,
    pub actor_entity: Entity,
    pub actor: &'a mut ActorBody,
    pub volume_index: usize,
    pub contact: ContactResult,
    pub config: &'a SimConfig,
    pub cues: &'a mut Vec<SoundCue>,
}

impl ContactContext<'_> {
    pub fn pixel(&self) -> IVec2 {
        self.position.pixel()
    }

    pub fn play(&mut self, kind: SoundKind) {
        self.cues.push(SoundCue { kind, source: self.entity, tick: self.tick });
    }
}
