use bevy::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::game::actor::ActorBody;
use crate::game::fixed_math::snap_coord;
use crate::game::simulation::ObjectPosition;
use crate::game::solid::{ObjectContacts, SolidBody};

use super::context::{BehaviorContext, ContactContext};
use super::PlatformMachine;

/// Level placement of one object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpawnRecord {
    pub x: i32,
    pub y: i32,
    pub object_type_id: u8,
    pub subtype_bits: u8,
    pub render_flag_bits: u8,
}

impl SpawnRecord {
    pub const FLIP_X: u8 = 0x01;
    pub const FLIP_Y: u8 = 0x02;

    pub fn new(object_type_id: u8, x: i32, y: i32, subtype_bits: u8) -> Self {
        Self { x, y, object_type_id, subtype_bits, render_flag_bits: 0 }
    }

    pub fn with_render_flags(mut self, bits: u8) -> Self {
        self.render_flag_bits = bits;
        self
    }

    pub fn flip_x(&self) -> bool {
        self.render_flag_bits & Self::FLIP_X != 0
    }

    pub fn flip_y(&self) -> bool {
        self.render_flag_bits & Self::FLIP_Y != 0
    }

    pub fn origin(&self) -> IVec2 {
        IVec2::new(self.x, self.y)
    }
}

/// Low nibble of the subtype.
pub fn subtype_mode(subtype: u8) -> usize {
    usize::from(subtype & 0x0F)
}

/// Bits 4..=6 of the subtype.
pub fn subtype_size(subtype: u8) -> usize {
    usize::from((subtype >> 4) & 0x07)
}

/// `table[index]`, clamping an out-of-range index to the last entry.
pub fn table_entry<T: Copy + Default>(table: &[T], index: usize) -> T {
    let last = table.len().saturating_sub(1);
    if index > last {
        debug!("Spawn table index {} clamped to {}", index, last);
    }
    table.get(index.min(last)).copied().unwrap_or_default()
}

/// Which behavior drives an entity, plus the raw spawn bits it was built from.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Behavior {
    pub type_id: u8,
    pub subtype: u8,
    pub render_flags: u8,
    pub spawn_id: Option<u32>,
}

#[derive(Bundle)]
pub struct ObjectBundle {
    pub behavior: Behavior,
    pub position: ObjectPosition,
    pub machine: PlatformMachine,
    pub body: SolidBody,
    pub contacts: ObjectContacts,
}

pub type BuildFn = fn(&SpawnRecord) -> (PlatformMachine, SolidBody);
pub type UpdateFn = fn(&mut BehaviorContext);
pub type ContactFn = fn(&mut ContactContext);
pub type SolidForFn = fn(&PlatformMachine, Entity, &ActorBody) -> bool;

/// Strategy row for one object type.
#[derive(Clone, Copy)]
pub struct BehaviorEntry {
    pub name: &'static str,
    pub build: BuildFn,
    pub update: UpdateFn,
    pub on_contact: Option<ContactFn>,
    pub solid_for: Option<SolidForFn>,
}

impl BehaviorEntry {
    pub fn new(name: &'static str, build: BuildFn, update: UpdateFn) -> Self {
        Self { name, build, update, on_contact: None, solid_for: None }
    }

    pub fn with_contact(mut self, on_contact: ContactFn) -> Self {
        self.on_contact = Some(on_contact);
        self
    }

    pub fn with_solid_for(mut self, solid_for: SolidForFn) -> Self {
        self.solid_for = Some(solid_for);
        self
    }
}

impl std::fmt::Debug for BehaviorEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BehaviorEntry")
            .field("name", &self.name)
            .field("on_contact", &self.on_contact.is_some())
            .field("solid_for", &self.solid_for.is_some())
            .finish()
    }
}

/// `object_type_id` to behavior table, built once at startup.
#[derive(Resource, Default, Debug, Clone)]
pub struct BehaviorRegistry {
    entries: FxHashMap<u8, BehaviorEntry>,
}

impl BehaviorRegistry {
    pub fn register(&mut self, type_id: u8, entry: BehaviorEntry) -> &mut Self {
        if let Some(previous) = self.entries.insert(type_id, entry) {
            warn!("Behavior {:#04x} ({}) replaced by {}", type_id, previous.name, entry.name);
        }
        self
    }

    pub fn get(&self, type_id: u8) -> Option<&BehaviorEntry> {
        self.entries.get(&type_id)
    }

    pub fn contains(&self, type_id: u8) -> bool {
        self.entries.contains_key(&type_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered ids in ascending order.
    pub fn ids(&self) -> Vec<u8> {
        let mut ids: Vec<u8> = self.entries.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Components for a new object, or `None` for an unknown type.
    pub fn instantiate(&self, record: &SpawnRecord, spawn_id: Option<u32>) -> Option<ObjectBundle> {
        let entry = self.get(record.object_type_id)?;
        let (machine, body) = (entry.build)(record);
        Some(ObjectBundle {
            behavior: Behavior {
                type_id: record.object_type_id,
                subtype: record.subtype_bits,
                render_flags: record.render_flag_bits,
                spawn_id,
            },
            position: ObjectPosition { x: snap_coord(record.x), y: snap_coord(record.y) },
            machine,
            contacts: ObjectContacts::default(),
            body,
        })
    }

    /// Run the update hook. Returns `false` for an unknown type.
    pub fn update(&self, type_id: u8, ctx: &mut BehaviorContext) -> bool {
        match self.get(type_id) {
            Some(entry) => {
                (entry.update)(ctx);
                true
            }
            None => false,
        }
    }

    pub fn on_contact(&self, type_id: u8, ctx: &mut ContactContext) {
        if let Some(hook) = self.get(type_id).and_then(|e| e.on_contact) {
            hook(ctx);
        }
    }

    /// Solid unless the behavior opts out for this actor.
    pub fn is_solid_for(&self, type_id: u8, machine: &PlatformMachine, actor_entity: Entity, actor: &ActorBody) -> bool {
        self.get(type_id)
            .and_then(|e| e.solid_for)
            .map_or(true, |hook| hook(machine, actor_entity, actor))
    }
}
