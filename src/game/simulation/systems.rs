/// Core simulation systems.
///
/// This module contains systems for:
/// - Tick counting and timing
/// - Spawn intake and level teardown
/// - Oscillation advance
/// - Per-object behavior updates
/// - Render command emission and end-of-tick cleanup

use bevy::prelude::*;
use zonephys_macros::profile;

use crate::game::actor::{ActorBody, ActorRole};
use crate::game::oscillation::OscillationTable;
use crate::game::platform::{Behavior, BehaviorContext, BehaviorRegistry, PlatformMachine};
use crate::game::solid::{ObjectContacts, RidingState, SolidBody};
use crate::game::terrain::TerrainQuery;

use super::components::*;
use super::events::*;
use super::resources::*;

// ============================================================================
// Tick Management
// ============================================================================

/// Increment the global simulation tick counter.
///
/// Runs first in FixedUpdate so every later system sees the current tick.
pub fn increment_sim_tick(mut tick: ResMut<SimTick>) {
    tick.increment();
}

/// Log simulation status once per second when `perf_stats` is enabled.
pub fn sim_start(
    mut stats: ResMut<SimPerformance>,
    #[allow(unused_variables)] tick: Res<SimTick>,
    #[allow(unused_variables)] objects: Query<Entity, With<Behavior>>,
    #[allow(unused_variables)] riding: Res<RidingState>,
) {
    use crate::profile_log;

    profile_log!(tick, "[SIM STATUS] Tick: {} | Objects: {} | Riders: {} | Last sim duration: {:?}",
          tick.0, objects.iter().len(), riding.ride_count(), stats.last_duration);
    stats.start_time = Some(std::time::Instant::now());
}

/// Store the wall-clock duration of the tick that just finished.
#[profile(16)]  // Warn if entire simulation tick > 16ms
pub fn sim_end(mut stats: ResMut<SimPerformance>) {
    if let Some(start) = stats.start_time.take() {
        stats.last_duration = start.elapsed();
    }
}

// ============================================================================
// Level Lifecycle
// ============================================================================

/// Startup: put the shared services into their level-start state.
pub fn init_level(mut oscillation: ResMut<OscillationTable>, mut riding: ResMut<RidingState>) {
    oscillation.init();
    riding.clear();
}

/// Instantiate queued spawn requests in arrival order.
pub fn process_spawn_commands(
    mut commands: Commands,
    mut spawn_events: MessageReader<SpawnObjectCommand>,
    registry: Res<BehaviorRegistry>,
    memory: Res<RespawnMemory>,
    debug_config: Res<DebugConfig>,
    tick: Res<SimTick>,
) {
    for event in spawn_events.read() {
        if event.spawn_id.is_some_and(|id| memory.is_remembered(id)) {
            if debug_config.log_spawns {
                debug!("[SPAWN] tick {}: spawn id {:?} is remembered, skipping", tick.0, event.spawn_id);
            }
            continue;
        }
        let Some(bundle) = registry.instantiate(&event.record, event.spawn_id) else {
            warn!(
                "[SPAWN] Unknown object type {:#04x} at ({}, {}), skipping",
                event.record.object_type_id, event.record.x, event.record.y
            );
            continue;
        };
        let entity = commands.spawn(bundle).id();
        if debug_config.log_spawns {
            debug!(
                "[SPAWN] tick {}: {:?} type {:#04x} subtype {:#04x} at ({}, {})",
                tick.0, entity, event.record.object_type_id, event.record.subtype_bits, event.record.x, event.record.y
            );
        }
    }
}

/// Remove every object and reset shared services on [`LevelTeardown`].
pub fn handle_level_teardown(
    mut commands: Commands,
    mut teardown_events: MessageReader<LevelTeardown>,
    objects: Query<Entity, With<Behavior>>,
    mut actors: Query<&mut ActorBody>,
    mut oscillation: ResMut<OscillationTable>,
    mut riding: ResMut<RidingState>,
    mut memory: ResMut<RespawnMemory>,
) {
    if teardown_events.read().count() == 0 {
        return;
    }

    let mut removed = 0;
    for entity in objects.iter() {
        commands.entity(entity).despawn();
        removed += 1;
    }
    for mut actor in actors.iter_mut() {
        if actor.on_object {
            actor.set_airborne(true);
        }
    }

    oscillation.reset();
    riding.clear();
    memory.clear();
    info!("Level teardown: removed {} objects", removed);
}

// ============================================================================
// Oscillation
// ============================================================================

pub fn advance_oscillation(tick: Res<SimTick>, mut oscillation: ResMut<OscillationTable>) {
    oscillation.advance(tick.0);
}

// ============================================================================
// Object Updates
// ============================================================================

/// Run every live object's behavior once, in entity order.
///
/// Objects see the previous resolver pass's contacts and the lagged standing
/// latch. Spawns and destroys go through commands and land at the next sync
/// point, before solid resolution.
#[profile(4)]
pub fn update_objects(
    mut commands: Commands,
    tick: Res<SimTick>,
    config: Res<SimConfig>,
    debug_config: Res<DebugConfig>,
    oscillation: Res<OscillationTable>,
    terrain: Res<TerrainQuery>,
    riding: Res<RidingState>,
    registry: Res<BehaviorRegistry>,
    mut memory: ResMut<RespawnMemory>,
    actors: Query<(Entity, &ActorBody)>,
    mut objects: Query<
        (
            Entity,
            &Behavior,
            &mut PlatformMachine,
            &mut ObjectPosition,
            &mut SolidBody,
            &ObjectContacts,
            Option<&ParentLink>,
        ),
        Without<Destroyed>,
    >,
    mut sounds: MessageWriter<SoundCue>,
) {
    let now = tick.0;
    let primary = actors
        .iter()
        .filter(|(_, actor)| actor.role == ActorRole::Player)
        .min_by_key(|(entity, _)| *entity)
        .map(|(_, actor)| actor);

    let mut items: Vec<_> = objects.iter_mut().collect();
    items.sort_by_key(|(entity, ..)| *entity);

    let mut cues = Vec::new();
    for (entity, behavior, mut machine, mut position, mut body, contacts, parent) in items {
        if machine.is_destroyed() {
            continue;
        }
        let mut ctx = BehaviorContext {
            entity,
            tick: now,
            behavior,
            machine: &mut *machine,
            position: &mut *position,
            body: &mut *body,
            contacts,
            parent: parent.map(|link| link.0),
            oscillation: &oscillation,
            terrain: &terrain,
            riding: &riding,
            config: &config,
            registry: &registry,
            primary,
            commands: &mut commands,
            memory: &mut *memory,
            cues: &mut cues,
            log_transitions: debug_config.log_transitions,
        };
        if !registry.update(behavior.type_id, &mut ctx) {
            debug!("[OBJECT] {:?} has unregistered type {:#04x}", entity, behavior.type_id);
        }
    }

    sounds.write_batch(cues);
}

// ============================================================================
// Output
// ============================================================================

/// One render command per live object, in entity order.
pub fn emit_render_commands(
    tick: Res<SimTick>,
    objects: Query<(Entity, &Behavior, &ObjectPosition, &PlatformMachine), Without<Destroyed>>,
    mut render: MessageWriter<RenderCommand>,
) {
    let mut items: Vec<_> = objects.iter().collect();
    items.sort_by_key(|(entity, ..)| *entity);

    for (entity, behavior, position, machine) in items {
        let pixel = position.pixel();
        render.write(RenderCommand {
            entity,
            tick: tick.0,
            type_id: behavior.type_id,
            x: pixel.x,
            y: pixel.y,
            frame: machine.frame,
            render_flags: behavior.render_flags,
        });
    }
}

// ============================================================================
// Cleanup
// ============================================================================

/// Despawn destroyed objects and drop every reference the riding state holds
/// to them or to actors that no longer exist.
pub fn cleanup_destroyed(
    mut commands: Commands,
    destroyed: Query<Entity, With<Destroyed>>,
    actors: Query<Entity, With<ActorBody>>,
    mut riding: ResMut<RidingState>,
) {
    let mut gone: Vec<Entity> = destroyed.iter().collect();
    gone.sort();
    for entity in gone {
        riding.forget_owner(entity);
        commands.entity(entity).despawn();
    }

    let stale: Vec<Entity> = riding.riders().filter(|rider| !actors.contains(*rider)).collect();
    for rider in stale {
        riding.forget_actor(rider);
    }
}
