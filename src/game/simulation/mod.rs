/// Simulation layer - deterministic per-tick game logic.
///
/// This module is organized into:
/// - **components**: Object position and lifecycle markers
/// - **resources**: Tick counter, fixed-point config, spawn memory
/// - **events**: Spawn/teardown input, render/sound output
/// - **systems**: Tick bookkeeping, intake, object updates, cleanup
/// - **systems_config**: Startup config conversion
///
/// The tick order is fixed: oscillation, actors, objects, solid resolution,
/// render output. Objects therefore always see the previous resolver pass's
/// contacts.

use bevy::prelude::*;

use crate::game::actor::integrate_actors;
use crate::game::objects::standard_registry;
use crate::game::oscillation::OscillationTable;
use crate::game::platform::BehaviorRegistry;
use crate::game::solid::{resolve_solids, RidingState};
use crate::game::terrain::TerrainQuery;

// Module declarations
pub mod components;
pub mod resources;
pub mod events;
pub mod systems;
pub mod systems_config;

// Re-export commonly used items
pub use components::*;
pub use resources::*;
pub use events::*;

// System sets for organizing execution order
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub enum SimSet {
    Tick,        // Tick counter and timing
    Intake,      // Spawn requests
    Oscillation, // Shared oscillators
    Actors,      // Actor integration against terrain
    Objects,     // Behavior state machines
    Solids,      // Actor vs object resolution
    Render,      // Output commands
    Cleanup,     // Despawns and teardown
}

/// Main simulation plugin
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Configure FixedUpdate timestep (overwritten from InitialConfig at startup)
        app.insert_resource(Time::<Fixed>::from_hz(60.0));

        app.init_resource::<SimConfig>();
        app.init_resource::<SimPerformance>();
        app.init_resource::<SimTick>();
        app.init_resource::<DebugConfig>();
        app.init_resource::<OscillationTable>();
        app.init_resource::<TerrainQuery>();
        app.init_resource::<RidingState>();
        app.init_resource::<RespawnMemory>();
        if !app.world().contains_resource::<BehaviorRegistry>() {
            app.insert_resource(standard_registry());
        }

        // Register messages
        app.add_message::<SpawnObjectCommand>();
        app.add_message::<LevelTeardown>();
        app.add_message::<RenderCommand>();
        app.add_message::<SoundCue>();

        // Configure System Sets
        app.configure_sets(FixedUpdate, (
            SimSet::Tick,
            SimSet::Intake,
            SimSet::Oscillation,
            SimSet::Actors,
            SimSet::Objects,
            SimSet::Solids,
            SimSet::Render,
            SimSet::Cleanup,
        ).chain());

        // Startup systems
        app.add_systems(Startup, (
            systems_config::init_sim_config_from_initial
                .after(crate::game::config::load_initial_config),
            systems::init_level,
        ).chain());

        // Fixed update systems (deterministic simulation)
        app.add_systems(FixedUpdate, (
            (systems::increment_sim_tick, systems::sim_start).chain().in_set(SimSet::Tick),
            systems::process_spawn_commands.in_set(SimSet::Intake),
            systems::advance_oscillation.in_set(SimSet::Oscillation),
            integrate_actors.in_set(SimSet::Actors),
            systems::update_objects.in_set(SimSet::Objects),
            resolve_solids.in_set(SimSet::Solids),
            systems::emit_render_commands.in_set(SimSet::Render),
            (
                systems::cleanup_destroyed,
                systems::handle_level_teardown,
                systems::sim_end,
            ).chain().in_set(SimSet::Cleanup),
        ));
    }
}
