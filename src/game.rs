use bevy::prelude::*;

pub mod actor;
pub mod config;
pub mod fixed_math;
pub mod objects;
pub mod oscillation;
pub mod platform;
pub mod simulation;
pub mod solid;
pub mod terrain;

use config::ConfigPlugin;
use simulation::SimulationPlugin;

/// Config loading plus the deterministic simulation.
///
/// Needs an asset server for the hot-reloaded runtime config; headless tests
/// add [`SimulationPlugin`] on its own instead.
pub struct GamePlugin;

impl Plugin for GamePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((ConfigPlugin, SimulationPlugin));
    }
}
