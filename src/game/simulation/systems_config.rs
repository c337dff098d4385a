/// Configuration initialization systems
///
/// Turns the startup [`InitialConfig`] (loaded from initial_config.ron) into
/// the fixed-point [`SimConfig`] and pushes the values that belong to other
/// services (fixed timestep, terrain probe range) where they live.

use bevy::prelude::*;

use crate::game::config::InitialConfig;
use crate::game::terrain::TerrainQuery;

use crate::game::simulation::resources::*;

/// Initialize SimConfig from InitialConfig at startup
pub fn init_sim_config_from_initial(
    mut fixed_time: ResMut<Time<Fixed>>,
    mut sim_config: ResMut<SimConfig>,
    mut terrain: ResMut<TerrainQuery>,
    initial_config: Option<Res<InitialConfig>>,
) {
    info!("Initializing SimConfig from InitialConfig");

    let config = match &initial_config {
        Some(cfg) => cfg.as_ref(),
        None => {
            warn!("InitialConfig not found, using defaults");
            &InitialConfig::default()
        }
    };

    if config.tick_rate > 0.0 {
        fixed_time.set_timestep_seconds(1.0 / config.tick_rate);
    } else {
        error!("Invalid tick_rate {}, keeping {:?} timestep", config.tick_rate, fixed_time.timestep());
    }

    *sim_config = SimConfig::from_initial(config);
    terrain.set_probe_range(sim_config.probe_range);

    info!(
        "SimConfig initialized: {} Hz, gravity {:#06x}, max fall {:#06x}, stand band -{}..+{}",
        sim_config.tick_rate,
        sim_config.gravity.to_bits(),
        sim_config.max_fall_speed.to_bits(),
        sim_config.stand_above,
        sim_config.stand_below
    );
}
