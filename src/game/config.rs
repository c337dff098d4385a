use bevy::prelude::*;
use bevy_common_assets::ron::RonAssetPlugin;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::game::simulation::DebugConfig;

pub const INITIAL_CONFIG_PATH: &str = "assets/initial_config.ron";
pub const RUNTIME_CONFIG_ASSET: &str = "zone.runtime.ron";

/// Static configuration loaded once at startup. Every value here feeds the
/// deterministic tick path; changing one mid-level changes replays.
///
/// Velocities and accelerations are raw 8.8 words (`0x38` is 0.21875 px/tick).
#[derive(Resource, Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct InitialConfig {
    pub tick_rate: f64,

    // Actor physics
    pub gravity: i16,
    pub max_fall_speed: i16,

    // Solid object contact
    pub stand_above: i32,
    pub stand_below: i32,
    pub side_min_overlap: i32,

    // Terrain
    pub probe_range: i32,

    // Object timings (ticks)
    pub fall_delay: u16,
    pub collapse_delay: u16,
    pub spring_lock: u16,
    pub hurt_invulnerability: u16,
    pub fall_despawn_distance: i32,
}

impl Default for InitialConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            gravity: 0x38,
            max_fall_speed: 0x1000,
            stand_above: 4,
            stand_below: 12,
            side_min_overlap: 4,
            probe_range: 32,
            fall_delay: 30,
            collapse_delay: 7,
            spring_lock: 15,
            hurt_invulnerability: 120,
            fall_despawn_distance: 0x200,
        }
    }
}

/// Runtime configuration that can be hot-reloaded during play.
/// Only debug switches live here; nothing in it affects the simulation.
#[derive(Deserialize, Serialize, Asset, TypePath, Clone, Debug, Default)]
#[serde(default)]
pub struct RuntimeConfig {
    pub log_contacts: bool,
    pub log_transitions: bool,
    pub log_spawns: bool,
}

#[derive(Resource)]
pub struct RuntimeConfigHandle(pub Handle<RuntimeConfig>);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ron::error::SpannedError,
    },
}

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(RonAssetPlugin::<RuntimeConfig>::new(&["runtime.ron"]))
            .init_resource::<DebugConfig>()
            .add_systems(Startup, (load_initial_config, setup_runtime_config).chain())
            .add_systems(Update, update_debug_from_runtime_config);
    }
}

/// Parse an [`InitialConfig`] from RON text. Missing fields take their defaults.
pub fn parse_initial_config(contents: &str, path: &str) -> Result<InitialConfig, ConfigError> {
    ron::from_str::<InitialConfig>(contents).map_err(|source| ConfigError::Parse { path: path.to_string(), source })
}

pub fn read_initial_config(path: impl AsRef<Path>) -> Result<InitialConfig, ConfigError> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io { path: display.clone(), source })?;
    parse_initial_config(&contents, &display)
}

/// Load static initial configuration synchronously at startup.
/// Falls back to defaults on any error so a broken file never blocks a level.
pub fn load_initial_config(mut commands: Commands) {
    match read_initial_config(INITIAL_CONFIG_PATH) {
        Ok(config) => {
            info!("Loaded initial config from {}", INITIAL_CONFIG_PATH);
            commands.insert_resource(config);
        }
        Err(e) => {
            error!("{}", e);
            error!("Using default InitialConfig");
            commands.insert_resource(InitialConfig::default());
        }
    }
}

/// Load runtime configuration asynchronously (can be hot-reloaded).
fn setup_runtime_config(mut commands: Commands, asset_server: Res<AssetServer>) {
    let handle = asset_server.load(RUNTIME_CONFIG_ASSET);
    commands.insert_resource(RuntimeConfigHandle(handle));
}

/// Copy the hot-reloaded debug switches into [`DebugConfig`].
pub fn update_debug_from_runtime_config(
    config_handle: Option<Res<RuntimeConfigHandle>>,
    runtime_configs: Res<Assets<RuntimeConfig>>,
    mut events: MessageReader<AssetEvent<RuntimeConfig>>,
    mut debug_config: ResMut<DebugConfig>,
) {
    let Some(config_handle) = config_handle else {
        return;
    };
    for event in events.read() {
        let id = config_handle.0.id();
        if !(event.is_modified(id) || event.is_loaded_with_dependencies(id)) {
            continue;
        }
        if let Some(config) = runtime_configs.get(&config_handle.0) {
            debug_config.log_contacts = config.log_contacts;
            debug_config.log_transitions = config.log_transitions;
            debug_config.log_spawns = config.log_spawns;
            info!("Runtime config loaded/updated: {:?}", *debug_config);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = parse_initial_config("(gravity: 0x40, fall_delay: 12)", "inline").expect("valid ron");
        assert_eq!(config.gravity, 0x40);
        assert_eq!(config.fall_delay, 12);
        assert_eq!(config.max_fall_speed, 0x1000);
        assert_eq!(config.tick_rate, 60.0);
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let err = parse_initial_config("(gravity: \"heavy\")", "inline").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().starts_with("failed to parse inline"));
    }

    #[test]
    fn missing_file_reports_io_error() {
        let err = read_initial_config("does/not/exist.ron").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
