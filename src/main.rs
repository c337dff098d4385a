use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;

use zonephys::game::actor::{ActorBody, ActorRole};
use zonephys::game::fixed_math::velocity;
use zonephys::game::objects::{BUMPER, LEDGE, PLATFORM, ROTOR, SPIKES, SPRING, STAIRCASE};
use zonephys::game::platform::SpawnRecord;
use zonephys::game::simulation::{systems, SimSet, SimTick, SoundCue, SpawnObjectCommand};
use zonephys::game::solid::RidingState;
use zonephys::game::terrain::{HeightMapTerrain, TerrainQuery};
use zonephys::game::GamePlugin;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Ticks the headless demo runs before exiting.
const DEMO_TICKS: u64 = 1200;
const LEVEL_WIDTH: i32 = 2048;
const FLOOR_Y: i32 = 640;

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bevy_ecs=info,zonephys=info"))
}

fn setup_file_logging() -> std::io::Result<String> {
    let log_dir = PathBuf::from("logs");
    fs::create_dir_all(&log_dir)?;

    // Keep only the last 25 runs
    cleanup_old_logs(&log_dir, 25);

    let now = chrono::Local::now();
    let log_filename = format!("zonephys_{}.log", now.format("%Y%m%d_%H%M%S"));
    let log_path_str = log_dir.join(&log_filename).to_string_lossy().to_string();

    let file_appender = RollingFileAppender::new(Rotation::NEVER, &log_dir, &log_filename);
    let file_layer = fmt::layer().with_writer(file_appender).with_ansi(false);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);

    tracing_subscriber::registry()
        .with(log_filter())
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(log_path_str)
}

fn cleanup_old_logs(log_dir: &Path, keep_count: usize) {
    let Ok(entries) = fs::read_dir(log_dir) else {
        return;
    };
    let mut log_files: Vec<_> = entries
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|s| s.starts_with("zonephys") && s.ends_with(".log"))
        })
        .collect();

    // Oldest first
    log_files.sort_by_key(|e| e.metadata().ok().and_then(|m| m.modified().ok()));

    if log_files.len() > keep_count {
        for file in log_files.iter().take(log_files.len() - keep_count) {
            let _ = fs::remove_file(file.path());
        }
    }
}

// ============================================================================
// Demo Level
// ============================================================================

/// Rolling floor with a pit in the middle that only the objects bridge.
fn demo_terrain() -> HeightMapTerrain {
    HeightMapTerrain::new(0, 16, (LEVEL_WIDTH / 16) as usize)
        .with_floor(0, 640, FLOOR_Y)
        .with_floor(640, 768, FLOOR_Y - 32)
        .with_floor(1280, LEVEL_WIDTH, FLOOR_Y)
        .with_ceiling(0, 128, 64)
}

fn demo_objects() -> Vec<(SpawnRecord, Option<u32>)> {
    vec![
        (SpawnRecord::new(SPRING, 300, FLOOR_Y - 8, 0x00), None),
        (SpawnRecord::new(PLATFORM, 820, 560, 0x01), None),
        (SpawnRecord::new(PLATFORM, 900, 520, 0x12), None),
        (SpawnRecord::new(LEDGE, 980, 560, 0x00), Some(1)),
        (SpawnRecord::new(PLATFORM, 1060, 580, 0x03), None),
        (SpawnRecord::new(PLATFORM, 1120, 560, 0x07), None),
        (SpawnRecord::new(ROTOR, 1000, 400, 0x10), None),
        (SpawnRecord::new(STAIRCASE, 1400, 560, 0x00), None),
        (SpawnRecord::new(BUMPER, 1550, 580, 0x00), None),
        (SpawnRecord::new(SPIKES, 1700, FLOOR_Y - 16, 0x00), None),
        (SpawnRecord::new(PLATFORM, 1800, 520, 0x05), None),
        (SpawnRecord::new(PLATFORM, 1900, 600, 0x06), None),
    ]
}

/// Load the demo level on the first tick so the spawns land in the same
/// tick's intake.
fn spawn_demo_level(
    tick: Res<SimTick>,
    mut terrain: ResMut<TerrainQuery>,
    mut spawns: MessageWriter<SpawnObjectCommand>,
    mut commands: Commands,
) {
    if tick.0 != 1 {
        return;
    }
    terrain.set_provider(demo_terrain());
    spawns.write_batch(
        demo_objects()
            .into_iter()
            .map(|(record, spawn_id)| SpawnObjectCommand { record, spawn_id }),
    );
    commands.spawn(ActorBody::new(ActorRole::Player, 120, FLOOR_Y - 120));
    commands.spawn(ActorBody::new(ActorRole::Sidekick, 90, FLOOR_Y - 120));
    info!("Demo level loaded: {} objects", demo_objects().len());
}

/// Run right at walking pace, turning round at the level edges.
fn drive_actors(mut actors: Query<&mut ActorBody>) {
    for mut actor in actors.iter_mut() {
        let heading = match actor.pixel_x() {
            x if x >= LEVEL_WIDTH - 64 => -1,
            x if x <= 64 => 1,
            _ => actor.facing.sign(),
        };
        actor.steer(velocity(0x180 * heading as i16));
    }
}

fn report_outputs(
    tick: Res<SimTick>,
    mut sounds: MessageReader<SoundCue>,
    actors: Query<(Entity, &ActorBody)>,
    riding: Res<RidingState>,
    mut exit: MessageWriter<AppExit>,
) {
    for cue in sounds.read() {
        info!("[tick {}] sound {:?} from {:?}", cue.tick, cue.kind, cue.source);
    }
    if tick.0 % 120 == 0 {
        for (entity, actor) in actors.iter() {
            let support = riding.ride_of(entity).map(|ride| ride.volume.owner);
            info!(
                "[tick {}] {:?} at ({}, {}) airborne={} riding={:?}",
                tick.0,
                actor.role,
                actor.pixel_x(),
                actor.feet(),
                actor.airborne,
                support
            );
        }
    }
    if tick.0 >= DEMO_TICKS {
        info!("Demo finished after {} ticks", tick.0);
        exit.write(AppExit::Success);
    }
}

fn main() {
    match setup_file_logging() {
        Ok(log_file) => {
            println!("╔══════════════════════════════════════════════════════════╗");
            println!("║  zonephys - Logging to file                              ║");
            println!("╠══════════════════════════════════════════════════════════╣");
            println!("║  Log file: {:<45} ║", log_file);
            println!("╚══════════════════════════════════════════════════════════╝");
        }
        Err(err) => {
            eprintln!("File logging unavailable ({err}); logging to stdout only");
            tracing_subscriber::registry().with(log_filter()).with(fmt::layer()).init();
        }
    }

    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(1.0 / 60.0))))
        .add_plugins(AssetPlugin::default())
        .add_plugins(GamePlugin)
        .add_systems(FixedUpdate, (
            spawn_demo_level.in_set(SimSet::Tick).after(systems::increment_sim_tick),
            drive_actors.in_set(SimSet::Intake),
            report_outputs.after(SimSet::Render).before(SimSet::Cleanup),
        ))
        .run();
}
