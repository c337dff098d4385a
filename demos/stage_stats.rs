/// Stress run: a crowded level, per-tick timings printed every simulated second.
use bevy::ecs::message::Messages;
use bevy::prelude::*;
use std::time::Duration;
use zonephys::game::actor::{ActorBody, ActorRole};
use zonephys::game::fixed_math::velocity;
use zonephys::game::objects::{BUMPER, LEDGE, PLATFORM, ROTOR, SPIKES, SPRING, STAIRCASE};
use zonephys::game::platform::{Behavior, SpawnRecord};
use zonephys::game::simulation::{SimPerformance, SimulationPlugin, SpawnObjectCommand};
use zonephys::game::solid::RidingState;
use zonephys::game::terrain::{FlatTerrain, TerrainQuery};

const OBJECTS: u32 = 2_000;
const ACTORS: usize = 200;
const TICKS: usize = 600;
const LEVEL_WIDTH: i32 = 32_000;

fn main() {
    let mut app = App::new();

    app.add_plugins((
        MinimalPlugins,
        bevy::log::LogPlugin::default(),
    ));
    app.add_plugins(SimulationPlugin);
    app.world_mut().run_schedule(Startup);

    app.world_mut().resource_mut::<TerrainQuery>().set_provider(FlatTerrain::floor(900));

    let mut rng = fastrand::Rng::with_seed(42);
    let types = [PLATFORM, LEDGE, ROTOR, STAIRCASE, SPRING, BUMPER, SPIKES];

    {
        let mut spawns = app.world_mut().resource_mut::<Messages<SpawnObjectCommand>>();
        for index in 0..OBJECTS {
            let type_id = types[rng.usize(..types.len())];
            let record = SpawnRecord::new(type_id, rng.i32(0..LEVEL_WIDTH), rng.i32(300..800), rng.u8(..));
            spawns.write(SpawnObjectCommand { record, spawn_id: (type_id == LEDGE).then_some(index) });
        }
    }

    for index in 0..ACTORS {
        let role = if index == 0 { ActorRole::Player } else { ActorRole::Sidekick };
        let mut body = ActorBody::new(role, rng.i32(0..LEVEL_WIDTH), rng.i32(0..300));
        body.vx = velocity(rng.i16(-0x300..=0x300));
        app.world_mut().spawn(body);
    }

    println!("Running {} ticks with {} objects and {} actors...\n", TICKS, OBJECTS, ACTORS);
    let mut total = Duration::ZERO;
    let mut worst = Duration::ZERO;
    for tick in 1..=TICKS {
        app.world_mut().run_schedule(FixedUpdate);
        let last = app.world().resource::<SimPerformance>().last_duration;
        total += last;
        worst = worst.max(last);

        if tick % 60 == 0 {
            let objects = app.world_mut().query::<&Behavior>().iter(app.world()).count();
            let riders = app.world().resource::<RidingState>().ride_count();
            println!(
                "=== Tick {} === objects: {} | riders: {} | last: {:?} | worst: {:?}",
                tick, objects, riders, last, worst
            );
        }
    }
    println!("\nAverage tick: {:?}", total / TICKS as u32);
}
