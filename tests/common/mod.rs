//! Shared helpers for headless simulation tests.
#![allow(dead_code)]

use bevy::ecs::message::Messages;
use bevy::prelude::*;

use zonephys::game::actor::ActorBody;
use zonephys::game::platform::{Behavior, PlatformMachine, SpawnRecord};
use zonephys::game::simulation::{
    LevelTeardown, ObjectPosition, RenderCommand, SimSet, SimulationPlugin, SoundCue, SoundKind, SpawnObjectCommand,
};
use zonephys::game::terrain::{TerrainProvider, TerrainQuery};

/// Everything the simulation emitted, in emission order.
#[derive(Resource, Default)]
pub struct Captured {
    pub renders: Vec<RenderCommand>,
    pub sounds: Vec<SoundCue>,
}

impl Captured {
    pub fn sound_count(&self, kind: SoundKind) -> usize {
        self.sounds.iter().filter(|cue| cue.kind == kind).count()
    }
}

fn capture_outputs(
    mut renders: MessageReader<RenderCommand>,
    mut sounds: MessageReader<SoundCue>,
    mut captured: ResMut<Captured>,
) {
    captured.renders.extend(renders.read().copied());
    captured.sounds.extend(sounds.read().copied());
}

/// Headless app with the simulation plugin and its startup already run.
pub fn sim_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(SimulationPlugin);
    app.init_resource::<Captured>();
    app.add_systems(FixedUpdate, capture_outputs.after(SimSet::Render).before(SimSet::Cleanup));
    app.world_mut().run_schedule(Startup);
    app
}

pub fn set_terrain(app: &mut App, provider: impl TerrainProvider + 'static) {
    app.world_mut().resource_mut::<TerrainQuery>().set_provider(provider);
}

pub fn request_spawn(app: &mut App, record: SpawnRecord, spawn_id: Option<u32>) {
    app.world_mut()
        .resource_mut::<Messages<SpawnObjectCommand>>()
        .write(SpawnObjectCommand { record, spawn_id });
}

pub fn request_teardown(app: &mut App) {
    app.world_mut().resource_mut::<Messages<LevelTeardown>>().write(LevelTeardown);
}

pub fn spawn_actor(app: &mut App, body: ActorBody) -> Entity {
    app.world_mut().spawn(body).id()
}

pub fn tick(app: &mut App) {
    app.world_mut().run_schedule(FixedUpdate);
}

pub fn run_ticks(app: &mut App, count: usize) {
    for _ in 0..count {
        tick(app);
    }
}

/// Tick until `done` holds, returning how many ticks it took.
pub fn run_until(app: &mut App, max_ticks: usize, mut done: impl FnMut(&mut World) -> bool) -> Option<usize> {
    for ticks in 1..=max_ticks {
        tick(app);
        if done(app.world_mut()) {
            return Some(ticks);
        }
    }
    None
}

/// Objects of `type_id`, in entity order.
pub fn objects_of_type(app: &mut App, type_id: u8) -> Vec<Entity> {
    let mut query = app.world_mut().query::<(Entity, &Behavior)>();
    let mut found: Vec<Entity> = query
        .iter(app.world())
        .filter(|(_, behavior)| behavior.type_id == type_id)
        .map(|(entity, _)| entity)
        .collect();
    found.sort();
    found
}

pub fn position(app: &App, entity: Entity) -> IVec2 {
    app.world().get::<ObjectPosition>(entity).map(|p| p.pixel()).expect("object has a position")
}

pub fn machine(app: &App, entity: Entity) -> PlatformMachine {
    app.world().get::<PlatformMachine>(entity).cloned().expect("object has a state machine")
}

pub fn actor(app: &App, entity: Entity) -> ActorBody {
    app.world().get::<ActorBody>(entity).cloned().expect("actor exists")
}

pub fn is_standing_on_object(world: &World, entity: Entity) -> bool {
    world.get::<ActorBody>(entity).is_some_and(|a| a.on_object && !a.airborne)
}
