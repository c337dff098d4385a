mod common;

use bevy::ecs::system::RunSystemOnce;
use bevy::prelude::*;

use common::*;
use zonephys::game::actor::{ActorBody, ActorRole};
use zonephys::game::fixed_math::{velocity, Velocity};
use zonephys::game::objects::{PLATFORM, SPIKES, SPRING};
use zonephys::game::platform::SpawnRecord;
use zonephys::game::simulation::SoundKind;
use zonephys::game::solid::{resolve_solids, ObjectContacts, RidingState};

fn falling_actor(x: i32, feet: i32) -> ActorBody {
    let mut body = ActorBody::new(ActorRole::Player, x, 0);
    body.snap_feet_to(feet);
    body.vy = velocity(0x200);
    body
}

fn ridden_owner(app: &App, actor_entity: Entity) -> Option<Entity> {
    app.world().resource::<RidingState>().ride_of(actor_entity).map(|ride| ride.volume.owner)
}

#[test]
fn falling_actor_lands_on_platform_top() {
    let mut app = sim_app();
    request_spawn(&mut app, SpawnRecord::new(PLATFORM, 200, 292, 0x00), None);
    let player = spawn_actor(&mut app, falling_actor(200, 270));

    let landed = run_until(&mut app, 60, |world| is_standing_on_object(world, player));
    assert!(landed.is_some(), "actor never landed");

    let body = actor(&app, player);
    assert_eq!(body.feet(), 284);
    assert_eq!(body.vy, Velocity::ZERO);

    let platform = objects_of_type(&mut app, PLATFORM)[0];
    assert_eq!(ridden_owner(&app, player), Some(platform));

    run_ticks(&mut app, 20);
    assert_eq!(actor(&app, player).feet(), 284);
    assert!(is_standing_on_object(app.world(), player));
}

#[test]
fn equal_distance_seam_prefers_the_earlier_object() {
    let mut app = sim_app();
    request_spawn(&mut app, SpawnRecord::new(PLATFORM, 200, 292, 0x00), None);
    request_spawn(&mut app, SpawnRecord::new(PLATFORM, 232, 292, 0x00), None);
    let player = spawn_actor(&mut app, falling_actor(216, 270));

    run_until(&mut app, 60, |world| is_standing_on_object(world, player)).expect("actor lands");

    let platforms = objects_of_type(&mut app, PLATFORM);
    assert_eq!(platforms.len(), 2);
    let first = platforms
        .iter()
        .copied()
        .find(|&entity| position(&app, entity).x == 200)
        .expect("left platform");
    assert_eq!(ridden_owner(&app, player), Some(first));
}

#[test]
fn rider_moves_with_a_swinging_platform() {
    let mut app = sim_app();
    request_spawn(&mut app, SpawnRecord::new(PLATFORM, 100, 200, 0x01), None);
    let player = spawn_actor(&mut app, falling_actor(100, 176));

    run_until(&mut app, 20, |world| is_standing_on_object(world, player)).expect("actor lands");
    let platform = objects_of_type(&mut app, PLATFORM)[0];
    let offset = actor(&app, player).pixel_x() - position(&app, platform).x;

    for _ in 0..90 {
        tick(&mut app);
        let body = actor(&app, player);
        assert!(is_standing_on_object(app.world(), player));
        assert_eq!(body.pixel_x() - position(&app, platform).x, offset);
        assert_eq!(body.feet(), 192);
    }
}

#[test]
fn walking_past_the_edge_releases_the_rider() {
    let mut app = sim_app();
    request_spawn(&mut app, SpawnRecord::new(PLATFORM, 200, 292, 0x00), None);
    let player = spawn_actor(&mut app, falling_actor(200, 270));
    run_until(&mut app, 60, |world| is_standing_on_object(world, player)).expect("actor lands");

    app.world_mut().get_mut::<ActorBody>(player).expect("actor").vx = velocity(0x100);
    let released = run_until(&mut app, 60, |world| world.get::<ActorBody>(player).is_some_and(|a| a.airborne));
    assert!(released.is_some());
    assert!(actor(&app, player).pixel_x() >= 232);
    assert_eq!(ridden_owner(&app, player), None);
}

#[test]
fn spring_launches_on_the_landing_tick() {
    let mut app = sim_app();
    request_spawn(&mut app, SpawnRecord::new(SPRING, 200, 300, 0x00), None);
    let player = spawn_actor(&mut app, falling_actor(200, 280));

    run_until(&mut app, 30, |world| world.get::<ActorBody>(player).is_some_and(|a| a.vy < Velocity::ZERO))
        .expect("spring fires");
    let launched = actor(&app, player);
    assert!(launched.airborne);
    assert_eq!(launched.vy, -velocity(0x1000));
    assert_eq!(app.world().resource::<Captured>().sound_count(SoundKind::Spring), 1);

    let feet = launched.feet();
    run_ticks(&mut app, 5);
    let later = actor(&app, player);
    assert!(later.feet() < feet - 40);
    assert!(!later.on_object);
    assert_eq!(ridden_owner(&app, player), None);
    assert_eq!(app.world().resource::<Captured>().sound_count(SoundKind::Spring), 1);
}

#[test]
fn repeated_resolution_in_one_tick_changes_nothing() {
    let mut app = sim_app();
    request_spawn(&mut app, SpawnRecord::new(SPRING, 200, 300, 0x00), None);
    let player = spawn_actor(&mut app, falling_actor(200, 280));

    run_until(&mut app, 30, |world| world.get::<ActorBody>(player).is_some_and(|a| a.vy < Velocity::ZERO))
        .expect("spring fires");
    let spring = objects_of_type(&mut app, SPRING)[0];
    let contacts = app.world().get::<ObjectContacts>(spring).cloned().expect("spring contacts");
    let body = actor(&app, player);
    let riding = app.world().resource::<RidingState>();
    let (ride, latch) = (riding.ride_of(player), riding.latch(spring));
    assert!(contacts.any_standing());

    app.world_mut().run_system_once(resolve_solids).expect("resolver runs");

    assert_eq!(app.world().get::<ObjectContacts>(spring), Some(&contacts));
    assert_eq!(actor(&app, player), body);
    let riding = app.world().resource::<RidingState>();
    assert_eq!((riding.ride_of(player), riding.latch(spring)), (ride, latch));

    tick(&mut app);
    assert_eq!(app.world().resource::<Captured>().sound_count(SoundKind::Spring), 1);
}

#[test]
fn spikes_hurt_once_while_invulnerable() {
    let mut app = sim_app();
    request_spawn(&mut app, SpawnRecord::new(SPIKES, 200, 300, 0x00), None);
    let player = spawn_actor(&mut app, falling_actor(200, 270));

    run_until(&mut app, 60, |world| world.get::<ActorBody>(player).is_some_and(|a| a.invulnerable > 0))
        .expect("spikes hurt");
    let hurt = actor(&app, player);
    assert!(hurt.airborne);
    assert!(hurt.vy < Velocity::ZERO);
    assert!(hurt.vx > Velocity::ZERO);

    run_ticks(&mut app, 60);
    assert_eq!(app.world().resource::<Captured>().sound_count(SoundKind::Hurt), 1);
}
