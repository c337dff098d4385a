/// Solid-object resolution.
///
/// Runs once per tick after every object has moved. For each actor (player
/// first, then sidekick) it classifies the actor against every active volume,
/// applies at most one vertical and one horizontal correction, keeps the
/// riding records in [`RidingState`] and hands each non-empty
/// [`ContactResult`] to the owning behavior.

use bevy::prelude::*;
use smallvec::SmallVec;
use zonephys_macros::profile;

use crate::game::actor::{ActorBody, Facing};
use crate::game::fixed_math::Velocity;
use crate::game::platform::context::ContactContext;
use crate::game::platform::registry::{Behavior, BehaviorRegistry};
use crate::game::platform::PlatformMachine;
use crate::game::simulation::{DebugConfig, Destroyed, ObjectPosition, SimConfig, SimTick, SoundCue};

use super::contact::{ContactResult, ObjectContacts};
use super::riding::{RideRecord, RidingState, VolumeKey};
use super::volume::{SolidBody, SolidVolume};

// ============================================================================
// Pure resolution
// ============================================================================

/// Tolerances of the classification, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolverRules {
    /// Feet may hover this far above a top edge and still land.
    pub stand_above: i32,
    /// Feet may sink this far below a top edge and still land.
    pub stand_below: i32,
    /// Side contacts overlapping vertically by no more than this are flagged
    /// without a push.
    pub side_min_overlap: i32,
}

impl Default for ResolverRules {
    fn default() -> Self {
        Self { stand_above: 4, stand_below: 12, side_min_overlap: 4 }
    }
}

impl ResolverRules {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            stand_above: config.stand_above,
            stand_below: config.stand_below,
            side_min_overlap: config.side_min_overlap,
        }
    }
}

/// One volume as seen by one actor this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VolumeSnapshot {
    pub key: VolumeKey,
    pub center: IVec2,
    pub volume: SolidVolume,
    /// Whether the owner currently collides with this actor at all.
    pub solid: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActorResolution {
    /// Non-empty results in volume-key order.
    pub contacts: SmallVec<[(VolumeKey, ContactResult); 4]>,
    /// Volume the actor started riding this pass.
    pub landed: Option<VolumeKey>,
    /// Volume the actor stopped riding this pass.
    pub released: Option<VolumeKey>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Candidate {
    Stand { top: i32, distance: i32 },
    TopTouch,
    Bottom { push: i32 },
    Side { push: i32, penetration: i32, into: bool, on_right: bool },
    SideTouch,
}

/// Horizontal reach test. Top-solid volumes need the actor's centre over the
/// edge; full-solid volumes include the actor's own radius.
fn within_reach(volume: &SolidVolume, actor: &ActorBody, dx: i32) -> bool {
    let half_width = volume.half_width();
    if volume.is_top_solid() {
        (-half_width..half_width).contains(&dx)
    } else {
        dx.abs() <= half_width + actor.x_radius
    }
}

fn classify(actor: &ActorBody, snapshot: &VolumeSnapshot, rules: &ResolverRules) -> Option<Candidate> {
    let falling = actor.vy >= Velocity::ZERO;
    let volume = &snapshot.volume;
    let half_height = volume.half_height(actor.vy);
    let top = snapshot.center.y - half_height;
    let pen_top = actor.feet() - top;
    let dx = actor.pixel_x() - snapshot.center.x;

    if !within_reach(volume, actor, dx) {
        return None;
    }

    let in_band = (-rules.stand_above..=rules.stand_below).contains(&pen_top);

    if volume.is_top_solid() {
        if !in_band {
            return None;
        }
        return Some(if falling { Candidate::Stand { top, distance: pen_top.abs() } } else { Candidate::TopTouch });
    }

    let w = volume.half_width() + actor.x_radius;
    let h = half_height + actor.y_radius;
    if pen_top < -rules.stand_above || pen_top > 2 * h {
        return None;
    }

    let x_pen = w - dx.abs();
    let y_pen_top = pen_top + rules.stand_above;
    let y_pen_bottom = 2 * h - pen_top;
    let y_pen = y_pen_top.min(y_pen_bottom);

    if x_pen > y_pen {
        if y_pen_top <= y_pen_bottom {
            if in_band {
                return Some(if falling { Candidate::Stand { top, distance: pen_top.abs() } } else { Candidate::TopTouch });
            }
        } else {
            return Some(Candidate::Bottom { push: y_pen_bottom });
        }
    }

    if y_pen <= rules.side_min_overlap {
        return Some(Candidate::SideTouch);
    }
    // Volume to the actor's right pushes it left.
    let on_right = dx < 0;
    let push = if on_right { -x_pen } else { x_pen };
    let into = if on_right { actor.vx > Velocity::ZERO } else { actor.vx < Velocity::ZERO };
    Some(Candidate::Side { push, penetration: x_pen, into, on_right })
}

/// Carry a riding actor by its volume's displacement. `None` releases it.
fn continue_ride(actor: &mut ActorBody, record: RideRecord, volumes: &[VolumeSnapshot]) -> Option<VolumeSnapshot> {
    if actor.airborne || actor.vy < Velocity::ZERO {
        return None;
    }
    let snapshot = volumes.iter().find(|v| v.key == record.volume && v.solid)?;

    let carry = snapshot.center - record.anchor;
    actor.shift(carry.x, 0);
    if !within_reach(&snapshot.volume, actor, actor.pixel_x() - snapshot.center.x) {
        return None;
    }
    actor.snap_feet_to(snapshot.center.y - snapshot.volume.ground_half_height());
    actor.vy = Velocity::ZERO;
    actor.on_object = true;
    Some(*snapshot)
}

/// Resolve one actor against `volumes`.
///
/// Calling this twice in the same tick with the same volumes leaves the actor,
/// the riding state and the reported contacts unchanged the second time.
pub fn resolve_actor(
    actor: &mut ActorBody,
    actor_entity: Entity,
    volumes: &[VolumeSnapshot],
    riding: &mut RidingState,
    rules: &ResolverRules,
) -> ActorResolution {
    let mut out = ActorResolution::default();

    // Riding continuation claims the vertical correction.
    let mut ridden = None;
    if let Some(record) = riding.ride_of(actor_entity) {
        match continue_ride(actor, record, volumes) {
            Some(snapshot) => {
                riding.ride(actor_entity, snapshot.key, snapshot.center);
                ridden = Some(snapshot.key);
                out.contacts.push((snapshot.key, ContactResult::standing()));
            }
            None => {
                riding.release(actor_entity);
                actor.set_airborne(true);
                out.released = Some(record.volume);
            }
        }
    } else if actor.on_object {
        // Support record dropped with its object.
        actor.set_airborne(true);
    }

    let mut order: SmallVec<[&VolumeSnapshot; 16]> = volumes.iter().filter(|v| v.solid).collect();
    order.sort_by_key(|v| v.key);

    let mut stand: Option<(&VolumeSnapshot, i32, i32)> = None;
    let mut bottom: Option<(&VolumeSnapshot, i32)> = None;
    let mut side: Option<(&VolumeSnapshot, Candidate)> = None;

    for snapshot in order {
        if Some(snapshot.key) == ridden {
            continue;
        }
        match classify(actor, snapshot, rules) {
            Some(Candidate::Stand { top, distance }) => {
                if stand.map_or(true, |(_, _, best)| distance < best) {
                    stand = Some((snapshot, top, distance));
                }
            }
            Some(Candidate::Bottom { push }) => {
                if bottom.map_or(true, |(_, best)| push < best) {
                    bottom = Some((snapshot, push));
                }
            }
            Some(candidate @ Candidate::Side { penetration, into, .. }) => {
                let better = match side {
                    Some((_, Candidate::Side { penetration: best_pen, into: best_into, .. })) => {
                        (into, penetration) > (best_into, best_pen)
                    }
                    _ => true,
                };
                if better {
                    side = Some((snapshot, candidate));
                }
            }
            Some(Candidate::TopTouch) => {
                out.contacts.push((snapshot.key, ContactResult { touch_top: true, ..ContactResult::NONE }));
            }
            Some(Candidate::SideTouch) => {
                out.contacts.push((snapshot.key, ContactResult { touch_side: true, ..ContactResult::NONE }));
            }
            None => {}
        }
    }

    if ridden.is_none() {
        if let Some((snapshot, top, _)) = stand {
            actor.snap_feet_to(top);
            actor.vy = Velocity::ZERO;
            actor.airborne = false;
            actor.on_object = true;
            riding.ride(actor_entity, snapshot.key, snapshot.center);
            out.landed = Some(snapshot.key);
            out.contacts.push((snapshot.key, ContactResult::standing()));
        } else if let Some((snapshot, push)) = bottom {
            actor.shift(0, push);
            if actor.vy < Velocity::ZERO {
                actor.vy = Velocity::ZERO;
            }
            out.contacts.push((snapshot.key, ContactResult { touch_bottom: true, ..ContactResult::NONE }));
        }
    }

    if let Some((snapshot, Candidate::Side { push, into, on_right, .. })) = side {
        actor.shift(push, 0);
        if into {
            actor.vx = Velocity::ZERO;
        }
        let on_facing_side = match actor.facing {
            Facing::Right => on_right,
            Facing::Left => !on_right,
        };
        let pushing = !actor.airborne && on_facing_side;
        out.contacts.push((snapshot.key, ContactResult { touch_side: true, pushing, ..ContactResult::NONE }));
    }

    out.contacts.sort_by_key(|(key, _)| *key);
    out
}

// ============================================================================
// System
// ============================================================================

type SolidObjectQuery<'w, 's> = Query<
    'w,
    's,
    (
        Entity,
        &'static Behavior,
        &'static ObjectPosition,
        &'static SolidBody,
        &'static mut PlatformMachine,
        &'static mut ObjectContacts,
    ),
    Without<Destroyed>,
>;

fn gather_volumes(
    objects: &SolidObjectQuery,
    owners: &[Entity],
    registry: &BehaviorRegistry,
    actor_entity: Entity,
    actor: &ActorBody,
) -> Vec<VolumeSnapshot> {
    let mut volumes = Vec::new();
    for &owner in owners {
        let Ok((_, behavior, position, body, machine, _)) = objects.get(owner) else {
            continue;
        };
        let solid = body.enabled && registry.is_solid_for(behavior.type_id, machine, actor_entity, actor);
        let origin = position.pixel();
        for (index, piece) in body.pieces().enumerate() {
            if !piece.active {
                continue;
            }
            let Some(center) = body.world_position(index, origin) else {
                continue;
            };
            volumes.push(VolumeSnapshot {
                key: VolumeKey::new(owner, index),
                center,
                volume: piece.volume,
                solid,
            });
        }
    }
    volumes
}

/// Resolve every actor against every solid object, then latch standing.
#[profile(4)]
pub fn resolve_solids(
    tick: Res<SimTick>,
    config: Res<SimConfig>,
    debug_config: Res<DebugConfig>,
    registry: Res<BehaviorRegistry>,
    mut riding: ResMut<RidingState>,
    mut actors: Query<(Entity, &mut ActorBody)>,
    mut objects: SolidObjectQuery,
    mut sounds: MessageWriter<SoundCue>,
) {
    let now = tick.0;
    if !riding.begin_pass(now) {
        return;
    }
    let rules = ResolverRules::from_config(&config);

    for (_, _, _, body, _, mut contacts) in objects.iter_mut() {
        contacts.begin(now, body.volume_count());
    }

    let mut owners: Vec<Entity> = objects.iter().map(|(e, ..)| e).collect();
    owners.sort();

    let mut order: Vec<(crate::game::actor::ActorRole, Entity)> = actors.iter().map(|(e, a)| (a.role, e)).collect();
    order.sort();

    let mut cues = Vec::new();
    for (_, actor_entity) in order {
        let Ok((_, mut actor)) = actors.get_mut(actor_entity) else {
            continue;
        };
        let volumes = gather_volumes(&objects, &owners, &registry, actor_entity, &actor);
        let resolution = resolve_actor(&mut actor, actor_entity, &volumes, &mut riding, &rules);

        if debug_config.log_contacts {
            if let Some(key) = resolution.landed {
                debug!("[SOLID] tick {} actor {:?} landed on {:?}#{}", now, actor_entity, key.owner, key.index);
            }
            if let Some(key) = resolution.released {
                debug!("[SOLID] tick {} actor {:?} left {:?}#{}", now, actor_entity, key.owner, key.index);
            }
        }

        for (key, contact) in resolution.contacts {
            let Ok((owner, behavior, position, _, mut machine, mut contacts)) = objects.get_mut(key.owner) else {
                continue;
            };
            contacts.record(key.index as usize, contact);
            let mut ctx = ContactContext {
                entity: owner,
                tick: now,
                machine: &mut *machine,
                position,
                actor_entity,
                actor: &mut *actor,
                volume_index: key.index as usize,
                contact,
                config: &config,
                cues: &mut cues,
            };
            registry.on_contact(behavior.type_id, &mut ctx);
        }
    }

    for (owner, _, _, _, _, contacts) in objects.iter() {
        if contacts.any_standing() {
            riding.mark_standing(owner, now);
        }
    }

    for cue in cues {
        sounds.write(cue);
    }

    crate::profile_log!(tick, "[SOLID] {} objects, {} riders", owners.len(), riding.ride_count());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::actor::ActorRole;
    use crate::game::fixed_math::velocity;

    struct Fixture {
        world: World,
        actor_entity: Entity,
        owners: Vec<Entity>,
        riding: RidingState,
    }

    impl Fixture {
        fn new(owners: usize) -> Self {
            let mut world = World::new();
            let actor_entity = world.spawn_empty().id();
            let owners = (0..owners).map(|_| world.spawn_empty().id()).collect();
            Self { world, actor_entity, owners, riding: RidingState::default() }
        }

        fn snapshot(&self, owner: usize, index: usize, center: (i32, i32), volume: SolidVolume) -> VolumeSnapshot {
            VolumeSnapshot {
                key: VolumeKey::new(self.owners[owner], index),
                center: IVec2::new(center.0, center.1),
                volume,
                solid: true,
            }
        }

        fn resolve(&mut self, actor: &mut ActorBody, volumes: &[VolumeSnapshot]) -> ActorResolution {
            resolve_actor(actor, self.actor_entity, volumes, &mut self.riding, &ResolverRules::default())
        }
    }

    fn falling_actor(x: i32, feet: i32) -> ActorBody {
        let mut actor = ActorBody::new(ActorRole::Player, x, 0);
        actor.snap_feet_to(feet);
        actor.vy = velocity(0x200);
        actor.airborne = true;
        actor
    }

    #[test]
    fn lands_on_a_top_solid_volume_within_tolerance() {
        let mut fx = Fixture::new(1);
        let volumes = [fx.snapshot(0, 0, (200, 300), SolidVolume::top_solid(32, 16))];

        let mut actor = falling_actor(200, 290);
        let res = fx.resolve(&mut actor, &volumes);

        assert_eq!(actor.feet(), 284);
        assert_eq!(actor.vy, Velocity::ZERO);
        assert!(!actor.airborne && actor.on_object);
        assert_eq!(res.landed, Some(volumes[0].key));
        assert_eq!(res.contacts.as_slice(), &[(volumes[0].key, ContactResult::standing())]);
        assert!(fx.riding.is_riding_object(fx.owners[0]));
    }

    #[test]
    fn top_solid_ignores_feet_outside_the_band_and_rising_actors() {
        let mut fx = Fixture::new(1);
        let volumes = [fx.snapshot(0, 0, (200, 300), SolidVolume::top_solid(32, 16))];

        let mut deep = falling_actor(200, 284 + 13);
        assert!(fx.resolve(&mut deep, &volumes).contacts.is_empty());

        let mut high = falling_actor(200, 284 - 5);
        assert!(fx.resolve(&mut high, &volumes).contacts.is_empty());

        let mut rising = falling_actor(200, 286);
        rising.vy = velocity(-0x300);
        let res = fx.resolve(&mut rising, &volumes);
        assert_eq!(res.contacts[0].1, ContactResult { touch_top: true, ..ContactResult::NONE });
        assert_eq!(rising.feet(), 286);
    }

    #[test]
    fn second_pass_in_the_same_tick_is_a_no_op() {
        let mut fx = Fixture::new(2);
        let volumes = [
            fx.snapshot(0, 0, (200, 300), SolidVolume::full(16, 16)),
            fx.snapshot(1, 0, (222, 270), SolidVolume::full(8, 24)),
        ];
        let mut actor = falling_actor(206, 287);
        actor.vx = velocity(0x180);

        let first = fx.resolve(&mut actor, &volumes);
        let after_first = actor.clone();
        let riding_after_first = fx.riding.ride_of(fx.actor_entity);

        let second = fx.resolve(&mut actor, &volumes);
        assert_eq!(actor, after_first);
        assert_eq!(first.contacts, second.contacts);
        assert_eq!(fx.riding.ride_of(fx.actor_entity), riding_after_first);
        assert!(first.contacts.iter().any(|(_, c)| c.standing));
        assert!(first.contacts.iter().any(|(_, c)| c.touch_side));
    }

    #[test]
    fn rider_is_carried_by_the_volume_displacement() {
        let mut fx = Fixture::new(1);
        let volume = SolidVolume::top_solid(32, 8);
        let mut actor = falling_actor(100, 92);
        fx.resolve(&mut actor, &[fx.snapshot(0, 0, (100, 100), volume)]);
        assert_eq!(actor.feet(), 92);

        let moved = [fx.snapshot(0, 0, (105, 97), volume)];
        let res = fx.resolve(&mut actor, &moved);
        assert_eq!((actor.pixel_x(), actor.feet()), (105, 89));
        assert_eq!(res.landed, None);
        assert!(res.contacts[0].1.standing);
    }

    #[test]
    fn rider_is_released_when_the_volume_vanishes_or_it_walks_off() {
        let mut fx = Fixture::new(1);
        let volume = SolidVolume::top_solid(16, 8);
        let mut actor = falling_actor(100, 92);
        fx.resolve(&mut actor, &[fx.snapshot(0, 0, (100, 100), volume)]);

        let res = fx.resolve(&mut actor, &[]);
        assert_eq!(res.released, Some(VolumeKey::new(fx.owners[0], 0)));
        assert!(actor.airborne && !actor.on_object);

        let mut walker = falling_actor(100, 92);
        let here = [fx.snapshot(0, 0, (100, 100), volume)];
        fx.resolve(&mut walker, &here);
        walker.set_position(116, walker.pixel_y());
        let res = fx.resolve(&mut walker, &here);
        assert!(res.released.is_some());
        assert!(walker.airborne);
    }

    #[test]
    fn not_solid_volumes_are_ignored_and_release_riders() {
        let mut fx = Fixture::new(1);
        let mut snapshot = fx.snapshot(0, 0, (100, 100), SolidVolume::top_solid(16, 8));
        let mut actor = falling_actor(100, 92);
        fx.resolve(&mut actor, &[snapshot]);
        assert!(actor.on_object);

        snapshot.solid = false;
        let res = fx.resolve(&mut actor, &[snapshot]);
        assert!(res.contacts.is_empty());
        assert!(actor.airborne);
    }

    #[test]
    fn nearest_top_edge_wins_and_seam_ties_follow_key_order() {
        let mut fx = Fixture::new(2);
        let volume = SolidVolume::top_solid(16, 8);

        // Overlapping columns, tops 2 px apart: the nearer one wins.
        let volumes = [fx.snapshot(1, 0, (100, 100), volume), fx.snapshot(0, 0, (110, 102), volume)];
        let mut actor = falling_actor(105, 92);
        let res = fx.resolve(&mut actor, &volumes);
        assert_eq!(res.landed, Some(volumes[0].key));
        assert_eq!(actor.feet(), 92);
        let standing: Vec<_> = res.contacts.iter().filter(|(_, c)| c.standing).collect();
        assert_eq!(standing.len(), 1, "losing candidates report nothing");

        // Equal tops at a seam: lower (owner, index) wins.
        let mut fx = Fixture::new(1);
        let seam = [fx.snapshot(0, 1, (110, 100), volume), fx.snapshot(0, 0, (100, 100), volume)];
        let mut actor = falling_actor(105, 93);
        let res = fx.resolve(&mut actor, &seam);
        assert_eq!(res.landed, Some(VolumeKey::new(fx.owners[0], 0)));

        // Once riding piece 1, the tie keeps piece 1.
        fx.riding.ride(fx.actor_entity, VolumeKey::new(fx.owners[0], 1), IVec2::new(110, 100));
        let res = fx.resolve(&mut actor, &seam);
        let standing: Vec<_> = res.contacts.iter().filter(|(_, c)| c.standing).map(|(k, _)| k.index).collect();
        assert_eq!(standing, vec![1]);
    }

    #[test]
    fn full_solid_side_push_and_shallow_touch() {
        let mut fx = Fixture::new(1);
        let wall = [fx.snapshot(0, 0, (100, 100), SolidVolume::full(16, 32))];

        // Grounded actor walking right into the wall's left face.
        let mut actor = ActorBody::new(ActorRole::Player, 80, 0);
        actor.snap_feet_to(120);
        actor.airborne = false;
        actor.vx = velocity(0x200);
        let res = fx.resolve(&mut actor, &wall);
        assert_eq!(actor.pixel_x(), 100 - 16 - actor.x_radius);
        assert_eq!(actor.vx, Velocity::ZERO);
        assert_eq!(res.contacts[0].1, ContactResult { touch_side: true, pushing: true, ..ContactResult::NONE });

        // Feet level with the top edge: flagged but not pushed.
        let mut grazing = ActorBody::new(ActorRole::Player, 77, 0);
        grazing.snap_feet_to(68);
        grazing.airborne = false;
        let res = fx.resolve(&mut grazing, &wall);
        assert_eq!(grazing.pixel_x(), 77);
        assert_eq!(res.contacts[0].1, ContactResult { touch_side: true, ..ContactResult::NONE });
    }

    #[test]
    fn full_solid_bottom_bonk_stops_upward_motion() {
        let mut fx = Fixture::new(1);
        let block = [fx.snapshot(0, 0, (100, 100), SolidVolume::full(16, 16))];
        let mut actor = ActorBody::new(ActorRole::Player, 100, 0);
        // Head 3 px into the block's underside.
        actor.set_position(100, 116 + actor.y_radius - 3);
        actor.vy = velocity(-0x400);
        let res = fx.resolve(&mut actor, &block);
        assert_eq!(actor.pixel_y() - actor.y_radius, 116);
        assert_eq!(actor.vy, Velocity::ZERO);
        assert!(res.contacts[0].1.touch_bottom);
    }

    #[test]
    fn side_contact_in_the_direction_of_travel_wins() {
        let mut fx = Fixture::new(2);
        let volumes = [
            fx.snapshot(0, 0, (70, 100), SolidVolume::full(16, 32)),
            fx.snapshot(1, 0, (110, 100), SolidVolume::full(16, 32)),
        ];
        // Squeezed between two walls, moving right.
        let mut actor = ActorBody::new(ActorRole::Player, 90, 0);
        actor.snap_feet_to(120);
        actor.airborne = false;
        actor.vx = velocity(0x100);
        let res = fx.resolve(&mut actor, &volumes);
        let sides: Vec<_> = res.contacts.iter().filter(|(_, c)| c.touch_side).map(|(k, _)| k.owner).collect();
        assert_eq!(sides, vec![fx.owners[1]]);
        assert_eq!(actor.pixel_x(), 110 - 16 - actor.x_radius);
    }
}
