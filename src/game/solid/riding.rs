use bevy::prelude::*;
use rustc_hash::FxHashMap;

/// Identifies one volume: owning object plus piece index.
///
/// Ordering is the resolver's deterministic tie-break order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VolumeKey {
    pub owner: Entity,
    pub index: u8,
}

impl VolumeKey {
    pub fn new(owner: Entity, index: usize) -> Self {
        Self { owner, index: index.min(u8::MAX as usize) as u8 }
    }
}

/// "Actor is supported by this volume", with the volume centre at the last pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RideRecord {
    pub volume: VolumeKey,
    pub anchor: IVec2,
}

/// Lagged standing signal.
///
/// Object logic runs before the resolver, so "stood on" is read from the
/// previous tick: the latch is fresh iff `now - last_true <= 1`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StandingLatch {
    last_true: Option<u64>,
}

impl StandingLatch {
    pub fn mark(&mut self, tick: u64) {
        self.last_true = Some(tick);
    }

    pub fn last_true(&self) -> Option<u64> {
        self.last_true
    }

    pub fn is_fresh(&self, now: u64) -> bool {
        self.last_true.is_some_and(|t| t <= now && now - t <= 1)
    }
}

/// Resolver-owned support records.
///
/// Which actor rides which volume lives here rather than on the object so a
/// destroyed object can never leave an actor pointing at freed data.
#[derive(Resource, Default, Debug, Clone)]
pub struct RidingState {
    rides: FxHashMap<Entity, RideRecord>,
    latches: FxHashMap<Entity, StandingLatch>,
    last_pass: Option<u64>,
}

impl RidingState {
    /// Claim the resolver pass for `tick`. A second pass in the same tick is
    /// refused so contacts and latches are not recorded twice.
    pub fn begin_pass(&mut self, tick: u64) -> bool {
        if self.last_pass == Some(tick) {
            warn!("Solid resolution ran twice for tick {}; ignoring", tick);
            return false;
        }
        self.last_pass = Some(tick);
        true
    }

    pub fn last_pass(&self) -> Option<u64> {
        self.last_pass
    }

    pub fn ride_of(&self, actor: Entity) -> Option<RideRecord> {
        self.rides.get(&actor).copied()
    }

    pub fn ride(&mut self, actor: Entity, volume: VolumeKey, anchor: IVec2) {
        self.rides.insert(actor, RideRecord { volume, anchor });
    }

    pub fn release(&mut self, actor: Entity) -> Option<RideRecord> {
        self.rides.remove(&actor)
    }

    /// Is any actor currently supported by a volume of `owner`?
    pub fn is_riding_object(&self, owner: Entity) -> bool {
        self.rides.values().any(|r| r.volume.owner == owner)
    }

    /// Every actor with a support record.
    pub fn riders(&self) -> impl Iterator<Item = Entity> + '_ {
        self.rides.keys().copied()
    }

    pub fn mark_standing(&mut self, owner: Entity, tick: u64) {
        self.latches.entry(owner).or_default().mark(tick);
    }

    pub fn latch(&self, owner: Entity) -> StandingLatch {
        self.latches.get(&owner).copied().unwrap_or_default()
    }

    /// Was `owner` stood on during the previous (or current) resolver pass?
    pub fn was_stood_on(&self, owner: Entity, now: u64) -> bool {
        self.latch(owner).is_fresh(now)
    }

    /// Drop every record mentioning a destroyed object.
    pub fn forget_owner(&mut self, owner: Entity) {
        self.rides.retain(|_, r| r.volume.owner != owner);
        self.latches.remove(&owner);
    }

    pub fn forget_actor(&mut self, actor: Entity) {
        self.rides.remove(&actor);
    }

    pub fn clear(&mut self) {
        self.rides.clear();
        self.latches.clear();
        self.last_pass = None;
    }

    pub fn ride_count(&self) -> usize {
        self.rides.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latch_is_fresh_for_exactly_one_tick_after() {
        let mut latch = StandingLatch::default();
        assert!(!latch.is_fresh(0));
        latch.mark(10);
        assert!(latch.is_fresh(10));
        assert!(latch.is_fresh(11));
        assert!(!latch.is_fresh(12));
        assert!(!latch.is_fresh(9));
    }

    #[test]
    fn forgetting_an_owner_drops_its_riders() {
        let mut world = World::new();
        let actor = world.spawn_empty().id();
        let sidekick = world.spawn_empty().id();
        let platform = world.spawn_empty().id();
        let other = world.spawn_empty().id();

        let mut riding = RidingState::default();
        riding.ride(sidekick, VolumeKey::new(platform, 0), IVec2::ZERO);
        riding.ride(actor, VolumeKey::new(platform, 1), IVec2::ZERO);
        riding.mark_standing(platform, 3);
        assert!(riding.is_riding_object(platform));
        assert!(!riding.is_riding_object(other));
        assert_eq!(riding.riders().count(), 2);

        riding.forget_owner(platform);
        assert!(!riding.is_riding_object(platform));
        assert_eq!(riding.ride_of(actor), None);
        assert!(!riding.was_stood_on(platform, 3));
    }

    #[test]
    fn each_tick_gets_a_single_pass() {
        let mut riding = RidingState::default();
        assert!(riding.begin_pass(4));
        assert!(!riding.begin_pass(4));
        assert_eq!(riding.last_pass(), Some(4));
        assert!(riding.begin_pass(5));

        riding.clear();
        assert_eq!(riding.last_pass(), None);
        assert!(riding.begin_pass(5));
    }
}
