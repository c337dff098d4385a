use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Classification of one actor against one volume for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContactResult {
    /// Supported by the top edge.
    pub standing: bool,
    /// Feet within the top tolerance band, standing or not.
    pub touch_top: bool,
    /// Head pressed against the bottom edge.
    pub touch_bottom: bool,
    pub touch_side: bool,
    /// Side contact on the facing side of a grounded actor.
    pub pushing: bool,
}

impl ContactResult {
    pub const NONE: Self = Self {
        standing: false,
        touch_top: false,
        touch_bottom: false,
        touch_side: false,
        pushing: false,
    };

    pub fn standing() -> Self {
        Self { standing: true, touch_top: true, ..Self::NONE }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }

    /// Field-wise OR.
    pub fn merge(self, other: Self) -> Self {
        Self {
            standing: self.standing || other.standing,
            touch_top: self.touch_top || other.touch_top,
            touch_bottom: self.touch_bottom || other.touch_bottom,
            touch_side: self.touch_side || other.touch_side,
            pushing: self.pushing || other.pushing,
        }
    }
}

/// Contacts an object received during the most recent resolver pass.
///
/// Written only by the resolver; the object's own update reads it one tick
/// later.
#[derive(Component, Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectContacts {
    pub tick: u64,
    per_volume: SmallVec<[ContactResult; 4]>,
}

impl ObjectContacts {
    /// Clear for a new pass over an object with `volumes` pieces.
    pub fn begin(&mut self, tick: u64, volumes: usize) {
        self.tick = tick;
        self.per_volume.clear();
        self.per_volume.resize(volumes, ContactResult::NONE);
    }

    pub fn record(&mut self, index: usize, contact: ContactResult) {
        if index >= self.per_volume.len() {
            self.per_volume.resize(index + 1, ContactResult::NONE);
        }
        self.per_volume[index] = self.per_volume[index].merge(contact);
    }

    pub fn any_standing(&self) -> bool {
        self.per_volume.iter().any(|c| c.standing)
    }

    /// Every volume's result OR-ed together.
    pub fn aggregate(&self) -> ContactResult {
        self.per_volume.iter().fold(ContactResult::NONE, |acc, c| acc.merge(*c))
    }
}
