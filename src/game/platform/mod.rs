/// Movable-object framework.
///
/// Every object is a small finite-state machine over a shared vocabulary:
///
/// - **state**: [`PlatformState`] plus timer, rest position and decoded params
/// - **motion**: fixed-point motion laws (oscillation, convergence, orbit,
///   waypoints, free fall)
/// - **registry**: `object_type_id` to behavior dispatch table
/// - **context**: what a behavior may read and mutate during its update or
///   contact hook
///
/// Behaviors read contact information one tick late: object updates run
/// before the solid resolver, so "was I stood on" comes from the
/// [`StandingLatch`](crate::game::solid::StandingLatch) of the previous pass.

use bevy::prelude::*;

use crate::game::fixed_math::{Coord, Velocity};

pub mod context;
pub mod motion;
pub mod registry;

pub use context::{BehaviorContext, ContactContext};
pub use registry::{Behavior, BehaviorEntry, BehaviorRegistry, ObjectBundle, SpawnRecord};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PlatformState {
    /// At rest, not yet armed.
    #[default]
    Idle,
    /// Armed; a trigger or timer will start it.
    WaitTrigger,
    Active,
    /// Heading back to the rest position.
    Return,
    /// Finished for good.
    Done,
}

/// Decoded spawn parameters. Every field has already been clamped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlatformParams {
    pub mode: u8,
    pub size_index: u8,
    pub amplitude: i32,
    /// Pixels per tick for route motion, raw 8.8 for convergence.
    pub speed: i16,
    pub osc_offset: usize,
    pub flip_x: bool,
    pub flip_y: bool,
    pub trigger_distance: i32,
}

/// Per-object motion integrator state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MotionState {
    pub vx: Velocity,
    pub vy: Velocity,
    /// Displacement along the object's travel axis.
    pub travel: Coord,
    pub waypoint: usize,
    pub landed: bool,
}

#[derive(Component, Clone, Debug, PartialEq, Eq)]
pub struct PlatformMachine {
    pub state: PlatformState,
    pub timer: u16,
    /// Rest position in pixels.
    pub base: IVec2,
    pub params: PlatformParams,
    pub motion: MotionState,
    /// Weak handle to a linked sibling.
    pub link: Option<Entity>,
    /// Actor the object is currently acting on (e.g. just launched).
    pub subject: Option<Entity>,
    pub frame: u8,
    destroy: bool,
}

impl PlatformMachine {
    pub fn new(base: IVec2, params: PlatformParams) -> Self {
        Self {
            state: PlatformState::Idle,
            timer: 0,
            base,
            params,
            motion: MotionState::default(),
            link: None,
            subject: None,
            frame: 0,
            destroy: false,
        }
    }

    pub fn with_state(mut self, state: PlatformState) -> Self {
        self.state = state;
        self
    }

    /// Returns `true` if the state changed.
    pub fn set_state(&mut self, next: PlatformState) -> bool {
        if self.state == next {
            return false;
        }
        self.state = next;
        true
    }

    pub fn start_timer(&mut self, ticks: u16) {
        self.timer = ticks;
    }

    /// Count the timer down; `true` once it has reached zero.
    pub fn tick_timer(&mut self) -> bool {
        self.timer = self.timer.saturating_sub(1);
        self.timer == 0
    }

    pub fn request_destroy(&mut self) {
        self.destroy = true;
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_reaches_zero_after_exactly_n_ticks() {
        let mut machine = PlatformMachine::new(IVec2::ZERO, PlatformParams::default());
        machine.start_timer(3);
        assert!(!machine.tick_timer());
        assert!(!machine.tick_timer());
        assert!(machine.tick_timer());
        assert!(machine.tick_timer(), "stays expired");
    }

    #[test]
    fn set_state_reports_changes_only() {
        let mut machine = PlatformMachine::new(IVec2::ZERO, PlatformParams::default());
        assert!(!machine.set_state(PlatformState::Idle));
        assert!(machine.set_state(PlatformState::Active));
        assert_eq!(machine.state, PlatformState::Active);
        assert!(!machine.is_destroyed());
        machine.request_destroy();
        assert!(machine.is_destroyed());
    }
}
