/// Resource definitions for the simulation.
///
/// This module contains the tick counter, the fixed-point simulation
/// configuration, debug switches, spawn memory and performance tracking.

use bevy::prelude::*;
use fixedbitset::FixedBitSet;
use std::time::{Duration, Instant};

use crate::game::config::InitialConfig;
use crate::game::fixed_math::{velocity, Velocity};

// ============================================================================
// Tick
// ============================================================================

/// Number of simulation ticks run so far. Incremented first in every tick.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct SimTick(pub u64);

impl SimTick {
    pub fn increment(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }
}

// ============================================================================
// Performance Tracking
// ============================================================================

/// Performance tracking for simulation ticks
#[derive(Resource, Default)]
pub struct SimPerformance {
    pub start_time: Option<Instant>,
    pub last_duration: Duration,
}

// ============================================================================
// Simulation Configuration
// ============================================================================

/// Simulation parameters in the units the tick path uses.
///
/// Built once from [`InitialConfig`] at startup. Speeds and accelerations are
/// 8.8 [`Velocity`] values; distances are whole pixels; delays are ticks.
/// Changing any of these mid-level changes the outcome of a replay.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub tick_rate: f64,
    pub gravity: Velocity,
    pub max_fall_speed: Velocity,
    pub stand_above: i32,
    pub stand_below: i32,
    pub side_min_overlap: i32,
    pub probe_range: i32,
    pub fall_delay: u16,
    pub collapse_delay: u16,
    pub spring_lock: u16,
    pub hurt_invulnerability: u16,
    /// Falling objects that drop this far below their rest position are removed.
    pub fall_despawn_distance: i32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::from_initial(&InitialConfig::default())
    }
}

impl SimConfig {
    pub fn from_initial(config: &InitialConfig) -> Self {
        Self {
            tick_rate: config.tick_rate,
            gravity: velocity(config.gravity),
            max_fall_speed: velocity(config.max_fall_speed),
            stand_above: config.stand_above,
            stand_below: config.stand_below,
            side_min_overlap: config.side_min_overlap,
            probe_range: config.probe_range.max(1),
            fall_delay: config.fall_delay,
            collapse_delay: config.collapse_delay,
            spring_lock: config.spring_lock,
            hurt_invulnerability: config.hurt_invulnerability,
            fall_despawn_distance: config.fall_despawn_distance,
        }
    }
}

// ============================================================================
// Debug Configuration
// ============================================================================

/// Debug logging switches, fed from the hot-reloadable runtime config.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugConfig {
    pub log_contacts: bool,
    pub log_transitions: bool,
    pub log_spawns: bool,
}

// ============================================================================
// Spawn Memory
// ============================================================================

/// Spawn ids at or above this are never remembered.
pub const MAX_SPAWN_IDS: u32 = 1 << 16;

/// Spawn ids that must not be instantiated again (collapsed ledges and the
/// like).
#[derive(Resource, Debug, Clone, Default)]
pub struct RespawnMemory(FixedBitSet);

impl RespawnMemory {
    /// Returns `false` for ids outside the spawn-id space.
    pub fn remember(&mut self, spawn_id: u32) -> bool {
        if spawn_id >= MAX_SPAWN_IDS {
            warn!("Spawn id {} is outside the respawn table (max {}); not remembered", spawn_id, MAX_SPAWN_IDS - 1);
            return false;
        }
        let index = spawn_id as usize;
        if index >= self.0.len() {
            self.0.grow(index + 1);
        }
        self.0.insert(index);
        true
    }

    pub fn is_remembered(&self, spawn_id: u32) -> bool {
        self.0.contains(spawn_id as usize)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn count(&self) -> usize {
        self.0.count_ones(..)
    }

    /// Bits currently allocated.
    pub fn capacity(&self) -> usize {
        self.0.len()
    }
}
