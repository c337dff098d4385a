//! Floor and ceiling probes against level terrain.
//!
//! The tile data itself lives outside the physics core. It is reached through
//! the [`TerrainProvider`] trait object held by the [`TerrainQuery`] resource;
//! with no provider installed every probe reports open air.

use bevy::prelude::*;

/// Default probe reach in pixels.
pub const DEFAULT_PROBE_RANGE: i32 = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProbeDirection {
    /// Look down from `y + half_height`.
    Floor,
    /// Look up from `y - half_height`.
    Ceiling,
}

/// Outcome of a probe. `distance` is measured from the probing edge to the
/// surface; negative means the edge is embedded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProbeResult {
    pub has_collision: bool,
    pub distance: i32,
}

impl ProbeResult {
    pub fn open(range: i32) -> Self {
        Self { has_collision: false, distance: range }
    }

    fn from_distance(distance: i32, range: i32) -> Self {
        let distance = distance.clamp(-range, range);
        Self { has_collision: distance <= 0, distance }
    }
}

/// Source of solid terrain.
pub trait TerrainProvider: Send + Sync {
    /// Signed distance from `edge_y` to the nearest surface in `direction` at
    /// column `x`, or `None` when the column has no such surface.
    fn surface_distance(&self, x: i32, edge_y: i32, direction: ProbeDirection) -> Option<i32>;
}

/// A single infinite floor and optional ceiling.
#[derive(Clone, Copy, Debug)]
pub struct FlatTerrain {
    pub floor_y: i32,
    pub ceiling_y: Option<i32>,
}

impl FlatTerrain {
    pub fn floor(floor_y: i32) -> Self {
        Self { floor_y, ceiling_y: None }
    }
}

impl TerrainProvider for FlatTerrain {
    fn surface_distance(&self, _x: i32, edge_y: i32, direction: ProbeDirection) -> Option<i32> {
        match direction {
            ProbeDirection::Floor => Some(self.floor_y - edge_y),
            ProbeDirection::Ceiling => self.ceiling_y.map(|c| edge_y - c),
        }
    }
}

/// Column height map. Column `i` covers `origin_x + i * column_width ..` for
/// one column width; floors are solid at and below their y, ceilings above.
#[derive(Clone, Debug)]
pub struct HeightMapTerrain {
    origin_x: i32,
    column_width: i32,
    floors: Vec<Option<i32>>,
    ceilings: Vec<Option<i32>>,
}

impl HeightMapTerrain {
    pub fn new(origin_x: i32, column_width: i32, columns: usize) -> Self {
        Self {
            origin_x,
            column_width: column_width.max(1),
            floors: vec![None; columns],
            ceilings: vec![None; columns],
        }
    }

    /// Set the floor for every column overlapping `x_start..x_end`.
    pub fn with_floor(mut self, x_start: i32, x_end: i32, floor_y: i32) -> Self {
        for column in self.columns_in(x_start, x_end) {
            self.floors[column] = Some(floor_y);
        }
        self
    }

    pub fn with_ceiling(mut self, x_start: i32, x_end: i32, ceiling_y: i32) -> Self {
        for column in self.columns_in(x_start, x_end) {
            self.ceilings[column] = Some(ceiling_y);
        }
        self
    }

    fn column(&self, x: i32) -> Option<usize> {
        let rel = x.checked_sub(self.origin_x)?;
        if rel < 0 {
            return None;
        }
        let index = (rel / self.column_width) as usize;
        (index < self.floors.len()).then_some(index)
    }

    fn columns_in(&self, x_start: i32, x_end: i32) -> std::ops::Range<usize> {
        let first = (x_start - self.origin_x).max(0) / self.column_width;
        let last = ((x_end - self.origin_x + self.column_width - 1) / self.column_width).max(0);
        let len = self.floors.len();
        (first as usize).min(len)..(last as usize).min(len)
    }
}

impl TerrainProvider for HeightMapTerrain {
    fn surface_distance(&self, x: i32, edge_y: i32, direction: ProbeDirection) -> Option<i32> {
        let column = self.column(x)?;
        match direction {
            ProbeDirection::Floor => self.floors[column].map(|f| f - edge_y),
            ProbeDirection::Ceiling => self.ceilings[column].map(|c| edge_y - c),
        }
    }
}

/// Terrain probe service.
#[derive(Resource)]
pub struct TerrainQuery {
    provider: Option<Box<dyn TerrainProvider>>,
    probe_range: i32,
}

impl Default for TerrainQuery {
    fn default() -> Self {
        Self { provider: None, probe_range: DEFAULT_PROBE_RANGE }
    }
}

impl TerrainQuery {
    pub fn new(provider: impl TerrainProvider + 'static) -> Self {
        Self { provider: Some(Box::new(provider)), ..default() }
    }

    pub fn set_provider(&mut self, provider: impl TerrainProvider + 'static) {
        self.provider = Some(Box::new(provider));
    }

    pub fn probe_range(&self) -> i32 {
        self.probe_range
    }

    pub fn set_probe_range(&mut self, range: i32) {
        self.probe_range = range.max(1);
    }

    pub fn probe(&self, x: i32, y: i32, half_height: i32, direction: ProbeDirection) -> ProbeResult {
        let Some(provider) = &self.provider else {
            return ProbeResult::open(self.probe_range);
        };
        let edge_y = match direction {
            ProbeDirection::Floor => y + half_height,
            ProbeDirection::Ceiling => y - half_height,
        };
        match provider.surface_distance(x, edge_y, direction) {
            Some(distance) => ProbeResult::from_distance(distance, self.probe_range),
            None => ProbeResult::open(self.probe_range),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_provider_reports_open_air() {
        let query = TerrainQuery::default();
        let result = query.probe(10, 10, 8, ProbeDirection::Floor);
        assert!(!result.has_collision);
        assert_eq!(result.distance, DEFAULT_PROBE_RANGE);
    }

    #[test]
    fn floor_distance_is_measured_from_the_bottom_edge() {
        let query = TerrainQuery::new(FlatTerrain::floor(100));
        assert_eq!(query.probe(0, 80, 8, ProbeDirection::Floor), ProbeResult { has_collision: false, distance: 12 });
        assert_eq!(query.probe(0, 92, 8, ProbeDirection::Floor), ProbeResult { has_collision: true, distance: 0 });
        assert_eq!(query.probe(0, 95, 8, ProbeDirection::Floor), ProbeResult { has_collision: true, distance: -3 });
    }

    #[test]
    fn distances_clamp_to_the_probe_range() {
        let mut query = TerrainQuery::new(FlatTerrain::floor(1000));
        query.set_probe_range(16);
        assert_eq!(query.probe(0, 0, 0, ProbeDirection::Floor).distance, 16);
        assert_eq!(query.probe(0, 2000, 0, ProbeDirection::Floor).distance, -16);
    }

    #[test]
    fn height_map_columns() {
        let terrain = HeightMapTerrain::new(0, 16, 8)
            .with_floor(0, 64, 200)
            .with_floor(64, 128, 150)
            .with_ceiling(32, 48, 40);
        let query = TerrainQuery::new(terrain);

        assert_eq!(query.probe(10, 180, 10, ProbeDirection::Floor).distance, 10);
        assert_eq!(query.probe(70, 130, 10, ProbeDirection::Floor).distance, 10);
        assert_eq!(query.probe(40, 60, 10, ProbeDirection::Ceiling).distance, 10);
        assert!(!query.probe(10, 60, 10, ProbeDirection::Ceiling).has_collision);
        // Outside the map.
        assert!(!query.probe(-5, 190, 10, ProbeDirection::Floor).has_collision);
        assert!(!query.probe(500, 190, 10, ProbeDirection::Floor).has_collision);
    }
}
