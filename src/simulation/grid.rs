//! The tile grid underlying the whole simulation
//!
//! A fixed-size 2D array of tiles. Topology, lanes, and agents only ever
//! read or write cells through this type, so bounds checking lives in
//! exactly one place.

use super::types::{Tile, TileKind};

/// A fixed-size 2D tile grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
}

impl TileGrid {
    /// Create an empty grid of the given dimensions
    pub fn new(width: i32, height: i32) -> Self {
        assert!(width > 0 && height > 0, "grid dimensions must be positive");
        Self {
            width,
            height,
            tiles: vec![Tile::EMPTY; (width * height) as usize],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    /// Gets the tile at a position, or None when out of bounds
    pub fn get(&self, x: i32, y: i32) -> Option<&Tile> {
        if !self.in_bounds(x, y) {
            return None;
        }
        self.tiles.get((y * self.width + x) as usize)
    }

    pub fn get_mut(&mut self, x: i32, y: i32) -> Option<&mut Tile> {
        if !self.in_bounds(x, y) {
            return None;
        }
        self.tiles.get_mut((y * self.width + x) as usize)
    }

    /// Overwrites the tile at an in-bounds position; no-op out of bounds
    pub fn set(&mut self, x: i32, y: i32, tile: Tile) {
        if let Some(slot) = self.get_mut(x, y) {
            *slot = tile;
        }
    }

    /// The kind at a position, treating out-of-bounds as Obstacle so agents
    /// never walk off the map
    pub fn kind_at(&self, x: i32, y: i32) -> TileKind {
        self.get(x, y).map(|t| t.kind).unwrap_or(TileKind::Obstacle)
    }

    /// Surface predicate for pedestrians: sidewalk or any road lane
    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        matches!(self.kind_at(x, y), TileKind::Sidewalk | TileKind::Asphalt)
    }

    /// Surface predicate for vehicles: asphalt only
    pub fn is_drivable(&self, x: i32, y: i32) -> bool {
        self.kind_at(x, y) == TileKind::Asphalt
    }

    /// Whether a road segment is anchored at this exact position
    ///
    /// Building anchors don't count: an anchor is a road-surface cell whose
    /// origin points at itself.
    pub fn is_road_anchor(&self, x: i32, y: i32) -> bool {
        match self.get(x, y) {
            Some(tile) => {
                tile.origin == Some((x, y))
                    && matches!(tile.kind, TileKind::Sidewalk | TileKind::Asphalt)
            }
            None => false,
        }
    }

    /// All tile positions satisfying a predicate, in row-major order
    pub fn positions_where<F>(&self, pred: F) -> Vec<(i32, i32)>
    where
        F: Fn(&TileGrid, i32, i32) -> bool,
    {
        let mut positions = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                if pred(self, x, y) {
                    positions.push((x, y));
                }
            }
        }
        positions
    }

    /// Every walkable tile on the grid
    pub fn walkable_tiles(&self) -> Vec<(i32, i32)> {
        self.positions_where(|g, x, y| g.is_walkable(x, y))
    }

    /// Every drivable tile on the grid
    pub fn drivable_tiles(&self) -> Vec<(i32, i32)> {
        self.positions_where(|g, x, y| g.is_drivable(x, y))
    }

    /// Number of walkable neighbor tiles around a position
    pub fn walkable_neighbor_count(&self, x: i32, y: i32) -> usize {
        super::types::Direction::ALL
            .iter()
            .filter(|d| {
                let (dx, dy) = d.offset();
                self.is_walkable(x + dx, y + dy)
            })
            .count()
    }
}
