//! Pedestrian movement logic
//!
//! Foot traffic wanders the walkable surface tile by tile; there is no
//! destination and no route. Each per-frame update is a pure function from
//! old state to new state so the whole collection can be replaced at once.

use log::debug;
use rand::seq::IndexedRandom;
use rand::Rng;

use super::grid::TileGrid;
use super::types::{
    near_tile_center, tile_center, tile_of, AgentId, Direction, PED_STRAIGHT_BIAS,
    PED_WANDER_CHANCE,
};

/// A pedestrian in the simulation
#[derive(Debug, Clone, PartialEq)]
pub struct SimPedestrian {
    pub id: AgentId,
    /// Fractional grid coordinates; `floor` gives the occupied tile
    pub x: f64,
    pub y: f64,
    pub direction: Direction,
    /// Walking speed in tiles per second
    pub speed: f64,
}

impl SimPedestrian {
    pub fn new(id: AgentId, x: f64, y: f64, direction: Direction, speed: f64) -> Self {
        Self {
            id,
            x,
            y,
            direction,
            speed,
        }
    }

    /// The tile this pedestrian currently occupies
    pub fn tile(&self) -> (i32, i32) {
        tile_of(self.x, self.y)
    }
}

/// Advances one pedestrian by one frame
///
/// Recovery comes first: a pedestrian whose tile was edited away is
/// teleported to a random walkable tile. Otherwise it walks along its
/// heading, re-picking direction at tile centers when the way ahead ends
/// or, occasionally, at junctions.
pub fn update_pedestrian<R: Rng>(
    pedestrian: &SimPedestrian,
    grid: &TileGrid,
    rng: &mut R,
    delta: f64,
) -> SimPedestrian {
    let mut pedestrian = pedestrian.clone();
    let (tile_x, tile_y) = pedestrian.tile();

    if !grid.is_walkable(tile_x, tile_y) {
        return relocate(pedestrian, grid, rng);
    }

    if near_tile_center(pedestrian.x, pedestrian.y) {
        let (dx, dy) = pedestrian.direction.offset();
        let ahead_walkable = grid.is_walkable(tile_x + dx, tile_y + dy);
        let wandering = grid.walkable_neighbor_count(tile_x, tile_y) > 2
            && rng.random_bool(PED_WANDER_CHANCE);

        if !ahead_walkable || wandering {
            let chosen = choose_direction(grid, (tile_x, tile_y), pedestrian.direction, rng);
            if chosen != pedestrian.direction {
                // Turn from the tile center so the new heading stays on axis
                let (center_x, center_y) = tile_center(tile_x, tile_y);
                pedestrian.x = center_x;
                pedestrian.y = center_y;
                pedestrian.direction = chosen;
            }
        }
    }

    let (dx, dy) = pedestrian.direction.offset();
    let moved_x = pedestrian.x + dx as f64 * pedestrian.speed * delta;
    let moved_y = pedestrian.y + dy as f64 * pedestrian.speed * delta;
    let (moved_tile_x, moved_tile_y) = tile_of(moved_x, moved_y);

    if grid.is_walkable(moved_tile_x, moved_tile_y) {
        pedestrian.x = moved_x;
        pedestrian.y = moved_y;
    } else {
        // Don't clip into a removed road; hold at the current tile center
        let (center_x, center_y) = tile_center(tile_x, tile_y);
        pedestrian.x = center_x;
        pedestrian.y = center_y;
    }
    pedestrian
}

/// Picks a travel direction among walkable neighbors
///
/// Keeps going straight 60% of the time when straight is open; otherwise
/// avoids reversing unless reversing is the only way out.
fn choose_direction<R: Rng>(
    grid: &TileGrid,
    tile: (i32, i32),
    current: Direction,
    rng: &mut R,
) -> Direction {
    let (tile_x, tile_y) = tile;
    let candidates: Vec<Direction> = Direction::ALL
        .iter()
        .copied()
        .filter(|d| {
            let (dx, dy) = d.offset();
            grid.is_walkable(tile_x + dx, tile_y + dy)
        })
        .collect();

    if candidates.is_empty() {
        return current;
    }
    if candidates.contains(&current) && rng.random_bool(PED_STRAIGHT_BIAS) {
        return current;
    }

    let non_reverse: Vec<Direction> = candidates
        .iter()
        .copied()
        .filter(|d| *d != current.opposite())
        .collect();
    let pool = if non_reverse.is_empty() {
        &candidates
    } else {
        &non_reverse
    };
    *pool.choose(rng).unwrap_or(&current)
}

/// Recovery transition: the tile under this pedestrian is gone, move it to
/// a uniformly random walkable tile with a random facing
fn relocate<R: Rng>(mut pedestrian: SimPedestrian, grid: &TileGrid, rng: &mut R) -> SimPedestrian {
    let tiles = grid.walkable_tiles();
    match tiles.choose(rng) {
        Some(&(tile_x, tile_y)) => {
            let (center_x, center_y) = tile_center(tile_x, tile_y);
            pedestrian.x = center_x;
            pedestrian.y = center_y;
            pedestrian.direction = *Direction::ALL.choose(rng).unwrap_or(&pedestrian.direction);
            debug!(
                "pedestrian {:?} relocated to ({}, {})",
                pedestrian.id, tile_x, tile_y
            );
        }
        None => {
            // No walkable surface anywhere; stay put until one is built
        }
    }
    pedestrian
}
