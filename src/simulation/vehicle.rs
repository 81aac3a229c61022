//! Vehicle movement logic
//!
//! Cars are constrained to asphalt and obey lane discipline: one legal
//! direction per sub-tile except at junction centers. There is no route
//! planning; at every tile center a car either follows its lane, turns at
//! a junction, or U-turns out of a dead end. Updates are pure functions
//! over a positions snapshot of the other vehicles.

use log::debug;
use rand::seq::IndexedRandom;
use rand::Rng;

use super::grid::TileGrid;
use super::lanes::{can_turn, is_intersection, lane_direction, u_turn_direction};
use super::topology::{connections, local_coords, segment_origin};
use super::types::{
    near_tile_center, quantize, tile_center, tile_of, AgentId, Direction, TileKind,
    CAR_MIN_GAP, CAR_SPACING, CAR_STRAIGHT_BIAS, CAR_TURN_CHANCE, LANE_CROSS_TOLERANCE,
    WAITING_REROUTE_THRESHOLD,
};

/// A car in the simulation (AI-driven or the player's)
#[derive(Debug, Clone, PartialEq)]
pub struct SimVehicle {
    pub id: AgentId,
    /// Fractional grid coordinates; `floor` gives the occupied tile
    pub x: f64,
    pub y: f64,
    pub direction: Direction,
    /// Cruising speed in tiles per second
    pub speed: f64,
    /// Consecutive frames spent blocked behind another agent
    pub waiting: u32,
}

impl SimVehicle {
    pub fn new(id: AgentId, x: f64, y: f64, direction: Direction, speed: f64) -> Self {
        Self {
            id,
            x,
            y,
            direction,
            speed,
            waiting: 0,
        }
    }

    /// The tile this vehicle currently occupies
    pub fn tile(&self) -> (i32, i32) {
        tile_of(self.x, self.y)
    }
}

/// Whether any other agent sits in the narrow forward cone: ahead of the
/// position along `direction`, within the spacing threshold, and close to
/// the travel axis
///
/// The cone is deliberately narrow so crossing traffic on the other lane
/// does not read as a blocker.
pub fn blocked_ahead(x: f64, y: f64, direction: Direction, others: &[(f64, f64)]) -> bool {
    let (dx, dy) = direction.offset();
    others.iter().any(|&(other_x, other_y)| {
        let rel_x = other_x - x;
        let rel_y = other_y - y;
        let forward = rel_x * dx as f64 + rel_y * dy as f64;
        let cross = (rel_x * dy as f64 - rel_y * dx as f64).abs();
        forward > 0.0 && forward <= CAR_SPACING && cross <= LANE_CROSS_TOLERANCE
    })
}

/// Whether a position sits within the minimum gap of any other agent
pub fn overlaps_agent(x: f64, y: f64, others: &[(f64, f64)]) -> bool {
    others.iter().any(|&(other_x, other_y)| {
        let rel_x = other_x - x;
        let rel_y = other_y - y;
        (rel_x * rel_x + rel_y * rel_y).sqrt() < CAR_MIN_GAP
    })
}

/// Advances one AI car by one frame
pub fn update_vehicle<R: Rng>(
    car: &SimVehicle,
    grid: &TileGrid,
    others: &[(f64, f64)],
    rng: &mut R,
    delta: f64,
) -> SimVehicle {
    let mut car = car.clone();
    let (tile_x, tile_y) = car.tile();

    if !grid.is_drivable(tile_x, tile_y) {
        return relocate(car, grid, rng);
    }

    if blocked_ahead(car.x, car.y, car.direction, others) {
        car.waiting = car.waiting.saturating_add(1);
        if car.waiting >= WAITING_REROUTE_THRESHOLD && is_intersection(grid, tile_x, tile_y) {
            // Stuck long enough; look for any other way out of here
            let escapes: Vec<Direction> = clear_choices(&car, grid, others)
                .into_iter()
                .filter(|d| *d != car.direction)
                .collect();
            if let Some(&escape) = escapes.choose(rng) {
                turn_to(&mut car, escape);
            }
            car.waiting = 0;
        }
        return car;
    }
    car.waiting = 0;

    if near_tile_center(car.x, car.y) {
        let (seg_x, seg_y) = segment_origin(tile_x, tile_y);
        let mask = connections(grid, seg_x, seg_y);
        let (local_x, local_y) = local_coords(tile_x, tile_y);
        let (dx, dy) = car.direction.offset();
        let ahead_drivable = grid.is_drivable(tile_x + dx, tile_y + dy);

        if is_intersection(grid, tile_x, tile_y) {
            if rng.random_bool(CAR_TURN_CHANCE) || !ahead_drivable {
                if let Some(chosen) = reconsider_direction(&car, grid, others, rng) {
                    if chosen != car.direction {
                        turn_to(&mut car, chosen);
                    }
                }
            }
        } else if !ahead_drivable {
            if mask.count() <= 1 {
                // Dead end: cross to the opposite-flow lane, then reverse
                let reversal = u_turn_direction(grid, tile_x, tile_y, car.direction);
                turn_to(&mut car, reversal);
            } else {
                let turns: Vec<Direction> = clear_choices(&car, grid, others)
                    .into_iter()
                    .filter(|d| *d != car.direction)
                    .collect();
                match turns.choose(rng) {
                    Some(&turn) => turn_to(&mut car, turn),
                    None => {
                        let reversal = u_turn_direction(grid, tile_x, tile_y, car.direction);
                        turn_to(&mut car, reversal);
                    }
                }
            }
        } else if let Some(lane) = lane_direction(local_x, local_y, mask) {
            // Off-junction cells have one fixed flow; fall in line with it,
            // unless that flow runs straight into missing asphalt (U-turn
            // crossings pass through opposing-lane cells)
            let (lane_dx, lane_dy) = lane.offset();
            if lane != car.direction && grid.is_drivable(tile_x + lane_dx, tile_y + lane_dy) {
                turn_to(&mut car, lane);
            }
        }
    }

    let (dx, dy) = car.direction.offset();
    let moved_x = quantize(car.x + dx as f64 * car.speed * delta);
    let moved_y = quantize(car.y + dy as f64 * car.speed * delta);
    let (moved_tile_x, moved_tile_y) = tile_of(moved_x, moved_y);

    if grid.is_drivable(moved_tile_x, moved_tile_y) {
        car.x = moved_x;
        car.y = moved_y;
    } else {
        let (center_x, center_y) = tile_center(tile_x, tile_y);
        car.x = quantize(center_x);
        car.y = quantize(center_y);
    }
    car
}

/// Advances the player car by one frame
///
/// Steering is external; there is no lane discipline and no blocking
/// logic, but the same quantization applies and the car may neither enter
/// a building tile nor overlap another agent.
pub fn update_player(
    player: &SimVehicle,
    grid: &TileGrid,
    others: &[(f64, f64)],
    input: Option<Direction>,
    delta: f64,
) -> SimVehicle {
    let mut car = player.clone();
    let Some(direction) = input else {
        return car;
    };
    car.direction = direction;

    let (dx, dy) = direction.offset();
    let moved_x = quantize(car.x + dx as f64 * car.speed * delta);
    let moved_y = quantize(car.y + dy as f64 * car.speed * delta);
    let (moved_tile_x, moved_tile_y) = tile_of(moved_x, moved_y);

    if grid.kind_at(moved_tile_x, moved_tile_y) != TileKind::Obstacle
        && !overlaps_agent(moved_x, moved_y, others)
    {
        car.x = moved_x;
        car.y = moved_y;
    }
    car
}

/// The legal, drivable, unblocked directions out of the car's tile
/// (straight included when it qualifies; reversal never)
fn clear_choices(car: &SimVehicle, grid: &TileGrid, others: &[(f64, f64)]) -> Vec<Direction> {
    let (tile_x, tile_y) = car.tile();
    let (local_x, local_y) = local_coords(tile_x, tile_y);

    Direction::ALL
        .iter()
        .copied()
        .filter(|d| can_turn(local_x, local_y, car.direction, *d))
        .filter(|d| {
            let (dx, dy) = d.offset();
            grid.is_drivable(tile_x + dx, tile_y + dy)
        })
        .filter(|d| !blocked_ahead(car.x, car.y, *d, others))
        .collect()
}

/// Junction direction choice: straight is preferred 75% of the time when
/// it is among the clear choices, otherwise a random clear turn
fn reconsider_direction<R: Rng>(
    car: &SimVehicle,
    grid: &TileGrid,
    others: &[(f64, f64)],
    rng: &mut R,
) -> Option<Direction> {
    let choices = clear_choices(car, grid, others);
    if choices.is_empty() {
        return None;
    }
    if choices.contains(&car.direction) && rng.random_bool(CAR_STRAIGHT_BIAS) {
        return Some(car.direction);
    }
    let turns: Vec<Direction> = choices
        .iter()
        .copied()
        .filter(|d| *d != car.direction)
        .collect();
    if turns.is_empty() {
        return choices.first().copied();
    }
    turns.choose(rng).copied()
}

/// Changes heading at the current tile center so the new travel axis is
/// clean of drift from the old one
fn turn_to(car: &mut SimVehicle, direction: Direction) {
    let (tile_x, tile_y) = car.tile();
    let (center_x, center_y) = tile_center(tile_x, tile_y);
    car.x = quantize(center_x);
    car.y = quantize(center_y);
    car.direction = direction;
}

/// Recovery transition: this car's asphalt was edited away, move it to a
/// random remaining asphalt tile facing that tile's lane flow
fn relocate<R: Rng>(mut car: SimVehicle, grid: &TileGrid, rng: &mut R) -> SimVehicle {
    let tiles = grid.drivable_tiles();
    match tiles.choose(rng) {
        Some(&(tile_x, tile_y)) => {
            let (center_x, center_y) = tile_center(tile_x, tile_y);
            car.x = quantize(center_x);
            car.y = quantize(center_y);

            let (seg_x, seg_y) = segment_origin(tile_x, tile_y);
            let mask = connections(grid, seg_x, seg_y);
            let (local_x, local_y) = local_coords(tile_x, tile_y);
            car.direction = match lane_direction(local_x, local_y, mask) {
                Some(lane) => lane,
                None => *Direction::ALL.choose(rng).unwrap_or(&car.direction),
            };
            car.waiting = 0;
            debug!("vehicle {:?} relocated to ({}, {})", car.id, tile_x, tile_y);
        }
        None => {
            // No asphalt anywhere; nothing to recover onto
        }
    }
    car
}
