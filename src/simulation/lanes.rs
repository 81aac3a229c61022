//! Lane and turn resolver
//!
//! Derives, purely from a tile's position inside its 4x4 segment and that
//! segment's live connections, which direction a vehicle may legally
//! travel there and where it may turn. Rows/columns 1 and 2 are the
//! two-lane carriageway; 0 and 3 are the shoulders.
//!
//! Traffic is right-handed with y growing downward: row 1 carries
//! westbound traffic, row 2 eastbound, column 1 southbound, column 2
//! northbound.

use std::cmp::Ordering;

use super::grid::TileGrid;
use super::topology::{connections, local_coords, segment_origin, ConnectionMask};
use super::types::Direction;

/// The carriageway row a horizontal direction travels on; None for
/// vertical directions
pub fn lane_row(direction: Direction) -> Option<i32> {
    match direction {
        Direction::Left => Some(1),
        Direction::Right => Some(2),
        Direction::Up | Direction::Down => None,
    }
}

/// The carriageway column a vertical direction travels on; None for
/// horizontal directions
pub fn lane_col(direction: Direction) -> Option<i32> {
    match direction {
        Direction::Down => Some(1),
        Direction::Up => Some(2),
        Direction::Left | Direction::Right => None,
    }
}

fn in_center(local_x: i32, local_y: i32) -> bool {
    (local_x == 1 || local_x == 2) && (local_y == 1 || local_y == 2)
}

/// Row rule: which direction a cell's row assigns
fn row_rule(local_y: i32) -> Option<Direction> {
    match local_y {
        1 => Some(Direction::Left),
        2 => Some(Direction::Right),
        _ => None,
    }
}

/// Column rule: which direction a cell's column assigns
fn col_rule(local_x: i32) -> Option<Direction> {
    match local_x {
        1 => Some(Direction::Down),
        2 => Some(Direction::Up),
        _ => None,
    }
}

/// Lane assignment for an edge cell: its own row rule when it sits on a
/// carriageway row, otherwise its column rule
fn edge_rule(local_x: i32, local_y: i32) -> Option<Direction> {
    if local_y == 1 || local_y == 2 {
        row_rule(local_y)
    } else {
        col_rule(local_x)
    }
}

/// The one legal travel direction at a sub-tile position, or None when the
/// position is unconstrained (the free-choice center of a junction)
pub fn lane_direction(
    local_x: i32,
    local_y: i32,
    mask: ConnectionMask,
) -> Option<Direction> {
    match mask.count() {
        count if count >= 3 => {
            // True intersection: free at the center, lane-bound on the arms
            if in_center(local_x, local_y) {
                None
            } else {
                edge_rule(local_x, local_y)
            }
        }
        2 if mask.has_vertical() && mask.has_horizontal() => {
            // Corner: the center is a free-turn zone
            if in_center(local_x, local_y) {
                None
            } else {
                edge_rule(local_x, local_y)
            }
        }
        2 => {
            // Straight road: every carriageway cell has exactly one direction
            if mask.has_horizontal() {
                row_rule(local_y)
            } else {
                col_rule(local_x)
            }
        }
        _ => {
            // Dead ends and isolated segments: position-keyed default on
            // the stub's axis
            if mask.has_vertical() {
                col_rule(local_x).or_else(|| row_rule(local_y))
            } else {
                row_rule(local_y).or_else(|| col_rule(local_x))
            }
        }
    }
}

/// Whether a tile is junction interior: the 2x2 center of a segment whose
/// connections span both axes
///
/// A corner's center counts; a pure straight road's does not.
pub fn is_intersection(grid: &TileGrid, x: i32, y: i32) -> bool {
    let (local_x, local_y) = local_coords(x, y);
    if !in_center(local_x, local_y) {
        return false;
    }
    let (seg_x, seg_y) = segment_origin(x, y);
    if !grid.is_road_anchor(seg_x, seg_y) {
        return false;
    }
    let mask = connections(grid, seg_x, seg_y);
    mask.has_vertical() && mask.has_horizontal()
}

/// Whether a vehicle heading `from` may change to `to` at a sub-tile
/// position
///
/// Straight continuation is always legal and full reversal never is
/// (dead-end U-turns go through [`u_turn_direction`] instead). Every other
/// pair is legal at exactly one cell: the crossing of the vertical
/// direction's column and the horizontal direction's row, which makes cars
/// hug the correct corner when turning.
pub fn can_turn(local_x: i32, local_y: i32, from: Direction, to: Direction) -> bool {
    if to == from {
        return true;
    }
    if to == from.opposite() {
        return false;
    }

    let (horizontal, vertical) = if from.is_horizontal() {
        (from, to)
    } else {
        (to, from)
    };
    lane_col(vertical) == Some(local_x) && lane_row(horizontal) == Some(local_y)
}

/// Direction out of a dead end
///
/// Prefers to first cross onto the opposite-flow row/column (when that
/// neighbor tile is drivable), so the car comes back on the correct lane;
/// reverses in place when it is already there or the crossing is blocked
/// by missing asphalt.
pub fn u_turn_direction(grid: &TileGrid, x: i32, y: i32, direction: Direction) -> Direction {
    let reversed = direction.opposite();
    let (local_x, local_y) = local_coords(x, y);

    let crossing = if direction.is_horizontal() {
        lane_row(reversed).and_then(|target_row| match target_row.cmp(&local_y) {
            Ordering::Less => Some(Direction::Up),
            Ordering::Greater => Some(Direction::Down),
            Ordering::Equal => None,
        })
    } else {
        lane_col(reversed).and_then(|target_col| match target_col.cmp(&local_x) {
            Ordering::Less => Some(Direction::Left),
            Ordering::Greater => Some(Direction::Right),
            Ordering::Equal => None,
        })
    };

    match crossing {
        Some(step) => {
            let (dx, dy) = step.offset();
            if grid.is_drivable(x + dx, y + dy) {
                step
            } else {
                reversed
            }
        }
        None => reversed,
    }
}
