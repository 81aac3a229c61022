//! Road topology resolver
//!
//! Roads are placed as 4x4 segments. A segment's shape is never stored:
//! it is re-derived from which cardinal neighbors hold a segment anchor
//! (the connection mask), then repainted as sidewalk/asphalt tiles.
//! Placing or removing one segment can reclassify its neighbors, so every
//! mutation repaints the segment and all four cardinal neighbors.

use thiserror::Error;

use super::grid::TileGrid;
use super::types::{Direction, SegmentType, Tile, TileKind, SEGMENT_SIZE};

/// Why a placement or removal was rejected
///
/// Rejections are reported before anything is written; the grid is never
/// left partially mutated.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PlacementError {
    #[error("segment at ({x}, {y}) extends out of bounds")]
    OutOfBounds { x: i32, y: i32 },

    #[error("cell ({x}, {y}) is already occupied")]
    Occupied { x: i32, y: i32 },

    #[error("no object anchored at ({x}, {y})")]
    Vacant { x: i32, y: i32 },
}

/// 4-bit cardinal connection set for a road segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionMask(u8);

impl ConnectionMask {
    const NORTH: u8 = 0b0001;
    const SOUTH: u8 = 0b0010;
    const EAST: u8 = 0b0100;
    const WEST: u8 = 0b1000;

    pub const EMPTY: ConnectionMask = ConnectionMask(0);

    /// Builds a mask from the low 4 bits (N, S, E, W)
    pub fn from_bits(bits: u8) -> Self {
        Self(bits & 0b1111)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    fn bit(direction: Direction) -> u8 {
        match direction {
            Direction::Up => Self::NORTH,
            Direction::Down => Self::SOUTH,
            Direction::Right => Self::EAST,
            Direction::Left => Self::WEST,
        }
    }

    /// Returns this mask with the given direction connected
    pub fn with(self, direction: Direction) -> Self {
        Self(self.0 | Self::bit(direction))
    }

    pub fn has(self, direction: Direction) -> bool {
        self.0 & Self::bit(direction) != 0
    }

    /// Number of connected directions
    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Connected to a neighbor above or below
    pub fn has_vertical(self) -> bool {
        self.has(Direction::Up) || self.has(Direction::Down)
    }

    /// Connected to a neighbor left or right
    pub fn has_horizontal(self) -> bool {
        self.has(Direction::Left) || self.has(Direction::Right)
    }
}

/// One cell of a segment's paint pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternCell {
    pub dx: i32,
    pub dy: i32,
    pub kind: TileKind,
}

/// Floors a tile position to the origin of the segment containing it
pub fn segment_origin(x: i32, y: i32) -> (i32, i32) {
    (
        x.div_euclid(SEGMENT_SIZE) * SEGMENT_SIZE,
        y.div_euclid(SEGMENT_SIZE) * SEGMENT_SIZE,
    )
}

/// Position of a tile inside its segment, each coordinate in 0..4
pub fn local_coords(x: i32, y: i32) -> (i32, i32) {
    (x.rem_euclid(SEGMENT_SIZE), y.rem_euclid(SEGMENT_SIZE))
}

/// Checks that a whole 4x4 segment can be placed at the given origin
///
/// All 16 cells must be in bounds and Empty; otherwise the placement is
/// rejected wholesale and nothing is written.
pub fn placement_valid(grid: &TileGrid, seg_x: i32, seg_y: i32) -> Result<(), PlacementError> {
    for dy in 0..SEGMENT_SIZE {
        for dx in 0..SEGMENT_SIZE {
            let (x, y) = (seg_x + dx, seg_y + dy);
            match grid.get(x, y) {
                None => return Err(PlacementError::OutOfBounds { x, y }),
                Some(tile) if tile.kind != TileKind::Empty => {
                    return Err(PlacementError::Occupied { x, y });
                }
                Some(_) => {}
            }
        }
    }
    Ok(())
}

/// Live connection mask of the segment at the given origin
///
/// Tests exactly the four positions offset by one segment on each axis for
/// a road-segment anchor, bounds-checked.
pub fn connections(grid: &TileGrid, seg_x: i32, seg_y: i32) -> ConnectionMask {
    let mut mask = ConnectionMask::EMPTY;
    for direction in Direction::ALL {
        let (dx, dy) = direction.offset();
        if grid.is_road_anchor(seg_x + dx * SEGMENT_SIZE, seg_y + dy * SEGMENT_SIZE) {
            mask = mask.with(direction);
        }
    }
    mask
}

/// Classifies a segment shape from its connection mask
///
/// Pure and total: classification is strictly by popcount, then by which
/// bits are set.
pub fn segment_type(mask: ConnectionMask) -> SegmentType {
    let north = mask.has(Direction::Up);
    let south = mask.has(Direction::Down);
    let east = mask.has(Direction::Right);
    let west = mask.has(Direction::Left);

    match mask.count() {
        0 => SegmentType::Isolated,
        1 => {
            if north {
                SegmentType::DeadEndNorth
            } else if south {
                SegmentType::DeadEndSouth
            } else if east {
                SegmentType::DeadEndEast
            } else {
                SegmentType::DeadEndWest
            }
        }
        2 => match (north, south, east, west) {
            (true, true, false, false) => SegmentType::Vertical,
            (false, false, true, true) => SegmentType::Horizontal,
            (true, false, true, false) => SegmentType::CornerNorthEast,
            (true, false, false, true) => SegmentType::CornerNorthWest,
            (false, true, true, false) => SegmentType::CornerSouthEast,
            (false, true, false, true) => SegmentType::CornerSouthWest,
            _ => unreachable!("popcount 2 admits exactly six bit pairs"),
        },
        3 => {
            // A tee is named for the missing direction
            if !north {
                SegmentType::TeeNorth
            } else if !south {
                SegmentType::TeeSouth
            } else if !east {
                SegmentType::TeeEast
            } else {
                SegmentType::TeeWest
            }
        }
        _ => SegmentType::Intersection,
    }
}

/// The canonical connection set of a segment shape (inverse of
/// [`segment_type`]; Isolated maps to no connections)
pub fn canonical_connections(segment_type: SegmentType) -> ConnectionMask {
    let mask = ConnectionMask::EMPTY;
    match segment_type {
        SegmentType::Isolated => mask,
        SegmentType::DeadEndNorth => mask.with(Direction::Up),
        SegmentType::DeadEndSouth => mask.with(Direction::Down),
        SegmentType::DeadEndEast => mask.with(Direction::Right),
        SegmentType::DeadEndWest => mask.with(Direction::Left),
        SegmentType::Horizontal => mask.with(Direction::Left).with(Direction::Right),
        SegmentType::Vertical => mask.with(Direction::Up).with(Direction::Down),
        SegmentType::CornerNorthEast => mask.with(Direction::Up).with(Direction::Right),
        SegmentType::CornerNorthWest => mask.with(Direction::Up).with(Direction::Left),
        SegmentType::CornerSouthEast => mask.with(Direction::Down).with(Direction::Right),
        SegmentType::CornerSouthWest => mask.with(Direction::Down).with(Direction::Left),
        SegmentType::TeeNorth => mask
            .with(Direction::Down)
            .with(Direction::Right)
            .with(Direction::Left),
        SegmentType::TeeSouth => mask
            .with(Direction::Up)
            .with(Direction::Right)
            .with(Direction::Left),
        SegmentType::TeeEast => mask
            .with(Direction::Up)
            .with(Direction::Down)
            .with(Direction::Left),
        SegmentType::TeeWest => mask
            .with(Direction::Up)
            .with(Direction::Down)
            .with(Direction::Right),
        SegmentType::Intersection => mask
            .with(Direction::Up)
            .with(Direction::Down)
            .with(Direction::Left)
            .with(Direction::Right),
    }
}

/// Whether a local cell is asphalt under the given connection set
///
/// Asphalt is the center 2x2 plus a two-wide stub toward each connected
/// edge. That single rule yields every fixed per-shape pattern: a straight
/// road paints its middle two rows/columns, an intersection paints the
/// full center cross, an isolated segment paints only the center square.
fn is_asphalt_cell(dx: i32, dy: i32, mask: ConnectionMask) -> bool {
    let lane_x = dx == 1 || dx == 2;
    let lane_y = dy == 1 || dy == 2;

    if lane_x && lane_y {
        return true;
    }
    (mask.has(Direction::Up) && lane_x && dy == 0)
        || (mask.has(Direction::Down) && lane_x && dy == SEGMENT_SIZE - 1)
        || (mask.has(Direction::Right) && lane_y && dx == SEGMENT_SIZE - 1)
        || (mask.has(Direction::Left) && lane_y && dx == 0)
}

/// The full 16-cell paint pattern for a segment shape
///
/// Total: every shape maps to exactly 16 entries covering the segment.
pub fn tile_pattern(segment_type: SegmentType) -> [PatternCell; 16] {
    let mask = canonical_connections(segment_type);
    let mut cells = [PatternCell {
        dx: 0,
        dy: 0,
        kind: TileKind::Sidewalk,
    }; 16];

    for (index, cell) in cells.iter_mut().enumerate() {
        let dx = index as i32 % SEGMENT_SIZE;
        let dy = index as i32 / SEGMENT_SIZE;
        let kind = if is_asphalt_cell(dx, dy, mask) {
            TileKind::Asphalt
        } else {
            TileKind::Sidewalk
        };
        *cell = PatternCell { dx, dy, kind };
    }
    cells
}

/// The segments whose classification a mutation at this origin can change:
/// the segment itself plus its in-bounds cardinal neighbors
pub fn affected_segments(grid: &TileGrid, seg_x: i32, seg_y: i32) -> Vec<(i32, i32)> {
    let mut origins = vec![(seg_x, seg_y)];
    for direction in Direction::ALL {
        let (dx, dy) = direction.offset();
        let (nx, ny) = (seg_x + dx * SEGMENT_SIZE, seg_y + dy * SEGMENT_SIZE);
        if grid.in_bounds(nx, ny) {
            origins.push((nx, ny));
        }
    }
    origins
}

/// Recomputes the shape of the segment anchored at an origin and rewrites
/// its 16 tile kinds; no-op when no segment is anchored there
fn repaint_segment(grid: &mut TileGrid, seg_x: i32, seg_y: i32) {
    if !grid.is_road_anchor(seg_x, seg_y) {
        return;
    }
    let shape = segment_type(connections(grid, seg_x, seg_y));
    for cell in tile_pattern(shape) {
        grid.set(
            seg_x + cell.dx,
            seg_y + cell.dy,
            Tile {
                kind: cell.kind,
                origin: Some((seg_x, seg_y)),
            },
        );
    }
}

/// Places a road segment at the given origin and repaints every affected
/// segment
///
/// All-or-nothing: on rejection the grid is untouched.
pub fn place_segment(grid: &mut TileGrid, seg_x: i32, seg_y: i32) -> Result<(), PlacementError> {
    placement_valid(grid, seg_x, seg_y)?;

    for dy in 0..SEGMENT_SIZE {
        for dx in 0..SEGMENT_SIZE {
            grid.set(
                seg_x + dx,
                seg_y + dy,
                Tile {
                    kind: TileKind::Sidewalk,
                    origin: Some((seg_x, seg_y)),
                },
            );
        }
    }

    for (ox, oy) in affected_segments(grid, seg_x, seg_y) {
        repaint_segment(grid, ox, oy);
    }
    Ok(())
}

/// Removes the road segment anchored at the given origin, reverting its
/// cells to Empty and repainting the remaining neighbors
pub fn remove_segment(grid: &mut TileGrid, seg_x: i32, seg_y: i32) -> Result<(), PlacementError> {
    if !grid.in_bounds(seg_x, seg_y) {
        return Err(PlacementError::OutOfBounds { x: seg_x, y: seg_y });
    }
    if !grid.is_road_anchor(seg_x, seg_y) {
        return Err(PlacementError::Vacant { x: seg_x, y: seg_y });
    }

    for dy in 0..SEGMENT_SIZE {
        for dx in 0..SEGMENT_SIZE {
            grid.set(seg_x + dx, seg_y + dy, Tile::EMPTY);
        }
    }

    for (ox, oy) in affected_segments(grid, seg_x, seg_y) {
        repaint_segment(grid, ox, oy);
    }
    Ok(())
}
