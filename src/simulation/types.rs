//! Core types for the city simulation
//!
//! These are standalone types shared by the grid, the road topology
//! resolver, and the agent simulators.

/// A unique identifier for simulation agents
/// This is a simple wrapper around a usize for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AgentId(pub usize);

/// The four travel directions on the grid
///
/// y grows downward, so `Up` decreases y. The enum is deliberately closed:
/// every lookup over it is an exhaustive match, so adding a variant is a
/// compile error everywhere a case is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// All four directions, in a fixed order
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit tile offset for this direction
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// The reverse of this direction
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Whether travel along this direction moves on the x axis
    pub fn is_horizontal(self) -> bool {
        match self {
            Direction::Left | Direction::Right => true,
            Direction::Up | Direction::Down => false,
        }
    }
}

/// What occupies a single grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileKind {
    /// Buildable ground; nothing placed here
    Empty,
    /// Pedestrian surface of a road segment
    Sidewalk,
    /// Drivable surface of a road segment
    Asphalt,
    /// Building footprint; blocks everything
    Obstacle,
}

/// A single grid cell
///
/// `origin` points at the top-left anchor of the multi-cell object this
/// cell belongs to (road segment or building); the anchor cell points at
/// itself. Road-segment origins are always aligned to multiples of
/// [`SEGMENT_SIZE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub kind: TileKind,
    pub origin: Option<(i32, i32)>,
}

impl Tile {
    pub const EMPTY: Tile = Tile {
        kind: TileKind::Empty,
        origin: None,
    };
}

impl Default for Tile {
    fn default() -> Self {
        Tile::EMPTY
    }
}

/// The qualitative shape of a road segment, derived from its live
/// connection mask
///
/// Dead ends are named for their single connection; tees are named for the
/// one *missing* direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentType {
    Isolated,
    DeadEndNorth,
    DeadEndSouth,
    DeadEndEast,
    DeadEndWest,
    Horizontal,
    Vertical,
    CornerNorthEast,
    CornerNorthWest,
    CornerSouthEast,
    CornerSouthWest,
    TeeNorth,
    TeeSouth,
    TeeEast,
    TeeWest,
    Intersection,
}

/// Side length of a road segment in tiles
pub const SEGMENT_SIZE: i32 = 4;

/// How close to a tile center an agent must be before it is allowed to
/// make a direction decision there
pub const CENTER_SNAP_DISTANCE: f64 = 0.15;

/// Forward reach of the vehicle blocking cone, in tiles
pub const CAR_SPACING: f64 = 1.25;

/// Maximum cross-axis offset for another agent to count as "ahead" rather
/// than crossing traffic
pub const LANE_CROSS_TOLERANCE: f64 = 0.5;

/// Minimum center-to-center gap between the player car and any other agent
pub const CAR_MIN_GAP: f64 = 0.75;

/// Frames a blocked vehicle waits before hunting for another direction
pub const WAITING_REROUTE_THRESHOLD: u32 = 60;

/// Vehicle positions are quantized to multiples of this step after every
/// move, so logical tile occupancy never drifts from the rendered position
pub const POSITION_QUANTUM: f64 = 1.0 / 64.0;

/// Probability a pedestrian keeps going straight when straight is legal
pub const PED_STRAIGHT_BIAS: f64 = 0.6;

/// Probability per center-crossing that a pedestrian wanders at a junction
pub const PED_WANDER_CHANCE: f64 = 0.1;

/// Probability a vehicle reconsiders its direction at an intersection
pub const CAR_TURN_CHANCE: f64 = 0.25;

/// Probability a reconsidering vehicle keeps going straight when it can
pub const CAR_STRAIGHT_BIAS: f64 = 0.75;

/// Pedestrian walking speed range, tiles per second
pub const PED_SPEED_RANGE: std::ops::Range<f64> = 0.8..1.6;

/// Vehicle cruising speed range, tiles per second
pub const CAR_SPEED_RANGE: std::ops::Range<f64> = 2.0..4.0;

/// Player car speed, tiles per second
pub const PLAYER_CAR_SPEED: f64 = 3.0;

/// The tile containing a continuous position
pub fn tile_of(x: f64, y: f64) -> (i32, i32) {
    (x.floor() as i32, y.floor() as i32)
}

/// Center of a tile in continuous coordinates
pub fn tile_center(tile_x: i32, tile_y: i32) -> (f64, f64) {
    (tile_x as f64 + 0.5, tile_y as f64 + 0.5)
}

/// Whether a position is close enough to its tile center for a direction
/// decision
pub fn near_tile_center(x: f64, y: f64) -> bool {
    (x - x.floor() - 0.5).abs() <= CENTER_SNAP_DISTANCE
        && (y - y.floor() - 0.5).abs() <= CENTER_SNAP_DISTANCE
}

/// Snaps a coordinate to the fixed position grid (see [`POSITION_QUANTUM`])
pub fn quantize(v: f64) -> f64 {
    (v / POSITION_QUANTUM).round() * POSITION_QUANTUM
}
