//! Standalone city simulation module
//!
//! This module contains all the core simulation logic: the tile grid,
//! the road topology resolver, lane discipline, and the agent movement
//! simulators. It runs independently of any rendering layer and can be
//! exercised from the console or from tests without booting a game.

mod grid;
mod lanes;
mod pedestrian;
mod topology;
mod types;
mod vehicle;
mod world;

// Re-export public types for external use
// These may not be used within this crate but are part of the public API
#[allow(unused_imports)]
pub use grid::TileGrid;
#[allow(unused_imports)]
pub use lanes::{can_turn, is_intersection, lane_col, lane_direction, lane_row, u_turn_direction};
#[allow(unused_imports)]
pub use pedestrian::{update_pedestrian, SimPedestrian};
#[allow(unused_imports)]
pub use topology::{
    affected_segments, connections, local_coords, place_segment, placement_valid, remove_segment,
    segment_origin, segment_type, tile_pattern, ConnectionMask, PatternCell, PlacementError,
};
#[allow(unused_imports)]
pub use types::{
    near_tile_center, quantize, tile_center, tile_of, AgentId, Direction, SegmentType, Tile,
    TileKind, CAR_MIN_GAP, CAR_SPACING, CENTER_SNAP_DISTANCE, POSITION_QUANTUM, SEGMENT_SIZE,
    WAITING_REROUTE_THRESHOLD,
};
#[allow(unused_imports)]
pub use vehicle::{blocked_ahead, overlaps_agent, update_player, update_vehicle, SimVehicle};
pub use world::SimWorld;
