//! Main simulation world that ties everything together
//!
//! `SimWorld` owns the tile grid, every agent, and the RNG. External code
//! edits the grid and requests spawns through the methods here, then calls
//! `advance` once per frame and reads the agent snapshots back; it never
//! mutates agents directly. Grid edits must happen between frames, never
//! during one; `advance` assumes the grid is stable for the whole pass.

use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use super::grid::TileGrid;
use super::lanes::lane_direction;
use super::pedestrian::{update_pedestrian, SimPedestrian};
use super::topology::{
    self, connections, local_coords, segment_origin, segment_type, PlacementError,
};
use super::types::{
    tile_center, AgentId, Direction, SegmentType, Tile, TileKind, CAR_SPEED_RANGE,
    PED_SPEED_RANGE, PLAYER_CAR_SPEED, SEGMENT_SIZE,
};
use super::vehicle::{update_player, update_vehicle, SimVehicle};

/// The main simulation world
pub struct SimWorld {
    /// The tile grid everything reads
    grid: TileGrid,

    /// All foot-traffic agents
    pedestrians: Vec<SimPedestrian>,

    /// All AI-driven cars
    vehicles: Vec<SimVehicle>,

    /// The player's car, when driving mode is on
    player_car: Option<SimVehicle>,

    /// Steering input applied to the player car each frame
    player_input: Option<Direction>,

    /// Next agent ID to assign
    next_id: usize,

    /// Simulation time in seconds
    pub time: f64,

    /// Seeded RNG: entropy-seeded by default, fixed-seeded for
    /// reproducible runs
    rng: StdRng,
}

impl SimWorld {
    /// Create an empty world with an entropy-seeded RNG
    pub fn new(width: i32, height: i32) -> Self {
        Self::new_internal(width, height, StdRng::from_os_rng())
    }

    /// Create an empty world with a seeded RNG for reproducible simulations
    pub fn new_with_seed(width: i32, height: i32, seed: u64) -> Self {
        Self::new_internal(width, height, StdRng::seed_from_u64(seed))
    }

    fn new_internal(width: i32, height: i32, rng: StdRng) -> Self {
        Self {
            grid: TileGrid::new(width, height),
            pedestrians: Vec::new(),
            vehicles: Vec::new(),
            player_car: None,
            player_input: None,
            next_id: 0,
            time: 0.0,
            rng,
        }
    }

    fn next_agent_id(&mut self) -> AgentId {
        let id = AgentId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn width(&self) -> i32 {
        self.grid.width()
    }

    pub fn height(&self) -> i32 {
        self.grid.height()
    }

    /// Read-only view of the grid, for rendering and debug overlays
    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// Current pedestrians, for rendering
    pub fn pedestrians(&self) -> &[SimPedestrian] {
        &self.pedestrians
    }

    /// Current AI cars, for rendering
    pub fn vehicles(&self) -> &[SimVehicle] {
        &self.vehicles
    }

    /// The player car, when driving mode is on
    pub fn player_car(&self) -> Option<&SimVehicle> {
        self.player_car.as_ref()
    }

    /// Places a 4x4 road segment and repaints it plus all affected
    /// neighbors
    ///
    /// The origin is snapped to its segment boundary first, so any cell of
    /// the intended segment may be passed. All-or-nothing: on rejection
    /// the grid is untouched.
    pub fn place_road_segment(&mut self, origin: (i32, i32)) -> Result<(), PlacementError> {
        let (seg_x, seg_y) = segment_origin(origin.0, origin.1);
        topology::place_segment(&mut self.grid, seg_x, seg_y)
    }

    /// Removes the road segment at an origin, reverting its cells to
    /// buildable ground and repainting the remaining neighbors
    pub fn remove_road_segment(&mut self, origin: (i32, i32)) -> Result<(), PlacementError> {
        let (seg_x, seg_y) = segment_origin(origin.0, origin.1);
        topology::remove_segment(&mut self.grid, seg_x, seg_y)
    }

    /// The current shape of the segment at an origin, for rendering and
    /// debug overlays
    pub fn segment_type_at(&self, origin: (i32, i32)) -> Option<SegmentType> {
        let (seg_x, seg_y) = segment_origin(origin.0, origin.1);
        if !self.grid.is_road_anchor(seg_x, seg_y) {
            return None;
        }
        Some(segment_type(connections(&self.grid, seg_x, seg_y)))
    }

    /// Places a building footprint of Obstacle tiles anchored at `origin`
    ///
    /// Validated atomically like a road segment: every cell must be
    /// in-bounds and Empty.
    pub fn place_building(
        &mut self,
        origin: (i32, i32),
        width: i32,
        height: i32,
    ) -> Result<(), PlacementError> {
        let (origin_x, origin_y) = origin;
        for dy in 0..height.max(1) {
            for dx in 0..width.max(1) {
                let (x, y) = (origin_x + dx, origin_y + dy);
                match self.grid.get(x, y) {
                    None => return Err(PlacementError::OutOfBounds { x, y }),
                    Some(tile) if tile.kind != TileKind::Empty => {
                        return Err(PlacementError::Occupied { x, y });
                    }
                    Some(_) => {}
                }
            }
        }
        for dy in 0..height.max(1) {
            for dx in 0..width.max(1) {
                self.grid.set(
                    origin_x + dx,
                    origin_y + dy,
                    Tile {
                        kind: TileKind::Obstacle,
                        origin: Some(origin),
                    },
                );
            }
        }
        Ok(())
    }

    /// Removes the building anchored at `origin`
    pub fn remove_building(&mut self, origin: (i32, i32)) -> Result<(), PlacementError> {
        let (origin_x, origin_y) = origin;
        match self.grid.get(origin_x, origin_y) {
            None => {
                return Err(PlacementError::OutOfBounds {
                    x: origin_x,
                    y: origin_y,
                })
            }
            Some(tile) if tile.kind == TileKind::Obstacle && tile.origin == Some(origin) => {}
            Some(_) => {
                return Err(PlacementError::Vacant {
                    x: origin_x,
                    y: origin_y,
                })
            }
        }
        let footprint = self.grid.positions_where(|g, x, y| {
            g.get(x, y)
                .map(|t| t.kind == TileKind::Obstacle && t.origin == Some(origin))
                .unwrap_or(false)
        });
        for (x, y) in footprint {
            self.grid.set(x, y, Tile::EMPTY);
        }
        Ok(())
    }

    /// Spawns a pedestrian on a random walkable tile
    ///
    /// Returns false iff no walkable tile exists anywhere in the grid.
    pub fn spawn_pedestrian(&mut self) -> bool {
        let tiles = self.grid.walkable_tiles();
        let Some(&(tile_x, tile_y)) = tiles.choose(&mut self.rng) else {
            return false;
        };
        let (x, y) = tile_center(tile_x, tile_y);
        let direction = *Direction::ALL.choose(&mut self.rng).unwrap_or(&Direction::Up);
        let speed = self.rng.random_range(PED_SPEED_RANGE);
        let id = self.next_agent_id();
        self.pedestrians
            .push(SimPedestrian::new(id, x, y, direction, speed));
        true
    }

    /// Spawns a pedestrian on a specific tile; false when the tile is not
    /// walkable
    pub fn spawn_pedestrian_at(&mut self, tile_x: i32, tile_y: i32) -> bool {
        if !self.grid.is_walkable(tile_x, tile_y) {
            return false;
        }
        let (x, y) = tile_center(tile_x, tile_y);
        let direction = *Direction::ALL.choose(&mut self.rng).unwrap_or(&Direction::Up);
        let speed = self.rng.random_range(PED_SPEED_RANGE);
        let id = self.next_agent_id();
        self.pedestrians
            .push(SimPedestrian::new(id, x, y, direction, speed));
        true
    }

    /// Spawns an AI car on a random asphalt tile facing that tile's lane
    /// flow
    ///
    /// Returns false iff no asphalt tile exists anywhere in the grid.
    pub fn spawn_vehicle(&mut self) -> bool {
        let tiles = self.grid.drivable_tiles();
        let Some(&(tile_x, tile_y)) = tiles.choose(&mut self.rng) else {
            return false;
        };
        let direction = self.lane_or_random_direction(tile_x, tile_y);
        self.push_vehicle(tile_x, tile_y, direction);
        true
    }

    /// Spawns an AI car on a specific tile with a given heading; false
    /// when the tile is not asphalt
    pub fn spawn_vehicle_at(&mut self, tile_x: i32, tile_y: i32, direction: Direction) -> bool {
        if !self.grid.is_drivable(tile_x, tile_y) {
            return false;
        }
        self.push_vehicle(tile_x, tile_y, direction);
        true
    }

    fn push_vehicle(&mut self, tile_x: i32, tile_y: i32, direction: Direction) {
        let (x, y) = tile_center(tile_x, tile_y);
        let speed = self.rng.random_range(CAR_SPEED_RANGE);
        let id = self.next_agent_id();
        self.vehicles
            .push(SimVehicle::new(id, x, y, direction, speed));
    }

    fn lane_or_random_direction(&mut self, tile_x: i32, tile_y: i32) -> Direction {
        let (seg_x, seg_y) = segment_origin(tile_x, tile_y);
        let mask = connections(&self.grid, seg_x, seg_y);
        let (local_x, local_y) = local_coords(tile_x, tile_y);
        match lane_direction(local_x, local_y, mask) {
            Some(lane) => lane,
            None => *Direction::ALL.choose(&mut self.rng).unwrap_or(&Direction::Up),
        }
    }

    /// Turns player driving mode on or off
    ///
    /// Enabling spawns the player car on the asphalt tile closest to the
    /// middle of the map; returns false when there is no asphalt to spawn
    /// on. Disabling despawns the car.
    pub fn set_player_driving(&mut self, enabled: bool) -> bool {
        if !enabled {
            self.player_car = None;
            self.player_input = None;
            return true;
        }
        if self.player_car.is_some() {
            return true;
        }

        let tiles = self.grid.drivable_tiles();
        let mid_x = self.grid.width() as f64 / 2.0;
        let mid_y = self.grid.height() as f64 / 2.0;
        let Some(&(tile_x, tile_y)) = tiles.iter().min_by_key(|(x, y)| {
            let dx = *x as f64 + 0.5 - mid_x;
            let dy = *y as f64 + 0.5 - mid_y;
            OrderedFloat(dx * dx + dy * dy)
        }) else {
            return false;
        };

        let direction = self.lane_or_random_direction(tile_x, tile_y);
        let (x, y) = tile_center(tile_x, tile_y);
        let id = self.next_agent_id();
        self.player_car = Some(SimVehicle::new(id, x, y, direction, PLAYER_CAR_SPEED));
        true
    }

    /// Sets the steering input consumed by the player car on the next
    /// frame; None lets the car idle
    pub fn set_player_input(&mut self, input: Option<Direction>) {
        self.player_input = input;
    }

    /// Despawns every pedestrian immediately
    pub fn clear_pedestrians(&mut self) {
        self.pedestrians.clear();
    }

    /// Despawns every AI car immediately (the player car is governed by
    /// [`SimWorld::set_player_driving`])
    pub fn clear_vehicles(&mut self) {
        self.vehicles.clear();
    }

    /// Runs one simulation step
    ///
    /// The in-frame order is fixed and is a correctness dependency: all
    /// pedestrians, then all AI cars, then the player car. Each stage sees
    /// the already-updated state of the stages before it. Every agent
    /// update is a pure old-state -> new-state function and each
    /// collection is replaced wholesale, so a partially updated collection
    /// is never observable.
    pub fn advance(&mut self, delta: f64) {
        self.time += delta;

        let updated: Vec<SimPedestrian> = self
            .pedestrians
            .iter()
            .map(|p| update_pedestrian(p, &self.grid, &mut self.rng, delta))
            .collect();
        self.pedestrians = updated;

        // AI cars avoid each other based on the pre-pass vehicle positions
        let snapshot: Vec<(AgentId, f64, f64)> = self
            .vehicles
            .iter()
            .map(|c| (c.id, c.x, c.y))
            .chain(self.player_car.iter().map(|c| (c.id, c.x, c.y)))
            .collect();
        let updated: Vec<SimVehicle> = self
            .vehicles
            .iter()
            .map(|car| {
                let others: Vec<(f64, f64)> = snapshot
                    .iter()
                    .filter(|(id, _, _)| *id != car.id)
                    .map(|&(_, x, y)| (x, y))
                    .collect();
                update_vehicle(car, &self.grid, &others, &mut self.rng, delta)
            })
            .collect();
        self.vehicles = updated;

        // The player car moves last and must not overlap anything that
        // already moved this frame
        if let Some(player) = &self.player_car {
            let others: Vec<(f64, f64)> = self
                .vehicles
                .iter()
                .map(|c| (c.x, c.y))
                .chain(self.pedestrians.iter().map(|p| (p.x, p.y)))
                .collect();
            self.player_car = Some(update_player(
                player,
                &self.grid,
                &others,
                self.player_input,
                delta,
            ));
        }
    }

    /// Number of road segments currently placed
    pub fn road_segment_count(&self) -> usize {
        self.grid
            .positions_where(|g, x, y| g.is_road_anchor(x, y))
            .len()
    }

    /// Create a demo city with a street grid and a few buildings
    pub fn create_demo_city(width: i32, height: i32) -> Self {
        Self::build_demo_city(SimWorld::new(width, height))
    }

    /// Create a demo city with a seeded RNG for reproducible simulations
    pub fn create_demo_city_with_seed(width: i32, height: i32, seed: u64) -> Self {
        Self::build_demo_city(SimWorld::new_with_seed(width, height, seed))
    }

    /// Internal helper to lay out the demo city
    fn build_demo_city(mut world: SimWorld) -> SimWorld {
        let max_x = world.grid.width() - SEGMENT_SIZE;
        let max_y = world.grid.height() - SEGMENT_SIZE;

        // Avenues every 16 tiles each way, spanning most of the map
        let mut origins: Vec<(i32, i32)> = Vec::new();
        for y in (8..=max_y.min(40)).step_by(16) {
            for x in (4..=max_x - 4).step_by(4) {
                origins.push((x, y));
            }
        }
        for x in (8..=max_x.min(40)).step_by(16) {
            for y in (4..=max_y - 4).step_by(4) {
                origins.push((x, y));
            }
        }
        origins.sort();
        origins.dedup();
        for (x, y) in origins {
            let _ = world.place_road_segment((x, y));
        }

        // A few buildings in the leftover blocks
        let blocks = [(14, 14), (30, 14), (14, 30), (30, 30)];
        for (x, y) in blocks {
            let _ = world.place_building((x, y), 4, 4);
        }

        world
    }

    /// Print a summary of the world state
    pub fn print_summary(&self) {
        println!("=== City Simulation Summary ===");
        println!("Time: {:.2}s", self.time);
        println!(
            "Grid: {}x{}, road segments: {}",
            self.grid.width(),
            self.grid.height(),
            self.road_segment_count()
        );
        println!(
            "Pedestrians: {}, Cars: {}, Player driving: {}",
            self.pedestrians.len(),
            self.vehicles.len(),
            if self.player_car.is_some() { "yes" } else { "no" }
        );
    }

    /// Draw a visual map of the world in the terminal
    pub fn draw_map(&self) {
        let width = self.grid.width();
        let height = self.grid.height();

        let mut rows: Vec<Vec<char>> = (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| match self.grid.kind_at(x, y) {
                        TileKind::Empty => ' ',
                        TileKind::Sidewalk => '░',
                        TileKind::Asphalt => '█',
                        TileKind::Obstacle => '#',
                    })
                    .collect()
            })
            .collect();

        let mut plot = |tile: (i32, i32), ch: char| {
            let (x, y) = tile;
            if x >= 0 && y >= 0 && x < width && y < height {
                rows[y as usize][x as usize] = ch;
            }
        };
        for pedestrian in &self.pedestrians {
            plot(pedestrian.tile(), 'p');
        }
        for car in &self.vehicles {
            plot(car.tile(), 'c');
        }
        if let Some(player) = &self.player_car {
            plot(player.tile(), 'P');
        }

        println!("\n=== City Map ===");
        println!("Legend: ░=Sidewalk █=Asphalt #=Building p=Pedestrian c=Car P=Player");
        println!();
        for row in &rows {
            let line: String = row.iter().collect();
            println!("{}", line);
        }
        println!();
    }
}
