//! Road topology resolver tests
//!
//! These validate segment classification, tile painting, and the
//! place/remove repaint cascade against the public API.

use city_sim::simulation::{
    affected_segments, segment_type, tile_pattern, ConnectionMask, PlacementError, SegmentType,
    SimWorld, TileKind, SEGMENT_SIZE,
};

const ALL_TYPES: [SegmentType; 16] = [
    SegmentType::Isolated,
    SegmentType::DeadEndNorth,
    SegmentType::DeadEndSouth,
    SegmentType::DeadEndEast,
    SegmentType::DeadEndWest,
    SegmentType::Horizontal,
    SegmentType::Vertical,
    SegmentType::CornerNorthEast,
    SegmentType::CornerNorthWest,
    SegmentType::CornerSouthEast,
    SegmentType::CornerSouthWest,
    SegmentType::TeeNorth,
    SegmentType::TeeSouth,
    SegmentType::TeeEast,
    SegmentType::TeeWest,
    SegmentType::Intersection,
];

fn asphalt_cells(shape: SegmentType) -> Vec<(i32, i32)> {
    tile_pattern(shape)
        .iter()
        .filter(|cell| cell.kind == TileKind::Asphalt)
        .map(|cell| (cell.dx, cell.dy))
        .collect()
}

#[test]
fn empty_mask_is_isolated_with_center_square() {
    let mask = ConnectionMask::from_bits(0);
    assert_eq!(mask.count(), 0);
    assert_eq!(segment_type(mask), SegmentType::Isolated);

    let asphalt = asphalt_cells(SegmentType::Isolated);
    assert_eq!(asphalt, vec![(1, 1), (2, 1), (1, 2), (2, 2)]);
}

#[test]
fn full_mask_is_intersection_with_center_cross() {
    let mask = ConnectionMask::from_bits(0b1111);
    assert_eq!(mask.count(), 4);
    assert_eq!(segment_type(mask), SegmentType::Intersection);

    let asphalt = asphalt_cells(SegmentType::Intersection);
    for dy in 0..SEGMENT_SIZE {
        for dx in 0..SEGMENT_SIZE {
            let in_cross = dx == 1 || dx == 2 || dy == 1 || dy == 2;
            assert_eq!(
                asphalt.contains(&(dx, dy)),
                in_cross,
                "cell ({}, {})",
                dx,
                dy
            );
        }
    }
}

#[test]
fn segment_type_is_pure_and_total() {
    for bits in 0u8..16 {
        let mask = ConnectionMask::from_bits(bits);
        let first = segment_type(mask);
        let second = segment_type(mask);
        assert_eq!(first, second, "mask {:#06b} not stable", bits);

        // Classification follows popcount
        let expected_class = match mask.count() {
            0 => first == SegmentType::Isolated,
            1 => matches!(
                first,
                SegmentType::DeadEndNorth
                    | SegmentType::DeadEndSouth
                    | SegmentType::DeadEndEast
                    | SegmentType::DeadEndWest
            ),
            2 => matches!(
                first,
                SegmentType::Horizontal
                    | SegmentType::Vertical
                    | SegmentType::CornerNorthEast
                    | SegmentType::CornerNorthWest
                    | SegmentType::CornerSouthEast
                    | SegmentType::CornerSouthWest
            ),
            3 => matches!(
                first,
                SegmentType::TeeNorth
                    | SegmentType::TeeSouth
                    | SegmentType::TeeEast
                    | SegmentType::TeeWest
            ),
            _ => first == SegmentType::Intersection,
        };
        assert!(expected_class, "mask {:#06b} classified as {:?}", bits, first);
    }
}

#[test]
fn opposite_pairs_are_straights_and_adjacent_pairs_are_corners() {
    let vertical = ConnectionMask::EMPTY
        .with(city_sim::simulation::Direction::Up)
        .with(city_sim::simulation::Direction::Down);
    assert_eq!(segment_type(vertical), SegmentType::Vertical);

    let horizontal = ConnectionMask::EMPTY
        .with(city_sim::simulation::Direction::Left)
        .with(city_sim::simulation::Direction::Right);
    assert_eq!(segment_type(horizontal), SegmentType::Horizontal);

    let corner = ConnectionMask::EMPTY
        .with(city_sim::simulation::Direction::Up)
        .with(city_sim::simulation::Direction::Right);
    assert_eq!(segment_type(corner), SegmentType::CornerNorthEast);
}

#[test]
fn tee_is_named_for_the_missing_direction() {
    use city_sim::simulation::Direction;
    let mask = ConnectionMask::EMPTY
        .with(Direction::Down)
        .with(Direction::Left)
        .with(Direction::Right);
    assert_eq!(segment_type(mask), SegmentType::TeeNorth);
}

#[test]
fn tile_pattern_covers_every_cell_for_every_shape() {
    for shape in ALL_TYPES {
        let pattern = tile_pattern(shape);
        assert_eq!(pattern.len(), 16);

        let mut seen = [[false; 4]; 4];
        for cell in pattern {
            assert!((0..SEGMENT_SIZE).contains(&cell.dx));
            assert!((0..SEGMENT_SIZE).contains(&cell.dy));
            seen[cell.dy as usize][cell.dx as usize] = true;
        }
        assert!(
            seen.iter().flatten().all(|covered| *covered),
            "{:?} leaves gaps",
            shape
        );
    }
}

#[test]
fn horizontal_paints_the_middle_two_rows() {
    let asphalt = asphalt_cells(SegmentType::Horizontal);
    for dy in 0..SEGMENT_SIZE {
        for dx in 0..SEGMENT_SIZE {
            assert_eq!(asphalt.contains(&(dx, dy)), dy == 1 || dy == 2);
        }
    }
}

#[test]
fn affected_segments_is_self_plus_in_bounds_neighbors() {
    let world = SimWorld::new(48, 48);

    let interior = affected_segments(world.grid(), 20, 20);
    assert_eq!(interior.len(), 5);
    assert!(interior.contains(&(20, 20)));

    let corner = affected_segments(world.grid(), 0, 0);
    assert_eq!(corner.len(), 3);
    assert!(corner.contains(&(0, 0)));
    assert!(corner.contains(&(4, 0)));
    assert!(corner.contains(&(0, 4)));
}

#[test]
fn isolated_segment_scenario() {
    let mut world = SimWorld::new(48, 48);
    world.place_road_segment((0, 0)).unwrap();

    assert_eq!(world.segment_type_at((0, 0)), Some(SegmentType::Isolated));
    for y in 0..SEGMENT_SIZE {
        for x in 0..SEGMENT_SIZE {
            let expected = if (x == 1 || x == 2) && (y == 1 || y == 2) {
                TileKind::Asphalt
            } else {
                TileKind::Sidewalk
            };
            assert_eq!(world.grid().kind_at(x, y), expected, "cell ({}, {})", x, y);
        }
    }
}

#[test]
fn neighbor_placement_reclassifies_both_segments() {
    let mut world = SimWorld::new(48, 48);
    world.place_road_segment((0, 0)).unwrap();
    world.place_road_segment((4, 0)).unwrap();

    assert_eq!(
        world.segment_type_at((0, 0)),
        Some(SegmentType::DeadEndEast)
    );
    assert_eq!(
        world.segment_type_at((4, 0)),
        Some(SegmentType::DeadEndWest)
    );
    // The dead end toward the east neighbor paints an asphalt stub up to
    // the shared edge
    assert_eq!(world.grid().kind_at(3, 1), TileKind::Asphalt);
    assert_eq!(world.grid().kind_at(3, 0), TileKind::Sidewalk);

    world.place_road_segment((8, 0)).unwrap();
    assert_eq!(
        world.segment_type_at((4, 0)),
        Some(SegmentType::Horizontal)
    );
}

#[test]
fn placement_is_rejected_wholesale() {
    let mut world = SimWorld::new(10, 10);

    // Out of bounds: cells 8..12 spill past the 10-wide grid
    let before = world.grid().clone();
    assert_eq!(
        world.place_road_segment((8, 0)),
        Err(PlacementError::OutOfBounds { x: 10, y: 0 })
    );
    assert_eq!(world.grid(), &before);

    // Occupied: second placement at the same origin
    world.place_road_segment((0, 0)).unwrap();
    let before = world.grid().clone();
    assert_eq!(
        world.place_road_segment((0, 0)),
        Err(PlacementError::Occupied { x: 0, y: 0 })
    );
    assert_eq!(world.grid(), &before);
}

#[test]
fn removal_reverts_cells_and_repaints_neighbors() {
    let mut world = SimWorld::new(48, 48);
    world.place_road_segment((0, 0)).unwrap();
    world.place_road_segment((4, 0)).unwrap();

    world.remove_road_segment((4, 0)).unwrap();
    assert_eq!(world.segment_type_at((0, 0)), Some(SegmentType::Isolated));
    assert_eq!(world.segment_type_at((4, 0)), None);
    for y in 0..SEGMENT_SIZE {
        for x in 4..4 + SEGMENT_SIZE {
            assert_eq!(world.grid().kind_at(x, y), TileKind::Empty);
        }
    }
}

#[test]
fn removing_a_vacant_origin_is_rejected() {
    let mut world = SimWorld::new(48, 48);
    let before = world.grid().clone();
    assert_eq!(
        world.remove_road_segment((4, 4)),
        Err(PlacementError::Vacant { x: 4, y: 4 })
    );
    assert_eq!(world.grid(), &before);
}

#[test]
fn building_footprints_are_atomic_obstacles() {
    let mut world = SimWorld::new(48, 48);
    world.place_road_segment((0, 0)).unwrap();

    // Overlapping the road is rejected without mutating anything
    let before = world.grid().clone();
    assert_eq!(
        world.place_building((2, 2), 3, 3),
        Err(PlacementError::Occupied { x: 2, y: 2 })
    );
    assert_eq!(world.grid(), &before);

    world.place_building((10, 10), 3, 2).unwrap();
    assert_eq!(world.grid().kind_at(12, 11), TileKind::Obstacle);

    world.remove_building((10, 10)).unwrap();
    assert_eq!(world.grid().kind_at(12, 11), TileKind::Empty);
    assert_eq!(
        world.remove_building((10, 10)),
        Err(PlacementError::Vacant { x: 10, y: 10 })
    );
}
