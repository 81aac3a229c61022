//! City Simulation Library
//!
//! The simulation core of an isometric city builder: a road-topology
//! resolver over a tile grid, plus the pedestrian and vehicle agents that
//! drive over it. Runs fully headless; rendering and UI live elsewhere.

pub mod simulation;
