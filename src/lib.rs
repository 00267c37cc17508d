//! # grid_steering
//!
//! Path search on a tile grid plus a steering layer that moves units along the result.
//! Two planners are provided: a four-directional best-first search and a
//! [jump point](https://en.wikipedia.org/wiki/Jump_point_search) style search which scans
//! straight runs until a wall, the map edge or a forced neighbour is found. Paths are
//! returned destination-first so that units can consume them as a stack, and
//! [steering::Steering] turns them into per-tick seek and separation forces.
pub mod error;
pub mod grid_map;
pub mod search;
pub mod solver;
pub mod steering;
pub mod worker;
pub mod world;

use glam::Vec2;
use grid_util::Point;

pub use crate::error::{PlanError, PlanResult};
pub use crate::grid_map::GridMap;
pub use crate::solver::{find_path, SearchMode};
pub use crate::steering::{Steering, SteeringParams, Unit};
pub use crate::world::World;

/// Tile code of a traversable cell.
pub const FREE: i32 = 0;
/// Tile code of a blocked cell.
pub const BLOCKED: i32 = 12;
/// Edge length of a tile in pixels, shared with whatever renders the map.
pub const TILE_SIZE: f32 = 64.0;

/// Inline capacity of successor lists; at most four straight and four diagonal successors.
pub const N_SMALLVEC_SIZE: usize = 8;

/// Waypoint stack in tile coordinates, destination first and start last.
pub type Path = Vec<Point>;

/// Converts a pixel position to the tile containing it. Positions left of or above the map
/// map to negative tiles rather than being clamped to the border.
pub fn tile_at(pos: Vec2) -> Point {
    let tile = (pos / TILE_SIZE).floor();
    Point::new(tile.x as i32, tile.y as i32)
}

/// Pixel position of the top-left corner of a tile.
pub fn tile_origin(point: Point) -> Vec2 {
    Vec2::new(point.x as f32, point.y as f32) * TILE_SIZE
}

/// Pixel position of the center of a tile.
pub fn tile_center(point: Point) -> Vec2 {
    tile_origin(point) + Vec2::splat(TILE_SIZE / 2.0)
}

/// Checks whether a path returned by a search for `start` to `dest` is the degenerate
/// "no route" answer. Callers should not steer towards such a path.
pub fn is_no_route(path: &[Point], start: Point, dest: Point) -> bool {
    start != dest && path.len() == 1 && path[0] == start
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_tile_conversion() {
        assert_eq!(tile_at(Vec2::new(0.0, 0.0)), Point::new(0, 0));
        assert_eq!(tile_at(Vec2::new(63.9, 64.0)), Point::new(0, 1));
        assert_eq!(tile_at(Vec2::new(-0.5, 130.0)), Point::new(-1, 2));
        assert_eq!(tile_center(Point::new(1, 2)), Vec2::new(96.0, 160.0));
        assert_eq!(tile_origin(Point::new(1, 2)), Vec2::new(64.0, 128.0));
    }

    #[test]
    fn no_route_detection() {
        let start = Point::new(1, 1);
        let dest = Point::new(3, 1);
        assert!(is_no_route(&[start], start, dest));
        assert!(!is_no_route(&[start], start, start));
        assert!(!is_no_route(&[dest, start], start, dest));
    }
}
