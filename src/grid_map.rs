use core::fmt;
use grid_util::{Point, Rect, SimpleValueGrid, ValueGrid};
use itertools::iproduct;

use crate::{BLOCKED, FREE};

/// [GridMap] stores one integer tile code per cell. Only two codes carry meaning for
/// searching and steering: [FREE] and [BLOCKED]. The map is never resized; editing happens in
/// place through [set](GridMap::set) and friends.
#[derive(Clone, Debug)]
pub struct GridMap {
    pub cells: SimpleValueGrid<i32>,
}

impl Default for GridMap {
    /// The 20 by 20 empty test map.
    fn default() -> GridMap {
        GridMap::new(20, 20)
    }
}

impl GridMap {
    /// Creates a map of the given extents where every tile is [FREE].
    pub fn new(width: usize, height: usize) -> GridMap {
        GridMap {
            cells: SimpleValueGrid::new(width, height, FREE),
        }
    }
    pub fn width(&self) -> usize {
        self.cells.width()
    }
    pub fn height(&self) -> usize {
        self.cells.height()
    }
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width() && (y as usize) < self.height()
    }
    pub fn point_in_bounds(&self, point: Point) -> bool {
        self.in_bounds(point.x, point.y)
    }
    /// Raw tile code at `point`, which must be in bounds.
    pub fn get(&self, point: Point) -> i32 {
        debug_assert!(self.point_in_bounds(point));
        self.cells.get(point.x, point.y)
    }
    /// Whether the tile carries the [BLOCKED] code. Bounds are the caller's responsibility.
    pub fn is_blocked(&self, x: i32, y: i32) -> bool {
        debug_assert!(self.in_bounds(x, y), "({x}, {y}) is outside of the map");
        self.cells.get(x, y) == BLOCKED
    }
    pub fn is_blocked_point(&self, point: Point) -> bool {
        self.is_blocked(point.x, point.y)
    }
    /// In bounds and not blocked.
    pub fn is_walkable(&self, point: Point) -> bool {
        self.point_in_bounds(point) && !self.is_blocked_point(point)
    }
    /// Writes a tile code. Bounds are the caller's responsibility.
    pub fn set(&mut self, x: i32, y: i32, code: i32) {
        debug_assert!(self.in_bounds(x, y), "({x}, {y}) is outside of the map");
        self.cells.set(x, y, code);
    }
    pub fn block(&mut self, x: i32, y: i32) {
        self.set(x, y, BLOCKED);
    }
    pub fn unblock(&mut self, x: i32, y: i32) {
        self.set(x, y, FREE);
    }
    pub fn set_rect(&mut self, rect: Rect, code: i32) {
        self.cells.set_rect(rect, code);
    }
    /// All blocked tiles in column-major order.
    pub fn blocked_tiles(&self) -> impl Iterator<Item = Point> + '_ {
        iproduct!(0..self.width() as i32, 0..self.height() as i32)
            .filter(move |&(x, y)| self.is_blocked(x, y))
            .map(|(x, y)| Point::new(x, y))
    }
}

impl fmt::Display for GridMap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for y in 0..self.height() as i32 {
            let row = (0..self.width() as i32)
                .map(|x| if self.is_blocked(x, y) { '#' } else { '.' })
                .collect::<String>();
            writeln!(f, "{}", row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_and_occupancy() {
        let mut map = GridMap::new(4, 3);
        map.block(2, 1);
        assert_eq!(map.width(), 4);
        assert_eq!(map.height(), 3);
        assert!(map.in_bounds(3, 2));
        assert!(!map.in_bounds(4, 0));
        assert!(!map.in_bounds(0, -1));
        assert!(map.is_blocked(2, 1));
        assert!(!map.is_blocked(1, 2));
        assert_eq!(map.get(Point::new(2, 1)), BLOCKED);
        assert!(!map.is_walkable(Point::new(2, 1)));
        assert!(!map.is_walkable(Point::new(-1, 1)));
        map.unblock(2, 1);
        assert!(map.is_walkable(Point::new(2, 1)));
    }

    #[test]
    fn reserved_codes_are_not_blocked() {
        let mut map = GridMap::new(2, 2);
        map.set(0, 0, 7);
        assert!(!map.is_blocked(0, 0));
        assert_eq!(map.get(Point::new(0, 0)), 7);
    }

    #[test]
    fn blocked_tiles_and_display() {
        // |.#.|
        // |.#.|
        let mut map = GridMap::new(3, 2);
        map.set_rect(Rect::new(1, 0, 1, 2), BLOCKED);
        let blocked = map.blocked_tiles().collect::<Vec<_>>();
        assert_eq!(blocked, vec![Point::new(1, 0), Point::new(1, 1)]);
        assert_eq!(format!("{}", map), ".#.\n.#.\n");
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "outside of the map")]
    fn writing_outside_panics() {
        let mut map = GridMap::new(3, 3);
        map.block(3, 1);
    }

    #[test]
    fn default_map_is_empty() {
        let map = GridMap::default();
        assert_eq!((map.width(), map.height()), (20, 20));
        assert_eq!(map.blocked_tiles().count(), 0);
    }
}
