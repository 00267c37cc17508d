use grid_util::Point;
use smallvec::SmallVec;

use crate::{grid_map::GridMap, solver::GridSolver, N_SMALLVEC_SIZE};

/// Default number of iterations before a jump point search gives up.
pub const JUMP_POINT_BUDGET: usize = 650;

/// How a straight scan ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanEnd {
    /// Ran into a blocked tile or off the map without finding anything.
    Wall,
    /// Stopped at a tile that has to be expanded: the destination, a tile next to the map
    /// edge or a tile with a forced neighbour.
    JumpPoint(Point),
}

/// Jump point style solver. From every node four straight scans are run; each either hits a
/// wall or yields one jump point. A diagonal step is only taken into a quadrant whose two
/// bounding scans both hit a wall, and never onto the outermost row or column of the map.
#[derive(Clone, Debug)]
pub struct JumpPointSolver {
    pub budget: usize,
}

impl JumpPointSolver {
    pub fn new() -> JumpPointSolver {
        JumpPointSolver {
            budget: JUMP_POINT_BUDGET,
        }
    }

    /// Marches from `node` in the cardinal direction `(dx, dy)` one tile at a time.
    pub fn scan(&self, map: &GridMap, node: &Point, dx: i32, dy: i32, dest: &Point) -> ScanEnd {
        debug_assert!(dx.abs() + dy.abs() == 1);
        // Offsets of the two tiles beside the scan line
        let (sx, sy) = (dy.abs(), dx.abs());
        let mut current = *node;
        loop {
            current = Point::new(current.x + dx, current.y + dy);
            if current == *dest {
                return ScanEnd::JumpPoint(current);
            }
            if !map.is_walkable(current) {
                return ScanEnd::Wall;
            }
            let side_1 = Point::new(current.x - sx, current.y - sy);
            let side_2 = Point::new(current.x + sx, current.y + sy);
            if !map.point_in_bounds(side_1) || !map.point_in_bounds(side_2) {
                return ScanEnd::JumpPoint(current);
            }
            if map.is_blocked_point(side_1) || map.is_blocked_point(side_2) {
                return ScanEnd::JumpPoint(current);
            }
        }
    }
}

/// Whether `point` lies inside the map with at least one tile between it and every edge.
fn is_interior(map: &GridMap, point: Point) -> bool {
    point.x > 0
        && point.y > 0
        && point.x < map.width() as i32 - 1
        && point.y < map.height() as i32 - 1
}

impl Default for JumpPointSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl GridSolver for JumpPointSolver {
    type Successors = SmallVec<[Point; N_SMALLVEC_SIZE]>;

    fn successors(&self, map: &GridMap, node: &Point, dest: &Point) -> Self::Successors {
        let mut succ = SmallVec::new();
        let mut hit_wall = |end: ScanEnd| match end {
            ScanEnd::Wall => true,
            ScanEnd::JumpPoint(p) => {
                succ.push(p);
                false
            }
        };
        let left = hit_wall(self.scan(map, node, -1, 0, dest));
        let right = hit_wall(self.scan(map, node, 1, 0, dest));
        let up = hit_wall(self.scan(map, node, 0, -1, dest));
        let down = hit_wall(self.scan(map, node, 0, 1, dest));

        for (open_quadrant, dx, dy) in [
            (right && up, 1, -1),
            (up && left, -1, -1),
            (left && down, -1, 1),
            (down && right, 1, 1),
        ] {
            let diagonal = Point::new(node.x + dx, node.y + dy);
            if open_quadrant && is_interior(map, diagonal) && !map.is_blocked_point(diagonal) {
                succ.push(diagonal);
            }
        }
        succ
    }

    fn budget(&self) -> usize {
        self.budget
    }
}
