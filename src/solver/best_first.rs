use grid_util::Point;
use smallvec::SmallVec;

use crate::{grid_map::GridMap, solver::GridSolver, N_SMALLVEC_SIZE};

/// Default number of iterations before a four-directional search gives up.
pub const BEST_FIRST_BUDGET: usize = 10_000;

/// Expands the four orthogonal neighbours of a node: left, right, up and down.
#[derive(Clone, Debug)]
pub struct BestFirstSolver {
    pub budget: usize,
}

impl BestFirstSolver {
    pub fn new() -> BestFirstSolver {
        BestFirstSolver {
            budget: BEST_FIRST_BUDGET,
        }
    }
}

impl Default for BestFirstSolver {
    fn default() -> Self {
        Self::new()
    }
}

fn orthogonal_neighbours(node: &Point) -> [Point; 4] {
    [
        Point::new(node.x - 1, node.y),
        Point::new(node.x + 1, node.y),
        Point::new(node.x, node.y - 1),
        Point::new(node.x, node.y + 1),
    ]
}

impl GridSolver for BestFirstSolver {
    type Successors = SmallVec<[Point; N_SMALLVEC_SIZE]>;

    fn successors(&self, map: &GridMap, node: &Point, _dest: &Point) -> Self::Successors {
        orthogonal_neighbours(node)
            .into_iter()
            .filter(|p| map.is_walkable(*p))
            .collect()
    }

    /// A destination tile may itself be blocked. Standing next to it then counts as arrival.
    fn arrives_early(&self, map: &GridMap, node: &Point, dest: &Point) -> bool {
        orthogonal_neighbours(node)
            .iter()
            .any(|p| p == dest && map.is_blocked_point(*p))
    }

    fn budget(&self) -> usize {
        self.budget
    }
}
