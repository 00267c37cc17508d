use grid_util::Point;
use log::info;

use crate::error::{PlanError, PlanResult};
use crate::grid_map::GridMap;
use crate::search::{search, SearchResult};
use crate::Path;

pub mod best_first;
pub mod jps;

use best_first::BestFirstSolver;
use jps::JumpPointSolver;

/// Selects which successor rule [find_path] plugs into the shared search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SearchMode {
    /// Four-directional expansion, see [BestFirstSolver].
    BestFirst,
    /// Straight-run scanning, see [JumpPointSolver].
    JumpPoint,
}

/// A successor rule for the search skeleton in [crate::search].
pub trait GridSolver {
    type Successors: IntoIterator<Item = Point>;

    /// Candidate coordinates reachable from `node`. Every candidate is scored and admitted by
    /// the skeleton, so no cost information is returned.
    fn successors(&self, map: &GridMap, node: &Point, dest: &Point) -> Self::Successors;

    /// Whether the destination counts as reached directly from `node`, without going through
    /// the open set.
    fn arrives_early(&self, _map: &GridMap, _node: &Point, _dest: &Point) -> bool {
        false
    }

    /// Maximum number of nodes popped before the search gives up.
    fn budget(&self) -> usize;

    /// Validates the endpoints and runs the search.
    fn plan(&self, map: &GridMap, start: Point, dest: Point) -> PlanResult<SearchResult>
    where
        Self: Sized,
    {
        if !map.point_in_bounds(start) {
            return Err(PlanError::StartOutOfBounds { point: start });
        }
        if !map.point_in_bounds(dest) {
            return Err(PlanError::DestOutOfBounds { point: dest });
        }
        Ok(search(self, map, start, dest))
    }

    /// Path from `start` to `dest`, destination first. Returns `[start]` if no route is found
    /// within the budget.
    fn find_path(&self, map: &GridMap, start: Point, dest: Point) -> PlanResult<Path>
    where
        Self: Sized,
    {
        self.plan(map, start, dest).map(|result| result.path)
    }
}

/// Searches with the default budget of the solver selected by `mode`.
pub fn plan(map: &GridMap, start: Point, dest: Point, mode: SearchMode) -> PlanResult<SearchResult> {
    info!("Planning {:?} search from {:?} to {:?}", mode, start, dest);
    match mode {
        SearchMode::BestFirst => BestFirstSolver::new().plan(map, start, dest),
        SearchMode::JumpPoint => JumpPointSolver::new().plan(map, start, dest),
    }
}

/// Computes a destination-first path from `start` to `dest` in tile coordinates. Endpoints
/// outside of the map are an error; running out of budget is not and yields `[start]`.
pub fn find_path(map: &GridMap, start: Point, dest: Point, mode: SearchMode) -> PlanResult<Path> {
    plan(map, start, dest, mode).map(|result| result.path)
}
