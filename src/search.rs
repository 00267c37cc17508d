//! The search skeleton shared by both planners. Nodes live in an arena and refer to their
//! parent by index, so the search tree cannot contain cycles. Selection uses a binary heap
//! keyed on fcost, and admission is decided against the best cost ever admitted for a
//! coordinate, which covers both the open and the closed set.
use fxhash::FxHashMap;
use grid_util::Point;
use log::{debug, warn};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::grid_map::GridMap;
use crate::solver::GridSolver;
use crate::Path;

/// Straight-line distance between two tiles.
pub fn euclidean_distance(p1: &Point, p2: &Point) -> f32 {
    let dx = (p1.x - p2.x) as f32;
    let dy = (p1.y - p2.y) as f32;
    dx.hypot(dy)
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchNode {
    pub point: Point,
    pub parent: Option<usize>,
    /// Accumulated step cost from the start.
    pub g: f32,
    /// Ranking cost, `g` plus the distance to the destination.
    pub cost: f32,
}

/// Arena of [SearchNode]s for one search invocation.
#[derive(Debug, Default)]
pub struct NodeStore {
    nodes: Vec<SearchNode>,
    best: FxHashMap<Point, f32>,
}

impl NodeStore {
    pub fn new() -> NodeStore {
        NodeStore::default()
    }
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
    pub fn node(&self, index: usize) -> &SearchNode {
        &self.nodes[index]
    }
    /// Lowest cost admitted so far at `point`, if any.
    pub fn best_cost(&self, point: &Point) -> Option<f32> {
        self.best.get(point).copied()
    }
    /// Unconditionally allocates a node.
    pub fn push(&mut self, point: Point, parent: Option<usize>, g: f32, cost: f32) -> usize {
        debug_assert!(parent.map_or(true, |p| p < self.nodes.len()));
        let index = self.nodes.len();
        self.nodes.push(SearchNode {
            point,
            parent,
            g,
            cost,
        });
        let best = self.best.entry(point).or_insert(cost);
        if cost < *best {
            *best = cost;
        }
        index
    }
    /// Allocates a node unless a node at the same coordinate already has an equal or lower
    /// cost. Existing worse nodes are kept as they are.
    pub fn admit(&mut self, point: Point, parent: usize, g: f32, cost: f32) -> Option<usize> {
        match self.best_cost(&point) {
            Some(best) if best <= cost => None,
            _ => Some(self.push(point, Some(parent), g, cost)),
        }
    }
    /// Walks the parent links from `index` back to the root, which yields the path
    /// destination first.
    pub fn reconstruct_path(&self, index: usize) -> Path {
        std::iter::successors(Some(index), |&i| self.nodes[i].parent)
            .map(|i| self.nodes[i].point)
            .collect()
    }
}

struct SmallestCostHolder {
    cost: f32,
    index: usize,
}

impl Eq for SmallestCostHolder {}

impl PartialEq for SmallestCostHolder {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl PartialOrd for SmallestCostHolder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SmallestCostHolder {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so that the max-heap pops the cheapest node, earliest discovered first
        match other.cost.total_cmp(&self.cost) {
            Ordering::Equal => other.index.cmp(&self.index),
            s => s,
        }
    }
}

/// Outcome of a single search.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchResult {
    /// Destination-first path, or `[start]` if no route was found.
    pub path: Path,
    /// fcost of the destination node when the destination was reached.
    pub cost: Option<f32>,
    /// Number of nodes popped from the open set.
    pub iterations: usize,
}

impl SearchResult {
    pub fn found(&self) -> bool {
        self.cost.is_some()
    }
}

/// Runs the search skeleton with the successor rule of `solver`. Both endpoints must be
/// inside the map; [find_path](crate::solver::find_path) checks this before calling.
pub fn search<S: GridSolver>(
    solver: &S,
    map: &GridMap,
    start: Point,
    dest: Point,
) -> SearchResult {
    debug_assert!(map.point_in_bounds(start) && map.point_in_bounds(dest));
    let mut store = NodeStore::new();
    let mut open = BinaryHeap::new();
    let root = store.push(start, None, 0.0, euclidean_distance(&start, &dest));
    open.push(SmallestCostHolder {
        cost: store.node(root).cost,
        index: root,
    });

    let budget = solver.budget();
    let mut iterations = 0;
    while iterations < budget {
        let Some(SmallestCostHolder { index, .. }) = open.pop() else {
            break;
        };
        iterations += 1;
        let current = store.node(index).clone();
        if current.point == dest {
            debug!(
                "Reached {:?} from {:?} after {} iterations",
                dest, start, iterations
            );
            return SearchResult {
                path: store.reconstruct_path(index),
                cost: Some(current.cost),
                iterations,
            };
        }
        if solver.arrives_early(map, &current.point, &dest) {
            let g = current.g + euclidean_distance(&current.point, &dest);
            let arrival = store.push(dest, Some(index), g, g);
            debug!(
                "Arrived next to {:?} from {:?} after {} iterations",
                dest, start, iterations
            );
            return SearchResult {
                path: store.reconstruct_path(arrival),
                cost: Some(g),
                iterations,
            };
        }
        for successor in solver.successors(map, &current.point, &dest) {
            let g = current.g + euclidean_distance(&current.point, &successor);
            let cost = g + euclidean_distance(&successor, &dest);
            if let Some(n) = store.admit(successor, index, g, cost) {
                open.push(SmallestCostHolder { cost, index: n });
            }
        }
    }
    warn!(
        "No route from {:?} to {:?} within {} iterations ({} nodes allocated)",
        start,
        dest,
        iterations,
        store.len()
    );
    SearchResult {
        path: vec![start],
        cost: None,
        iterations,
    }
}
