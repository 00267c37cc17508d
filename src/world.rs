use glam::Vec2;
use grid_util::Point;
use log::{info, warn};
use rand::Rng;

use crate::error::{PlanError, PlanResult};
use crate::grid_map::GridMap;
use crate::solver::{find_path, SearchMode};
use crate::steering::{Steering, Unit};
use crate::worker::PathDelivery;
use crate::{is_no_route, Path};

/// A map together with the units moving on it.
#[derive(Clone, Debug, Default)]
pub struct World {
    pub map: GridMap,
    pub units: Vec<Unit>,
    pub steering: Steering,
}

impl World {
    pub fn new(map: GridMap) -> World {
        World {
            map,
            units: Vec::new(),
            steering: Steering::new(),
        }
    }

    /// Adds `count` units at random pixel positions inside `[0, extent]`.
    pub fn spawn_units<R: Rng + ?Sized>(&mut self, rng: &mut R, count: usize, extent: Vec2) {
        self.units
            .extend((0..count).map(|_| Unit::spawn(&mut *rng, extent)));
    }

    /// Replaces the path of unit `index`. A "no route" answer for a search that started at
    /// `start` leaves the unit without a path instead of sending it to its own tile.
    pub fn assign_path(&mut self, index: usize, start: Point, dest: Point, path: Path) -> bool {
        let unit = &mut self.units[index];
        if is_no_route(&path, start, dest) {
            info!("Unit {} has no route from {:?} to {:?}", index, start, dest);
            unit.path.clear();
            false
        } else {
            unit.path = path;
            true
        }
    }

    /// Sends every unit to tile `dest`, planning one path per unit from the tile it stands on.
    /// Returns how many units received a route. A destination outside the map aborts the
    /// whole command; units that have left the map are skipped.
    pub fn command_move(&mut self, dest: Point, mode: SearchMode) -> PlanResult<usize> {
        if !self.map.point_in_bounds(dest) {
            return Err(PlanError::DestOutOfBounds { point: dest });
        }
        let mut routed = 0;
        for index in 0..self.units.len() {
            let start = self.units[index].tile();
            match find_path(&self.map, start, dest, mode) {
                Ok(path) => {
                    if self.assign_path(index, start, dest, path) {
                        routed += 1;
                    }
                }
                Err(e) => warn!("Skipping unit {}: {}", index, e),
            }
        }
        info!(
            "Move to {:?}: {} of {} units routed",
            dest,
            routed,
            self.units.len()
        );
        Ok(routed)
    }

    /// Hands a result from a [PathWorker](crate::worker::PathWorker) to its unit. Returns
    /// whether the unit received a route.
    pub fn apply_delivery(&mut self, delivery: PathDelivery) -> bool {
        if delivery.unit >= self.units.len() {
            warn!("Delivery {} for unknown unit {}", delivery.ticket, delivery.unit);
            return false;
        }
        match delivery.result {
            Ok(path) => self.assign_path(delivery.unit, delivery.start, delivery.dest, path),
            Err(e) => {
                warn!("Request {} for unit {} failed: {}", delivery.ticket, delivery.unit, e);
                false
            }
        }
    }

    /// Advances the simulation by one tick.
    pub fn tick(&mut self) {
        self.steering.update(&mut self.units, &self.map);
    }

    /// Units that still have waypoints left.
    pub fn moving_units(&self) -> usize {
        self.units.iter().filter(|u| !u.is_idle()).count()
    }
}
