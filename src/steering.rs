//! Steering for units following a waypoint stack. Every tick a unit with a path computes a
//! seek force towards the center of its next waypoint plus separation from nearby units and
//! blocked tiles; afterwards all units integrate their force into velocity and position and
//! pop the waypoints they have reached.
use glam::Vec2;
use grid_util::Point;
use log::debug;
use rand::Rng;

use crate::grid_map::GridMap;
use crate::{tile_at, tile_center, tile_origin, Path};

pub const MAX_SPEED: f32 = 2.0;
pub const MAX_FORCE: f32 = 4.5;
/// Units closer than this push each other apart.
pub const MIN_SEPARATION: f32 = 18.0;
pub const SEPARATION_DIVISOR: f32 = 15.0;
/// Blocked tiles whose top-left corner is closer than this push units away.
pub const TILE_SEPARATION_RADIUS: f32 = 50.0;
pub const SCALING_FACTOR: f32 = 1.0 / 15.0;
pub const VELOCITY_MINIMUM: f32 = 0.2;
/// Distance to a waypoint center at which the waypoint counts as reached.
pub const ARRIVAL_RADIUS: f32 = 44.0;

/// Scales `v` down so that its length does not exceed `max`. Vectors that are already short
/// enough, including the zero vector, are returned unchanged.
pub fn truncate(v: Vec2, max: f32) -> Vec2 {
    let length = v.length();
    if length <= max || length == 0.0 {
        v
    } else {
        v * (max / length)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Unit {
    pub pos: Vec2,
    pub velocity: Vec2,
    pub force: Vec2,
    /// Waypoints in tile coordinates; the last element is the next one to visit.
    pub path: Path,
}

impl Unit {
    pub fn new(pos: Vec2) -> Unit {
        Unit {
            pos,
            ..Default::default()
        }
    }
    /// Places a unit uniformly at random inside `[0, extent]` on both axes.
    pub fn spawn<R: Rng + ?Sized>(rng: &mut R, extent: Vec2) -> Unit {
        Unit::new(Vec2::new(
            rng.gen_range(0.0..=extent.x),
            rng.gen_range(0.0..=extent.y),
        ))
    }
    /// Tile the unit is currently standing on.
    pub fn tile(&self) -> Point {
        tile_at(self.pos)
    }
    pub fn next_waypoint(&self) -> Option<Point> {
        self.path.last().copied()
    }
    /// True once the unit has no path left to follow.
    pub fn is_idle(&self) -> bool {
        self.path.is_empty()
    }
}

/// Tuning values of [Steering]; [Default] gives the crate constants.
#[derive(Clone, Debug, PartialEq)]
pub struct SteeringParams {
    pub max_speed: f32,
    pub max_force: f32,
    pub min_separation: f32,
    pub separation_divisor: f32,
    pub tile_separation_radius: f32,
    pub scaling_factor: f32,
    pub velocity_minimum: f32,
    pub arrival_radius: f32,
}

impl Default for SteeringParams {
    fn default() -> Self {
        SteeringParams {
            max_speed: MAX_SPEED,
            max_force: MAX_FORCE,
            min_separation: MIN_SEPARATION,
            separation_divisor: SEPARATION_DIVISOR,
            tile_separation_radius: TILE_SEPARATION_RADIUS,
            scaling_factor: SCALING_FACTOR,
            velocity_minimum: VELOCITY_MINIMUM,
            arrival_radius: ARRIVAL_RADIUS,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Steering {
    pub params: SteeringParams,
}

impl Steering {
    pub fn new() -> Steering {
        Steering::default()
    }

    /// Classic seek: the desired velocity at full speed towards `target` minus the current
    /// velocity.
    pub fn seek(&self, unit: &Unit, target: Vec2) -> Vec2 {
        let desired = self.params.max_speed * (target - unit.pos).normalize_or_zero();
        desired - unit.velocity
    }

    /// Push away from every other unit closer than the minimum separation. Units at exactly
    /// the same position are ignored.
    pub fn unit_separation(&self, index: usize, units: &[Unit]) -> Vec2 {
        let unit = &units[index];
        units
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != index)
            .map(|(_, other)| (other, unit.pos.distance(other.pos)))
            .filter(|&(_, dist)| dist > 0.0 && dist < self.params.min_separation)
            .fold(Vec2::ZERO, |total, (other, _)| {
                total + (unit.pos - other.pos) / self.params.separation_divisor
            })
    }

    /// Push away from the top-left corner of every nearby blocked tile.
    pub fn tile_separation(&self, unit: &Unit, map: &GridMap) -> Vec2 {
        map.blocked_tiles()
            .map(tile_origin)
            .filter(|origin| unit.pos.distance(*origin) < self.params.tile_separation_radius)
            .fold(Vec2::ZERO, |total, origin| total + (unit.pos - origin))
    }

    /// Combined separation from units and tiles, scaled by the maximum force.
    pub fn separation(&self, index: usize, units: &[Unit], map: &GridMap) -> Vec2 {
        let total = self.unit_separation(index, units) + self.tile_separation(&units[index], map);
        self.params.max_force * total
    }

    /// Steering force of unit `index`, or [None] if it has no path to follow.
    pub fn compute_force(&self, index: usize, units: &[Unit], map: &GridMap) -> Option<Vec2> {
        let unit = &units[index];
        let waypoint = unit.next_waypoint()?;
        let seek = self.seek(unit, tile_center(waypoint));
        let force = seek + self.separation(index, units, map);
        Some(truncate(force, self.params.max_force))
    }

    /// Applies the unit's force, moves it and handles waypoint arrival.
    pub fn integrate(&self, unit: &mut Unit) {
        let params = &self.params;
        unit.velocity = truncate(
            unit.velocity + params.scaling_factor * unit.force,
            params.max_speed,
        );
        unit.pos += unit.velocity;

        let Some(waypoint) = unit.next_waypoint() else {
            return;
        };
        if unit.pos.distance(tile_center(waypoint)) >= params.arrival_radius {
            return;
        }
        if unit.path.len() > 1 {
            unit.path.pop();
        }
        // A slow unit settles on the last waypoint, also right after popping onto it
        if unit.path.len() == 1
            && unit.velocity.x.abs() < params.velocity_minimum
            && unit.velocity.y.abs() < params.velocity_minimum
        {
            debug!("Unit settled at {:?} near {:?}", unit.pos, waypoint);
            unit.path.clear();
            unit.velocity = Vec2::ZERO;
            unit.force = Vec2::ZERO;
        }
    }

    /// One simulation tick: forces for every unit with a path, then integration of every unit.
    pub fn update(&self, units: &mut [Unit], map: &GridMap) {
        let forces = (0..units.len())
            .map(|i| self.compute_force(i, units, map))
            .collect::<Vec<_>>();
        for (unit, force) in units.iter_mut().zip(forces) {
            if let Some(force) = force {
                unit.force = force;
            }
        }
        for unit in units.iter_mut() {
            self.integrate(unit);
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn truncate_never_grows() {
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..1000 {
            let v = Vec2::new(rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0));
            let max = rng.gen_range(0.01..20.0);
            let t = truncate(v, max);
            assert!(t.length() <= v.length() + 1e-4);
            assert!(t.length() <= max + 1e-4);
            if v.length() > max {
                // Direction is preserved
                assert!(t.normalize().dot(v.normalize()) > 0.9999);
            } else {
                assert_eq!(t, v);
            }
        }
    }

    #[test]
    fn truncate_zero_and_exact() {
        assert_eq!(truncate(Vec2::ZERO, 4.5), Vec2::ZERO);
        assert_eq!(truncate(Vec2::new(3.0, 4.0), 2.5), Vec2::new(1.5, 2.0));
        assert_eq!(truncate(Vec2::new(0.3, 0.4), 1.0), Vec2::new(0.3, 0.4));
    }

    #[test]
    fn seek_towards_target() {
        let steering = Steering::new();
        let mut unit = Unit::new(Vec2::ZERO);
        assert_eq!(steering.seek(&unit, Vec2::new(10.0, 0.0)), Vec2::new(2.0, 0.0));
        unit.velocity = Vec2::new(1.0, 0.0);
        assert_eq!(steering.seek(&unit, Vec2::new(10.0, 0.0)), Vec2::new(1.0, 0.0));
        // Standing on the target only cancels the current velocity
        assert_eq!(steering.seek(&unit, Vec2::ZERO), Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn separation_is_symmetric() {
        let steering = Steering::new();
        let map = GridMap::new(5, 5);
        let units = vec![
            Unit::new(Vec2::new(100.0, 100.0)),
            Unit::new(Vec2::new(110.0, 104.0)),
            Unit::new(Vec2::new(250.0, 250.0)),
        ];
        let sep_0 = steering.separation(0, &units, &map);
        let sep_1 = steering.separation(1, &units, &map);
        assert!(sep_0.dot(units[1].pos - units[0].pos) < 0.0);
        assert!(sep_1.dot(units[0].pos - units[1].pos) < 0.0);
        assert!((sep_0 + sep_1).length() < 1e-5);
        assert_eq!(steering.separation(2, &units, &map), Vec2::ZERO);
        assert_eq!(
            steering.unit_separation(0, &units),
            Vec2::new(-10.0, -4.0) / SEPARATION_DIVISOR
        );
    }

    #[test]
    fn coincident_units_are_ignored() {
        let steering = Steering::new();
        let units = vec![Unit::new(Vec2::splat(50.0)), Unit::new(Vec2::splat(50.0))];
        assert_eq!(steering.unit_separation(0, &units), Vec2::ZERO);
    }

    #[test]
    fn tiles_push_from_their_corner() {
        let steering = Steering::new();
        let mut map = GridMap::new(5, 5);
        map.block(2, 2);
        let near = Unit::new(Vec2::new(120.0, 120.0));
        assert_eq!(steering.tile_separation(&near, &map), Vec2::new(-8.0, -8.0));
        // The tile center is close, but its corner is not
        let far = Unit::new(Vec2::new(170.0, 170.0));
        assert_eq!(steering.tile_separation(&far, &map), Vec2::ZERO);
    }

    #[test]
    fn no_force_without_path() {
        let steering = Steering::new();
        let map = GridMap::new(5, 5);
        let units = vec![Unit::new(Vec2::new(10.0, 10.0))];
        assert_eq!(steering.compute_force(0, &units, &map), None);
    }

    #[test]
    fn force_is_truncated() {
        let steering = Steering::new();
        let mut map = GridMap::new(5, 5);
        map.block(1, 1);
        let mut unit = Unit::new(Vec2::new(60.0, 60.0));
        unit.path = vec![Point::new(4, 4)];
        let units = vec![unit];
        let force = steering.compute_force(0, &units, &map).unwrap();
        assert!((force.length() - MAX_FORCE).abs() < 1e-4);
        // Pushed away from the blocked tile's corner despite seeking past it
        assert!(force.x < 0.0 && force.y < 0.0);
    }

    #[test]
    fn arrival_settles_unit() {
        let steering = Steering::new();
        let waypoint = Point::new(1, 1);
        let mut unit = Unit::new(tile_center(waypoint));
        unit.velocity = Vec2::new(0.05, 0.0);
        unit.path = vec![waypoint];
        steering.integrate(&mut unit);
        assert!(unit.is_idle());
        assert_eq!(unit.velocity, Vec2::ZERO);
        assert_eq!(unit.force, Vec2::ZERO);
    }

    #[test]
    fn fast_unit_does_not_settle() {
        let steering = Steering::new();
        let waypoint = Point::new(1, 1);
        let mut unit = Unit::new(tile_center(waypoint));
        unit.velocity = Vec2::new(1.0, 0.0);
        unit.path = vec![waypoint];
        steering.integrate(&mut unit);
        assert_eq!(unit.path, vec![waypoint]);
        assert_eq!(unit.velocity, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn reached_waypoint_is_popped() {
        let steering = Steering::new();
        let mut unit = Unit::new(tile_center(Point::new(1, 1)));
        unit.velocity = Vec2::new(1.0, 0.0);
        unit.path = vec![Point::new(3, 1), Point::new(1, 1)];
        steering.integrate(&mut unit);
        assert_eq!(unit.path, vec![Point::new(3, 1)]);
        assert_eq!(unit.next_waypoint(), Some(Point::new(3, 1)));
    }

    #[test]
    fn slow_unit_settles_after_pop() {
        let steering = Steering::new();
        let mut unit = Unit::new(tile_center(Point::new(1, 1)));
        unit.velocity = Vec2::new(0.05, 0.0);
        unit.force = Vec2::new(0.1, 0.1);
        unit.path = vec![Point::new(3, 1), Point::new(1, 1)];
        steering.integrate(&mut unit);
        assert!(unit.is_idle());
        assert_eq!(unit.velocity, Vec2::ZERO);
        assert_eq!(unit.force, Vec2::ZERO);
    }

    #[test]
    fn update_moves_towards_waypoint() {
        let steering = Steering::new();
        let map = GridMap::new(10, 10);
        let mut units = vec![Unit::new(Vec2::new(32.0, 32.0)), Unit::new(Vec2::new(300.0, 300.0))];
        units[0].path = vec![Point::new(5, 0)];
        for _ in 0..20 {
            steering.update(&mut units, &map);
            assert!(units[0].velocity.length() <= MAX_SPEED + 1e-4);
        }
        assert!(units[0].pos.x > 32.0);
        assert!((units[0].pos.y - 32.0).abs() < 1e-4);
        assert_eq!(units[1].pos, Vec2::new(300.0, 300.0));
    }

    #[test]
    fn spawn_is_reproducible() {
        let extent = Vec2::new(600.0, 600.0);
        let a = Unit::spawn(&mut StdRng::seed_from_u64(7), extent);
        let b = Unit::spawn(&mut StdRng::seed_from_u64(7), extent);
        assert_eq!(a, b);
        assert!(a.pos.x >= 0.0 && a.pos.x <= 600.0);
        assert!(a.pos.y >= 0.0 && a.pos.y <= 600.0);
        assert!(a.is_idle());
    }
}
