use glam::Vec2;
use grid_steering::{find_path, tile_center, GridMap, SearchMode, Unit, World};
use grid_util::Point;
use rand::{rngs::StdRng, SeedableRng};

// In this example a path is found on a 6x5 grid with shape
//  ______
// |S  #  |
// |   #  |
// |   # E|
// |      |
// |      |
//  ______
// where
// - # marks an obstacle
// - S marks the start
// - E marks the end
//
// Afterwards a few units are steered to the end until they settle.

fn main() {
    let mut map = GridMap::new(6, 5);
    for y in 0..3 {
        map.block(3, y);
    }
    println!("{}", map);
    let start = Point::new(0, 0);
    let end = Point::new(5, 2);
    for mode in [SearchMode::BestFirst, SearchMode::JumpPoint] {
        let path = find_path(&map, start, end, mode).unwrap();
        println!("{:?} path, destination first:", mode);
        for p in path {
            println!("{:?}", p);
        }
    }

    let mut world = World::new(map);
    world.units.push(Unit::new(tile_center(start)));
    world.spawn_units(&mut StdRng::seed_from_u64(0), 3, Vec2::new(180.0, 300.0));
    let routed = world.command_move(end, SearchMode::BestFirst).unwrap();
    println!("{} units routed", routed);
    let mut ticks = 0;
    while world.moving_units() > 0 && ticks < 5000 {
        world.tick();
        ticks += 1;
    }
    for unit in &world.units {
        println!("Unit at {:?} on tile {:?}", unit.pos, unit.tile());
    }
    println!("Finished after {} ticks", ticks);
}
