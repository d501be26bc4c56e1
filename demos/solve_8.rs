use grid_util::point::Point;
use wave_pathfinding::{Maze, Neighborhood, WaveSearch};

// In this example a path is found on a 3x3 grid with shape
//  ___
// |S  |
// | # |
// |  E|
//  ___
// where
// - # marks an obstacle
// - S marks the start
// - E marks the end
//
// Nodes have an 8-neighborhood

fn main() {
    let mut maze = Maze::new(3, Neighborhood::OrthoDiagonal).unwrap();
    maze.toggle_wall(Point::new(1, 1)).unwrap();
    maze.set_start(Point::new(0, 0)).unwrap();
    maze.set_end(Point::new(2, 2)).unwrap();
    let path = WaveSearch::solve(&mut maze).unwrap().unwrap();
    println!("{}", maze);
    println!("Path:");
    for p in path {
        println!("{:?}", p);
    }
}
