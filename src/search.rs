//! Lee wave expansion and backtrace, performed one step per call so a caller can animate the
//! search.
use crate::error::{PathfinderError, Result};
use crate::maze::Maze;
use grid_util::point::Point;
use log::{debug, info, trace, warn};
use smallvec::SmallVec;

/// How a finished search ended. Both are regular completions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    PathFound,
    NoPathFound,
}

impl Outcome {
    /// Human readable status line for the finished search.
    pub fn message(&self) -> &'static str {
        match self {
            Outcome::PathFound => "The path was found!",
            Outcome::NoPathFound => "No path could be found!",
        }
    }
}

/// Result of a single [WaveSearch::advance] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    /// One layer of the wave was labelled. `layer` is the distance assigned in this step and
    /// `reached_end` is set once the end cell carries a label, at which point the backtrace
    /// cursor has been placed on the end.
    Expanded { layer: u32, reached_end: bool },
    /// The backtrace cursor moved onto this cell, which is now marked as part of the path.
    Backtraced(Point),
    Finished(Outcome),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Expanding,
    Reached,
    Backtracing,
    Done(Outcome),
}

/// Incremental breadth-first search by distance layers over a [Maze].
///
/// The engine holds no reference to the maze; every step borrows it mutably instead, which keeps
/// the owner of the maze the only party that can change it.
#[derive(Clone, Debug)]
pub struct WaveSearch {
    start: Point,
    end: Point,
    frontier: u32,
    phase: Phase,
    cursor: Option<Point>,
    trail: Vec<Point>,
}

impl WaveSearch {
    /// Prepares a search between the endpoints of `maze`. Both endpoints must be placed.
    pub fn new(maze: &Maze) -> Result<WaveSearch> {
        match (maze.start(), maze.end()) {
            (Some(start), Some(end)) => Ok(WaveSearch {
                start,
                end,
                frontier: 0,
                phase: Phase::Idle,
                cursor: None,
                trail: Vec::new(),
            }),
            (None, _) => Err(PathfinderError::SearchNotReady("no start point")),
            (_, None) => Err(PathfinderError::SearchNotReady("no end point")),
        }
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn end(&self) -> Point {
        self.end
    }

    /// Distance of the layer the next [expand_one_layer](Self::expand_one_layer) call reads from.
    pub fn frontier_distance(&self) -> u32 {
        self.frontier
    }

    pub fn cursor(&self) -> Option<Point> {
        self.cursor
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            Phase::Done(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.outcome().is_some()
    }

    /// Whether the end cell has been labelled.
    pub fn reached_end(&self) -> bool {
        matches!(
            self.phase,
            Phase::Reached | Phase::Backtracing | Phase::Done(Outcome::PathFound)
        )
    }

    fn check_maze(&self, maze: &Maze) -> Result<()> {
        if maze.start() == Some(self.start) && maze.end() == Some(self.end) {
            Ok(())
        } else {
            warn!("Search from {} to {} used with a different maze", self.start, self.end);
            Err(PathfinderError::SearchNotReady("maze endpoints differ"))
        }
    }

    /// Clears any previous labels and labels the start cell with distance 0.
    pub fn begin_expansion(&mut self, maze: &mut Maze) -> Result<()> {
        self.check_maze(maze)?;
        if self.phase != Phase::Idle {
            return Err(PathfinderError::SearchNotReady("expansion already began"));
        }
        maze.reset();
        maze.label(&self.start, 0);
        self.frontier = 0;
        self.phase = Phase::Expanding;
        info!("Wave expansion from {} towards {}", self.start, self.end);
        Ok(())
    }

    /// Labels every unlabelled open neighbour of the current frontier with the next distance and
    /// moves the frontier outwards. Returns whether any cell was labelled. The frontier is taken
    /// as a snapshot before labelling, so cells labelled in this call never feed back into it.
    pub fn expand_one_layer(&mut self, maze: &mut Maze) -> Result<bool> {
        self.check_maze(maze)?;
        if self.phase != Phase::Expanding {
            return Err(PathfinderError::SearchNotReady("not expanding"));
        }
        let frontier = maze
            .cells()
            .filter(|(_, c)| c.distance == Some(self.frontier))
            .map(|(p, _)| p)
            .collect::<Vec<Point>>();
        let next = self.frontier + 1;
        let mut labelled = 0;
        for cell in frontier {
            let open = maze
                .neighbors_of(cell)
                .filter(|n| maze.can_move_to(n))
                .collect::<SmallVec<[Point; 8]>>();
            for n in open {
                if maze.label(&n, next) {
                    labelled += 1;
                }
            }
        }
        self.frontier = next;
        trace!("Layer {next}: labelled {labelled} cells");
        if maze.distance(&self.end).is_some() {
            debug!("End {} reached at distance {next}", self.end);
            self.phase = Phase::Reached;
        } else if labelled == 0 {
            info!("Wave exhausted after {} layers, {} is unreachable", next - 1, self.end);
            self.phase = Phase::Done(Outcome::NoPathFound);
        }
        Ok(labelled > 0)
    }

    /// Places the backtrace cursor on the end cell. Requires the end to be labelled.
    pub fn begin_backtrace(&mut self, maze: &Maze) -> Result<()> {
        self.check_maze(maze)?;
        if self.phase != Phase::Reached {
            return Err(PathfinderError::SearchNotReady("end point not reached"));
        }
        self.cursor = Some(self.end);
        self.trail = vec![self.end];
        self.phase = Phase::Backtracing;
        info!("Backtracing from {}", self.end);
        Ok(())
    }

    /// Moves the cursor to the neighbour with the strictly smallest label, the first one in
    /// enumeration order on ties, and marks it as part of the path unless it is the start.
    /// Returns [false] once the start is reached.
    pub fn backtrace_one_step(&mut self, maze: &mut Maze) -> Result<bool> {
        self.check_maze(maze)?;
        let cursor = match (self.phase, self.cursor) {
            (Phase::Backtracing, Some(cursor)) => cursor,
            _ => return Err(PathfinderError::SearchNotReady("not backtracing")),
        };
        let current = maze
            .distance(&cursor)
            .ok_or(PathfinderError::SearchNotReady("cursor is unlabelled"))?;
        let next = maze
            .neighbors_of(cursor)
            .filter_map(|n| maze.distance(&n).map(|d| (n, d)))
            .filter(|&(_, d)| d < current)
            .min_by_key(|&(_, d)| d)
            .map(|(n, _)| n);
        let next = match next {
            Some(next) => next,
            None => {
                warn!("Backtrace stuck at {cursor}: no neighbour below distance {current}");
                return Err(PathfinderError::SearchNotReady("labels are inconsistent"));
            }
        };
        self.cursor = Some(next);
        self.trail.push(next);
        if next == self.start {
            info!("Backtrace reached start, path has {} steps", self.trail.len() - 1);
            self.phase = Phase::Done(Outcome::PathFound);
            Ok(false)
        } else {
            trace!("Backtrace step to {next}");
            maze.mark_path(&next);
            Ok(true)
        }
    }

    /// Performs the next step of the search, whatever it is: the first call begins expansion and
    /// labels the first layer, later calls expand until the end is reached (placing the
    /// backtrace cursor in the same call) and then backtrace one cell at a time. Once finished,
    /// keeps returning the [Outcome].
    pub fn advance(&mut self, maze: &mut Maze) -> Result<Progress> {
        match self.phase {
            Phase::Idle => {
                self.begin_expansion(maze)?;
                self.expand(maze)
            }
            Phase::Expanding => self.expand(maze),
            Phase::Reached => {
                self.begin_backtrace(maze)?;
                self.step_back(maze)
            }
            Phase::Backtracing => self.step_back(maze),
            Phase::Done(outcome) => Ok(Progress::Finished(outcome)),
        }
    }

    fn expand(&mut self, maze: &mut Maze) -> Result<Progress> {
        self.expand_one_layer(maze)?;
        match self.phase {
            Phase::Done(outcome) => Ok(Progress::Finished(outcome)),
            Phase::Reached => {
                self.begin_backtrace(maze)?;
                Ok(Progress::Expanded {
                    layer: self.frontier,
                    reached_end: true,
                })
            }
            _ => Ok(Progress::Expanded {
                layer: self.frontier,
                reached_end: false,
            }),
        }
    }

    fn step_back(&mut self, maze: &mut Maze) -> Result<Progress> {
        if self.backtrace_one_step(maze)? {
            // Cursor is always set while backtracing.
            Ok(Progress::Backtraced(self.cursor.unwrap_or(self.start)))
        } else {
            Ok(Progress::Finished(Outcome::PathFound))
        }
    }

    /// The cells from start to end once a path was found.
    pub fn path(&self) -> Option<Vec<Point>> {
        match self.phase {
            Phase::Done(Outcome::PathFound) => Some(self.trail.iter().rev().copied().collect()),
            _ => None,
        }
    }

    /// Runs the whole search on `maze` and returns the path from start to end. Checks the
    /// connected components first to avoid flood filling when the end is unreachable, in which
    /// case no labels are written.
    pub fn solve(maze: &mut Maze) -> Result<Option<Vec<Point>>> {
        let mut search = WaveSearch::new(maze)?;
        maze.update();
        if maze.unreachable(&search.start, &search.end) {
            info!("{} is not reachable from {}", search.end, search.start);
            return Ok(None);
        }
        loop {
            if let Progress::Finished(outcome) = search.advance(maze)? {
                if outcome == Outcome::NoPathFound {
                    warn!("Reachable end could not be pathed to, are the components correct?");
                }
                return Ok(search.path());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neighborhood::Neighborhood;
    use crate::pattern::WallPattern;

    fn open_maze(size: usize, mode: Neighborhood, start: Point, end: Point) -> Maze {
        let mut maze = Maze::new(size, mode).unwrap();
        maze.set_start(start).unwrap();
        maze.set_end(end).unwrap();
        maze
    }

    fn expand_fully(search: &mut WaveSearch, maze: &mut Maze) {
        search.begin_expansion(maze).unwrap();
        while !search.reached_end() && search.expand_one_layer(maze).unwrap() {}
    }

    #[test]
    fn open_grid_distances() {
        let start = Point::new(0, 0);
        let end = Point::new(4, 4);
        for (mode, expected) in [(Neighborhood::Orthogonal, 8), (Neighborhood::OrthoDiagonal, 4)] {
            let mut maze = open_maze(5, mode, start, end);
            let mut search = WaveSearch::new(&maze).unwrap();
            expand_fully(&mut search, &mut maze);
            assert_eq!(maze.distance(&end), Some(expected));
            assert_eq!(search.frontier_distance(), expected);
        }
    }

    #[test]
    fn layers_do_not_leak() {
        let mut maze = open_maze(5, Neighborhood::Orthogonal, Point::new(2, 2), Point::new(0, 0));
        let mut search = WaveSearch::new(&maze).unwrap();
        search.begin_expansion(&mut maze).unwrap();
        assert!(search.expand_one_layer(&mut maze).unwrap());
        let labelled = maze.cells().filter(|(_, c)| c.distance.is_some()).count();
        assert_eq!(labelled, 5);
        assert_eq!(maze.distance(&Point::new(2, 0)), None);
    }

    #[test]
    fn walled_off_end_exhausts() {
        let pattern: WallPattern = "...\n.WW\n.W.".parse().unwrap();
        let mut maze = Maze::with_pattern(&pattern, Neighborhood::Orthogonal).unwrap();
        maze.set_start(Point::new(0, 0)).unwrap();
        maze.set_end(Point::new(2, 2)).unwrap();
        let mut search = WaveSearch::new(&maze).unwrap();
        search.begin_expansion(&mut maze).unwrap();
        let mut calls = 0;
        while search.expand_one_layer(&mut maze).unwrap() {
            calls += 1;
            assert!(calls <= 9);
        }
        assert_eq!(search.outcome(), Some(Outcome::NoPathFound));
        assert_eq!(maze.distance(&Point::new(2, 2)), None);
        assert!(search.begin_backtrace(&maze).is_err());
        assert!(search.path().is_none());
    }

    #[test]
    fn backtrace_labels_strictly_decrease() {
        let pattern: WallPattern = ".....\nW.WW.\n.....\n.WWWW\n.....".parse().unwrap();
        for mode in [Neighborhood::Orthogonal, Neighborhood::OrthoDiagonal] {
            let mut maze = Maze::with_pattern(&pattern, mode).unwrap();
            maze.set_start(Point::new(4, 0)).unwrap();
            maze.set_end(Point::new(0, 4)).unwrap();
            let mut search = WaveSearch::new(&maze).unwrap();
            expand_fully(&mut search, &mut maze);
            search.begin_backtrace(&maze).unwrap();
            let mut previous = maze.distance(&Point::new(0, 4)).unwrap();
            let mut steps = 0;
            loop {
                let more = search.backtrace_one_step(&mut maze).unwrap();
                let cursor = search.cursor().unwrap();
                let d = maze.distance(&cursor).unwrap();
                assert!(d < previous);
                previous = d;
                steps += 1;
                assert!(steps <= 25);
                if !more {
                    break;
                }
                assert!(maze.cell(&cursor).unwrap().on_path);
            }
            assert_eq!(search.cursor(), Some(Point::new(4, 0)));
            assert!(!maze.cell(&Point::new(4, 0)).unwrap().on_path);
        }
    }

    #[test]
    fn adjacent_endpoints_need_one_backtrace_step() {
        let start = Point::new(0, 0);
        let end = Point::new(1, 0);
        let mut maze = open_maze(3, Neighborhood::Orthogonal, start, end);
        let mut search = WaveSearch::new(&maze).unwrap();
        assert_eq!(
            search.advance(&mut maze).unwrap(),
            Progress::Expanded {
                layer: 1,
                reached_end: true
            }
        );
        assert_eq!(
            search.advance(&mut maze).unwrap(),
            Progress::Finished(Outcome::PathFound)
        );
        assert_eq!(search.path(), Some(vec![start, end]));
        assert!(maze.path_cells().is_empty());
    }

    #[test]
    fn expansion_cannot_begin_twice() {
        let mut maze = open_maze(3, Neighborhood::Orthogonal, Point::new(0, 0), Point::new(2, 2));
        let mut search = WaveSearch::new(&maze).unwrap();
        search.begin_expansion(&mut maze).unwrap();
        assert!(search.begin_expansion(&mut maze).is_err());
    }

    #[test]
    fn search_needs_both_endpoints() {
        let mut maze = Maze::new(3, Neighborhood::Orthogonal).unwrap();
        assert!(WaveSearch::new(&maze).is_err());
        maze.set_start(Point::new(0, 0)).unwrap();
        assert_eq!(
            WaveSearch::new(&maze).unwrap_err(),
            PathfinderError::SearchNotReady("no end point")
        );
    }

    #[test]
    fn new_search_clears_old_labels() {
        let mut maze = open_maze(4, Neighborhood::Orthogonal, Point::new(0, 0), Point::new(3, 3));
        let first = WaveSearch::solve(&mut maze).unwrap().unwrap();
        assert_eq!(first.len(), 7);
        let mut search = WaveSearch::new(&maze).unwrap();
        search.begin_expansion(&mut maze).unwrap();
        assert_eq!(maze.cells().filter(|(_, c)| c.distance.is_some()).count(), 1);
        assert!(maze.path_cells().is_empty());
    }

    #[test]
    fn solve_skips_unreachable_end() {
        let pattern: WallPattern = ".W.\n.W.\n.W.".parse().unwrap();
        let mut maze = Maze::with_pattern(&pattern, Neighborhood::OrthoDiagonal).unwrap();
        maze.set_start(Point::new(0, 0)).unwrap();
        maze.set_end(Point::new(2, 2)).unwrap();
        assert_eq!(WaveSearch::solve(&mut maze).unwrap(), None);
        assert!(maze.cells().all(|(_, c)| c.distance.is_none()));
    }

    #[test]
    fn finished_search_keeps_reporting() {
        let mut maze = open_maze(2, Neighborhood::OrthoDiagonal, Point::new(0, 0), Point::new(1, 1));
        let mut search = WaveSearch::new(&maze).unwrap();
        while !search.is_finished() {
            search.advance(&mut maze).unwrap();
        }
        assert_eq!(
            search.advance(&mut maze).unwrap(),
            Progress::Finished(Outcome::PathFound)
        );
    }
}
