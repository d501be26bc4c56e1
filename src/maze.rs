use crate::error::{Endpoint, PathfinderError, Result};
use crate::neighborhood::Neighborhood;
use crate::pattern::WallPattern;
use crate::MAX_MAZE_SIZE;
use core::fmt;
use grid_util::point::Point;
use itertools::iproduct;
use log::{debug, info};
use petgraph::unionfind::UnionFind;

/// State of a single grid cell as seen by a renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cell {
    pub is_wall: bool,
    /// Hop count from the start, assigned once during wave expansion. [None] means unvisited.
    pub distance: Option<u32>,
    pub is_start: bool,
    pub is_end: bool,
    /// Set during backtrace for the cells between start and end.
    pub on_path: bool,
}

impl Cell {
    /// Open, not an endpoint, and not a wall.
    pub fn is_plain(&self) -> bool {
        !self.is_wall && !self.is_start && !self.is_end
    }
}

/// [Maze] is a square grid of [Cell]s addressed by [Point], where `x` is the column and `y` the
/// row. Besides the cells it records the two endpoints and, like a pathing grid, maintains
/// connected components in a [UnionFind] structure so unreachable goals can be detected without
/// flood filling.
#[derive(Clone, Debug)]
pub struct Maze {
    size: usize,
    neighborhood: Neighborhood,
    cells: Vec<Cell>,
    start: Option<Point>,
    end: Option<Point>,
    searching: bool,
    components: UnionFind<usize>,
    components_dirty: bool,
}

impl Maze {
    /// Creates an open `size` x `size` maze without endpoints.
    pub fn new(size: usize, neighborhood: Neighborhood) -> Result<Maze> {
        if size == 0 || size > MAX_MAZE_SIZE {
            return Err(PathfinderError::InvalidSize(size));
        }
        info!("Creating {size}x{size} maze with {neighborhood:?} neighborhood");
        let mut maze = Maze {
            size,
            neighborhood,
            cells: vec![Cell::default(); size * size],
            start: None,
            end: None,
            searching: false,
            components: UnionFind::new(size * size),
            components_dirty: false,
        };
        maze.generate_components();
        Ok(maze)
    }

    /// Creates a maze and applies `pattern` to it.
    pub fn with_pattern(pattern: &WallPattern, neighborhood: Neighborhood) -> Result<Maze> {
        let mut maze = Maze::new(pattern.size(), neighborhood)?;
        maze.apply_wall_pattern(pattern)?;
        Ok(maze)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn neighborhood(&self) -> Neighborhood {
        self.neighborhood
    }

    pub fn start(&self) -> Option<Point> {
        self.start
    }

    pub fn end(&self) -> Option<Point> {
        self.end
    }

    pub fn in_bounds(&self, point: &Point) -> bool {
        point.x >= 0
            && point.y >= 0
            && (point.x as usize) < self.size
            && (point.y as usize) < self.size
    }

    fn ix(&self, point: &Point) -> Option<usize> {
        if self.in_bounds(point) {
            Some(point.y as usize * self.size + point.x as usize)
        } else {
            None
        }
    }

    fn checked_ix(&self, point: &Point) -> Result<usize> {
        self.ix(point).ok_or(PathfinderError::OutOfBounds(*point))
    }

    pub fn cell(&self, point: &Point) -> Option<&Cell> {
        self.ix(point).map(|ix| &self.cells[ix])
    }

    pub(crate) fn cell_mut(&mut self, point: &Point) -> Option<&mut Cell> {
        let ix = self.ix(point)?;
        Some(&mut self.cells[ix])
    }

    /// Label of the cell at `point`, [None] if unvisited or out of bounds.
    pub fn distance(&self, point: &Point) -> Option<u32> {
        self.cell(point).and_then(|c| c.distance)
    }

    /// Iterates over every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (Point, &Cell)> + '_ {
        iproduct!(0..self.size as i32, 0..self.size as i32)
            .map(|(y, x)| Point::new(x, y))
            .zip(self.cells.iter())
    }

    /// In-bounds neighbours of `point` under the maze's [Neighborhood].
    pub fn neighbors_of(&self, point: Point) -> impl Iterator<Item = Point> {
        self.neighborhood.neighbors_of(point, self.size)
    }

    /// Checks whether a walker may enter `point`.
    pub fn can_move_to(&self, point: &Point) -> bool {
        self.cell(point).is_some_and(|c| !c.is_wall)
    }

    /// Whether wall edits are still allowed, i.e. no start was chosen and no labels are present.
    pub fn editable(&self) -> bool {
        self.start.is_none() && !self.searching
    }

    /// Marks every wall in `pattern`. Only allowed before a start point is chosen.
    pub fn apply_wall_pattern(&mut self, pattern: &WallPattern) -> Result<()> {
        if !self.editable() {
            return Err(PathfinderError::EditLocked);
        }
        if pattern.size() != self.size {
            return Err(PathfinderError::PatternMismatch {
                expected: self.size,
                rows: pattern.size(),
                cols: pattern.size(),
            });
        }
        for (row, col) in pattern.walls() {
            self.cells[row * self.size + col].is_wall = true;
        }
        self.components_dirty = true;
        debug!("Applied wall pattern:\n{pattern}");
        Ok(())
    }

    /// Reads the walls back as a pattern.
    pub fn wall_pattern(&self) -> WallPattern {
        let mut pattern = WallPattern::open(self.size);
        for (p, cell) in self.cells() {
            pattern.set(p.y as usize, p.x as usize, cell.is_wall);
        }
        pattern
    }

    /// Flips the wall state of the cell at `point` and returns the new state. Fails on the start
    /// and end cells and while distance labels are present.
    pub fn toggle_wall(&mut self, point: Point) -> Result<bool> {
        let ix = self.checked_ix(&point)?;
        if self.searching {
            return Err(PathfinderError::EditLocked);
        }
        let cell = self.cells[ix];
        if cell.is_start || cell.is_end {
            return Err(PathfinderError::CellOccupied(point));
        }
        self.set_wall(point, ix, !cell.is_wall);
        Ok(!cell.is_wall)
    }

    /// Joins newly connected components when a cell opens and flags the components as dirty
    /// when a wall (potentially) breaks one apart.
    fn set_wall(&mut self, point: Point, ix: usize, blocked: bool) {
        self.cells[ix].is_wall = blocked;
        if blocked {
            self.components_dirty = true;
        } else {
            let open = self
                .neighbors_of(point)
                .filter(|n| self.can_move_to(n))
                .filter_map(|n| self.ix(&n))
                .collect::<Vec<usize>>();
            for n_ix in open {
                self.components.union(ix, n_ix);
            }
        }
    }

    pub fn set_start(&mut self, point: Point) -> Result<()> {
        self.set_endpoint(Endpoint::Start, point)
    }

    pub fn set_end(&mut self, point: Point) -> Result<()> {
        self.set_endpoint(Endpoint::End, point)
    }

    fn set_endpoint(&mut self, endpoint: Endpoint, point: Point) -> Result<()> {
        let ix = self.checked_ix(&point)?;
        let slot = match endpoint {
            Endpoint::Start => self.start,
            Endpoint::End => self.end,
        };
        if slot.is_some() {
            return Err(PathfinderError::EndpointAlreadySet(endpoint));
        }
        let cell = &mut self.cells[ix];
        if !cell.is_plain() {
            return Err(PathfinderError::CellOccupied(point));
        }
        match endpoint {
            Endpoint::Start => {
                cell.is_start = true;
                self.start = Some(point);
            }
            Endpoint::End => {
                cell.is_end = true;
                self.end = Some(point);
            }
        }
        debug!("Placed {endpoint} point at {point}");
        Ok(())
    }

    /// Clears all distance and path labels, keeping walls and endpoints.
    pub fn reset(&mut self) {
        for cell in self.cells.iter_mut() {
            cell.distance = None;
            cell.on_path = false;
        }
        self.searching = false;
    }

    /// Assigns a distance label to an unlabelled cell. Returns [false] if the cell already
    /// carries one, since labels are never overwritten.
    pub(crate) fn label(&mut self, point: &Point, distance: u32) -> bool {
        match self.cell_mut(point) {
            Some(cell) if cell.distance.is_none() => {
                cell.distance = Some(distance);
                self.searching = true;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn mark_path(&mut self, point: &Point) {
        if let Some(cell) = self.cell_mut(point) {
            cell.on_path = true;
        }
    }

    /// Cells currently on the backtraced path, excluding the endpoints, in row-major order.
    pub fn path_cells(&self) -> Vec<Point> {
        self.cells()
            .filter(|(_, c)| c.on_path)
            .map(|(p, _)| p)
            .collect()
    }

    /// Retrieves the component id a given [Point] belongs to.
    pub fn get_component(&self, point: &Point) -> Option<usize> {
        self.ix(point).map(|ix| self.components.find(ix))
    }

    /// Checks if start and goal are on the same component.
    pub fn reachable(&self, start: &Point, goal: &Point) -> bool {
        !self.unreachable(start, goal)
    }

    /// Checks if start and goal are not on the same component.
    pub fn unreachable(&self, start: &Point, goal: &Point) -> bool {
        match (self.ix(start), self.ix(goal)) {
            (Some(start_ix), Some(goal_ix)) => !self.components.equiv(start_ix, goal_ix),
            _ => true,
        }
    }

    /// Regenerates the components if they are marked as dirty.
    pub fn update(&mut self) {
        if self.components_dirty {
            self.generate_components();
        }
    }

    /// Generates a new [UnionFind] structure and links up open neighbours to the same components.
    pub fn generate_components(&mut self) {
        debug!("Generating connected components");
        self.components = UnionFind::new(self.size * self.size);
        self.components_dirty = false;
        for ix in 0..self.cells.len() {
            if self.cells[ix].is_wall {
                continue;
            }
            let point = Point::new((ix % self.size) as i32, (ix / self.size) as i32);
            // Links towards later cells only, the rest were visited already.
            let linked = self
                .neighbors_of(point)
                .filter_map(|n| self.ix(&n))
                .filter(|&n_ix| n_ix > ix && !self.cells[n_ix].is_wall)
                .collect::<Vec<usize>>();
            for n_ix in linked {
                self.components.union(ix, n_ix);
            }
        }
    }
}

impl fmt::Display for Maze {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in self.cells.chunks(self.size) {
            let line = row
                .iter()
                .map(|c| {
                    if c.is_wall {
                        '#'
                    } else if c.is_start {
                        'S'
                    } else if c.is_end {
                        'E'
                    } else if c.on_path {
                        '*'
                    } else {
                        match c.distance {
                            Some(d) => char::from_digit(d % 36, 36).unwrap_or('?'),
                            None => '.',
                        }
                    }
                })
                .collect::<String>();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
