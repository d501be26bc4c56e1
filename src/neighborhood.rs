use grid_util::point::Point;
use itertools::iproduct;

/// Determines which cells count as neighbours during wave expansion and backtrace.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Neighborhood {
    /// 4-connectivity, the [von Neumann neighborhood](https://en.wikipedia.org/wiki/Von_Neumann_neighborhood).
    #[default]
    Orthogonal,
    /// 8-connectivity, the [Moore neighborhood](https://en.wikipedia.org/wiki/Moore_neighborhood).
    OrthoDiagonal,
}

impl Neighborhood {
    /// Checks whether `a` and `b` are neighbours. Symmetric, and a cell is never adjacent to
    /// itself.
    pub fn is_adjacent(self, a: &Point, b: &Point) -> bool {
        let dx = (a.x - b.x).abs();
        let dy = (a.y - b.y).abs();
        match self {
            Neighborhood::Orthogonal => dx + dy == 1,
            Neighborhood::OrthoDiagonal => dx <= 1 && dy <= 1 && (dx, dy) != (0, 0),
        }
    }

    /// Maximum number of neighbours a cell can have.
    pub fn degree(self) -> usize {
        match self {
            Neighborhood::Orthogonal => 4,
            Neighborhood::OrthoDiagonal => 8,
        }
    }

    /// Lazily enumerates the in-bounds neighbours of `point` on a `size` x `size` grid. There is
    /// no wraparound. Cells come out row by row (top to bottom), left to right within a row,
    /// which is the order backtrace uses to break ties.
    pub fn neighbors_of(self, point: Point, size: usize) -> impl Iterator<Item = Point> {
        let size = size as i32;
        iproduct!(-1..=1, -1..=1)
            .map(move |(dy, dx)| Point::new(point.x + dx, point.y + dy))
            .filter(move |p| p.x >= 0 && p.y >= 0 && p.x < size && p.y < size)
            .filter(move |p| self.is_adjacent(&point, p))
    }
}
