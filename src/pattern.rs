//! Wall patterns: square matrices of markers where [WALL_MARKER] blocks a cell.
use crate::error::{PathfinderError, Result};
use crate::WALL_MARKER;
use core::fmt;
use std::collections::BTreeMap;
use std::str::FromStr;

/// A `size` x `size` matrix of wall flags, indexed `[row][col]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WallPattern {
    size: usize,
    walls: Vec<bool>,
}

impl WallPattern {
    /// An all-open pattern.
    pub fn open(size: usize) -> WallPattern {
        WallPattern {
            size,
            walls: vec![false; size * size],
        }
    }

    /// Builds a pattern from rows of markers. [WALL_MARKER] marks a wall, every other marker is
    /// open. The rows must form a square.
    pub fn from_markers<R, M>(rows: &[R]) -> Result<WallPattern>
    where
        R: AsRef<[M]>,
        M: Copy + Into<char>,
    {
        let size = rows.len();
        let mut walls = Vec::with_capacity(size * size);
        for row in rows {
            let row = row.as_ref();
            if row.len() != size {
                return Err(PathfinderError::PatternMismatch {
                    expected: size,
                    rows: size,
                    cols: row.len(),
                });
            }
            walls.extend(row.iter().map(|&m| m.into() == WALL_MARKER));
        }
        Ok(WallPattern { size, walls })
    }

    /// Builds a pattern from a list of wall positions given as `(row, col)`.
    pub fn with_walls(size: usize, walls: &[(usize, usize)]) -> Result<WallPattern> {
        let mut pattern = WallPattern::open(size);
        for &(row, col) in walls {
            if row >= size || col >= size {
                return Err(PathfinderError::PatternMismatch {
                    expected: size,
                    rows: row + 1,
                    cols: col + 1,
                });
            }
            pattern.walls[row * size + col] = true;
        }
        Ok(pattern)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub(crate) fn set(&mut self, row: usize, col: usize, wall: bool) {
        self.walls[row * self.size + col] = wall;
    }

    pub fn is_wall(&self, row: usize, col: usize) -> bool {
        row < self.size && col < self.size && self.walls[row * self.size + col]
    }

    /// Iterates over `(row, col)` of every wall in row-major order.
    pub fn walls(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.walls
            .iter()
            .enumerate()
            .filter(|(_, w)| **w)
            .map(move |(ix, _)| (ix / self.size, ix % self.size))
    }
}

/// Parses one row per line; `W` is a wall, `.` and `0` are open. Blank lines are skipped.
impl FromStr for WallPattern {
    type Err = PathfinderError;

    fn from_str(s: &str) -> Result<WallPattern> {
        let rows = s
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect::<Vec<&str>>();
        let mut markers = Vec::with_capacity(rows.len());
        for (row, line) in rows.iter().enumerate() {
            let mut parsed = Vec::with_capacity(line.len());
            for (col, marker) in line.chars().enumerate() {
                match marker {
                    WALL_MARKER | '.' | '0' => parsed.push(marker),
                    _ => return Err(PathfinderError::InvalidMarker { marker, row, col }),
                }
            }
            markers.push(parsed);
        }
        WallPattern::from_markers::<_, char>(&markers)
    }
}

impl fmt::Display for WallPattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in 0..self.size {
            let line = (0..self.size)
                .map(|col| if self.is_wall(row, col) { WALL_MARKER } else { '.' })
                .collect::<String>();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

const PATTERN_5: &str = "
.....
W.WW.
.....
.WWWW
.....
";

const PATTERN_10: &str = "
..........
WW.WWWWWW.
....W.....
....W.WWWW
....W.W...
....W.W...
....W.W...
....W.W.WW
WWWWW.W.W.
..........
";

const PATTERN_20: &str = "
...W................
..W.................
....................
..W.W....WW..W......
..........W.........
....................
.........W..W.......
.....W.......W......
....................
......WW...W........
.......W............
....W...............
WWW.WWWWWWWWWWWWWWWW
....................
....................
.........W..........
...WWW....W.........
....................
....................
....................
";

/// Wall patterns keyed by grid size, applied when the wizard creates a grid.
#[derive(Clone, Debug, Default)]
pub struct PatternLibrary {
    patterns: BTreeMap<usize, WallPattern>,
}

impl PatternLibrary {
    pub fn new() -> PatternLibrary {
        PatternLibrary::default()
    }

    /// The demonstration mazes for sizes 5, 10 and 20.
    pub fn builtin() -> PatternLibrary {
        let mut library = PatternLibrary::new();
        for text in [PATTERN_5, PATTERN_10, PATTERN_20] {
            if let Ok(pattern) = text.parse::<WallPattern>() {
                library.insert(pattern);
            }
        }
        library
    }

    /// Registers `pattern` for its size, replacing any previous one.
    pub fn insert(&mut self, pattern: WallPattern) -> Option<WallPattern> {
        self.patterns.insert(pattern.size(), pattern)
    }

    pub fn get(&self, size: usize) -> Option<&WallPattern> {
        self.patterns.get(&size)
    }

    /// Sizes a pattern is available for, ascending.
    pub fn sizes(&self) -> impl Iterator<Item = usize> + '_ {
        self.patterns.keys().copied()
    }
}
