use core::fmt;
use grid_util::point::Point;

use crate::wizard::Stage;

/// Which of the two special cells an operation refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Start,
    End,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Endpoint::Start => write!(f, "start"),
            Endpoint::End => write!(f, "end"),
        }
    }
}

/// Errors raised by the maze, the search engine and the wizard.
///
/// Structural errors ([InvalidSize](PathfinderError::InvalidSize),
/// [CellOccupied](PathfinderError::CellOccupied), ...) are checked before anything is written
/// to the [Maze](crate::maze::Maze), so a failed call never leaves a partially applied change.
/// [IllegalTransition](PathfinderError::IllegalTransition) is only ever reported back as wizard
/// feedback; the state machine stays usable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathfinderError {
    /// The requested grid size is zero or larger than [MAX_MAZE_SIZE](crate::MAX_MAZE_SIZE).
    InvalidSize(usize),
    /// The position lies outside the grid.
    OutOfBounds(Point),
    /// The cell is a wall or already holds the other endpoint.
    CellOccupied(Point),
    /// The endpoint was already placed during this cycle.
    EndpointAlreadySet(Endpoint),
    /// Walls can no longer be edited because a start point was chosen or a search ran.
    EditLocked,
    /// A wall pattern does not match the grid dimensions.
    PatternMismatch { expected: usize, rows: usize, cols: usize },
    /// A wall pattern contains a character that is neither a wall nor an open marker.
    InvalidMarker { marker: char, row: usize, col: usize },
    /// An engine step was requested before its precondition held.
    SearchNotReady(&'static str),
    /// The wizard cannot leave `stage` yet.
    IllegalTransition { stage: Stage, reason: &'static str },
}

impl fmt::Display for PathfinderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidSize(size) => write!(f, "invalid maze size {size}"),
            Self::OutOfBounds(p) => write!(f, "position {p} is outside the maze"),
            Self::CellOccupied(p) => write!(f, "cell {p} is a wall or already an endpoint"),
            Self::EndpointAlreadySet(e) => write!(f, "the {e} point was already chosen"),
            Self::EditLocked => write!(f, "walls cannot be edited once a start point is chosen"),
            Self::PatternMismatch {
                expected,
                rows,
                cols,
            } => write!(
                f,
                "wall pattern is {rows}x{cols}, expected {expected}x{expected}"
            ),
            Self::InvalidMarker { marker, row, col } => {
                write!(f, "invalid marker '{marker}' at row {row}, column {col}")
            }
            Self::SearchNotReady(reason) => write!(f, "search not ready: {reason}"),
            Self::IllegalTransition { stage, reason } => {
                write!(f, "cannot leave stage {stage:?}: {reason}")
            }
        }
    }
}

impl std::error::Error for PathfinderError {}

pub type Result<T> = std::result::Result<T, PathfinderError>;
