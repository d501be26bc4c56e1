//! # wave_pathfinding
//!
//! Shortest paths on a square grid with the
//! [Lee algorithm](https://en.wikipedia.org/wiki/Lee_algorithm): a breadth-first wave labels
//! every reachable open cell with its hop count from the start, after which the path is
//! recovered by walking back from the end along strictly decreasing labels. Both phases run one
//! step per call so the search can be animated. Note that this assumes a uniform-cost grid.
//!
//! A [Wizard] sequences the whole flow (size, walls, start, end, expansion, backtrace) as a pure
//! state machine over [Command]s and [Effect]s.
pub mod error;
pub mod maze;
pub mod neighborhood;
pub mod pattern;
pub mod search;
pub mod ticker;
pub mod wizard;

use std::time::Duration;

pub use error::{Endpoint, PathfinderError, Result};
pub use maze::{Cell, Maze};
pub use neighborhood::Neighborhood;
pub use pattern::{PatternLibrary, WallPattern};
pub use search::{Outcome, Progress, WaveSearch};
pub use ticker::Ticker;
pub use wizard::{Command, Effect, Stage, Wizard, WizardConfig};

/// Marker for a blocked cell in wall patterns.
pub const WALL_MARKER: char = 'W';
/// Largest supported grid side.
pub const MAX_MAZE_SIZE: usize = 256;
/// Interval between automatic advances.
pub const DEFAULT_AUTO_RUN_INTERVAL: Duration = Duration::from_millis(500);
