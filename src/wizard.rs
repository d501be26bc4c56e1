//! The step-by-step flow around a search: choose a size, edit the walls, place both endpoints,
//! then expand and backtrace one step per advance.
//!
//! [Wizard::update] is the only entry point. It takes a [Command] from the input side and returns
//! the [Effect]s a presentation layer should act on, so the whole flow can be driven and tested
//! without any user interface.
use crate::error::PathfinderError;
use crate::maze::Maze;
use crate::neighborhood::Neighborhood;
use crate::pattern::PatternLibrary;
use crate::search::{Outcome, WaveSearch};
use crate::ticker::Ticker;
use crate::DEFAULT_AUTO_RUN_INTERVAL;
use grid_util::point::Point;
use log::{debug, info, warn};
use std::time::{Duration, Instant};

/// Stages of the wizard in the order they are passed through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    ChoosingSize,
    EditingMaze,
    ChoosingStart,
    ChoosingEnd,
    Expanding,
    Backtracing,
    Finished,
}

impl Stage {
    /// Position of the stage in the flow, starting at 0. Useful for breadcrumbs.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Input delivered to the wizard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// A size was picked; 0 means no size.
    SelectSize(usize),
    /// The cell at the given position (`x` column, `y` row) was clicked.
    ClickCell(Point),
    /// Move on to the next step.
    Advance,
    ToggleAutoRun,
    /// Time passed; issues an [Advance](Command::Advance) when the auto-run interval elapsed.
    Tick(Instant),
}

/// Output of the wizard for the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    StageChanged(Stage),
    MazeCreated(usize),
    MazeDropped,
    /// The state of a single cell changed.
    CellChanged(Point),
    /// A layer of the wave was labelled.
    LayerExpanded(u32),
    /// The backtrace cursor moved to this cell.
    PathExtended(Point),
    /// A request was refused; the wizard state is unchanged. Meant as a transient nudge.
    Rejected {
        stage: Stage,
        error: PathfinderError,
    },
    AutoRun(bool),
    /// The search ended, either with a path or with exhaustion.
    Finished {
        outcome: Outcome,
        message: &'static str,
    },
}

/// Settings for a [Wizard].
#[derive(Clone, Debug)]
pub struct WizardConfig {
    pub neighborhood: Neighborhood,
    pub auto_run_interval: Duration,
    /// Walls applied to a new maze of matching size; other sizes start open.
    pub patterns: PatternLibrary,
}

impl Default for WizardConfig {
    fn default() -> WizardConfig {
        WizardConfig {
            neighborhood: Neighborhood::Orthogonal,
            auto_run_interval: DEFAULT_AUTO_RUN_INTERVAL,
            patterns: PatternLibrary::builtin(),
        }
    }
}

/// State machine sequencing a single search. Owns the [Maze] for the whole cycle; other parts
/// only get read access through [maze](Wizard::maze).
#[derive(Debug)]
pub struct Wizard {
    config: WizardConfig,
    stage: Stage,
    maze: Option<Maze>,
    search: Option<WaveSearch>,
    ticker: Ticker,
    message: Option<String>,
}

impl Default for Wizard {
    fn default() -> Wizard {
        Wizard::new(WizardConfig::default())
    }
}

impl Wizard {
    pub fn new(config: WizardConfig) -> Wizard {
        let ticker = Ticker::new(config.auto_run_interval);
        Wizard {
            config,
            stage: Stage::ChoosingSize,
            maze: None,
            search: None,
            ticker,
            message: None,
        }
    }

    pub fn config(&self) -> &WizardConfig {
        &self.config
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn maze(&self) -> Option<&Maze> {
        self.maze.as_ref()
    }

    pub fn search(&self) -> Option<&WaveSearch> {
        self.search.as_ref()
    }

    /// The final status message once [Finished](Stage::Finished).
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn auto_running(&self) -> bool {
        self.ticker.is_running()
    }

    /// Applies `command` and returns the resulting effects in order.
    pub fn update(&mut self, command: Command) -> Vec<Effect> {
        let mut effects = Vec::new();
        match command {
            Command::SelectSize(size) => self.select_size(size, &mut effects),
            Command::ClickCell(point) => self.click(point, &mut effects),
            Command::Advance => self.advance(&mut effects),
            Command::ToggleAutoRun => self.toggle_auto_run(&mut effects),
            Command::Tick(now) => {
                if self.ticker.poll(now) {
                    self.advance(&mut effects);
                }
            }
        }
        effects
    }

    fn enter(&mut self, stage: Stage, effects: &mut Vec<Effect>) {
        info!("Wizard stage {:?} -> {:?}", self.stage, stage);
        self.stage = stage;
        effects.push(Effect::StageChanged(stage));
    }

    fn reject(&self, error: PathfinderError, effects: &mut Vec<Effect>) {
        debug!("Rejected in {:?}: {error}", self.stage);
        effects.push(Effect::Rejected {
            stage: self.stage,
            error,
        });
    }

    fn illegal(&self, reason: &'static str, effects: &mut Vec<Effect>) {
        self.reject(
            PathfinderError::IllegalTransition {
                stage: self.stage,
                reason,
            },
            effects,
        );
    }

    fn stop_auto_run(&mut self, effects: &mut Vec<Effect>) {
        if self.ticker.is_running() {
            self.ticker.cancel();
            effects.push(Effect::AutoRun(false));
        }
    }

    fn select_size(&mut self, size: usize, effects: &mut Vec<Effect>) {
        self.stop_auto_run(effects);
        self.search = None;
        self.message = None;
        if self.maze.take().is_some() {
            effects.push(Effect::MazeDropped);
        }
        if size == 0 {
            self.enter(Stage::ChoosingSize, effects);
            return;
        }
        let maze = match self.config.patterns.get(size) {
            Some(pattern) => Maze::with_pattern(pattern, self.config.neighborhood),
            None => Maze::new(size, self.config.neighborhood),
        };
        match maze {
            Ok(maze) => {
                self.maze = Some(maze);
                effects.push(Effect::MazeCreated(size));
                self.enter(Stage::EditingMaze, effects);
            }
            Err(error) => {
                self.stage = Stage::ChoosingSize;
                self.reject(error, effects);
                effects.push(Effect::StageChanged(Stage::ChoosingSize));
            }
        }
    }

    fn click(&mut self, point: Point, effects: &mut Vec<Effect>) {
        let stage = self.stage;
        let maze = match self.maze.as_mut() {
            Some(maze) => maze,
            None => return,
        };
        let result = match stage {
            Stage::EditingMaze => maze.toggle_wall(point).map(|_| ()),
            Stage::ChoosingStart => maze.set_start(point),
            Stage::ChoosingEnd => maze.set_end(point),
            // Clicks carry no meaning outside of editing and placing endpoints.
            _ => return,
        };
        match result {
            Ok(()) => effects.push(Effect::CellChanged(point)),
            Err(error) => self.reject(error, effects),
        }
    }

    fn advance(&mut self, effects: &mut Vec<Effect>) {
        match self.stage {
            Stage::ChoosingSize => self.illegal("no maze size chosen", effects),
            Stage::EditingMaze => self.enter(Stage::ChoosingStart, effects),
            Stage::ChoosingStart => {
                if self.maze.as_ref().and_then(Maze::start).is_some() {
                    self.enter(Stage::ChoosingEnd, effects);
                } else {
                    self.illegal("no start point chosen", effects);
                }
            }
            Stage::ChoosingEnd => {
                if self.maze.as_ref().and_then(Maze::end).is_some() {
                    self.begin_search(effects);
                } else {
                    self.illegal("no end point chosen", effects);
                }
            }
            Stage::Expanding => self.expand(effects),
            Stage::Backtracing => self.backtrace(effects),
            Stage::Finished => {}
        }
    }

    fn begin_search(&mut self, effects: &mut Vec<Effect>) {
        let Some(maze) = self.maze.as_mut() else {
            return;
        };
        let started = WaveSearch::new(maze).and_then(|mut search| {
            search.begin_expansion(maze)?;
            Ok(search)
        });
        match started {
            Ok(search) => {
                self.search = Some(search);
                self.enter(Stage::Expanding, effects);
            }
            Err(error) => self.reject(error, effects),
        }
    }

    fn expand(&mut self, effects: &mut Vec<Effect>) {
        let (Some(maze), Some(search)) = (self.maze.as_mut(), self.search.as_mut()) else {
            return;
        };
        let step = search.expand_one_layer(maze).and_then(|_| {
            if search.reached_end() {
                search.begin_backtrace(maze)?;
            }
            Ok((search.frontier_distance(), search.reached_end(), search.outcome()))
        });
        match step {
            Ok((layer, reached_end, outcome)) => {
                effects.push(Effect::LayerExpanded(layer));
                if reached_end {
                    self.enter(Stage::Backtracing, effects);
                } else if let Some(outcome) = outcome {
                    self.finish(outcome, effects);
                }
            }
            Err(error) => {
                warn!("Expansion failed: {error}");
                self.reject(error, effects);
            }
        }
    }

    fn backtrace(&mut self, effects: &mut Vec<Effect>) {
        let (Some(maze), Some(search)) = (self.maze.as_mut(), self.search.as_mut()) else {
            return;
        };
        match search.backtrace_one_step(maze) {
            Ok(true) => {
                if let Some(cursor) = search.cursor() {
                    effects.push(Effect::PathExtended(cursor));
                }
            }
            Ok(false) => self.finish(Outcome::PathFound, effects),
            Err(error) => {
                warn!("Backtrace failed: {error}");
                self.reject(error, effects);
            }
        }
    }

    fn finish(&mut self, outcome: Outcome, effects: &mut Vec<Effect>) {
        self.stop_auto_run(effects);
        self.message = Some(outcome.message().to_owned());
        self.enter(Stage::Finished, effects);
        effects.push(Effect::Finished {
            outcome,
            message: outcome.message(),
        });
    }

    fn toggle_auto_run(&mut self, effects: &mut Vec<Effect>) {
        match self.stage {
            Stage::ChoosingSize => self.illegal("no maze size chosen", effects),
            Stage::Finished => self.illegal("search already finished", effects),
            _ => {
                let running = self.ticker.toggle();
                effects.push(Effect::AutoRun(running));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::WallPattern;

    fn open_config(neighborhood: Neighborhood) -> WizardConfig {
        WizardConfig {
            neighborhood,
            patterns: PatternLibrary::new(),
            ..WizardConfig::default()
        }
    }

    fn snapshot(wizard: &Wizard) -> String {
        wizard.maze().map(|m| m.to_string()).unwrap_or_default()
    }

    #[test]
    fn starts_choosing_size() {
        let wizard = Wizard::default();
        assert_eq!(wizard.stage(), Stage::ChoosingSize);
        assert!(wizard.maze().is_none());
        assert_eq!(Stage::Finished.index(), 6);
    }

    #[test]
    fn selecting_a_size_applies_its_pattern() {
        let mut wizard = Wizard::default();
        let effects = wizard.update(Command::SelectSize(5));
        assert_eq!(
            effects,
            vec![
                Effect::MazeCreated(5),
                Effect::StageChanged(Stage::EditingMaze)
            ]
        );
        let expected = PatternLibrary::builtin().get(5).cloned().unwrap();
        assert_eq!(wizard.maze().unwrap().wall_pattern(), expected);
    }

    #[test]
    fn size_without_pattern_is_open() {
        let mut wizard = Wizard::default();
        wizard.update(Command::SelectSize(7));
        assert_eq!(wizard.maze().unwrap().wall_pattern(), WallPattern::open(7));
    }

    #[test]
    fn advance_without_start_is_rejected() {
        let mut wizard = Wizard::new(open_config(Neighborhood::Orthogonal));
        wizard.update(Command::SelectSize(3));
        wizard.update(Command::Advance);
        assert_eq!(wizard.stage(), Stage::ChoosingStart);
        let before = snapshot(&wizard);
        let effects = wizard.update(Command::Advance);
        assert_eq!(
            effects,
            vec![Effect::Rejected {
                stage: Stage::ChoosingStart,
                error: PathfinderError::IllegalTransition {
                    stage: Stage::ChoosingStart,
                    reason: "no start point chosen"
                }
            }]
        );
        assert_eq!(wizard.stage(), Stage::ChoosingStart);
        assert_eq!(snapshot(&wizard), before);

        wizard.update(Command::ClickCell(Point::new(0, 0)));
        assert_eq!(
            wizard.update(Command::Advance),
            vec![Effect::StageChanged(Stage::ChoosingEnd)]
        );
    }

    #[test]
    fn clicks_depend_on_stage() {
        let mut wizard = Wizard::new(open_config(Neighborhood::Orthogonal));
        assert!(wizard.update(Command::ClickCell(Point::new(0, 0))).is_empty());
        wizard.update(Command::SelectSize(3));
        let wall = Point::new(1, 1);
        assert_eq!(
            wizard.update(Command::ClickCell(wall)),
            vec![Effect::CellChanged(wall)]
        );
        assert!(wizard.maze().unwrap().cell(&wall).unwrap().is_wall);
        wizard.update(Command::Advance);
        let effects = wizard.update(Command::ClickCell(wall));
        assert!(matches!(
            effects.as_slice(),
            [Effect::Rejected {
                error: PathfinderError::CellOccupied(_),
                ..
            }]
        ));
        assert!(wizard.maze().unwrap().start().is_none());
    }

    #[test]
    fn reselecting_size_tears_down() {
        let mut wizard = Wizard::new(open_config(Neighborhood::Orthogonal));
        wizard.update(Command::SelectSize(3));
        wizard.update(Command::Advance);
        wizard.update(Command::ClickCell(Point::new(0, 0)));
        let effects = wizard.update(Command::SelectSize(4));
        assert_eq!(
            effects,
            vec![
                Effect::MazeDropped,
                Effect::MazeCreated(4),
                Effect::StageChanged(Stage::EditingMaze)
            ]
        );
        assert!(wizard.maze().unwrap().start().is_none());
        wizard.update(Command::SelectSize(0));
        assert_eq!(wizard.stage(), Stage::ChoosingSize);
        assert!(wizard.maze().is_none());
    }

    #[test]
    fn oversized_maze_is_rejected() {
        let mut wizard = Wizard::default();
        let effects = wizard.update(Command::SelectSize(crate::MAX_MAZE_SIZE + 1));
        assert!(matches!(
            effects.first(),
            Some(Effect::Rejected {
                error: PathfinderError::InvalidSize(_),
                ..
            })
        ));
        assert_eq!(wizard.stage(), Stage::ChoosingSize);
    }

    #[test]
    fn unreachable_end_finishes_without_path() {
        let mut config = open_config(Neighborhood::Orthogonal);
        config
            .patterns
            .insert("...\n.WW\n.W.".parse::<WallPattern>().unwrap());
        let mut wizard = Wizard::new(config);
        wizard.update(Command::SelectSize(3));
        wizard.update(Command::Advance);
        wizard.update(Command::ClickCell(Point::new(0, 0)));
        wizard.update(Command::Advance);
        wizard.update(Command::ClickCell(Point::new(2, 2)));
        wizard.update(Command::Advance);
        assert_eq!(wizard.stage(), Stage::Expanding);
        let mut last = Vec::new();
        for _ in 0..10 {
            if wizard.stage() == Stage::Finished {
                break;
            }
            last = wizard.update(Command::Advance);
        }
        assert_eq!(wizard.stage(), Stage::Finished);
        assert!(last.contains(&Effect::Finished {
            outcome: Outcome::NoPathFound,
            message: Outcome::NoPathFound.message()
        }));
        assert_eq!(wizard.message(), Some(Outcome::NoPathFound.message()));
        assert!(wizard.update(Command::Advance).is_empty());
    }

    #[test]
    fn auto_run_drives_to_completion_and_cancels() {
        let mut wizard = Wizard::new(open_config(Neighborhood::OrthoDiagonal));
        wizard.update(Command::SelectSize(3));
        wizard.update(Command::Advance);
        wizard.update(Command::ClickCell(Point::new(0, 0)));
        wizard.update(Command::Advance);
        wizard.update(Command::ClickCell(Point::new(2, 2)));
        assert_eq!(
            wizard.update(Command::ToggleAutoRun),
            vec![Effect::AutoRun(true)]
        );
        let interval = wizard.config().auto_run_interval;
        let t0 = Instant::now();
        assert!(wizard.update(Command::Tick(t0)).is_empty());
        let mut finished_effects = Vec::new();
        for i in 1..20 {
            let effects = wizard.update(Command::Tick(t0 + interval * i));
            if wizard.stage() == Stage::Finished {
                finished_effects = effects;
                break;
            }
        }
        assert_eq!(wizard.stage(), Stage::Finished);
        assert_eq!(finished_effects.first(), Some(&Effect::AutoRun(false)));
        assert!(!wizard.auto_running());
        assert!(wizard.update(Command::Tick(t0 + interval * 100)).is_empty());
        assert_eq!(wizard.message(), Some(Outcome::PathFound.message()));
    }

    #[test]
    fn auto_run_needs_a_maze() {
        let mut wizard = Wizard::default();
        let effects = wizard.update(Command::ToggleAutoRun);
        assert!(matches!(effects.as_slice(), [Effect::Rejected { .. }]));
        assert!(!wizard.auto_running());
    }
}
