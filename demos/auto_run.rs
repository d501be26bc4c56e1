use grid_util::point::Point;
use std::thread;
use std::time::{Duration, Instant};
use wave_pathfinding::{Command, Effect, Neighborhood, Wizard, WizardConfig};

// Lets the auto-run timer drive the 20x20 demonstration maze with diagonal moves allowed.

fn main() {
    let mut wizard = Wizard::new(WizardConfig {
        neighborhood: Neighborhood::OrthoDiagonal,
        auto_run_interval: Duration::from_millis(50),
        ..WizardConfig::default()
    });
    wizard.update(Command::SelectSize(20));
    wizard.update(Command::Advance);
    wizard.update(Command::ClickCell(Point::new(0, 0)));
    wizard.update(Command::Advance);
    wizard.update(Command::ClickCell(Point::new(19, 19)));
    wizard.update(Command::ToggleAutoRun);
    while wizard.auto_running() {
        for effect in wizard.update(Command::Tick(Instant::now())) {
            match effect {
                Effect::LayerExpanded(layer) => println!("layer {}", layer),
                Effect::PathExtended(p) => println!("path {:?}", p),
                Effect::Finished { message, .. } => println!("{}", message),
                _ => {}
            }
        }
        thread::sleep(Duration::from_millis(10));
    }
    if let Some(maze) = wizard.maze() {
        println!("{}", maze);
    }
}
