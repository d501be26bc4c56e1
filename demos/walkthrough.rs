use grid_util::point::Point;
use wave_pathfinding::{Command, Effect, Wizard};

// Steps through the 10x10 demonstration maze by hand, printing the grid after every advance.
// Distances are printed in base 36, `*` marks the backtraced path.

fn main() {
    let mut wizard = Wizard::default();
    let commands = [
        Command::SelectSize(10),
        Command::Advance,
        Command::ClickCell(Point::new(0, 0)),
        Command::Advance,
        Command::ClickCell(Point::new(9, 9)),
        Command::Advance,
    ];
    for command in commands {
        report(wizard.update(command));
    }
    while wizard.message().is_none() {
        report(wizard.update(Command::Advance));
        if let Some(maze) = wizard.maze() {
            println!("{}", maze);
        }
    }
}

fn report(effects: Vec<Effect>) {
    for effect in effects {
        match effect {
            Effect::StageChanged(stage) => println!("== {:?} ==", stage),
            Effect::Finished { message, .. } => println!("{}", message),
            Effect::Rejected { error, .. } => println!("rejected: {}", error),
            _ => {}
        }
    }
}
