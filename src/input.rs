//! Line commands typed at the terminal.

use crate::checkers::Position;

/// A parsed terminal command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// Touch the cell at row, column.
    Touch(Position),
    /// Send a chat line.
    Say(String),
    /// Print the board.
    Board,
    /// Drop the current selection.
    Cancel,
    /// Leave the game.
    Quit,
}

/// Parses one line. Returns `None` for blank or unknown input.
pub fn parse_command(line: &str) -> Option<UserCommand> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    match word {
        "t" | "touch" => {
            let mut parts = rest.split_whitespace();
            let row = parts.next()?.parse().ok()?;
            let col = parts.next()?.parse().ok()?;
            if parts.next().is_some() {
                return None;
            }
            Some(UserCommand::Touch(Position::new(row, col)))
        }
        "say" if !rest.is_empty() => Some(UserCommand::Say(rest.to_string())),
        "board" => Some(UserCommand::Board),
        "cancel" => Some(UserCommand::Cancel),
        "quit" | "q" => Some(UserCommand::Quit),
        _ => None,
    }
}
