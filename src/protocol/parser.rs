//! Viewer command parser.
//!
//! Parses incoming text commands into structured `Command` variants that
//! the main loop can dispatch on.

use tracing::warn;

/// A parsed host-to-viewer command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Load a match record from a JSON file.
    Load { path: String },

    /// Move the cursor to an absolute turn.
    Seek { turn: i64 },

    /// Move the cursor one turn forward.
    Next,

    /// Move the cursor one turn back.
    Prev,

    /// Append a live move, given as a JSON move object.
    Move { json: String },

    /// Emit the scores for the current turn.
    Scores,

    /// Report the cursor position.
    Status,

    /// Compare the replayed result with the recorded outcome.
    Verify,

    /// Set a viewer option: `setoption name <id> [value <x>]`.
    SetOption { name: String, value: Option<String> },

    /// Synchronization ping; the viewer replies `readyok`.
    IsReady,

    /// Terminate the viewer process.
    Quit,
}

/// Parses a single line of input into a `Command`.
///
/// Returns `None` for empty lines or unrecognized commands. Malformed
/// arguments for known commands also return `None` after logging a warning.
pub fn parse_command(line: &str) -> Option<Command> {
    let trimmed = line.trim();
    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }

    match tokens[0] {
        "next" => Some(Command::Next),
        "prev" => Some(Command::Prev),
        "scores" => Some(Command::Scores),
        "status" => Some(Command::Status),
        "verify" => Some(Command::Verify),
        "isready" => Some(Command::IsReady),
        "quit" => Some(Command::Quit),

        "load" => parse_load(trimmed),
        "seek" => parse_seek(&tokens),
        "move" => parse_move(trimmed),
        "setoption" => parse_setoption(&tokens),

        other => {
            warn!("unknown command: {}", other);
            None
        }
    }
}

/// Returns everything after the command keyword, trimmed.
fn rest_of<'a>(line: &'a str, keyword: &str) -> &'a str {
    line.strip_prefix(keyword).unwrap_or("").trim()
}

/// Parses `load <path>`. The path may contain spaces.
fn parse_load(line: &str) -> Option<Command> {
    let path = rest_of(line, "load");
    if path.is_empty() {
        warn!("malformed load: expected 'load <path>'");
        return None;
    }
    Some(Command::Load {
        path: path.to_string(),
    })
}

/// Parses `seek <turn>`. Negative turns parse and are rejected by the session.
fn parse_seek(tokens: &[&str]) -> Option<Command> {
    if tokens.len() < 2 {
        warn!("malformed seek: expected 'seek <turn>'");
        return None;
    }
    match tokens[1].parse::<i64>() {
        Ok(turn) => Some(Command::Seek { turn }),
        Err(_) => {
            warn!("invalid seek turn: '{}'", tokens[1]);
            None
        }
    }
}

/// Parses `move <json>`, capturing the JSON text verbatim.
fn parse_move(line: &str) -> Option<Command> {
    let json = rest_of(line, "move");
    if json.is_empty() {
        warn!("malformed move: expected 'move <json>'");
        return None;
    }
    Some(Command::Move {
        json: json.to_string(),
    })
}

/// Parses `setoption name <id> [value <x>]`.
fn parse_setoption(tokens: &[&str]) -> Option<Command> {
    if tokens.len() < 3 || tokens[1] != "name" {
        warn!("malformed setoption: expected 'setoption name <id> [value <x>]'");
        return None;
    }

    let value_idx = tokens.iter().position(|&t| t == "value");
    let (name_parts, value_parts) = match value_idx {
        Some(vi) => (&tokens[2..vi], &tokens[vi + 1..]),
        None => (&tokens[2..], &tokens[..0]),
    };
    if name_parts.is_empty() {
        warn!("malformed setoption: empty name");
        return None;
    }

    let name = name_parts.join(" ");
    let value = if value_parts.is_empty() {
        None
    } else {
        Some(value_parts.join(" "))
    };
    Some(Command::SetOption { name, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_commands() {
        assert_eq!(parse_command("next"), Some(Command::Next));
        assert_eq!(parse_command("prev"), Some(Command::Prev));
        assert_eq!(parse_command("scores"), Some(Command::Scores));
        assert_eq!(parse_command("status"), Some(Command::Status));
        assert_eq!(parse_command("verify"), Some(Command::Verify));
        assert_eq!(parse_command("isready"), Some(Command::IsReady));
        assert_eq!(parse_command("  quit  "), Some(Command::Quit));
    }

    #[test]
    fn parse_empty_and_unknown() {
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("   "), None);
        assert_eq!(parse_command("rewind"), None);
    }

    #[test]
    fn parse_load_keeps_spaces() {
        assert_eq!(
            parse_command("load /tmp/my match.json"),
            Some(Command::Load {
                path: "/tmp/my match.json".to_string()
            })
        );
        assert_eq!(parse_command("load"), None);
    }

    #[test]
    fn parse_seek_values() {
        assert_eq!(parse_command("seek 12"), Some(Command::Seek { turn: 12 }));
        assert_eq!(parse_command("seek -3"), Some(Command::Seek { turn: -3 }));
        assert_eq!(parse_command("seek"), None);
        assert_eq!(parse_command("seek ten"), None);
    }

    #[test]
    fn parse_move_captures_json() {
        let cmd = parse_command(r#"move {"pass": {"punter": 1}}"#);
        assert_eq!(
            cmd,
            Some(Command::Move {
                json: r#"{"pass": {"punter": 1}}"#.to_string()
            })
        );
        assert_eq!(parse_command("move"), None);
    }

    #[test]
    fn parse_setoption_with_value() {
        assert_eq!(
            parse_command("setoption name AutoScore value false"),
            Some(Command::SetOption {
                name: "AutoScore".to_string(),
                value: Some("false".to_string())
            })
        );
    }

    #[test]
    fn parse_setoption_without_value() {
        assert_eq!(
            parse_command("setoption name Futures"),
            Some(Command::SetOption {
                name: "Futures".to_string(),
                value: None
            })
        );
        assert_eq!(parse_command("setoption Futures"), None);
        assert_eq!(parse_command("setoption name value 1"), None);
    }
}
