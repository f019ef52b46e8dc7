//! Viewer protocol handling.
//!
//! This module implements the JSON match record format, the line command
//! parser used by the main loop, and the text notation for notifications.

pub mod notation;
pub mod parser;
pub mod record;

pub use notation::{format_edge, format_scores, format_verification, LineBuffer};
pub use parser::{parse_command, Command};
pub use record::{MatchRecord, MoveRecord, RecordError};
