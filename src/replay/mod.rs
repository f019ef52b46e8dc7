//! Turn-indexed navigation over a move sequence.

pub mod cursor;

pub use cursor::{CursorError, ReplayCursor};
