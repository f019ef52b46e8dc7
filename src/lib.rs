//! riverwatch replay library.
//!
//! Exposes the map model, ownership tracking, the replay cursor, scoring, and
//! protocol modules for use by integration tests and the binary entry point.

pub mod board;
pub mod driver;
pub mod eval;
pub mod protocol;
pub mod replay;
pub mod session;
