//! Score computation.
//!
//! Basic scores reward each punter for every site reachable from a mine
//! through their own rivers, weighted by the squared full-map distance.
//! Futures add or subtract the cubed distance of a declared mine-target bet.

pub mod futures;
pub mod score;

pub use futures::{filter_futures, Future};
pub use score::{score, score_with_futures, ScoreMismatch, ScoreReport, ScoreRow};
