//! Replay cursor: seek to any turn by applying or reverting the moves
//! between the current position and the target.
//!
//! Forward seeks apply moves in increasing order; backward seeks revert in
//! decreasing order, most recent first. Stepping one turn costs one move, so
//! dragging a slider across the whole match is linear in the match length.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use crate::board::graph::{EdgeId, GraphModel};
use crate::board::moves::{Move, PlayerId};
use crate::board::ownership::{EdgeChange, MoveError, OwnershipState};

/// Errors raised while moving the cursor.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CursorError {
    #[error("turn {target} is outside 0..={move_count}")]
    OutOfRange { target: i64, move_count: usize },

    #[error("move at turn {turn} is illegal: {source}")]
    Move {
        turn: usize,
        #[source]
        source: MoveError,
    },
}

/// Position in a move sequence plus the ownership it implies.
#[derive(Debug, Clone)]
pub struct ReplayCursor {
    moves: Vec<Move>,
    state: OwnershipState,
    current: usize,
}

impl ReplayCursor {
    /// Creates a cursor at turn 0 with every river unowned.
    pub fn new(river_count: usize, moves: Vec<Move>) -> Self {
        ReplayCursor {
            moves,
            state: OwnershipState::new(river_count),
            current: 0,
        }
    }

    pub fn current_turn(&self) -> usize {
        self.current
    }

    pub fn move_count(&self) -> usize {
        self.moves.len()
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn state(&self) -> &OwnershipState {
        &self.state
    }

    /// True when every recorded move has been applied.
    pub fn is_live(&self) -> bool {
        self.current == self.moves.len()
    }

    /// Checks that the whole sequence applies cleanly, leaving the cursor
    /// where it was.
    pub fn validate(&mut self, graph: &GraphModel) -> Result<(), CursorError> {
        let back = self.current;
        let result = self.seek(graph, self.moves.len()).map(|_| ());
        self.seek(graph, back)?;
        result
    }

    /// Moves to `target`, returning one change per river whose owner differs
    /// from before the seek.
    ///
    /// If a move fails to apply the cursor stops on the turn of that move,
    /// with every earlier move applied.
    pub fn seek(&mut self, graph: &GraphModel, target: usize) -> Result<Vec<EdgeChange>, CursorError> {
        if target > self.moves.len() {
            return Err(CursorError::OutOfRange {
                target: target as i64,
                move_count: self.moves.len(),
            });
        }
        if target == self.current {
            return Ok(Vec::new());
        }

        debug!(from = self.current, to = target, "seek");
        let mut touched = Touched::default();

        while self.current < target {
            let turn = self.current;
            let changes = self
                .state
                .apply_move(graph, &self.moves[turn])
                .map_err(|source| CursorError::Move { turn, source })?;
            touched.record(&changes);
            self.current += 1;
        }
        while self.current > target {
            // Frames exist for every applied move, so this only fails if the
            // state and cursor disagree.
            let changes = self.state.revert_move().map_err(|source| CursorError::Move {
                turn: self.current - 1,
                source,
            })?;
            touched.record(&changes);
            self.current -= 1;
        }

        Ok(touched.net_changes(&self.state))
    }

    /// Applies or reverts a single turn relative to the current one.
    pub fn step(&mut self, graph: &GraphModel, delta: i64) -> Result<Vec<EdgeChange>, CursorError> {
        let target = self.current as i64 + delta;
        if target < 0 {
            return Err(CursorError::OutOfRange {
                target,
                move_count: self.moves.len(),
            });
        }
        self.seek(graph, target as usize)
    }

    /// Appends a move at the end of the sequence after checking it against
    /// the final ownership.
    ///
    /// Returns the resulting changes if the cursor was at the live edge and
    /// advanced into the new move, or `None` if it stayed behind. A rejected
    /// move is not appended and leaves the cursor untouched.
    pub fn push_move(&mut self, graph: &GraphModel, mv: Move) -> Result<Option<Vec<EdgeChange>>, CursorError> {
        let end = self.moves.len();
        if self.is_live() {
            let changes = self
                .state
                .apply_move(graph, &mv)
                .map_err(|source| CursorError::Move { turn: end, source })?;
            self.moves.push(mv);
            self.current += 1;
            return Ok(Some(changes));
        }

        let back = self.current;
        self.seek(graph, end)?;
        let applied = self.state.apply_move(graph, &mv);
        match applied {
            Ok(_) => {
                self.moves.push(mv);
                self.current += 1;
                self.seek(graph, back)?;
                Ok(None)
            }
            Err(source) => {
                self.seek(graph, back)?;
                Err(CursorError::Move { turn: end, source })
            }
        }
    }

    /// Moves by `player` preceding the end of the sequence, newest first.
    pub fn recent_moves_by(&self, player: PlayerId) -> impl Iterator<Item = &Move> {
        self.moves.iter().rev().filter(move |m| m.player() == player)
    }
}

/// First-seen owner of every river touched during one seek.
#[derive(Default)]
struct Touched {
    order: Vec<EdgeId>,
    before: HashMap<EdgeId, Option<PlayerId>>,
}

impl Touched {
    fn record(&mut self, changes: &[EdgeChange]) {
        for c in changes {
            if !self.before.contains_key(&c.edge) {
                self.before.insert(c.edge, c.before);
                self.order.push(c.edge);
            }
        }
    }

    fn net_changes(self, state: &OwnershipState) -> Vec<EdgeChange> {
        self.order
            .into_iter()
            .filter_map(|edge| {
                let before = self.before[&edge];
                let after = state.owner(edge);
                (before != after).then_some(EdgeChange { edge, before, after })
            })
            .collect()
    }
}
