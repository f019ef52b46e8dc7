//! River ownership and single-move application.
//!
//! Ownership is a vector indexed by `EdgeId`. Every applied move pushes an
//! undo frame with the prior owner of each river it touched, so reverting is
//! an exact inverse no matter which variant was applied. Moves are validated
//! in full before the first write; a rejected move leaves the state as it was.

use thiserror::Error;

use super::graph::{EdgeId, GraphModel, SiteId};
use super::moves::{Move, PlayerId};

/// Errors raised when a move cannot be applied or reverted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("no river between {0} and {1}")]
    NoSuchRiver(SiteId, SiteId),

    #[error("river {from}-{to} is already owned by punter {owner}")]
    EdgeAlreadyOwned {
        from: SiteId,
        to: SiteId,
        owner: PlayerId,
    },

    #[error("splurge route needs at least two sites, got {0}")]
    RouteTooShort(usize),

    #[error("river {0}-{1} occurs more than once in the route")]
    RepeatedRiver(SiteId, SiteId),

    #[error("splurge of {length} rivers exceeds budget of {budget}")]
    SplurgeTooLong { length: usize, budget: usize },

    #[error("unknown punter {player} (game has {player_count})")]
    UnknownPlayer {
        player: PlayerId,
        player_count: usize,
    },

    #[error("no applied move to revert")]
    NothingToRevert,
}

/// One river whose owner changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeChange {
    pub edge: EdgeId,
    pub before: Option<PlayerId>,
    pub after: Option<PlayerId>,
}

/// Owner of every river plus the undo frames of applied moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipState {
    owners: Vec<Option<PlayerId>>,
    undo: Vec<Vec<(EdgeId, Option<PlayerId>)>>,
}

impl OwnershipState {
    /// Creates a state with every river unowned.
    pub fn new(river_count: usize) -> Self {
        OwnershipState {
            owners: vec![None; river_count],
            undo: Vec::new(),
        }
    }

    #[inline]
    pub fn owner(&self, edge: EdgeId) -> Option<PlayerId> {
        self.owners.get(edge).copied().flatten()
    }

    pub fn owners(&self) -> &[Option<PlayerId>] {
        &self.owners
    }

    /// Number of applied moves that can still be reverted.
    pub fn applied_count(&self) -> usize {
        self.undo.len()
    }

    /// Rivers currently owned by `player`.
    pub fn owned_by(&self, player: PlayerId) -> Vec<EdgeId> {
        self.owners
            .iter()
            .enumerate()
            .filter(|(_, o)| **o == Some(player))
            .map(|(e, _)| e)
            .collect()
    }

    /// Resolves the rivers a move would take without touching state.
    pub fn check_move(&self, graph: &GraphModel, mv: &Move) -> Result<Vec<EdgeId>, MoveError> {
        match mv {
            Move::Pass { .. } => Ok(Vec::new()),
            Move::Claim { source, target, .. } => {
                let edge = self.resolve(graph, *source, *target)?;
                self.ensure_unowned(edge, *source, *target)?;
                Ok(vec![edge])
            }
            Move::Option { source, target, .. } => {
                Ok(vec![self.resolve(graph, *source, *target)?])
            }
            Move::Splurge { route, .. } => {
                if route.len() < 2 {
                    return Err(MoveError::RouteTooShort(route.len()));
                }
                let mut edges = Vec::with_capacity(route.len() - 1);
                for hop in route.windows(2) {
                    let (s, t) = (hop[0], hop[1]);
                    let edge = self.resolve(graph, s, t)?;
                    self.ensure_unowned(edge, s, t)?;
                    if edges.contains(&edge) {
                        return Err(MoveError::RepeatedRiver(s, t));
                    }
                    edges.push(edge);
                }
                Ok(edges)
            }
        }
    }

    /// Applies one move atomically and returns the rivers whose owner changed.
    pub fn apply_move(&mut self, graph: &GraphModel, mv: &Move) -> Result<Vec<EdgeChange>, MoveError> {
        let edges = self.check_move(graph, mv)?;
        let player = mv.player();
        let mut frame = Vec::with_capacity(edges.len());
        let mut changes = Vec::with_capacity(edges.len());

        for edge in edges {
            let before = self.owners[edge];
            frame.push((edge, before));
            self.owners[edge] = Some(player);
            if before != Some(player) {
                changes.push(EdgeChange {
                    edge,
                    before,
                    after: Some(player),
                });
            }
        }

        self.undo.push(frame);
        Ok(changes)
    }

    /// Undoes the most recently applied move.
    pub fn revert_move(&mut self) -> Result<Vec<EdgeChange>, MoveError> {
        let frame = self.undo.pop().ok_or(MoveError::NothingToRevert)?;
        let mut changes = Vec::with_capacity(frame.len());

        // Reverse order so a river touched twice in one frame ends at its
        // earliest recorded owner.
        for &(edge, before) in frame.iter().rev() {
            let after = self.owners[edge];
            self.owners[edge] = before;
            if before != after {
                changes.push(EdgeChange {
                    edge,
                    before: after,
                    after: before,
                });
            }
        }
        Ok(changes)
    }

    fn resolve(&self, graph: &GraphModel, source: SiteId, target: SiteId) -> Result<EdgeId, MoveError> {
        graph
            .edge_between(source, target)
            .ok_or(MoveError::NoSuchRiver(source, target))
    }

    fn ensure_unowned(&self, edge: EdgeId, source: SiteId, target: SiteId) -> Result<(), MoveError> {
        match self.owners[edge] {
            Some(owner) => Err(MoveError::EdgeAlreadyOwned {
                from: source,
                to: target,
                owner,
            }),
            None => Ok(()),
        }
    }
}
