//! Replay session.
//!
//! Owns the map, the distance table, the cursor, and the recorded scores of
//! one match. Every mutation goes through `&mut self`, so two seeks can never
//! interleave. Hosts that receive seek requests faster than they can render
//! queue them with `request_seek` and apply only the latest with `flush`.
//!
//! Rendering layers observe the session through `ReplayObserver`.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::board::distance::DistanceIndex;
use crate::board::graph::{EdgeId, GraphModel, River};
use crate::board::moves::{Move, PlayerId};
use crate::board::ownership::{EdgeChange, MoveError, OwnershipState};
use crate::eval::futures::Future;
use crate::eval::score::{score_with_futures, ScoreMismatch, ScoreReport, ScoreRow};
use crate::protocol::record::{MatchRecord, RecordError};
use crate::replay::cursor::{CursorError, ReplayCursor};

/// Receives notifications from a session.
pub trait ReplayObserver {
    /// A river's owner differs from what it was before the last seek.
    fn on_edge_ownership_changed(&mut self, edge: EdgeId, river: River, owner: Option<PlayerId>);

    /// Scores were recomputed for `report.turn`.
    fn on_scores_computed(&mut self, report: &ScoreReport);
}

/// Observer that ignores everything.
pub struct NullObserver;

impl ReplayObserver for NullObserver {
    fn on_edge_ownership_changed(&mut self, _: EdgeId, _: River, _: Option<PlayerId>) {}
    fn on_scores_computed(&mut self, _: &ScoreReport) {}
}

/// Errors surfaced by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Cursor(#[from] CursorError),

    #[error(transparent)]
    Move(#[from] MoveError),
}

/// Behavior switches for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Recompute and emit scores after every seek and live append.
    pub auto_score: bool,
    /// Include futures in recomputed scores.
    pub futures: bool,
    /// Limit live splurges to one river more than the punter's preceding
    /// consecutive passes.
    pub splurge_budget: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        SessionOptions {
            auto_score: true,
            futures: true,
            splurge_budget: false,
        }
    }
}

/// A river whose replayed final owner disagrees with the setup snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnershipMismatch {
    pub river: River,
    pub replayed: Option<PlayerId>,
    pub recorded: Option<PlayerId>,
}

/// Result of checking the replayed match against its recorded outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verification {
    pub scores: Vec<ScoreMismatch>,
    pub rivers: Vec<OwnershipMismatch>,
}

impl Verification {
    pub fn is_ok(&self) -> bool {
        self.scores.is_empty() && self.rivers.is_empty()
    }
}

/// One match being replayed.
pub struct ReplaySession {
    graph: GraphModel,
    distances: DistanceIndex,
    cursor: ReplayCursor,
    player_count: usize,
    /// Recorded scores after each move, parallel to the move list.
    recorded: Vec<Option<Vec<ScoreRow>>>,
    futures: Vec<Vec<Future>>,
    snapshot: Vec<(EdgeId, Option<PlayerId>)>,
    pending_seek: Option<i64>,
    pub options: SessionOptions,
}

impl ReplaySession {
    /// Builds a session from a parsed record. The cursor starts at turn 0.
    ///
    /// Fails if the map is invalid or any recorded move cannot be applied.
    pub fn from_record(record: &MatchRecord, options: SessionOptions) -> Result<Self, SessionError> {
        let graph = record.build_graph()?;
        let moves = record.to_moves()?;
        let mut session = ReplaySession::new(graph, record.punters, moves, options)?;
        session.recorded = record.recorded_scores();
        session.futures = record.futures_for(&session.graph);
        session.snapshot = record.snapshot_owners(&session.graph);
        Ok(session)
    }

    /// Builds a session from a map and a move list with no recorded scores.
    pub fn new(
        graph: GraphModel,
        player_count: usize,
        moves: Vec<Move>,
        options: SessionOptions,
    ) -> Result<Self, SessionError> {
        if player_count == 0 {
            return Err(RecordError::NoPunters.into());
        }
        if let Some((turn, mv)) = moves.iter().enumerate().find(|(_, m)| m.player() >= player_count) {
            return Err(RecordError::UnknownPlayer {
                turn,
                player: mv.player(),
                player_count,
            }
            .into());
        }

        let distances = DistanceIndex::compute(&graph);
        let move_count = moves.len();
        let mut cursor = ReplayCursor::new(graph.river_count(), moves);
        cursor.validate(&graph).map_err(|e| match e {
            CursorError::Move { turn, source } => {
                SessionError::Record(RecordError::IllegalMove { turn, source })
            }
            other => SessionError::Cursor(other),
        })?;

        info!(
            sites = graph.site_count(),
            rivers = graph.river_count(),
            mines = graph.mines().len(),
            punters = player_count,
            moves = move_count,
            "session loaded"
        );

        Ok(ReplaySession {
            graph,
            distances,
            cursor,
            player_count,
            recorded: vec![None; move_count],
            futures: Vec::new(),
            snapshot: Vec::new(),
            pending_seek: None,
            options,
        })
    }

    pub fn graph(&self) -> &GraphModel {
        &self.graph
    }

    pub fn distances(&self) -> &DistanceIndex {
        &self.distances
    }

    pub fn state(&self) -> &OwnershipState {
        self.cursor.state()
    }

    pub fn moves(&self) -> &[Move] {
        self.cursor.moves()
    }

    pub fn player_count(&self) -> usize {
        self.player_count
    }

    pub fn current_turn(&self) -> usize {
        self.cursor.current_turn()
    }

    pub fn move_count(&self) -> usize {
        self.cursor.move_count()
    }

    pub fn is_live(&self) -> bool {
        self.cursor.is_live()
    }

    /// Moves to `target` and notifies the observer of every river whose
    /// owner changed, then of the new scores when `auto_score` is on.
    pub fn seek<O: ReplayObserver + ?Sized>(&mut self, target: i64, observer: &mut O) -> Result<(), SessionError> {
        if target < 0 {
            return Err(CursorError::OutOfRange {
                target,
                move_count: self.move_count(),
            }
            .into());
        }
        let changes = self.cursor.seek(&self.graph, target as usize)?;
        self.notify(&changes, observer);
        Ok(())
    }

    /// Moves `delta` turns forward (or backward when negative).
    pub fn step<O: ReplayObserver + ?Sized>(&mut self, delta: i64, observer: &mut O) -> Result<(), SessionError> {
        let target = self.current_turn() as i64 + delta;
        self.seek(target, observer)
    }

    /// Queues a seek. Only the latest queued target is kept.
    pub fn request_seek(&mut self, target: i64) {
        if let Some(dropped) = self.pending_seek.replace(target) {
            debug!(dropped, target, "seek request superseded");
        }
    }

    /// Performs the queued seek, if any. Returns whether a seek ran.
    pub fn flush<O: ReplayObserver + ?Sized>(&mut self, observer: &mut O) -> Result<bool, SessionError> {
        match self.pending_seek.take() {
            Some(target) => {
                self.seek(target, observer)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Appends a move from a live feed.
    ///
    /// If the viewer was at the live edge it advances into the new move and
    /// the observer is notified. Illegal moves are rejected without touching
    /// the history. Returns whether the cursor advanced.
    pub fn push_move<O: ReplayObserver + ?Sized>(
        &mut self,
        mv: Move,
        recorded: Option<Vec<ScoreRow>>,
        observer: &mut O,
    ) -> Result<bool, SessionError> {
        if let Err(e) = self.check_live_move(&mv) {
            warn!(turn = self.move_count(), error = %e, "live move rejected");
            return Err(e.into());
        }

        let turn = self.move_count();
        let kind = mv.kind();
        let player = mv.player();
        let advanced = match self.cursor.push_move(&self.graph, mv) {
            Ok(advanced) => advanced,
            Err(e) => {
                warn!(turn, error = %e, "live move rejected");
                return Err(e.into());
            }
        };
        self.recorded.push(recorded);
        info!(turn, kind, player, live = advanced.is_some(), "move appended");

        match advanced {
            Some(changes) => {
                self.notify(&changes, observer);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Recomputes scores for the current turn.
    pub fn compute_scores(&self) -> Vec<ScoreRow> {
        let futures: &[Vec<Future>] = if self.options.futures { &self.futures } else { &[] };
        score_with_futures(
            self.cursor.state(),
            &self.distances,
            &self.graph,
            self.player_count,
            futures,
        )
    }

    /// Recomputed and recorded scores for the current turn.
    pub fn score_report(&self) -> ScoreReport {
        let turn = self.current_turn();
        let recorded = match turn {
            0 => None,
            t => self.recorded.get(t - 1).cloned().flatten(),
        };
        ScoreReport {
            turn,
            computed: self.compute_scores(),
            recorded,
        }
    }

    /// Computes the current scores and hands them to the observer.
    pub fn emit_scores<O: ReplayObserver + ?Sized>(&self, observer: &mut O) -> ScoreReport {
        let report = self.score_report();
        observer.on_scores_computed(&report);
        report
    }

    /// Replays to the end on a copy of the cursor and compares the result
    /// with the recorded final scores and the setup ownership snapshot.
    pub fn verify(&self) -> Result<Verification, SessionError> {
        let mut end = self.cursor.clone();
        end.seek(&self.graph, end.move_count())?;
        let futures: &[Vec<Future>] = if self.options.futures { &self.futures } else { &[] };
        let computed = score_with_futures(
            end.state(),
            &self.distances,
            &self.graph,
            self.player_count,
            futures,
        );

        let recorded = self.recorded.last().cloned().flatten();
        let report = ScoreReport {
            turn: end.current_turn(),
            computed,
            recorded,
        };

        let rivers = self
            .snapshot
            .iter()
            .filter_map(|&(edge, recorded)| {
                let replayed = end.state().owner(edge);
                let river = self.graph.river(edge)?;
                (replayed != recorded).then_some(OwnershipMismatch {
                    river,
                    replayed,
                    recorded,
                })
            })
            .collect();

        Ok(Verification {
            scores: report.mismatches(),
            rivers,
        })
    }

    fn check_live_move(&self, mv: &Move) -> Result<(), MoveError> {
        let player = mv.player();
        if player >= self.player_count {
            return Err(MoveError::UnknownPlayer {
                player,
                player_count: self.player_count,
            });
        }
        if self.options.splurge_budget && matches!(mv, Move::Splurge { .. }) {
            let passes = self
                .cursor
                .recent_moves_by(player)
                .take_while(|m| m.is_pass())
                .count();
            let length = mv.river_count();
            if length > passes + 1 {
                return Err(MoveError::SplurgeTooLong {
                    length,
                    budget: passes + 1,
                });
            }
        }
        Ok(())
    }

    fn notify<O: ReplayObserver + ?Sized>(&self, changes: &[EdgeChange], observer: &mut O) {
        for change in changes {
            if let Some(river) = self.graph.river(change.edge) {
                observer.on_edge_ownership_changed(change.edge, river, change.after);
            }
        }
        if self.options.auto_score {
            self.emit_scores(observer);
        }
    }
}
