//! JSON match records.
//!
//! A record holds the map setup, the punter count, and the ordered moves.
//! Each move is an object with exactly one of `claim`, `pass`, `splurge` or
//! `option`, and may carry the authoritative `scores` after that turn.
//!
//! ```json
//! { "setup": { "sites": [{"id": 0, "x": 0.0, "y": 0.0}],
//!              "rivers": [{"source": 0, "target": 1}],
//!              "mines": [0] },
//!   "punters": 2,
//!   "moves": [ {"claim": {"punter": 0, "source": 0, "target": 1}},
//!              {"pass": {"punter": 1}, "scores": [{"score": 1}, {"score": 0}]} ],
//!   "futures": [[{"source": 0, "target": 1}], []] }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::graph::{EdgeId, GraphError, GraphModel, Site, SiteId};
use crate::board::moves::{Move, PlayerId};
use crate::board::ownership::MoveError;
use crate::eval::futures::{filter_futures, Future};
use crate::eval::score::ScoreRow;

/// Errors raised while reading or checking a match record.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed match record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid map: {0}")]
    InvalidGraph(#[from] GraphError),

    #[error("match has no punters")]
    NoPunters,

    #[error("move {turn} has no claim, pass, splurge or option")]
    MissingAction { turn: usize },

    #[error("move {turn} is by punter {player}, but the match has {player_count}")]
    UnknownPlayer {
        turn: usize,
        player: PlayerId,
        player_count: usize,
    },

    #[error("recorded move {turn} is illegal: {source}")]
    IllegalMove {
        turn: usize,
        #[source]
        source: MoveError,
    },
}

/// Top-level match record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub setup: SetupRecord,
    pub punters: usize,
    #[serde(default)]
    pub moves: Vec<MoveRecord>,
    /// Futures per punter, indexed by punter id.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub futures: Vec<Vec<FutureRecord>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupRecord {
    pub sites: Vec<SiteRecord>,
    pub rivers: Vec<RiverRecord>,
    #[serde(default)]
    pub mines: Vec<SiteId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteRecord {
    pub id: SiteId,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

/// A river in the setup. `owned_by` is the server's final snapshot, with
/// negative values meaning unowned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiverRecord {
    pub source: SiteId,
    pub target: SiteId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owned_by: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeClaim {
    pub punter: PlayerId,
    pub source: SiteId,
    pub target: SiteId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassRecord {
    pub punter: PlayerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplurgeRecord {
    pub punter: PlayerId,
    pub route: Vec<SiteId>,
}

/// One move. Exactly one action field is expected to be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoveRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim: Option<EdgeClaim>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass: Option<PassRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub splurge: Option<SplurgeRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option: Option<EdgeClaim>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<Vec<ScoreRecord>>,
}

/// Authoritative score of one punter. Entries without `punter` are
/// positional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub punter: Option<PlayerId>,
    pub score: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_score: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub futures_score: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FutureRecord {
    pub source: SiteId,
    pub target: SiteId,
}

impl MatchRecord {
    /// Parses a record from a JSON string.
    pub fn from_json(json: &str) -> Result<MatchRecord, RecordError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a record from a file.
    pub fn load(path: &Path) -> Result<MatchRecord, RecordError> {
        let data = fs::read_to_string(path).map_err(|source| RecordError::Io {
            path: path.display().to_string(),
            source,
        })?;
        MatchRecord::from_json(&data)
    }

    /// Builds and validates the map.
    pub fn build_graph(&self) -> Result<GraphModel, RecordError> {
        let sites = self
            .setup
            .sites
            .iter()
            .map(|s| Site::new(s.id, s.x, s.y))
            .collect();
        let rivers: Vec<(SiteId, SiteId)> = self
            .setup
            .rivers
            .iter()
            .map(|r| (r.source, r.target))
            .collect();
        Ok(GraphModel::build(sites, &rivers, &self.setup.mines)?)
    }

    /// Converts every move record, checking punter ids.
    pub fn to_moves(&self) -> Result<Vec<Move>, RecordError> {
        if self.punters == 0 {
            return Err(RecordError::NoPunters);
        }
        self.moves
            .iter()
            .enumerate()
            .map(|(turn, m)| {
                let mv = m.to_move().ok_or(RecordError::MissingAction { turn })?;
                if mv.player() >= self.punters {
                    return Err(RecordError::UnknownPlayer {
                        turn,
                        player: mv.player(),
                        player_count: self.punters,
                    });
                }
                Ok(mv)
            })
            .collect()
    }

    /// Recorded scores after each move, parallel to `moves`.
    pub fn recorded_scores(&self) -> Vec<Option<Vec<ScoreRow>>> {
        self.moves
            .iter()
            .map(|m| m.scores.as_deref().map(score_rows))
            .collect()
    }

    /// Well-formed futures per punter. Punters without an entry get none.
    pub fn futures_for(&self, graph: &GraphModel) -> Vec<Vec<Future>> {
        (0..self.punters)
            .map(|p| {
                let requests: Vec<(SiteId, SiteId)> = self
                    .futures
                    .get(p)
                    .map(|fs| fs.iter().map(|f| (f.source, f.target)).collect())
                    .unwrap_or_default();
                filter_futures(graph, &requests)
            })
            .collect()
    }

    /// Final owners from the setup snapshot, for rivers that carry one.
    pub fn snapshot_owners(&self, graph: &GraphModel) -> Vec<(EdgeId, Option<PlayerId>)> {
        self.setup
            .rivers
            .iter()
            .filter_map(|r| {
                let owned = r.owned_by?;
                let edge = graph.edge_between(r.source, r.target)?;
                let owner = usize::try_from(owned).ok();
                Some((edge, owner))
            })
            .collect()
    }
}

impl MoveRecord {
    /// Parses a single move object, as sent by a live feed.
    pub fn from_json(json: &str) -> Result<MoveRecord, RecordError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Returns the move this record describes. The first set field wins in
    /// the order claim, pass, splurge, option.
    pub fn to_move(&self) -> Option<Move> {
        if let Some(c) = &self.claim {
            return Some(Move::Claim {
                player: c.punter,
                source: c.source,
                target: c.target,
            });
        }
        if let Some(p) = &self.pass {
            return Some(Move::Pass { player: p.punter });
        }
        if let Some(s) = &self.splurge {
            return Some(Move::Splurge {
                player: s.punter,
                route: s.route.clone(),
            });
        }
        self.option.as_ref().map(|o| Move::Option {
            player: o.punter,
            source: o.source,
            target: o.target,
        })
    }

    /// Recorded scores carried by this move, if any.
    pub fn score_rows(&self) -> Option<Vec<ScoreRow>> {
        self.scores.as_deref().map(score_rows)
    }
}

/// Converts recorded scores into rows. A missing basic score is derived
/// from the total minus the futures score.
fn score_rows(records: &[ScoreRecord]) -> Vec<ScoreRow> {
    records
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let futures = r.futures_score.unwrap_or(0);
            ScoreRow {
                player: r.punter.unwrap_or(i),
                basic: r.basic_score.unwrap_or(r.score - futures),
                futures,
                total: r.score,
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Sample map, one punter claiming every river, with final scores.
    pub(crate) const SAMPLE_MATCH: &str = r#"{
        "setup": {
            "sites": [
                {"id": 4, "x": 2.0, "y": -2.0}, {"id": 1, "x": 1.0, "y": 0.0},
                {"id": 3, "x": 2.0, "y": -1.0}, {"id": 6, "x": 0.0, "y": -2.0},
                {"id": 5, "x": 1.0, "y": -2.0}, {"id": 0, "x": 0.0, "y": 0.0},
                {"id": 7, "x": 0.0, "y": -1.0}, {"id": 2, "x": 2.0, "y": 0.0}
            ],
            "rivers": [
                {"source": 3, "target": 4, "owned_by": 0}, {"source": 0, "target": 1, "owned_by": 0},
                {"source": 2, "target": 3, "owned_by": 0}, {"source": 1, "target": 3, "owned_by": 0},
                {"source": 5, "target": 6, "owned_by": 0}, {"source": 4, "target": 5, "owned_by": 0},
                {"source": 3, "target": 5, "owned_by": 0}, {"source": 6, "target": 7, "owned_by": 0},
                {"source": 5, "target": 7, "owned_by": 0}, {"source": 1, "target": 7, "owned_by": 0},
                {"source": 0, "target": 7, "owned_by": 0}, {"source": 1, "target": 2, "owned_by": 0}
            ],
            "mines": [1, 5]
        },
        "punters": 1,
        "moves": [
            {"claim": {"punter": 0, "source": 3, "target": 4}},
            {"claim": {"punter": 0, "source": 1, "target": 0}},
            {"claim": {"punter": 0, "source": 2, "target": 3}},
            {"claim": {"punter": 0, "source": 1, "target": 3}},
            {"claim": {"punter": 0, "source": 6, "target": 5}},
            {"claim": {"punter": 0, "source": 4, "target": 5}},
            {"claim": {"punter": 0, "source": 3, "target": 5}},
            {"claim": {"punter": 0, "source": 7, "target": 6}},
            {"claim": {"punter": 0, "source": 5, "target": 7}},
            {"claim": {"punter": 0, "source": 1, "target": 7}},
            {"claim": {"punter": 0, "source": 0, "target": 7}},
            {"claim": {"punter": 0, "source": 2, "target": 1},
             "scores": [{"punter": 0, "score": 32, "basic_score": 32, "futures_score": 0}]}
        ]
    }"#;

    #[test]
    fn parse_sample_match() {
        let record = MatchRecord::from_json(SAMPLE_MATCH).unwrap();
        assert_eq!(record.punters, 1);
        assert_eq!(record.setup.sites.len(), 8);
        assert_eq!(record.setup.rivers.len(), 12);
        assert_eq!(record.moves.len(), 12);

        let graph = record.build_graph().unwrap();
        assert_eq!(graph.mines(), &[1, 5]);
        let moves = record.to_moves().unwrap();
        assert_eq!(
            moves[1],
            Move::Claim {
                player: 0,
                source: 1,
                target: 0
            }
        );
    }

    #[test]
    fn scores_only_on_final_move() {
        let record = MatchRecord::from_json(SAMPLE_MATCH).unwrap();
        let scores = record.recorded_scores();
        assert!(scores[..11].iter().all(|s| s.is_none()));
        let last = scores[11].as_ref().unwrap();
        assert_eq!(
            last[0],
            ScoreRow {
                player: 0,
                basic: 32,
                futures: 0,
                total: 32
            }
        );
    }

    #[test]
    fn parse_every_move_kind() {
        let json = r#"[
            {"claim": {"punter": 0, "source": 1, "target": 2}},
            {"pass": {"punter": 1}},
            {"splurge": {"punter": 0, "route": [1, 2, 3]}},
            {"option": {"punter": 1, "source": 2, "target": 1}}
        ]"#;
        let records: Vec<MoveRecord> = serde_json::from_str(json).unwrap();
        let kinds: Vec<&str> = records.iter().map(|r| r.to_move().unwrap().kind()).collect();
        assert_eq!(kinds, vec!["claim", "pass", "splurge", "option"]);
    }

    #[test]
    fn move_without_action_is_rejected() {
        let mut record = MatchRecord::from_json(SAMPLE_MATCH).unwrap();
        record.moves.push(MoveRecord::default());
        assert!(matches!(
            record.to_moves(),
            Err(RecordError::MissingAction { turn: 12 })
        ));
    }

    #[test]
    fn move_by_unknown_punter_is_rejected() {
        let mut record = MatchRecord::from_json(SAMPLE_MATCH).unwrap();
        record.moves[0] = MoveRecord::from_json(r#"{"pass": {"punter": 3}}"#).unwrap();
        assert!(matches!(
            record.to_moves(),
            Err(RecordError::UnknownPlayer { turn: 0, player: 3, player_count: 1 })
        ));
    }

    #[test]
    fn unknown_river_site_is_invalid_graph() {
        let mut record = MatchRecord::from_json(SAMPLE_MATCH).unwrap();
        record.setup.rivers.push(RiverRecord {
            source: 0,
            target: 99,
            owned_by: None,
        });
        assert!(matches!(
            record.build_graph(),
            Err(RecordError::InvalidGraph(GraphError::UnknownSite { site: 99, .. }))
        ));
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(matches!(MatchRecord::from_json("{"), Err(RecordError::Json(_))));
    }

    #[test]
    fn positional_scores_and_derived_basic() {
        let m = MoveRecord::from_json(
            r#"{"pass": {"punter": 0}, "scores": [{"score": 10, "futures_score": 8}, {"score": 3}]}"#,
        )
        .unwrap();
        let rows = m.score_rows().unwrap();
        assert_eq!(rows[0].player, 0);
        assert_eq!(rows[0].basic, 2);
        assert_eq!(rows[1].player, 1);
        assert_eq!(rows[1].basic, 3);
    }

    #[test]
    fn futures_are_filtered_per_punter() {
        let mut record = MatchRecord::from_json(SAMPLE_MATCH).unwrap();
        record.punters = 2;
        record.futures = vec![vec![
            FutureRecord { source: 1, target: 4 },
            FutureRecord { source: 4, target: 6 },
        ]];
        let graph = record.build_graph().unwrap();
        let futures = record.futures_for(&graph);
        assert_eq!(futures.len(), 2);
        assert_eq!(futures[0], vec![Future { mine: 1, target: 4 }]);
        assert!(futures[1].is_empty());
    }

    #[test]
    fn snapshot_owners_read_owned_by() {
        let mut record = MatchRecord::from_json(SAMPLE_MATCH).unwrap();
        record.setup.rivers[0].owned_by = Some(-1);
        record.setup.rivers[1].owned_by = None;
        let graph = record.build_graph().unwrap();
        let snap = record.snapshot_owners(&graph);
        assert_eq!(snap.len(), 11);
        assert_eq!(snap[0], (graph.edge_between(3, 4).unwrap(), None));
        assert_eq!(snap[1].1, Some(0));
    }
}
