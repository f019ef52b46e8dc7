//! Mine-distance scoring.
//!
//! For every mine and punter, a BFS walks only the rivers that punter owns.
//! Each site it reaches adds the square of that site's distance from the
//! mine on the full map. The reachable set reflects what the punter has
//! actually connected; the weight reflects how far the site is from the
//! mine regardless of ownership.
//!
//! Visited marks use a generation stamp so one buffer serves every BFS.

use std::collections::VecDeque;

use tracing::debug;

use super::futures::Future;
use crate::board::distance::DistanceIndex;
use crate::board::graph::GraphModel;
use crate::board::moves::PlayerId;
use crate::board::ownership::OwnershipState;

/// Score of one punter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreRow {
    pub player: PlayerId,
    pub basic: i64,
    pub futures: i64,
    pub total: i64,
}

impl ScoreRow {
    pub const fn zero(player: PlayerId) -> Self {
        ScoreRow {
            player,
            basic: 0,
            futures: 0,
            total: 0,
        }
    }
}

/// Scores every punter in `0..player_count` without futures.
pub fn score(
    state: &OwnershipState,
    distances: &DistanceIndex,
    graph: &GraphModel,
    player_count: usize,
) -> Vec<ScoreRow> {
    score_with_futures(state, distances, graph, player_count, &[])
}

/// Scores every punter, adding `+d^3` for each future whose target is
/// connected to its mine and `-d^3` for each one that is not.
///
/// `futures` is indexed by punter; missing entries mean no futures.
pub fn score_with_futures(
    state: &OwnershipState,
    distances: &DistanceIndex,
    graph: &GraphModel,
    player_count: usize,
    futures: &[Vec<Future>],
) -> Vec<ScoreRow> {
    let n = graph.site_count();
    let mut rows: Vec<ScoreRow> = (0..player_count).map(ScoreRow::zero).collect();
    let mut visited = vec![0u32; n];
    let mut stamp = 0u32;
    let mut queue = VecDeque::with_capacity(n);

    for slot in 0..distances.mine_count() {
        let mine = distances.mine_site_index(slot);
        let mine_id = graph.site_id(mine);

        for (player, row) in rows.iter_mut().enumerate() {
            stamp += 1;
            visited[mine] = stamp;
            queue.clear();
            queue.push_back(mine);

            while let Some(cur) = queue.pop_front() {
                for &(next, edge) in graph.adjacent(cur) {
                    if visited[next] == stamp || state.owner(edge) != Some(player) {
                        continue;
                    }
                    visited[next] = stamp;
                    if let Some(d) = distances.distance(slot, next) {
                        row.basic += i64::from(d) * i64::from(d);
                    }
                    queue.push_back(next);
                }
            }

            let bets = futures.get(player).map(Vec::as_slice).unwrap_or(&[]);
            for bet in bets.iter().filter(|f| f.mine == mine_id) {
                let Some(target) = graph.site_index(bet.target) else {
                    continue;
                };
                let Some(d) = distances.distance(slot, target) else {
                    continue;
                };
                let cube = i64::from(d).pow(3);
                if visited[target] == stamp {
                    row.futures += cube;
                } else {
                    row.futures -= cube;
                }
            }
        }
    }

    for row in rows.iter_mut() {
        row.total = row.basic + row.futures;
    }
    debug!(players = player_count, mines = distances.mine_count(), "scores computed");
    rows
}

/// A punter whose recomputed total differs from the recorded one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreMismatch {
    pub player: PlayerId,
    pub computed: i64,
    pub recorded: i64,
}

/// Scores for one turn: always the recomputed rows, plus the recorded rows
/// when the match record carries them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreReport {
    pub turn: usize,
    pub computed: Vec<ScoreRow>,
    pub recorded: Option<Vec<ScoreRow>>,
}

impl ScoreReport {
    /// Rows to show: recorded scores take precedence over recomputed ones.
    pub fn displayed(&self) -> &[ScoreRow] {
        self.recorded.as_deref().unwrap_or(&self.computed)
    }

    pub fn is_recorded(&self) -> bool {
        self.recorded.is_some()
    }

    /// Punters whose recomputed total disagrees with the recorded total.
    /// Empty when nothing was recorded for this turn.
    pub fn mismatches(&self) -> Vec<ScoreMismatch> {
        let Some(recorded) = &self.recorded else {
            return Vec::new();
        };
        self.computed
            .iter()
            .filter_map(|c| {
                let r = recorded.iter().find(|r| r.player == c.player)?;
                (r.total != c.total).then_some(ScoreMismatch {
                    player: c.player,
                    computed: c.total,
                    recorded: r.total,
                })
            })
            .collect()
    }
}
