//! Futures: per-punter bets that a mine will end up connected to a target.

use crate::board::graph::{GraphModel, SiteId};

/// A bet that `target` will be reachable from `mine` through the punter's
/// own rivers by the end of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Future {
    pub mine: SiteId,
    pub target: SiteId,
}

/// Keeps only well-formed futures: the source must be a mine, the target
/// must not be, and a later bet on the same mine replaces the earlier one.
///
/// The result is ordered by the first appearance of each mine.
pub fn filter_futures(graph: &GraphModel, requests: &[(SiteId, SiteId)]) -> Vec<Future> {
    let mut kept: Vec<Future> = Vec::with_capacity(requests.len());
    for &(mine, target) in requests {
        if !graph.is_mine(mine) || graph.is_mine(target) || graph.site_index(target).is_none() {
            continue;
        }
        match kept.iter_mut().find(|f| f.mine == mine) {
            Some(existing) => existing.target = target,
            None => kept.push(Future { mine, target }),
        }
    }
    kept
}
