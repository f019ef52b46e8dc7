//! Move representation.

use super::graph::{GraphModel, SiteId};

/// Identifier of a punter, `0..player_count`.
pub type PlayerId = usize;

/// A single recorded turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Move {
    /// Claim one unowned river.
    Claim {
        player: PlayerId,
        source: SiteId,
        target: SiteId,
    },
    /// Skip the turn.
    Pass { player: PlayerId },
    /// Claim every river along a route of consecutive sites.
    Splurge { player: PlayerId, route: Vec<SiteId> },
    /// Take over a river regardless of its current owner.
    Option {
        player: PlayerId,
        source: SiteId,
        target: SiteId,
    },
}

impl Move {
    pub fn player(&self) -> PlayerId {
        match self {
            Move::Claim { player, .. }
            | Move::Pass { player }
            | Move::Splurge { player, .. }
            | Move::Option { player, .. } => *player,
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Move::Pass { .. })
    }

    /// Short lowercase name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Move::Claim { .. } => "claim",
            Move::Pass { .. } => "pass",
            Move::Splurge { .. } => "splurge",
            Move::Option { .. } => "option",
        }
    }

    /// Site pairs this move touches, in route order. Pairs are not
    /// checked against the map.
    pub fn hops(&self) -> Vec<(SiteId, SiteId)> {
        match self {
            Move::Claim { source, target, .. } | Move::Option { source, target, .. } => {
                vec![(*source, *target)]
            }
            Move::Pass { .. } => Vec::new(),
            Move::Splurge { route, .. } => route.windows(2).map(|w| (w[0], w[1])).collect(),
        }
    }

    /// Number of rivers a splurge claims; 1 for claim/option, 0 for pass.
    pub fn river_count(&self) -> usize {
        match self {
            Move::Splurge { route, .. } => route.len().saturating_sub(1),
            Move::Pass { .. } => 0,
            _ => 1,
        }
    }

    /// True if every hop names an existing river.
    pub fn is_on_map(&self, graph: &GraphModel) -> bool {
        self.hops()
            .iter()
            .all(|&(s, t)| graph.edge_between(s, t).is_some())
    }
}
