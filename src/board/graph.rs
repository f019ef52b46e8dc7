//! Static map model: sites, rivers, and mines.
//!
//! Sites are stored in input order and addressed internally by a dense index
//! so that BFS buffers can be plain vectors. Rivers are undirected; each one is
//! stored once with its endpoints normalized (`a < b`) and recorded twice in
//! the adjacency lists, once per direction.

use std::collections::HashMap;

use thiserror::Error;

/// Identifier of a site as it appears in the match record.
pub type SiteId = u32;

/// Index of a river in `GraphModel::rivers`.
pub type EdgeId = usize;

/// Errors raised while building a `GraphModel` from setup data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("duplicate site id {0}")]
    DuplicateSite(SiteId),

    #[error("river {from}-{to} references unknown site {site}")]
    UnknownSite { from: SiteId, to: SiteId, site: SiteId },

    #[error("river {0}-{0} connects a site to itself")]
    SelfLoop(SiteId),

    #[error("duplicate river {0}-{1}")]
    DuplicateRiver(SiteId, SiteId),

    #[error("mine {0} is not a known site")]
    UnknownMine(SiteId),

    #[error("mine {0} listed more than once")]
    DuplicateMine(SiteId),
}

/// A vertex of the map. Coordinates are only carried for renderers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Site {
    pub id: SiteId,
    pub x: f64,
    pub y: f64,
}

impl Site {
    pub const fn new(id: SiteId, x: f64, y: f64) -> Self {
        Site { id, x, y }
    }
}

/// An undirected river with normalized endpoints (`a < b`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct River {
    pub a: SiteId,
    pub b: SiteId,
}

impl River {
    /// Builds a river from endpoints given in either order.
    pub fn new(source: SiteId, target: SiteId) -> Self {
        if source <= target {
            River { a: source, b: target }
        } else {
            River { a: target, b: source }
        }
    }
}

/// Immutable description of the map plus its adjacency lists.
#[derive(Debug, Clone)]
pub struct GraphModel {
    sites: Vec<Site>,
    index_of: HashMap<SiteId, usize>,
    rivers: Vec<River>,
    edge_of: HashMap<River, EdgeId>,
    /// Per dense site index: (neighbor dense index, edge).
    adjacency: Vec<Vec<(usize, EdgeId)>>,
    mines: Vec<SiteId>,
}

impl GraphModel {
    /// Validates the setup and builds adjacency in O(sites + rivers).
    ///
    /// `rivers` are `(source, target)` pairs in any orientation.
    pub fn build(
        sites: Vec<Site>,
        rivers: &[(SiteId, SiteId)],
        mines: &[SiteId],
    ) -> Result<GraphModel, GraphError> {
        let mut index_of = HashMap::with_capacity(sites.len());
        for (i, site) in sites.iter().enumerate() {
            if index_of.insert(site.id, i).is_some() {
                return Err(GraphError::DuplicateSite(site.id));
            }
        }

        let mut adjacency = vec![Vec::new(); sites.len()];
        let mut edge_of = HashMap::with_capacity(rivers.len());
        let mut normalized = Vec::with_capacity(rivers.len());

        for &(source, target) in rivers {
            let ia = lookup(&index_of, source, source, target)?;
            let ib = lookup(&index_of, target, source, target)?;
            if source == target {
                return Err(GraphError::SelfLoop(source));
            }
            let river = River::new(source, target);
            let edge = normalized.len();
            if edge_of.insert(river, edge).is_some() {
                return Err(GraphError::DuplicateRiver(river.a, river.b));
            }
            normalized.push(river);
            adjacency[ia].push((ib, edge));
            adjacency[ib].push((ia, edge));
        }

        let mut seen_mines = Vec::with_capacity(mines.len());
        for &mine in mines {
            if !index_of.contains_key(&mine) {
                return Err(GraphError::UnknownMine(mine));
            }
            if seen_mines.contains(&mine) {
                return Err(GraphError::DuplicateMine(mine));
            }
            seen_mines.push(mine);
        }

        Ok(GraphModel {
            sites,
            index_of,
            rivers: normalized,
            edge_of,
            adjacency,
            mines: seen_mines,
        })
    }

    pub fn site_count(&self) -> usize {
        self.sites.len()
    }

    pub fn river_count(&self) -> usize {
        self.rivers.len()
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn rivers(&self) -> &[River] {
        &self.rivers
    }

    pub fn mines(&self) -> &[SiteId] {
        &self.mines
    }

    pub fn is_mine(&self, site: SiteId) -> bool {
        self.mines.contains(&site)
    }

    /// Returns the normalized endpoints of an edge.
    pub fn river(&self, edge: EdgeId) -> Option<River> {
        self.rivers.get(edge).copied()
    }

    /// Finds the river joining two sites, regardless of endpoint order.
    pub fn edge_between(&self, source: SiteId, target: SiteId) -> Option<EdgeId> {
        self.edge_of.get(&River::new(source, target)).copied()
    }

    /// Dense index of a site, used to address BFS buffers.
    pub fn site_index(&self, site: SiteId) -> Option<usize> {
        self.index_of.get(&site).copied()
    }

    /// Site id at a dense index.
    pub fn site_id(&self, index: usize) -> SiteId {
        self.sites[index].id
    }

    /// Adjacency of a dense index as (neighbor dense index, edge).
    #[inline]
    pub fn adjacent(&self, index: usize) -> &[(usize, EdgeId)] {
        &self.adjacency[index]
    }

    /// Neighbors of a site as (neighbor id, edge). Empty for unknown sites.
    pub fn neighbors(&self, site: SiteId) -> impl Iterator<Item = (SiteId, EdgeId)> + '_ {
        let adj: &[(usize, EdgeId)] = match self.site_index(site) {
            Some(i) => &self.adjacency[i],
            None => &[],
        };
        adj.iter().map(|&(n, e)| (self.sites[n].id, e))
    }
}

fn lookup(
    index_of: &HashMap<SiteId, usize>,
    site: SiteId,
    source: SiteId,
    target: SiteId,
) -> Result<usize, GraphError> {
    index_of
        .get(&site)
        .copied()
        .ok_or(GraphError::UnknownSite {
            from: source,
            to: target,
            site,
        })
}
