//! Mine-to-site shortest path table.
//!
//! One BFS per mine over the full river set; ownership plays no part. The
//! table is a flat `mines x sites` vector with `-1` marking sites a mine
//! cannot reach.

use std::collections::VecDeque;

use tracing::warn;

use super::graph::{GraphModel, SiteId};

/// Hop counts from every mine to every site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceIndex {
    site_count: usize,
    mines: Vec<SiteId>,
    /// Dense index of each mine, parallel to `mines`.
    mine_index: Vec<usize>,
    dist: Vec<i32>,
}

impl DistanceIndex {
    /// Runs BFS from each mine of `graph`. Cost is O(mines * (sites + rivers)).
    pub fn compute(graph: &GraphModel) -> Self {
        let n = graph.site_count();
        let mines = graph.mines().to_vec();
        let mut mine_index = Vec::with_capacity(mines.len());
        let mut dist = vec![-1i32; mines.len() * n];
        let mut queue = VecDeque::with_capacity(n);

        for (slot, &mine) in mines.iter().enumerate() {
            // GraphModel::build guarantees mines are known sites.
            let Some(src) = graph.site_index(mine) else {
                mine_index.push(usize::MAX);
                continue;
            };
            mine_index.push(src);

            let row = &mut dist[slot * n..(slot + 1) * n];
            row[src] = 0;
            queue.clear();
            queue.push_back(src);

            while let Some(cur) = queue.pop_front() {
                let d = row[cur];
                for &(next, _) in graph.adjacent(cur) {
                    if row[next] == -1 {
                        row[next] = d + 1;
                        queue.push_back(next);
                    }
                }
            }

            let unreachable = row.iter().filter(|&&d| d < 0).count();
            if unreachable > 0 {
                warn!(mine, unreachable, "mine cannot reach every site");
            }
        }

        DistanceIndex {
            site_count: n,
            mines,
            mine_index,
            dist,
        }
    }

    pub fn mine_count(&self) -> usize {
        self.mines.len()
    }

    pub fn mines(&self) -> &[SiteId] {
        &self.mines
    }

    /// Dense index of the mine stored in `slot`.
    pub fn mine_site_index(&self, slot: usize) -> usize {
        self.mine_index[slot]
    }

    /// Hop count from the mine in `slot` to the site at dense index `site`.
    #[inline]
    pub fn distance(&self, slot: usize, site: usize) -> Option<u32> {
        let d = self.dist[slot * self.site_count + site];
        (d >= 0).then_some(d as u32)
    }

    /// Hop count between a mine and a site, addressed by ids.
    pub fn distance_between(&self, graph: &GraphModel, mine: SiteId, site: SiteId) -> Option<u32> {
        let slot = self.mines.iter().position(|&m| m == mine)?;
        let idx = graph.site_index(site)?;
        self.distance(slot, idx)
    }

    /// Sites the mine in `slot` cannot reach, by id.
    pub fn unreachable_from(&self, graph: &GraphModel, slot: usize) -> Vec<SiteId> {
        (0..self.site_count)
            .filter(|&i| self.distance(slot, i).is_none())
            .map(|i| graph.site_id(i))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::graph::tests::sample_graph;
    use crate::board::graph::Site;

    #[test]
    fn mine_distance_to_itself_is_zero() {
        let g = sample_graph();
        let idx = DistanceIndex::compute(&g);
        assert_eq!(idx.mine_count(), 2);
        assert_eq!(idx.distance_between(&g, 1, 1), Some(0));
        assert_eq!(idx.distance_between(&g, 5, 5), Some(0));
    }

    #[test]
    fn sample_distances_from_mine_1() {
        let g = sample_graph();
        let idx = DistanceIndex::compute(&g);
        let expected: [u32; 8] = [1, 0, 1, 1, 2, 2, 2, 1];
        for (site, &d) in expected.iter().enumerate() {
            assert_eq!(idx.distance_between(&g, 1, site as SiteId), Some(d), "site {site}");
        }
    }

    #[test]
    fn bfs_layering_holds_on_every_river() {
        let g = sample_graph();
        let idx = DistanceIndex::compute(&g);
        for slot in 0..idx.mine_count() {
            for i in 0..g.site_count() {
                let di = idx.distance(slot, i).unwrap() as i64;
                for &(j, _) in g.adjacent(i) {
                    let dj = idx.distance(slot, j).unwrap() as i64;
                    assert!((di - dj).abs() <= 1);
                }
            }
        }
    }

    #[test]
    fn disconnected_sites_are_unreachable() {
        let sites = (0..4).map(|i| Site::new(i, 0.0, 0.0)).collect();
        let g = GraphModel::build(sites, &[(0, 1), (2, 3)], &[0]).unwrap();
        let idx = DistanceIndex::compute(&g);
        assert_eq!(idx.distance_between(&g, 0, 1), Some(1));
        assert_eq!(idx.distance_between(&g, 0, 3), None);
        assert_eq!(idx.unreachable_from(&g, 0), vec![2, 3]);
    }

    #[test]
    fn no_mines_gives_empty_index() {
        let sites = (0..2).map(|i| Site::new(i, 0.0, 0.0)).collect();
        let g = GraphModel::build(sites, &[(0, 1)], &[]).unwrap();
        let idx = DistanceIndex::compute(&g);
        assert_eq!(idx.mine_count(), 0);
        assert_eq!(idx.distance_between(&g, 0, 1), None);
    }
}
