//! Households as connected components of the match-pair graph.
//!
//! Membership is transitive: records joined only through a chain of matches
//! still land in one household. A threshold that admits a few weak links can
//! therefore merge otherwise separate households.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::matching::MatchPair;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Household {
    /// Dense id in discovery order.
    pub id: usize,
    /// Member positions, ascending. Never empty.
    pub members: Vec<usize>,
}

impl Household {
    /// Lowest member position; its record represents the household.
    pub fn representative(&self) -> usize {
        self.members[0]
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }
}

/// Undirected adjacency lists indexed by record position.
#[derive(Debug, Clone, Default)]
pub struct MatchGraph {
    adjacency: Vec<Vec<usize>>,
}

impl MatchGraph {
    pub fn new(n_records: usize, pairs: &[MatchPair]) -> Self {
        let mut adjacency = vec![Vec::new(); n_records];
        for p in pairs {
            if p.a >= n_records || p.b >= n_records {
                log::warn!(
                    "match pair ({}, {}) outside {} records; ignored",
                    p.a,
                    p.b,
                    n_records
                );
                continue;
            }
            adjacency[p.a].push(p.b);
            adjacency[p.b].push(p.a);
        }
        Self { adjacency }
    }

    pub fn neighbors(&self, position: usize) -> &[usize] {
        self.adjacency
            .get(position)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Breadth-first component containing `start`, sorted ascending.
    fn component(&self, start: usize, assigned: &mut [bool]) -> Vec<usize> {
        let mut queue = VecDeque::from([start]);
        let mut visited = vec![start];
        assigned[start] = true;
        while let Some(curr) = queue.pop_front() {
            for &next in self.neighbors(curr) {
                if !assigned[next] {
                    assigned[next] = true;
                    visited.push(next);
                    queue.push_back(next);
                }
            }
        }
        visited.sort_unstable();
        visited
    }

    /// Partition `[0, n)` into households, scanning positions in order.
    pub fn households(&self) -> Vec<Household> {
        let n = self.adjacency.len();
        let mut assigned = vec![false; n];
        let mut out = Vec::new();
        for position in 0..n {
            if assigned[position] {
                continue;
            }
            let members = if self.adjacency[position].is_empty() {
                assigned[position] = true;
                vec![position]
            } else {
                self.component(position, &mut assigned)
            };
            out.push(Household {
                id: out.len(),
                members,
            });
        }
        out
    }
}

pub fn build_households(n_records: usize, match_pairs: &[MatchPair]) -> Vec<Household> {
    MatchGraph::new(n_records, match_pairs).households()
}
