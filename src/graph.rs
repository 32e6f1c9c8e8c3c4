/*!
Variable interaction (primal) graph of a CNF formula and the greedy cutset heuristic
used to split it.

Vertices are variable indices. Two vertices are adjacent if and only if the two variables
occur together in some clause.
*/

use std::{cmp::Reverse, collections::BTreeSet};

use crate::formula::Clause;

/// Default bound on the cutset size. At most `2^7` assignments are enumerated.
pub const DEFAULT_MAX_CUTSET_SIZE: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionGraph {
    adjacency: Vec<BTreeSet<usize>>,
}

impl InteractionGraph {
    /// Creates a graph with `num_vertices` isolated vertices.
    pub fn new(num_vertices: usize) -> Self {
        InteractionGraph {
            adjacency: vec![BTreeSet::new(); num_vertices],
        }
    }

    /// Builds the primal graph: every pair of variables sharing a clause is connected.
    /// Clauses must only mention variables below `num_variables`.
    pub fn from_clauses(num_variables: usize, clauses: &[Clause]) -> Self {
        let mut graph = InteractionGraph::new(num_variables);
        for clause in clauses {
            let literals = clause.literals();
            for (i, first) in literals.iter().enumerate() {
                for second in &literals[i + 1..] {
                    graph.add_edge(first.index(), second.index());
                }
            }
        }
        graph
    }

    pub fn num_vertices(&self) -> usize {
        self.adjacency.len()
    }

    pub fn num_edges(&self) -> usize {
        self.adjacency.iter().map(BTreeSet::len).sum::<usize>() / 2
    }

    pub fn degree(&self, vertex: usize) -> usize {
        self.adjacency[vertex].len()
    }

    pub fn neighbors(&self, vertex: usize) -> impl Iterator<Item = usize> + '_ {
        self.adjacency[vertex].iter().copied()
    }

    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        self.adjacency[u].contains(&v)
    }

    /// Inserts the undirected edge `u - v`. Self-loops are ignored, and so is an edge that
    /// is already present.
    pub fn add_edge(&mut self, u: usize, v: usize) {
        if u != v {
            self.adjacency[u].insert(v);
            self.adjacency[v].insert(u);
        }
    }

    /// Greedily selects vertices by decreasing degree (ties by increasing index) until the
    /// remaining vertices are disconnected or the cutset holds `max_size + 1` vertices.
    ///
    /// The result may still leave the remainder connected, in which case it either has more
    /// than `max_size` vertices or contains every vertex of the graph.
    pub fn find_cutset(&self, max_size: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.num_vertices()).collect();
        order.sort_by_key(|&vertex| (Reverse(self.degree(vertex)), vertex));

        let mut cutset = Vec::new();
        let mut is_cut = vec![false; self.num_vertices()];

        for vertex in order {
            if cutset.len() > max_size {
                break;
            }

            cutset.push(vertex);
            is_cut[vertex] = true;

            if !self.is_connected(&is_cut) {
                debug!("Graph disconnected by a cutset of size {}", cutset.len());
                return cutset;
            }
        }

        cutset
    }

    /// Returns true if every vertex outside the cut is reachable from every other one
    /// without passing through a cut vertex. Vacuously true when everything is cut.
    pub fn is_connected(&self, is_cut: &[bool]) -> bool {
        let start = match (0..self.num_vertices()).find(|&vertex| !is_cut[vertex]) {
            Some(start) => start,
            None => return true,
        };

        let visited = self.reachable_from(start, is_cut);
        (0..self.num_vertices()).all(|vertex| is_cut[vertex] || visited[vertex])
    }

    /// Marks all vertices reachable from `start` over non-cut vertices.
    /// Traversal uses an explicit stack so depth does not grow with the input.
    pub fn reachable_from(&self, start: usize, is_cut: &[bool]) -> Vec<bool> {
        let mut visited = vec![false; self.num_vertices()];
        let mut stack = vec![start];
        visited[start] = true;

        while let Some(vertex) = stack.pop() {
            for next in self.neighbors(vertex) {
                if !visited[next] && !is_cut[next] {
                    visited[next] = true;
                    stack.push(next);
                }
            }
        }

        visited
    }
}

/// Converts a list of cut vertices into a membership bitmap over `num_vertices`.
pub fn cut_mask(num_vertices: usize, cutset: &[usize]) -> Vec<bool> {
    let mut is_cut = vec![false; num_vertices];
    for &vertex in cutset {
        is_cut[vertex] = true;
    }
    is_cut
}
