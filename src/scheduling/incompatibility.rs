use std::collections::BTreeSet;

use crate::scheduling::operation::Operation;

/// Conflict graph over operations: an edge joins two operations whose
/// intervals overlap. Vertices are operation indices in input order.
///
/// Alongside the edges the graph keeps a clique cover: a list of cliques,
/// sorted and free of dominated entries, such that every edge and every
/// vertex lies in at least one of them. For interval conflicts these are
/// the maximal cliques, one per distinct busy instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncompatibilityGraph {
    adjacency: Vec<BTreeSet<usize>>,
    cliques: Vec<Vec<usize>>,
}

impl IncompatibilityGraph {
    /// Builds the graph by pairwise comparison, O(n^2).
    ///
    /// # Examples
    /// ```
    /// use room_colgen::{IncompatibilityGraph, Operation};
    ///
    /// let ops = vec![
    ///     Operation::new("1", 540, 600),
    ///     Operation::new("2", 570, 630),
    ///     Operation::new("3", 600, 660),
    /// ];
    /// let graph = IncompatibilityGraph::build(&ops);
    /// assert!(graph.conflicts(0, 1));
    /// assert!(!graph.conflicts(0, 2));
    /// ```
    pub fn build(operations: &[Operation]) -> Self {
        let n = operations.len();
        let mut adjacency = vec![BTreeSet::new(); n];
        for i in 0..n {
            for j in (i + 1)..n {
                if operations[i].overlaps(&operations[j]) {
                    adjacency[i].insert(j);
                    adjacency[j].insert(i);
                }
            }
        }
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by_key(|&i| (operations[i].start, operations[i].end, i));
        let cliques = drop_dominated(clique_cover(&adjacency, &order));
        Self { adjacency, cliques }
    }

    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    pub fn conflicts(&self, i: usize, j: usize) -> bool {
        self.adjacency.get(i).is_some_and(|n| n.contains(&j))
    }

    pub fn neighbors(&self, i: usize) -> impl Iterator<Item = usize> + '_ {
        self.adjacency[i].iter().copied()
    }

    pub fn degree(&self, i: usize) -> usize {
        self.adjacency[i].len()
    }

    /// Each undirected edge once, as `(i, j)` with `i < j`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.adjacency
            .iter()
            .enumerate()
            .flat_map(|(i, n)| n.range(i + 1..).map(move |&j| (i, j)))
    }

    pub fn edge_count(&self) -> usize {
        self.edges().count()
    }

    /// First conflicting pair among `members`, if any.
    pub fn find_conflict(&self, members: &[usize]) -> Option<(usize, usize)> {
        members.iter().enumerate().find_map(|(k, &i)| {
            members[k + 1..]
                .iter()
                .find(|&&j| self.conflicts(i, j))
                .map(|&j| (i, j))
        })
    }

    /// True when no two of `members` conflict.
    pub fn is_independent(&self, members: &[usize]) -> bool {
        self.find_conflict(members).is_none()
    }

    pub fn cliques(&self) -> &[Vec<usize>] {
        &self.cliques
    }

    /// The clique cover restricted to the vertices `keep` accepts, still
    /// covering every edge and vertex of the induced subgraph.
    pub fn cliques_among<F>(&self, keep: F) -> Vec<Vec<usize>>
    where
        F: Fn(usize) -> bool,
    {
        let projected = self
            .cliques
            .iter()
            .map(|clique| clique.iter().copied().filter(|&v| keep(v)).collect::<Vec<_>>())
            .filter(|clique| !clique.is_empty())
            .collect();
        drop_dominated(projected)
    }

    /// True when `candidate` conflicts with none of `members`.
    pub fn compatible_with(&self, candidate: usize, members: &[usize]) -> bool {
        members.iter().all(|&m| !self.conflicts(candidate, m))
    }
}

/// Visits vertices in `order` and grows a clique from each one over its
/// earlier neighbors. An earlier neighbor that does not fit is kept as an
/// edge clique of its own, so the cover never loses an edge.
fn clique_cover(adjacency: &[BTreeSet<usize>], order: &[usize]) -> Vec<Vec<usize>> {
    let mut position = vec![0; order.len()];
    for (p, &v) in order.iter().enumerate() {
        position[v] = p;
    }

    let mut cliques = Vec::with_capacity(order.len());
    for &k in order {
        let mut clique = vec![k];
        let mut leftover = Vec::new();
        for &i in adjacency[k].iter().filter(|&&i| position[i] < position[k]) {
            if clique.iter().all(|&m| m == k || adjacency[i].contains(&m)) {
                clique.push(i);
            } else {
                leftover.push(i);
            }
        }
        clique.sort_unstable();
        cliques.push(clique);
        for i in leftover {
            cliques.push(vec![i.min(k), i.max(k)]);
        }
    }
    cliques
}

/// Removes cliques contained in another one, keeping the first of equals.
fn drop_dominated(cliques: Vec<Vec<usize>>) -> Vec<Vec<usize>> {
    let dominated = |idx: usize, clique: &[usize]| {
        cliques.iter().enumerate().any(|(j, other)| {
            j != idx
                && (other.len() > clique.len() || (other.len() == clique.len() && j < idx))
                && clique.iter().all(|v| other.binary_search(v).is_ok())
        })
    };
    cliques
        .iter()
        .enumerate()
        .filter(|&(idx, clique)| !dominated(idx, clique.as_slice()))
        .map(|(_, clique)| clique.clone())
        .collect()
}
