use crate::libs::nt::Strand;
use itertools::Itertools;
use std::ops::Range;

/// A hit of one query onto one target sequence.
///
/// For antisense nodes `q_start` is an offset on the reverse-complemented query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedNode {
    pub q_start: usize,
    pub seq_idx: usize,
    pub t_start: usize,
    pub len: usize,
    pub mismatches: usize,
    pub strand: Strand,
}

impl SeedNode {
    /// Exclusive
    pub fn q_end(&self) -> usize {
        self.q_start + self.len
    }

    /// Exclusive
    pub fn t_end(&self) -> usize {
        self.t_start + self.len
    }
}

/// All nodes of one query, kept sorted by (target, strand, query start, target start)
#[derive(Debug, Default, Clone)]
pub struct SeedNodeSet {
    nodes: Vec<SeedNode>,
}

impl SeedNodeSet {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn push(&mut self, node: SeedNode) {
        self.nodes.push(node);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn as_slice(&self) -> &[SeedNode] {
        &self.nodes
    }

    pub fn sort(&mut self) {
        self.nodes
            .sort_by_key(|n| (n.seq_idx, n.strand, n.q_start, n.t_start));
    }
}

impl From<Vec<SeedNode>> for SeedNodeSet {
    fn from(nodes: Vec<SeedNode>) -> Self {
        let mut set = Self { nodes };
        set.sort();
        set
    }
}

/// Index ranges sharing one target sequence. Assumes sorted nodes.
pub fn target_runs(nodes: &[SeedNode]) -> Vec<Range<usize>> {
    let mut runs = vec![];
    let mut start = 0;
    for (_, group) in &nodes.iter().chunk_by(|n| n.seq_idx) {
        let end = start + group.count();
        runs.push(start..end);
        start = end;
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(seq_idx: usize, strand: Strand, q_start: usize, t_start: usize) -> SeedNode {
        SeedNode {
            q_start,
            seq_idx,
            t_start,
            len: 10,
            mismatches: 0,
            strand,
        }
    }

    #[test]
    fn sorted_and_split() {
        let set = SeedNodeSet::from(vec![
            node(2, Strand::Sense, 0, 5),
            node(0, Strand::Antisense, 3, 1),
            node(0, Strand::Sense, 7, 0),
            node(0, Strand::Sense, 7, 2),
            node(2, Strand::Sense, 0, 1),
        ]);
        let order: Vec<_> = set
            .as_slice()
            .iter()
            .map(|n| (n.seq_idx, n.strand, n.q_start, n.t_start))
            .collect();
        assert_eq!(
            order,
            vec![
                (0, Strand::Sense, 7, 0),
                (0, Strand::Sense, 7, 2),
                (0, Strand::Antisense, 3, 1),
                (2, Strand::Sense, 0, 1),
                (2, Strand::Sense, 0, 5),
            ]
        );
        assert_eq!(target_runs(set.as_slice()), vec![0..3, 3..5]);
    }

    #[test]
    fn empty_runs() {
        assert!(target_runs(SeedNodeSet::new().as_slice()).is_empty());
    }
}
