use crate::libs::chaining::{target_runs, ChainScoring, SeedNode};
use crate::libs::nt::{AlignStrand, Strand};
use std::cmp::Reverse;
use std::ops::Range;

/// Scoring state of one node within a chaining pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Unscored,
    Scoring,
    Scored(i32),
}

/// The first node of a selected path and the path's score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathHead {
    pub node: usize,
    pub score: i32,
}

/// Chains the seed nodes of one query into high-scoring colinear paths.
///
/// Nodes must be sorted by (target, strand, query start, target start), which
/// places every possible successor of a node after it.
///
/// All state is per query; call [`PathAssembler::reset`] (or [`PathAssembler::assemble`],
/// which does it) before chaining a new node set.
#[derive(Debug, Clone)]
pub struct PathAssembler {
    scoring: ChainScoring,
    marks: Vec<Mark>,
    next: Vec<Option<usize>>,
    selected: Vec<bool>,
    head: Vec<bool>,
}

impl PathAssembler {
    pub fn new(scoring: ChainScoring) -> Self {
        Self {
            scoring,
            marks: vec![],
            next: vec![],
            selected: vec![],
            head: vec![],
        }
    }

    /// Clears all state for `n` nodes
    pub fn reset(&mut self, n: usize) {
        self.marks.clear();
        self.marks.resize(n, Mark::Unscored);
        self.next.clear();
        self.next.resize(n, None);
        self.selected.clear();
        self.selected.resize(n, false);
        self.head.clear();
        self.head.resize(n, false);
    }

    pub fn mark(&self, idx: usize) -> Mark {
        self.marks[idx]
    }

    pub fn next_of(&self, idx: usize) -> Option<usize> {
        self.next[idx]
    }

    pub fn is_selected(&self, idx: usize) -> bool {
        self.selected[idx]
    }

    pub fn is_head(&self, idx: usize) -> bool {
        self.head[idx]
    }

    /// Node indices along the chain starting at `head`
    pub fn path_nodes(&self, head: usize) -> Vec<usize> {
        std::iter::successors(Some(head), |&i| self.next[i]).collect()
    }

    // Candidate successors of `cur` within `run`
    fn successors<'a>(
        &'a self,
        nodes: &'a [SeedNode],
        run: &Range<usize>,
        cur: usize,
        from: usize,
    ) -> impl Iterator<Item = usize> + 'a {
        let node = nodes[cur];
        let limit = node.q_start + self.scoring.max_gap;
        (from..run.end)
            .take_while(move |&i| nodes[i].strand == node.strand && nodes[i].q_start <= limit)
            .filter(move |&i| !self.selected[i] && self.scoring.can_follow(&node, &nodes[i]))
    }

    /// Best score of any chain starting at `idx`, memoized across the current pass.
    ///
    /// The maximum over its successors of `successor score + own score - gap cost`,
    /// each floored at 0. When no successor scores above 0 the node keeps its own score.
    /// The chosen successor is kept as the node's next link. A node met while still
    /// being scored is skipped.
    ///
    /// Recursion runs on an explicit stack, so chain length is not limited by thread stack size.
    pub fn best_score_from(&mut self, nodes: &[SeedNode], run: &Range<usize>, idx: usize) -> i32 {
        if let Mark::Scored(score) = self.marks[idx] {
            return score;
        }

        // (node, first candidate not yet visited)
        let mut stack = vec![(idx, idx + 1)];
        self.marks[idx] = Mark::Scoring;

        while let Some(&(cur, from)) = stack.last() {
            let pending = self
                .successors(nodes, run, cur, from)
                .find(|&i| self.marks[i] == Mark::Unscored);

            match pending {
                Some(succ) => {
                    if let Some(top) = stack.last_mut() {
                        top.1 = succ + 1;
                    }
                    self.marks[succ] = Mark::Scoring;
                    stack.push((succ, succ + 1));
                }
                None => {
                    let score = self.settle(nodes, run, cur);
                    self.marks[cur] = Mark::Scored(score);
                    stack.pop();
                }
            }
        }

        match self.marks[idx] {
            Mark::Scored(score) => score,
            _ => 0,
        }
    }

    // All successors of `cur` are scored (or in progress); pick the best
    fn settle(&mut self, nodes: &[SeedNode], run: &Range<usize>, cur: usize) -> i32 {
        let node = nodes[cur];
        let own = self.scoring.intrinsic(&node);

        // a positive candidate replaces the node's own score, even a lower one
        let mut best = 0;
        let mut best_next = None;
        for succ in self.successors(nodes, run, cur, cur + 1) {
            let Mark::Scored(succ_score) = self.marks[succ] else {
                continue;
            };
            let put = (succ_score + own - self.scoring.gap_cost(&node, &nodes[succ])).max(0);
            if put > best {
                best = put;
                best_next = Some(succ);
            }
        }

        self.next[cur] = best_next;
        if best_next.is_some() {
            best
        } else {
            own
        }
    }

    /// Extracts up to `max_paths` non-overlapping paths on one strand of one target run.
    ///
    /// Each round rescores every unselected node and takes the best head. A path is
    /// accepted when its score reaches `min_path_score` and its aligned length covers
    /// `min_query_aligned_pct` of the query; the first failure ends extraction.
    ///
    /// Returns the number of accepted paths.
    pub fn extract_paths(
        &mut self,
        nodes: &[SeedNode],
        run: Range<usize>,
        strand: Strand,
        query_len: usize,
    ) -> usize {
        let mut paths = 0;

        while paths < self.scoring.max_paths {
            for i in run.clone() {
                if nodes[i].strand == strand && !self.selected[i] {
                    self.marks[i] = Mark::Unscored;
                    self.next[i] = None;
                    self.head[i] = false;
                }
            }

            let mut best = self.scoring.min_path_score - 1;
            let mut best_head = None;
            for i in run.clone() {
                if self.selected[i] || nodes[i].strand != strand {
                    continue;
                }
                let score = self.best_score_from(nodes, &run, i);
                if score > best {
                    best = score;
                    best_head = Some(i);
                }
            }

            let Some(head) = best_head else {
                break;
            };

            let chain = self.path_nodes(head);
            let aligned: usize = chain.iter().map(|&i| nodes[i].len).sum();
            if query_len == 0 || aligned * 100 / query_len < self.scoring.min_query_aligned_pct {
                break;
            }

            for &i in &chain {
                self.selected[i] = true;
            }
            self.head[head] = true;
            paths += 1;
        }

        paths
    }

    /// Chains every target run on the requested strands and returns the path heads,
    /// best score first, at most `max_paths` of them.
    pub fn assemble(
        &mut self,
        nodes: &[SeedNode],
        query_len: usize,
        strands: AlignStrand,
    ) -> Vec<PathHead> {
        self.reset(nodes.len());
        if nodes.is_empty() {
            return vec![];
        }

        let mut found = 0;
        for run in target_runs(nodes) {
            for &strand in strands.strands() {
                found += self.extract_paths(nodes, run.clone(), strand, query_len);
            }
        }
        if found == 0 {
            return vec![];
        }

        let mut heads: Vec<PathHead> = (0..nodes.len())
            .filter(|&i| self.head[i])
            .filter_map(|i| match self.marks[i] {
                Mark::Scored(score) => Some(PathHead { node: i, score }),
                _ => None,
            })
            .collect();
        heads.sort_by_key(|h| (Reverse(h.score), nodes[h.node].seq_idx, h.node));
        heads.truncate(self.scoring.max_paths);
        heads
    }
}
