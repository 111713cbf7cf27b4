use crate::libs::chaining::SeedNode;
use std::cmp;

/// Scores and thresholds used when chaining seed nodes into paths.
///
/// Defaults reproduce the aligner's historical settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainScoring {
    pub match_reward: i32,
    pub mismatch_penalty: i32,
    pub gap_open: i32,
    /// Added for every 10bp of gap
    pub gap_extend: i32,
    /// Ceiling on the length-dependent part of the gap cost
    pub gap_extend_cap: i32,
    /// Successors may overlap their predecessor by this many bases
    pub overlap_slack: usize,
    pub max_gap: usize,
    pub min_path_score: i32,
    /// Percentage of the query a path must cover
    pub min_query_aligned_pct: usize,
    pub max_paths: usize,
}

impl Default for ChainScoring {
    fn default() -> Self {
        Self {
            match_reward: 1,
            mismatch_penalty: 2,
            gap_open: 5,
            gap_extend: 1,
            gap_extend_cap: 10,
            overlap_slack: 8,
            max_gap: 100_000,
            min_path_score: 75,
            min_query_aligned_pct: 25,
            max_paths: 10,
        }
    }
}

impl ChainScoring {
    /// Score of a node on its own, never negative
    pub fn intrinsic(&self, node: &SeedNode) -> i32 {
        let mm = node.mismatches as i32;
        let score = (node.len as i32 - mm) * self.match_reward - mm * self.mismatch_penalty;
        cmp::max(score, 0)
    }

    /// Cost of jumping from the end of `from` to the start of `to`.
    ///
    /// The query and target gaps are combined as a Euclidean distance, charged at
    /// `gap_extend` per 10bp up to `gap_extend_cap`, plus `gap_open`.
    ///
    /// # Arguments
    ///
    /// * `from` - The upstream node.
    /// * `to` - The downstream node.
    pub fn gap_cost(&self, from: &SeedNode, to: &SeedNode) -> i32 {
        let q_gap = to.q_start.abs_diff(from.q_end()) as f64;
        let t_gap = to.t_start.abs_diff(from.t_end()) as f64;
        let gap_len = (q_gap * q_gap + t_gap * t_gap).sqrt() as i32;

        let extend = cmp::min(1 + (gap_len / 10) * self.gap_extend, self.gap_extend_cap);
        extend + self.gap_open
    }

    /// Whether `to` may follow `from` in a chain: same strand, colinear, within the
    /// overlap slack and the maximum gap.
    pub fn can_follow(&self, from: &SeedNode, to: &SeedNode) -> bool {
        to.strand == from.strand
            && to.q_start > from.q_start
            && to.t_start > from.t_start
            && to.t_start >= from.t_end().saturating_sub(self.overlap_slack)
            && to.t_start <= from.t_end() + self.max_gap
            && to.q_start >= from.q_end().saturating_sub(self.overlap_slack)
            && to.q_start <= from.q_start + self.max_gap
    }
}
