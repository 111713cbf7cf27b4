use crate::libs::chaining::SeedNode;
use crate::libs::nt::{self, Strand};

/// One gap-free block of an alignment path.
///
/// `q_start` is on the strand-oriented query, so antisense blocks use
/// reverse-complement coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignBlock {
    pub q_start: usize,
    pub t_start: usize,
    pub len: usize,
    pub matches: usize,
    pub mismatches: usize,
    /// Positions holding N (or any non-ACGT base) on either sequence
    pub n_count: usize,
}

/// A chain of seed nodes turned into blocks against one target sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignPath {
    pub seq_idx: usize,
    pub strand: Strand,
    pub score: i32,
    pub blocks: Vec<AlignBlock>,
    pub q_num_insert: usize,
    pub q_base_insert: usize,
    pub t_num_insert: usize,
    pub t_base_insert: usize,
}

impl AlignPath {
    /// Builds the path for the node chain `chain`.
    ///
    /// `probe` is the query on the path's strand and `target` the bases of the
    /// target sequence. Each block is trimmed at its start by the amount it overlaps
    /// the previous one; a block swallowed entirely is dropped.
    ///
    /// Returns `None` for an empty chain or when a node lies outside the sequences.
    pub fn from_chain(
        nodes: &[SeedNode],
        chain: &[usize],
        score: i32,
        probe: &[u8],
        target: &[u8],
    ) -> Option<Self> {
        let first = nodes[*chain.first()?];
        let mut path = AlignPath {
            seq_idx: first.seq_idx,
            strand: first.strand,
            score,
            blocks: Vec::with_capacity(chain.len()),
            q_num_insert: 0,
            q_base_insert: 0,
            t_num_insert: 0,
            t_base_insert: 0,
        };

        for &i in chain {
            let node = nodes[i];
            let (mut q, mut t, mut len) = (node.q_start, node.t_start, node.len);

            if let Some(prev) = path.blocks.last() {
                let q_gap = q as isize - (prev.q_start + prev.len) as isize;
                let t_gap = t as isize - (prev.t_start + prev.len) as isize;
                if q_gap < 0 || t_gap < 0 {
                    let delta = if q_gap >= 0 {
                        t_gap.unsigned_abs()
                    } else if t_gap >= 0 {
                        q_gap.unsigned_abs()
                    } else {
                        q_gap.min(t_gap).unsigned_abs()
                    };
                    if delta >= len {
                        continue;
                    }
                    q += delta;
                    t += delta;
                    len -= delta;
                }

                let q_gap = q - (prev.q_start + prev.len);
                let t_gap = t - (prev.t_start + prev.len);
                if q_gap > 0 {
                    path.q_num_insert += 1;
                    path.q_base_insert += q_gap;
                }
                if t_gap > 0 {
                    path.t_num_insert += 1;
                    path.t_base_insert += t_gap;
                }
            }

            path.blocks
                .push(count_bases(probe.get(q..q + len)?, target.get(t..t + len)?, q, t));
        }

        Some(path)
    }

    pub fn q_start(&self) -> usize {
        self.blocks.first().map_or(0, |b| b.q_start)
    }

    /// Exclusive
    pub fn q_end(&self) -> usize {
        self.blocks.last().map_or(0, |b| b.q_start + b.len)
    }

    pub fn t_start(&self) -> usize {
        self.blocks.first().map_or(0, |b| b.t_start)
    }

    /// Exclusive
    pub fn t_end(&self) -> usize {
        self.blocks.last().map_or(0, |b| b.t_start + b.len)
    }

    pub fn aligned(&self) -> usize {
        self.blocks.iter().map(|b| b.len).sum()
    }

    pub fn matches(&self) -> usize {
        self.blocks.iter().map(|b| b.matches).sum()
    }

    pub fn mismatches(&self) -> usize {
        self.blocks.iter().map(|b| b.mismatches).sum()
    }

    pub fn n_count(&self) -> usize {
        self.blocks.iter().map(|b| b.n_count).sum()
    }

    /// Fraction of aligned bases that match
    pub fn identity(&self) -> f64 {
        match self.aligned() {
            0 => 0.0,
            aligned => self.matches() as f64 / aligned as f64,
        }
    }
}

fn count_bases(probe: &[u8], target: &[u8], q_start: usize, t_start: usize) -> AlignBlock {
    let mut block = AlignBlock {
        q_start,
        t_start,
        len: probe.len(),
        matches: 0,
        mismatches: 0,
        n_count: 0,
    };
    for (&a, &b) in probe.iter().zip(target) {
        let (a, b) = (a & nt::BASE_MASK, b & nt::BASE_MASK);
        if a > nt::T || b > nt::T {
            block.n_count += 1;
        } else if a == b {
            block.matches += 1;
        } else {
            block.mismatches += 1;
        }
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(q_start: usize, t_start: usize, len: usize) -> SeedNode {
        SeedNode {
            q_start,
            seq_idx: 0,
            t_start,
            len,
            mismatches: 0,
            strand: Strand::Sense,
        }
    }

    #[test]
    fn blocks_with_insert() {
        let target = nt::encode(b"ACGTACGTTTGCATGCAA");
        // 5bp insertion in the query between the two blocks
        let probe = nt::encode(b"ACGTACGTCCCCCTTGCATGCAA");
        let nodes = vec![node(0, 0, 8), node(13, 8, 10)];

        let path = AlignPath::from_chain(&nodes, &[0, 1], 11, &probe, &target).unwrap();
        assert_eq!(path.blocks.len(), 2);
        assert_eq!((path.q_start(), path.q_end()), (0, 23));
        assert_eq!((path.t_start(), path.t_end()), (0, 18));
        assert_eq!((path.q_num_insert, path.q_base_insert), (1, 5));
        assert_eq!((path.t_num_insert, path.t_base_insert), (0, 0));
        assert_eq!(path.matches(), 18);
        assert_eq!(path.identity(), 1.0);
    }

    #[test]
    fn overlap_trimmed() {
        let target = nt::encode(b"ACGTACGTACGTACGTACGT");
        let probe = target.clone();
        // second node overlaps the first by 3 on both sequences
        let nodes = vec![node(0, 0, 10), node(7, 7, 10)];

        let path = AlignPath::from_chain(&nodes, &[0, 1], 0, &probe, &target).unwrap();
        assert_eq!(path.blocks[1].q_start, 10);
        assert_eq!(path.blocks[1].t_start, 10);
        assert_eq!(path.blocks[1].len, 7);
        assert_eq!(path.aligned(), 17);
        assert_eq!(path.q_num_insert + path.t_num_insert, 0);
    }

    #[test]
    fn overlap_on_one_side() {
        let target = nt::encode(b"AAAACCCCGGGGTTTTAAAACCCC");
        let probe = nt::encode(b"AAAACCCCGGGGTTTTAAAACCCC");
        // query overlaps by 2, target gap of 2
        let nodes = vec![node(0, 0, 8), node(6, 10, 8)];

        let path = AlignPath::from_chain(&nodes, &[0, 1], 0, &probe, &target).unwrap();
        // shifted by the query overlap
        let b = path.blocks[1];
        assert_eq!((b.q_start, b.t_start, b.len), (8, 12, 6));
        assert_eq!((path.t_num_insert, path.t_base_insert), (1, 4));
    }

    #[test]
    fn swallowed_block_dropped() {
        let target = nt::encode(b"ACGTACGTACGTACGTACGT");
        let nodes = vec![node(0, 0, 12), node(4, 4, 6)];
        let path = AlignPath::from_chain(&nodes, &[0, 1], 0, &target, &target).unwrap();
        assert_eq!(path.blocks.len(), 1);
    }

    #[test]
    fn counts_mismatches_and_n() {
        let target = nt::encode(b"ACGTNCGTAC");
        let probe = nt::encode(b"ACCTACGTAN");
        let nodes = vec![node(0, 0, 10)];
        let path = AlignPath::from_chain(&nodes, &[0], 0, &probe, &target).unwrap();
        assert_eq!(path.matches(), 7);
        assert_eq!(path.mismatches(), 1);
        assert_eq!(path.n_count(), 2);
        approx::assert_abs_diff_eq!(path.identity(), 0.7, epsilon = 1e-9);
    }

    #[test]
    fn empty_or_out_of_range() {
        let seq = nt::encode(b"ACGT");
        assert!(AlignPath::from_chain(&[], &[], 0, &seq, &seq).is_none());
        let nodes = vec![node(0, 2, 4)];
        assert!(AlignPath::from_chain(&nodes, &[0], 0, &seq, &seq).is_none());
    }
}
