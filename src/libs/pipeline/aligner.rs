use crate::libs::chaining::{AlignPath, PathAssembler, SeedNode, SeedNodeSet};
use crate::libs::nt::{self, Strand};
use crate::libs::pipeline::AlignConfig;
use crate::libs::sfx::{HitFilter, SfxError, SuffixIndex};

/// Seeds and chains one query at a time. Each worker owns one, so node and
/// scoring buffers are reused between queries.
pub struct QueryAligner<'a, R> {
    index: &'a SuffixIndex<R>,
    config: &'a AlignConfig,
    nodes: SeedNodeSet,
    assembler: PathAssembler,
}

impl<'a, R> QueryAligner<'a, R> {
    pub fn new(index: &'a SuffixIndex<R>, config: &'a AlignConfig) -> Self {
        Self {
            index,
            config,
            nodes: SeedNodeSet::new(),
            assembler: PathAssembler::new(config.scoring),
        }
    }

    /// Aligns a query of encoded bases, returning its paths best first.
    ///
    /// Queries shorter than the minimum hit length have no paths.
    pub fn align(&mut self, seq: &[u8]) -> Result<Vec<AlignPath>, SfxError> {
        self.nodes.clear();
        let config = self.config;
        let seeds = &config.seeds;
        if seq.is_empty() || seq.len() < seeds.min_hit_len {
            return Ok(vec![]);
        }

        let strands = config.strand.strands();
        let anti = if strands.contains(&Strand::Antisense) {
            nt::rev_comp(seq)
        } else {
            vec![]
        };
        let probe_of = |strand: Strand| match strand {
            Strand::Sense => seq,
            Strand::Antisense => anti.as_slice(),
        };

        let max_nodes = config.max_nodes;
        for &strand in strands {
            let nodes = &mut self.nodes;
            self.index.locate_near_exacts(
                probe_of(strand),
                seeds,
                |_| HitFilter::Accept,
                |hit| {
                    nodes.push(SeedNode {
                        q_start: hit.probe_ofs,
                        seq_idx: hit.seq_idx,
                        t_start: hit.target_ofs,
                        len: hit.hit_len,
                        mismatches: hit.mismatches,
                        strand,
                    });
                    nodes.len() < max_nodes
                },
            )?;
            if self.nodes.len() >= max_nodes {
                log::debug!("Seed node limit {} reached", max_nodes);
                break;
            }
        }

        if self.nodes.is_empty() {
            return Ok(vec![]);
        }
        self.nodes.sort();

        let nodes = self.nodes.as_slice();
        let heads = self.assembler.assemble(nodes, seq.len(), config.strand);
        let paths = heads
            .iter()
            .filter_map(|head| {
                let first = nodes[head.node];
                AlignPath::from_chain(
                    nodes,
                    &self.assembler.path_nodes(head.node),
                    head.score,
                    probe_of(first.strand),
                    self.index.corpus().seq_bases(first.seq_idx),
                )
            })
            .collect();

        Ok(paths)
    }
}
