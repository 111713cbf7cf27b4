use crate::libs::sfx::SfxError;
use std::cmp::Reverse;

/// A candidate hit of a probe onto one target sequence.
/// `hit_len == 0` marks a core scheduled for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PutCore {
    pub seq_idx: usize,
    pub probe_ofs: usize,
    pub hit_len: usize,
    pub target_ofs: usize,
    pub mismatches: usize,
}

impl PutCore {
    pub fn is_deleted(&self) -> bool {
        self.hit_len == 0
    }

    /// Inclusive
    fn probe_end(&self) -> usize {
        self.probe_ofs + self.hit_len - 1
    }

    /// Inclusive
    fn target_end(&self) -> usize {
        self.target_ofs + self.hit_len - 1
    }

    /// `other` lies within `self` on both the probe and the target
    fn contains(&self, other: &PutCore) -> bool {
        self.probe_ofs <= other.probe_ofs
            && self.probe_end() >= other.probe_end()
            && self.target_ofs <= other.target_ofs
            && self.target_end() >= other.target_end()
    }
}

/// Accumulates the hits of one probe and removes contained or overlapping ones
#[derive(Debug, Default, Clone)]
pub struct PutativeCores {
    cores: Vec<PutCore>,
}

impl PutativeCores {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn len(&self) -> usize {
        self.cores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cores.is_empty()
    }

    pub fn as_slice(&self) -> &[PutCore] {
        &self.cores
    }

    /// Records a hit unless an existing live core on the same target already contains it.
    /// A live core contained by the new hit is overwritten in place.
    pub fn add_candidate(&mut self, cand: PutCore) -> Result<(), SfxError> {
        if cand.hit_len == 0 {
            return Ok(());
        }

        for core in self
            .cores
            .iter_mut()
            .filter(|c| !c.is_deleted() && c.seq_idx == cand.seq_idx)
        {
            if core.contains(&cand) {
                return Ok(());
            }
            if cand.contains(core) {
                *core = cand;
                return Ok(());
            }
        }

        self.cores
            .try_reserve(1)
            .map_err(|_| SfxError::OutOfMemory("putative cores"))?;
        self.cores.push(cand);
        Ok(())
    }

    /// Removes contained cores and, optionally, the shorter of any two cores overlapping
    /// on both probe and target. Survivors are left sorted by
    /// (target, probe offset, longest first, target offset).
    pub fn finalize(&mut self, remove_overlaps: bool) -> &[PutCore] {
        if self.cores.len() <= 1 {
            self.cores.retain(|c| !c.is_deleted());
            return &self.cores;
        }

        self.sort_cores();

        let mut resort = false;
        loop {
            let marked: usize = (0..self.cores.len() - 1)
                .map(|i| self.mark_contained(i))
                .sum();
            if marked == 0 {
                break;
            }
            resort = true;
        }

        if remove_overlaps {
            if resort {
                self.sort_and_truncate();
                resort = false;
            }
            if self.cores.len() > 1 {
                loop {
                    let marked: usize = (0..self.cores.len() - 1)
                        .map(|i| self.mark_overlaps(i))
                        .sum();
                    if marked == 0 {
                        break;
                    }
                    resort = true;
                }
            }
        }

        if resort {
            self.sort_and_truncate();
        }
        &self.cores
    }

    fn sort_cores(&mut self) {
        self.cores.sort_by_key(|c| {
            (
                c.is_deleted(),
                c.seq_idx,
                c.probe_ofs,
                Reverse(c.hit_len),
                c.target_ofs,
            )
        });
    }

    fn sort_and_truncate(&mut self) {
        self.sort_cores();
        let live = self.cores.partition_point(|c| !c.is_deleted());
        self.cores.truncate(live);
    }

    // Marks cores after `cur` contained within it
    fn mark_contained(&mut self, cur: usize) -> usize {
        let c = self.cores[cur];
        if c.is_deleted() {
            return 0;
        }

        let mut marked = 0;
        for nxt in cur + 1..self.cores.len() {
            let n = self.cores[nxt];
            if c.seq_idx < n.seq_idx {
                break;
            }
            if n.is_deleted() || c.seq_idx != n.seq_idx {
                continue;
            }
            if n.probe_ofs > c.probe_end() {
                break;
            }
            if c.contains(&n) {
                self.cores[nxt].hit_len = 0;
                marked += 1;
            }
        }
        marked
    }

    // Marks the shorter of `cur` and any later core overlapping it on probe and target
    fn mark_overlaps(&mut self, cur: usize) -> usize {
        let c = self.cores[cur];
        if c.is_deleted() {
            return 0;
        }

        let mut marked = 0;
        for nxt in cur + 1..self.cores.len() {
            let n = self.cores[nxt];
            if c.seq_idx < n.seq_idx {
                break;
            }
            if n.is_deleted() || c.seq_idx != n.seq_idx {
                continue;
            }
            if n.probe_ofs > c.probe_end() {
                break;
            }
            if c.probe_ofs <= n.probe_ofs
                && n.target_end() >= c.target_ofs
                && n.target_ofs <= c.target_end()
            {
                marked += 1;
                if n.hit_len > c.hit_len {
                    self.cores[cur].hit_len = 0;
                    break;
                }
                self.cores[nxt].hit_len = 0;
            }
        }
        marked
    }
}
