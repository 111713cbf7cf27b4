use crate::libs::nt;
use crate::libs::sfx::{Corpus, PutCore, PutativeCores, RepeatFilter, SfxError};
use rayon::prelude::*;
use std::cmp::Ordering;

/// One suffix: a sequence and an offset within it.
/// `offset == seq_len` is the suffix starting at the sequence's separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SfxEntry {
    pub seq_idx: usize,
    pub offset: usize,
}

/// What the filter callback decides about a putative hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitFilter {
    Accept,
    Reject,
    /// Drop this hit and stop seeding the probe
    Stop,
}

/// A maximally extended hit, before containment filtering
#[derive(Debug, Clone, Copy)]
pub struct PutativeHit<'a, R> {
    pub probe_ofs: usize,
    pub hit_len: usize,
    /// Probe offset of the exactly matching core
    pub core_ofs: usize,
    pub core_len: usize,
    pub left_mismatches: usize,
    pub right_mismatches: usize,
    pub seq_idx: usize,
    pub target_ref: &'a R,
    pub target_ofs: usize,
}

/// A hit that survived filtering
#[derive(Debug, Clone, Copy)]
pub struct SeedHit<'a, R> {
    pub probe_ofs: usize,
    pub hit_len: usize,
    pub seq_idx: usize,
    pub target_ref: &'a R,
    pub target_ofs: usize,
    pub mismatches: usize,
}

/// Parameters of [`SuffixIndex::locate_near_exacts`]
#[derive(Debug, Clone, Copy)]
pub struct NearExactParams {
    /// Exactly matching core needed before a hit counts
    pub min_core_len: usize,
    pub left_max_extend: usize,
    pub right_max_extend: usize,
    pub left_max_mismatches: usize,
    pub right_max_mismatches: usize,
    pub min_hit_len: usize,
    pub repeats: RepeatFilter,
    /// Also drop the shorter of two hits overlapping on probe and target
    pub remove_overlaps: bool,
}

impl Default for NearExactParams {
    fn default() -> Self {
        Self {
            min_core_len: 12,
            left_max_extend: usize::MAX,
            right_max_extend: usize::MAX,
            left_max_mismatches: 2,
            right_max_mismatches: 2,
            min_hit_len: 16,
            repeats: RepeatFilter::default(),
            remove_overlaps: false,
        }
    }
}

/// Seed length and step between seed starts for a minimum match length.
///
/// ```
/// use blitz::libs::sfx::seed_params;
/// assert_eq!(seed_params(8), (8, 1));
/// assert_eq!(seed_params(14), (12, 2));
/// assert_eq!(seed_params(20), (15, 5));
/// assert_eq!(seed_params(60), (30, 30));
/// ```
pub fn seed_params(min_len: usize) -> (usize, usize) {
    if min_len <= 12 {
        (min_len, 1)
    } else if min_len <= 49 {
        let delta = min_len / 4;
        let seed_len = min_len - delta;
        if seed_len < 12 {
            (12, min_len - 12)
        } else {
            (seed_len, delta)
        }
    } else {
        let delta = min_len / 2;
        (min_len - delta, delta)
    }
}

// Per-side extension limits
#[derive(Debug, Clone, Copy)]
struct Extension {
    left_max: usize,
    right_max: usize,
    left_mismatches: usize,
    right_mismatches: usize,
}

impl Extension {
    fn exact() -> Self {
        Self {
            left_max: usize::MAX,
            right_max: usize::MAX,
            left_mismatches: 0,
            right_mismatches: 0,
        }
    }
}

/// Suffix array over a [`Corpus`].
///
/// Sequences are added first, then [`SuffixIndex::build`] sorts the suffixes once.
/// After that the index is read-only and can be shared between threads.
#[derive(Debug)]
pub struct SuffixIndex<R> {
    corpus: Corpus<R>,
    sfx: Vec<SfxEntry>,
    built: bool,
}

impl<R> Default for SuffixIndex<R> {
    fn default() -> Self {
        Self {
            corpus: Corpus::new(),
            sfx: Vec::new(),
            built: false,
        }
    }
}

impl<R> SuffixIndex<R> {
    pub fn new() -> Self {
        Default::default()
    }

    /// Appends a sequence of encoded bases, returning its sequence index
    pub fn add(&mut self, target_ref: R, seq: &[u8]) -> Result<usize, SfxError> {
        if self.built {
            return Err(SfxError::AlreadyBuilt);
        }
        self.corpus.push(target_ref, seq)
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn corpus(&self) -> &Corpus<R> {
        &self.corpus
    }

    pub fn num_seqs(&self) -> usize {
        self.corpus.num_seqs()
    }

    pub fn target_ref(&self, seq_idx: usize) -> &R {
        &self.corpus.entry(seq_idx).target_ref
    }

    pub fn seq_len(&self, seq_idx: usize) -> usize {
        self.corpus.seq_len(seq_idx)
    }

    /// Sorted suffixes
    pub fn suffixes(&self) -> &[SfxEntry] {
        &self.sfx
    }

    fn pos(&self, e: &SfxEntry) -> usize {
        self.corpus.entry(e.seq_idx).start + e.offset
    }

    fn ensure_built(&self) -> Result<(), SfxError> {
        if self.built {
            Ok(())
        } else {
            Err(SfxError::NotBuilt)
        }
    }

    /// Index of the lowest suffix starting with `probe`.
    ///
    /// `None` when no suffix matches or the probe holds a base other than A, C, G or T.
    pub fn locate_first_exact(&self, probe: &[u8]) -> Result<Option<usize>, SfxError> {
        self.ensure_built()?;
        if probe.is_empty() || probe.iter().any(|&b| !nt::is_canonical(b)) {
            return Ok(None);
        }
        Ok(self.lower_bound(probe))
    }

    fn lower_bound(&self, probe: &[u8]) -> Option<usize> {
        let lo = self
            .sfx
            .partition_point(|e| self.corpus.compare_prefix(self.pos(e), probe) == Ordering::Less);
        match self.sfx.get(lo) {
            Some(e) if self.corpus.compare_prefix(self.pos(e), probe) == Ordering::Equal => {
                Some(lo)
            }
            _ => None,
        }
    }

    /// Finds every maximal exact match of at least `min_hit_len` bases.
    ///
    /// Each putative hit is first checked against `repeats`, then offered to `filter`.
    /// Hits not contained in another one go to `accept` in
    /// (target, probe offset) order until it returns `false`.
    ///
    /// Returns the number of hits delivered to `accept`.
    pub fn locate_exacts<F, P>(
        &self,
        probe: &[u8],
        min_hit_len: usize,
        repeats: RepeatFilter,
        filter: F,
        accept: P,
    ) -> Result<usize, SfxError>
    where
        F: FnMut(&PutativeHit<R>) -> HitFilter,
        P: FnMut(&SeedHit<R>) -> bool,
    {
        self.ensure_built()?;
        if min_hit_len == 0 {
            return Err(SfxError::InvalidSeedLen);
        }
        if min_hit_len > probe.len() {
            return Ok(0);
        }

        let (seed_len, delta) = seed_params(min_hit_len);
        let mut cores = PutativeCores::new();
        self.scan(
            probe,
            seed_len,
            delta,
            Extension::exact(),
            seed_len,
            min_hit_len,
            repeats,
            filter,
            &mut cores,
        )?;
        Ok(self.deliver(&mut cores, false, accept))
    }

    /// Finds hits holding an exact core of at least `min_core_len` bases whose flanks
    /// extend while each side stays within its mismatch budget.
    ///
    /// Returns the number of hits delivered to `accept`.
    pub fn locate_near_exacts<F, P>(
        &self,
        probe: &[u8],
        params: &NearExactParams,
        filter: F,
        accept: P,
    ) -> Result<usize, SfxError>
    where
        F: FnMut(&PutativeHit<R>) -> HitFilter,
        P: FnMut(&SeedHit<R>) -> bool,
    {
        self.ensure_built()?;
        if params.min_core_len == 0 || params.min_hit_len == 0 {
            return Err(SfxError::InvalidSeedLen);
        }
        if params.min_hit_len > probe.len() {
            return Err(SfxError::HitLenExceedsProbe {
                min_hit_len: params.min_hit_len,
                probe_len: probe.len(),
            });
        }

        let (seed_len, delta) = seed_params(params.min_core_len);
        let ext = Extension {
            left_max: params.left_max_extend,
            right_max: params.right_max_extend,
            left_mismatches: params.left_max_mismatches,
            right_mismatches: params.right_max_mismatches,
        };
        let mut cores = PutativeCores::new();
        self.scan(
            probe,
            seed_len,
            delta,
            ext,
            params.min_core_len,
            params.min_hit_len,
            params.repeats,
            filter,
            &mut cores,
        )?;
        Ok(self.deliver(&mut cores, params.remove_overlaps, accept))
    }

    fn deliver<P>(&self, cores: &mut PutativeCores, remove_overlaps: bool, mut accept: P) -> usize
    where
        P: FnMut(&SeedHit<R>) -> bool,
    {
        let mut delivered = 0;
        for core in cores.finalize(remove_overlaps) {
            let hit = SeedHit {
                probe_ofs: core.probe_ofs,
                hit_len: core.hit_len,
                seq_idx: core.seq_idx,
                target_ref: self.target_ref(core.seq_idx),
                target_ofs: core.target_ofs,
                mismatches: core.mismatches,
            };
            delivered += 1;
            if !accept(&hit) {
                break;
            }
        }
        delivered
    }

    // Seeds the probe every `delta` bases and extends each seed occurrence
    #[allow(clippy::too_many_arguments)]
    fn scan<F>(
        &self,
        probe: &[u8],
        seed_len: usize,
        delta: usize,
        ext: Extension,
        min_core_len: usize,
        min_hit_len: usize,
        repeats: RepeatFilter,
        mut filter: F,
        cores: &mut PutativeCores,
    ) -> Result<(), SfxError>
    where
        F: FnMut(&PutativeHit<R>) -> HitFilter,
    {
        if probe.len() < seed_len {
            return Ok(());
        }

        let mut seed_ofs = 0;
        while seed_ofs + seed_len <= probe.len() {
            let seed = &probe[seed_ofs..seed_ofs + seed_len];
            if seed.iter().all(|&b| nt::is_canonical(b)) {
                if let Some(first) = self.lower_bound(seed) {
                    for e in self.sfx[first..].iter().take_while(|e| {
                        self.corpus.compare_prefix(self.pos(e), seed) == Ordering::Equal
                    }) {
                        let hit = self.extend(probe, seed_ofs, seed_len, e, &ext);
                        if hit.core_len < min_core_len || hit.hit_len < min_hit_len {
                            continue;
                        }
                        if repeats.rejects(&probe[hit.probe_ofs..hit.probe_ofs + hit.hit_len]) {
                            continue;
                        }
                        match filter(&hit) {
                            HitFilter::Accept => cores.add_candidate(PutCore {
                                seq_idx: hit.seq_idx,
                                probe_ofs: hit.probe_ofs,
                                hit_len: hit.hit_len,
                                target_ofs: hit.target_ofs,
                                mismatches: hit.left_mismatches + hit.right_mismatches,
                            })?,
                            HitFilter::Reject => {}
                            HitFilter::Stop => return Ok(()),
                        }
                    }
                }
            }
            seed_ofs += delta;
        }

        Ok(())
    }

    // Extends one seed occurrence to the left, then to the right
    fn extend(
        &self,
        probe: &[u8],
        seed_ofs: usize,
        seed_len: usize,
        e: &SfxEntry,
        ext: &Extension,
    ) -> PutativeHit<R> {
        let target = self.corpus.seq_bases(e.seq_idx);

        let mut hit_len = seed_len;
        let mut core_ofs = seed_ofs;
        let mut core_len = seed_len;

        let mut p = seed_ofs;
        let mut t = e.offset;
        let mut left_mm = 0;
        let mut extended = 0;
        while p > 0 && t > 0 && extended < ext.left_max {
            let b1 = probe[p - 1] & nt::BASE_MASK;
            let b2 = target[t - 1] & nt::BASE_MASK;
            if b1 > nt::T || b2 > nt::T {
                break;
            }
            if b1 != b2 {
                left_mm += 1;
                if left_mm > ext.left_mismatches {
                    left_mm -= 1;
                    break;
                }
            } else if left_mm == 0 {
                core_ofs -= 1;
                core_len += 1;
            }
            hit_len += 1;
            p -= 1;
            t -= 1;
            extended += 1;
        }
        let (probe_ofs, target_ofs) = (p, t);

        let mut p = seed_ofs + seed_len;
        let mut t = e.offset + seed_len;
        let mut right_mm = 0;
        let mut extended = 0;
        while p < probe.len() && t < target.len() && extended < ext.right_max {
            let b1 = probe[p] & nt::BASE_MASK;
            let b2 = target[t] & nt::BASE_MASK;
            if b1 > nt::T || b2 > nt::T {
                break;
            }
            if b1 != b2 {
                right_mm += 1;
                if right_mm > ext.right_mismatches {
                    right_mm -= 1;
                    break;
                }
            } else if right_mm == 0 {
                core_len += 1;
            }
            hit_len += 1;
            p += 1;
            t += 1;
            extended += 1;
        }

        PutativeHit {
            probe_ofs,
            hit_len,
            core_ofs,
            core_len,
            left_mismatches: left_mm,
            right_mismatches: right_mm,
            seq_idx: e.seq_idx,
            target_ref: self.target_ref(e.seq_idx),
            target_ofs,
        }
    }
}

impl<R: Sync> SuffixIndex<R> {
    /// Sorts all suffixes. May be called once; adding sequences afterwards is an error.
    pub fn build(&mut self) -> Result<(), SfxError> {
        if self.built {
            return Err(SfxError::AlreadyBuilt);
        }

        let total = self.corpus.total_len();
        let mut sfx: Vec<SfxEntry> = Vec::new();
        sfx.try_reserve_exact(total)
            .map_err(|_| SfxError::OutOfMemory("suffix array"))?;
        for (seq_idx, entry) in self.corpus.entries().iter().enumerate() {
            sfx.extend((0..=entry.len).map(|offset| SfxEntry { seq_idx, offset }));
        }

        let corpus = &self.corpus;
        let pos = |e: &SfxEntry| corpus.entry(e.seq_idx).start + e.offset;
        sfx.par_sort_unstable_by(|a, b| {
            corpus
                .compare_suffixes(pos(a), pos(b))
                .then_with(|| a.cmp(b))
        });

        log::debug!(
            "Sorted {} suffixes over {} sequences",
            sfx.len(),
            corpus.num_seqs()
        );
        self.sfx = sfx;
        self.built = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::sfx::RepeatMasking;

    fn index_of(seqs: &[&[u8]]) -> SuffixIndex<usize> {
        let mut index = SuffixIndex::new();
        for (i, s) in seqs.iter().enumerate() {
            index.add(i, &nt::encode(s)).unwrap();
        }
        index.build().unwrap();
        index
    }

    fn exacts(index: &SuffixIndex<usize>, probe: &[u8], min_hit_len: usize) -> Vec<(usize, usize, usize, usize)> {
        let mut hits = vec![];
        index
            .locate_exacts(
                &nt::encode(probe),
                min_hit_len,
                RepeatFilter::ignore(),
                |_| HitFilter::Accept,
                |h| {
                    hits.push((h.probe_ofs, h.hit_len, h.seq_idx, h.target_ofs));
                    true
                },
            )
            .unwrap();
        hits
    }

    #[test]
    fn seed_params_floor() {
        assert_eq!(seed_params(1), (1, 1));
        assert_eq!(seed_params(12), (12, 1));
        assert_eq!(seed_params(13), (12, 1));
        assert_eq!(seed_params(15), (12, 3));
        assert_eq!(seed_params(16), (12, 4));
        assert_eq!(seed_params(49), (37, 12));
        assert_eq!(seed_params(50), (25, 25));
    }

    #[test]
    fn usage_errors() {
        let mut index: SuffixIndex<usize> = SuffixIndex::new();
        index.add(0, &nt::encode(b"ACGT")).unwrap();
        assert_eq!(
            index.locate_first_exact(&nt::encode(b"AC")),
            Err(SfxError::NotBuilt)
        );
        index.build().unwrap();
        assert_eq!(index.build(), Err(SfxError::AlreadyBuilt));
        assert_eq!(
            index.add(1, &nt::encode(b"ACGT")),
            Err(SfxError::AlreadyBuilt)
        );
        assert_eq!(index.add(1, &[]).unwrap_err(), SfxError::AlreadyBuilt);
    }

    #[test]
    fn suffixes_sorted() {
        let index = index_of(&[b"ACGTACGTACGT", b"GGTNAC"]);
        let corpus = index.corpus();
        assert_eq!(index.suffixes().len(), 12 + 1 + 6 + 1);
        for w in index.suffixes().windows(2) {
            let a = corpus.entry(w[0].seq_idx).start + w[0].offset;
            let b = corpus.entry(w[1].seq_idx).start + w[1].offset;
            let ord = corpus.compare_suffixes(a, b).then_with(|| w[0].cmp(&w[1]));
            assert_eq!(ord, Ordering::Less);
        }
    }

    #[test]
    fn first_exact() {
        let index = index_of(&[b"ACGTACGTACGT"]);
        let first = index.locate_first_exact(&nt::encode(b"ACGT")).unwrap().unwrap();
        // separator sorts last, so the longest "ACGT..." suffix comes first
        assert_eq!(index.suffixes()[first], SfxEntry { seq_idx: 0, offset: 0 });
        assert!(index.locate_first_exact(&nt::encode(b"TTT")).unwrap().is_none());
        assert!(index.locate_first_exact(&nt::encode(b"ACNT")).unwrap().is_none());
    }

    #[test]
    fn exact_hits_in_periodic_target() {
        let index = index_of(&[b"ACGTACGTACGT"]);
        let hits = exacts(&index, b"ACGTACGT", 8);
        assert_eq!(hits, vec![(0, 8, 0, 0), (0, 8, 0, 4)]);
    }

    #[test]
    fn exact_hits_across_sequences() {
        let index = index_of(&[b"TTTTACGTACGGTTTT", b"CCACGTACGGCC", b"ACGTAC"]);
        let hits = exacts(&index, b"ACGTACGG", 8);
        assert_eq!(hits, vec![(0, 8, 0, 4), (0, 8, 1, 2)]);
    }

    #[test]
    fn exact_min_len_over_probe() {
        let index = index_of(&[b"ACGTACGT"]);
        assert!(exacts(&index, b"ACGT", 5).is_empty());
    }

    #[test]
    fn exact_filter_stop() {
        let index = index_of(&[b"AAAACCCCGGGG", b"AAAACCCCGGGG"]);
        let mut seen = 0;
        let n = index
            .locate_exacts(
                &nt::encode(b"AAAACCCCGGGG"),
                12,
                RepeatFilter::ignore(),
                |_| {
                    seen += 1;
                    HitFilter::Stop
                },
                |_| true,
            )
            .unwrap();
        assert_eq!(seen, 1);
        assert_eq!(n, 0);
    }

    #[test]
    fn repeat_masked_hits_dropped() {
        let index = index_of(&[b"GGGGACGTACGTACGTGGGG"]);
        let probe = nt::encode(b"acgtacgtacgt");
        let filter = RepeatFilter {
            masking: RepeatMasking::Masked,
            max_pct: 80,
        };
        let n = index
            .locate_exacts(&probe, 12, filter, |_| HitFilter::Accept, |_| true)
            .unwrap();
        assert_eq!(n, 0);
        let n = index
            .locate_exacts(&probe, 12, RepeatFilter::ignore(), |_| HitFilter::Accept, |_| true)
            .unwrap();
        assert_eq!(n, 1);
    }

    #[test]
    fn near_exact_tolerates_flank_mismatches() {
        //                      core ACGTTGCA, then one mismatch on each flank
        let target = b"CCCCGATACGTTGCATCGTCCCC";
        let probe = b"GAAACGTTGCATAGT";
        let index = index_of(&[target]);
        let params = NearExactParams {
            min_core_len: 8,
            left_max_mismatches: 1,
            right_max_mismatches: 1,
            min_hit_len: 12,
            repeats: RepeatFilter::ignore(),
            ..Default::default()
        };

        let mut putative = vec![];
        let mut hits = vec![];
        index
            .locate_near_exacts(
                &nt::encode(probe),
                &params,
                |h| {
                    putative.push((h.core_ofs, h.core_len, h.left_mismatches, h.right_mismatches));
                    HitFilter::Accept
                },
                |h| {
                    hits.push((h.probe_ofs, h.hit_len, h.target_ofs, h.mismatches));
                    true
                },
            )
            .unwrap();

        assert_eq!(hits, vec![(0, 15, 4, 2)]);
        assert!(putative.contains(&(3, 9, 1, 1)));
    }

    #[test]
    fn near_exact_extension_caps() {
        let target = b"CCCCGATACGTTGCATCGTCCCC";
        let probe = b"GAAACGTTGCATAGT";
        let index = index_of(&[target]);
        let params = NearExactParams {
            min_core_len: 8,
            left_max_extend: 1,
            right_max_extend: 2,
            left_max_mismatches: 1,
            right_max_mismatches: 1,
            min_hit_len: 8,
            repeats: RepeatFilter::ignore(),
            remove_overlaps: false,
        };
        let mut hits = vec![];
        index
            .locate_near_exacts(&nt::encode(probe), &params, |_| HitFilter::Accept, |h| {
                hits.push((h.probe_ofs, h.hit_len));
                true
            })
            .unwrap();
        assert_eq!(hits, vec![(2, 11), (3, 11)]);

        let params = NearExactParams {
            remove_overlaps: true,
            ..params
        };
        let mut hits = vec![];
        index
            .locate_near_exacts(&nt::encode(probe), &params, |_| HitFilter::Accept, |h| {
                hits.push((h.probe_ofs, h.hit_len));
                true
            })
            .unwrap();
        assert_eq!(hits, vec![(2, 11)]);
    }

    #[test]
    fn near_exact_hit_len_over_probe() {
        let index = index_of(&[b"ACGTACGT"]);
        let params = NearExactParams {
            min_core_len: 4,
            min_hit_len: 9,
            ..Default::default()
        };
        let res = index.locate_near_exacts(&nt::encode(b"ACGTACGT"), &params, |_| HitFilter::Accept, |_| true);
        assert_eq!(
            res,
            Err(SfxError::HitLenExceedsProbe {
                min_hit_len: 9,
                probe_len: 8
            })
        );
    }

    #[test]
    fn accept_can_stop_delivery() {
        let index = index_of(&[b"TTACGTACGGTT", b"CCACGTACGGCC"]);
        let mut got = 0;
        let n = index
            .locate_exacts(
                &nt::encode(b"ACGTACGG"),
                8,
                RepeatFilter::ignore(),
                |_| HitFilter::Accept,
                |_| {
                    got += 1;
                    false
                },
            )
            .unwrap();
        assert_eq!((n, got), (1, 1));
    }
}
