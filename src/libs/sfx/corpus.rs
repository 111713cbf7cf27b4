use crate::libs::nt;
use crate::libs::sfx::SfxError;
use std::cmp::Ordering;

/// One sequence in the corpus
#[derive(Debug, Clone)]
pub struct SeqEntry<R> {
    /// Offset of the first base in the concatenated buffer
    pub start: usize,
    pub len: usize,
    pub target_ref: R,
}

/// All target sequences concatenated, each followed by [`nt::EOS`].
///
/// Bases keep their repeat-mask flag; comparisons go through [`Corpus::base_at`], which strips it.
#[derive(Debug, Clone)]
pub struct Corpus<R> {
    bases: Vec<u8>,
    entries: Vec<SeqEntry<R>>,
}

impl<R> Default for Corpus<R> {
    fn default() -> Self {
        Self {
            bases: Vec::new(),
            entries: Vec::new(),
        }
    }
}

impl<R> Corpus<R> {
    pub fn new() -> Self {
        Default::default()
    }

    /// Appends `seq` and its separator, returning the new sequence index
    pub fn push(&mut self, target_ref: R, seq: &[u8]) -> Result<usize, SfxError> {
        if seq.is_empty() {
            return Err(SfxError::EmptySequence);
        }
        self.bases
            .try_reserve(seq.len() + 1)
            .map_err(|_| SfxError::OutOfMemory("corpus bases"))?;
        self.entries
            .try_reserve(1)
            .map_err(|_| SfxError::OutOfMemory("corpus entries"))?;

        let start = self.bases.len();
        self.bases.extend_from_slice(seq);
        self.bases.push(nt::EOS);
        self.entries.push(SeqEntry {
            start,
            len: seq.len(),
            target_ref,
        });

        Ok(self.entries.len() - 1)
    }

    pub fn num_seqs(&self) -> usize {
        self.entries.len()
    }

    /// Bases plus separators
    pub fn total_len(&self) -> usize {
        self.bases.len()
    }

    pub fn entries(&self) -> &[SeqEntry<R>] {
        &self.entries
    }

    pub fn entry(&self, seq_idx: usize) -> &SeqEntry<R> {
        &self.entries[seq_idx]
    }

    pub fn seq_len(&self, seq_idx: usize) -> usize {
        self.entries[seq_idx].len
    }

    /// Bases of one sequence, mask flags included, separator excluded
    pub fn seq_bases(&self, seq_idx: usize) -> &[u8] {
        let entry = &self.entries[seq_idx];
        &self.bases[entry.start..entry.start + entry.len]
    }

    /// Base at an absolute position with the mask stripped; [`nt::EOS`] past the end
    #[inline]
    pub fn base_at(&self, pos: usize) -> u8 {
        self.bases.get(pos).map_or(nt::EOS, |&b| b & nt::BASE_MASK)
    }

    /// Compares the suffixes at two absolute positions up to and including the first separator
    pub fn compare_suffixes(&self, a: usize, b: usize) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        let mut i = 0;
        loop {
            let x = self.base_at(a + i);
            let y = self.base_at(b + i);
            match x.cmp(&y) {
                Ordering::Equal if x == nt::EOS => return Ordering::Equal,
                Ordering::Equal => i += 1,
                other => return other,
            }
        }
    }

    /// Compares the first `probe.len()` bases at `pos` with a probe of canonical bases
    pub fn compare_prefix(&self, pos: usize, probe: &[u8]) -> Ordering {
        for (i, &p) in probe.iter().enumerate() {
            let x = self.base_at(pos + i);
            match x.cmp(&(p & nt::BASE_MASK)) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        Ordering::Equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_read() {
        let mut corpus = Corpus::new();
        let i = corpus.push("chr1", &nt::encode(b"ACgt")).unwrap();
        let j = corpus.push("chr2", &nt::encode(b"TT")).unwrap();
        assert_eq!((i, j), (0, 1));
        assert_eq!(corpus.total_len(), 7);
        assert_eq!(corpus.entry(1).start, 5);
        assert_eq!(corpus.entry(1).target_ref, "chr2");
        assert_eq!(corpus.base_at(2), nt::G);
        assert_eq!(corpus.base_at(4), nt::EOS);
        assert_eq!(corpus.base_at(100), nt::EOS);
        assert_eq!(nt::decode(corpus.seq_bases(0)), "ACgt");
    }

    #[test]
    fn empty_rejected() {
        let mut corpus: Corpus<u32> = Corpus::new();
        assert_eq!(corpus.push(0, &[]), Err(SfxError::EmptySequence));
    }

    #[test]
    fn suffix_order_stops_at_separator() {
        let mut corpus = Corpus::new();
        corpus.push(0, &nt::encode(b"AC")).unwrap();
        corpus.push(1, &nt::encode(b"AC")).unwrap();
        // "AC$" vs "AC$": equal content
        assert_eq!(corpus.compare_suffixes(0, 3), Ordering::Equal);
        // "C$" > "AC$"
        assert_eq!(corpus.compare_suffixes(1, 0), Ordering::Greater);
        // separator suffix is greatest
        assert_eq!(corpus.compare_suffixes(2, 1), Ordering::Greater);
    }

    #[test]
    fn prefix_compare() {
        let mut corpus = Corpus::new();
        corpus.push(0, &nt::encode(b"ACGT")).unwrap();
        assert_eq!(
            corpus.compare_prefix(0, &nt::encode(b"ACG")),
            Ordering::Equal
        );
        assert_eq!(corpus.compare_prefix(0, &nt::encode(b"AG")), Ordering::Less);
        // running into the separator
        assert_eq!(
            corpus.compare_prefix(2, &nt::encode(b"GTA")),
            Ordering::Greater
        );
    }
}
