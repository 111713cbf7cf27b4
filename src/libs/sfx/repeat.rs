use crate::libs::nt;

/// How repeat-mask flags on probe bases are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatMasking {
    /// No base counts as a repeat, only non-canonical bases are rejected
    Ignore,
    /// Masked bases are repeats
    Masked,
    /// Unmasked bases are repeats
    Unmasked,
}

impl std::str::FromStr for RepeatMasking {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ignore" => Ok(RepeatMasking::Ignore),
            "masked" => Ok(RepeatMasking::Masked),
            "unmasked" => Ok(RepeatMasking::Unmasked),
            _ => Err(anyhow::anyhow!("Unknown repeat masking: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatFilter {
    pub masking: RepeatMasking,
    /// Spans with at least this percentage of repeats are dropped
    pub max_pct: u32,
}

impl Default for RepeatFilter {
    fn default() -> Self {
        Self {
            masking: RepeatMasking::Masked,
            max_pct: 80,
        }
    }
}

impl RepeatFilter {
    pub fn ignore() -> Self {
        Self {
            masking: RepeatMasking::Ignore,
            max_pct: 0,
        }
    }

    pub fn rejects(&self, seq: &[u8]) -> bool {
        filter_out_repeats(self.masking, self.max_pct, seq)
    }
}

/// Returns true when `seq` should be dropped: it holds a non-canonical base,
/// or its repeat percentage reaches `max_pct`.
///
/// ```
/// use blitz::libs::nt;
/// use blitz::libs::sfx::{filter_out_repeats, RepeatMasking};
///
/// let seq = nt::encode(b"ACGTacgt");
/// assert!(!filter_out_repeats(RepeatMasking::Ignore, 0, &seq));
/// assert!(filter_out_repeats(RepeatMasking::Masked, 50, &seq));
/// assert!(!filter_out_repeats(RepeatMasking::Masked, 51, &seq));
/// assert!(filter_out_repeats(RepeatMasking::Ignore, 0, &nt::encode(b"ACNT")));
/// ```
pub fn filter_out_repeats(masking: RepeatMasking, max_pct: u32, seq: &[u8]) -> bool {
    if seq.iter().any(|&b| !nt::is_canonical(b)) {
        return true;
    }

    let rpts = match masking {
        RepeatMasking::Ignore => return false,
        RepeatMasking::Masked => seq.iter().filter(|&&b| nt::is_masked(b)).count(),
        RepeatMasking::Unmasked => seq.iter().filter(|&&b| !nt::is_masked(b)).count(),
    };

    let pct = if seq.is_empty() {
        0
    } else {
        (100 * rpts / seq.len()) as u32
    };
    pct >= max_pct
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmasked_policy_counts_uppercase() {
        let seq = nt::encode(b"ACGTACgt");
        // 6 of 8 unmasked
        assert!(filter_out_repeats(RepeatMasking::Unmasked, 75, &seq));
        assert!(!filter_out_repeats(RepeatMasking::Unmasked, 76, &seq));
    }

    #[test]
    fn default_filter() {
        let filter = RepeatFilter::default();
        assert!(!filter.rejects(&nt::encode(b"ACGTACGTac")));
        assert!(filter.rejects(&nt::encode(b"acgtacgtAC")));
        assert!(RepeatFilter::ignore().rejects(&nt::encode(b"ACGN")));
    }
}
