//! Nucleotide codes.
//!
//! Bases are packed into the low three bits of a byte. Bit `0x08` marks a
//! repeat-masked base (a lowercase letter in the FASTA source).

/// Repeat-mask flag carried alongside a base code
pub const RPT_MASK_FLAG: u8 = 0x08;

/// Bits holding the base itself
pub const BASE_MASK: u8 = 0x07;

pub const A: u8 = 0;
pub const C: u8 = 1;
pub const G: u8 = 2;
pub const T: u8 = 3;
pub const N: u8 = 4;

/// Separator between concatenated sequences; also returned for out-of-range reads.
/// Compares greater than every base.
pub const EOS: u8 = 7;

/// Query strand relative to the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Strand {
    Sense,
    Antisense,
}

impl Strand {
    pub fn as_char(&self) -> char {
        match self {
            Strand::Sense => '+',
            Strand::Antisense => '-',
        }
    }
}

/// Which query strands to align
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignStrand {
    Both,
    Sense,
    Antisense,
}

impl AlignStrand {
    pub fn strands(&self) -> &'static [Strand] {
        match self {
            AlignStrand::Both => &[Strand::Sense, Strand::Antisense],
            AlignStrand::Sense => &[Strand::Sense],
            AlignStrand::Antisense => &[Strand::Antisense],
        }
    }
}

impl std::str::FromStr for AlignStrand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "both" => Ok(AlignStrand::Both),
            "sense" | "+" => Ok(AlignStrand::Sense),
            "antisense" | "-" => Ok(AlignStrand::Antisense),
            _ => Err(anyhow::anyhow!("Unknown strand: {}", s)),
        }
    }
}

/// Encodes one ASCII letter. Lowercase letters get the repeat-mask flag.
/// Anything that isn't ACGT becomes N.
#[inline]
pub fn encode_base(b: u8) -> u8 {
    let code = match b.to_ascii_uppercase() {
        b'A' => A,
        b'C' => C,
        b'G' => G,
        b'T' | b'U' => T,
        _ => N,
    };
    if b.is_ascii_lowercase() {
        code | RPT_MASK_FLAG
    } else {
        code
    }
}

/// ```
/// use blitz::libs::nt;
/// assert_eq!(nt::encode(b"ACgtN"), vec![0, 1, 2 | 0x08, 3 | 0x08, 4]);
/// ```
pub fn encode(seq: &[u8]) -> Vec<u8> {
    seq.iter().map(|&b| encode_base(b)).collect()
}

#[inline]
pub fn decode_base(code: u8) -> u8 {
    let b = match code & BASE_MASK {
        A => b'A',
        C => b'C',
        G => b'G',
        T => b'T',
        N => b'N',
        _ => b'-',
    };
    if code & RPT_MASK_FLAG != 0 {
        b.to_ascii_lowercase()
    } else {
        b
    }
}

pub fn decode(codes: &[u8]) -> String {
    codes.iter().map(|&c| decode_base(c) as char).collect()
}

/// A, C, G or T, mask ignored
#[inline]
pub fn is_canonical(code: u8) -> bool {
    code & BASE_MASK <= T
}

#[inline]
pub fn is_masked(code: u8) -> bool {
    code & RPT_MASK_FLAG != 0
}

/// Reverse complement of encoded bases. Non-canonical codes are kept, mask flags travel with their base.
///
/// ```
/// use blitz::libs::nt;
/// let rc = nt::rev_comp(&nt::encode(b"AACGn"));
/// assert_eq!(nt::decode(&rc), "nCGTT");
/// ```
pub fn rev_comp(codes: &[u8]) -> Vec<u8> {
    codes
        .iter()
        .rev()
        .map(|&c| {
            let base = c & BASE_MASK;
            let comp = if base <= T { T - base } else { base };
            comp | (c & RPT_MASK_FLAG)
        })
        .collect()
}
