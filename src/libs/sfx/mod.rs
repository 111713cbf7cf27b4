//! Suffix index over a multi-sequence corpus, with exact and near-exact seed location.

pub mod cores;
pub mod corpus;
pub mod index;
pub mod repeat;

pub use cores::{PutCore, PutativeCores};
pub use corpus::{Corpus, SeqEntry};
pub use index::{seed_params, HitFilter, NearExactParams, PutativeHit, SeedHit, SuffixIndex};
pub use repeat::{filter_out_repeats, RepeatFilter, RepeatMasking};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SfxError {
    #[error("suffix index has not been built")]
    NotBuilt,

    #[error("suffix index already built, no more sequences can be added")]
    AlreadyBuilt,

    #[error("empty sequence can't be indexed")]
    EmptySequence,

    #[error("seed length must be at least 1")]
    InvalidSeedLen,

    #[error("minimum hit length {min_hit_len} exceeds probe length {probe_len}")]
    HitLenExceedsProbe { min_hit_len: usize, probe_len: usize },

    #[error("unable to allocate memory for {0}")]
    OutOfMemory(&'static str),
}
