pub mod assembler;
pub mod node;
pub mod path;
pub mod score;

pub use assembler::{Mark, PathAssembler, PathHead};
pub use node::{target_runs, SeedNode, SeedNodeSet};
pub use path::{AlignBlock, AlignPath};
pub use score::ChainScoring;
