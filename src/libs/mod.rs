pub mod chaining;
pub mod io;
pub mod nt;
pub mod pipeline;
pub mod psl;
pub mod report;
pub mod sfx;
