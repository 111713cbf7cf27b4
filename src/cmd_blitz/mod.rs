//! Subcommand modules for the `blitz` binary.

pub mod align;
pub mod locate;

use anyhow::Context;
use clap::ArgMatches;

/// Value of an argument that has a default or is required
pub fn arg<'a, T>(args: &'a ArgMatches, id: &str) -> anyhow::Result<&'a T>
where
    T: Clone + Send + Sync + 'static,
{
    args.get_one::<T>(id)
        .with_context(|| format!("missing argument <{}>", id))
}
