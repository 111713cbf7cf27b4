use crate::cmd_blitz::arg;
use blitz::libs::nt::{self, Strand};
use blitz::libs::sfx::{HitFilter, NearExactParams, RepeatFilter, SeedHit};
use clap::*;
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("locate")
        .about("Reports seed hits of queries on target sequences")
        .after_help(
            r###"
Indexes all target sequences and reports where each query matches, without chaining.

Output columns (tab-separated):
    query  query_start  length  target  target_start  strand

Notes:
* Supports both plain text and gzipped (.gz) files
* Reads queries from stdin if the query file is 'stdin'
* Both query strands are searched; query starts are on the forward strand
* With `--mismatches 0` (default) hits are maximal exact matches of at least
  `--min-hit-len` bases; hits contained in another hit are not reported
* With `--mismatches n` hits hold an exact core of `--core-len` bases and up to n
  mismatches on each flank

Examples:
1. Exact matches of at least 20bp:
   blitz locate genome.fa reads.fa

2. Near-exact hits with 12bp cores:
   blitz locate genome.fa reads.fa --mismatches 1 --core-len 12 --min-hit-len 30

"###,
        )
        .arg(
            Arg::new("targets")
                .required(true)
                .num_args(1)
                .index(1)
                .help("Target FASTA file to index"),
        )
        .arg(
            Arg::new("queries")
                .required(true)
                .num_args(1)
                .index(2)
                .help("Query FASTA file"),
        )
        .arg(
            Arg::new("min_hit_len")
                .long("min-hit-len")
                .short('l')
                .value_parser(value_parser!(usize))
                .default_value("20")
                .help("Minimum hit length"),
        )
        .arg(
            Arg::new("core_len")
                .long("core-len")
                .short('c')
                .value_parser(value_parser!(usize))
                .default_value("12")
                .help("Minimum exact core length of near-exact hits"),
        )
        .arg(
            Arg::new("mismatches")
                .long("mismatches")
                .value_parser(value_parser!(usize))
                .default_value("0")
                .help("Mismatches allowed on each flank"),
        )
        .arg(
            Arg::new("outfile")
                .long("outfile")
                .short('o')
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let min_hit_len = *arg::<usize>(args, "min_hit_len")?;
    let mismatches = *arg::<usize>(args, "mismatches")?;
    let params = NearExactParams {
        min_core_len: *arg::<usize>(args, "core_len")?,
        left_max_mismatches: mismatches,
        right_max_mismatches: mismatches,
        min_hit_len,
        repeats: RepeatFilter::ignore(),
        ..Default::default()
    };

    let index = blitz::load_targets(arg::<String>(args, "targets")?)?;
    let mut writer = blitz::writer(arg::<String>(args, "outfile")?)?;

    blitz::for_each_fasta(arg::<String>(args, "queries")?, |name, seq| {
        let sense = nt::encode(seq);
        if sense.len() < min_hit_len {
            log::debug!("Query {} shorter than {}bp, skipped", name, min_hit_len);
            return Ok(true);
        }
        let anti = nt::rev_comp(&sense);

        let mut lines = vec![];
        for (strand, probe) in [(Strand::Sense, &sense), (Strand::Antisense, &anti)] {
            let mut hits = vec![];
            let mut collect = |hit: &SeedHit<String>| {
                hits.push((hit.probe_ofs, hit.hit_len, hit.seq_idx, hit.target_ofs));
                true
            };
            if mismatches == 0 {
                index.locate_exacts(
                    probe,
                    min_hit_len,
                    params.repeats,
                    |_| HitFilter::Accept,
                    &mut collect,
                )?;
            } else {
                index.locate_near_exacts(probe, &params, |_| HitFilter::Accept, &mut collect)?;
            }

            for (probe_ofs, len, seq_idx, target_ofs) in hits {
                let q_start = match strand {
                    Strand::Sense => probe_ofs,
                    Strand::Antisense => sense.len() - (probe_ofs + len),
                };
                lines.push(format!(
                    "{}\t{}\t{}\t{}\t{}\t{}\n",
                    name,
                    q_start,
                    len,
                    index.target_ref(seq_idx),
                    target_ofs,
                    strand.as_char()
                ));
            }
        }

        for line in lines {
            writer.write_all(line.as_bytes())?;
        }
        Ok(true)
    })?;

    writer.flush()?;
    Ok(())
}
