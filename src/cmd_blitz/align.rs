use crate::cmd_blitz::arg;
use blitz::libs::chaining::ChainScoring;
use blitz::libs::nt::{self, AlignStrand};
use blitz::libs::pipeline::{self, AlignConfig, QueryFeeder, ShutdownFlag};
use blitz::libs::report::{OutputFormat, OutputSink, PathReporter};
use blitz::libs::sfx::{NearExactParams, RepeatFilter, RepeatMasking};
use clap::*;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("align")
        .about("Aligns query sequences to target sequences")
        .after_help(
            r###"
Indexes all target sequences, then seeds every query against the index and chains the
seed hits into colinear, gapped alignment paths.

Notes:
* Supports both plain text and gzipped (.gz) files
* Reads queries from stdin if the query file is 'stdin'
* Lowercase bases are repeat-masked
    * `--repeat masked` (default) skips hits made mostly of masked query bases
    * `--repeat unmasked` skips hits made mostly of unmasked bases
    * `--repeat ignore` keeps all hits
* Seeds need an exact core of `--core-len` bases and may extend past it with up to
  `--mismatches` mismatches on each flank
* Path score: matches minus mismatch penalties minus gap costs
    * A gap costs `--gap-open` plus 1 per 10bp, capped at 10
* For each query, at most `--max-paths` paths are reported, best first
* Paths covering less than `--query-pct` percent of the query are dropped
* Runs in parallel with 1 loader and `--parallel` workers
    * The order of queries in the output may differ from the input

Examples:
1. Align queries to a genome, PSL output:
   blitz align genome.fa reads.fa

2. BED output, forward strand only:
   blitz align genome.fa reads.fa --format bed --strand sense

3. Exact seeds only, 4 threads, output to a file:
   blitz align genome.fa reads.fa --mismatches 0 --parallel 4 -o out.psl

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
            Arg::new("format")
                .long("format")
                .value_parser(["psl", "bed"])
                .default_value("psl")
                .help("Output format"),
        )
        .arg(
            Arg::new("strand")
                .long("strand")
                .value_parser(["both", "sense", "antisense"])
                .default_value("both")
                .help("Query strands to align"),
        )
        .arg(
            Arg::new("core_len")
                .long("core-len")
                .short('c')
                .value_parser(value_parser!(usize))
                .default_value("12")
                .help("Minimum exact core length of a seed"),
        )
        .arg(
            Arg::new("min_hit_len")
                .long("min-hit-len")
                .short('l')
                .value_parser(value_parser!(usize))
                .default_value("16")
                .help("Minimum length of a seed hit, core and flanks"),
        )
        .arg(
            Arg::new("mismatches")
                .long("mismatches")
                .value_parser(value_parser!(usize))
                .default_value("2")
                .help("Mismatches allowed on each flank of a seed core"),
        )
        .arg(
            Arg::new("match")
                .long("match")
                .value_parser(value_parser!(i32))
                .default_value("1")
                .help("Score for a matching base"),
        )
        .arg(
            Arg::new("mismatch")
                .long("mismatch")
                .value_parser(value_parser!(i32))
                .default_value("2")
                .help("Penalty for a mismatching base"),
        )
        .arg(
            Arg::new("gap_open")
                .long("gap-open")
                .value_parser(value_parser!(i32))
                .default_value("5")
                .help("Penalty for opening a gap between seeds"),
        )
        .arg(
            Arg::new("min_score")
                .long("min-score")
                .value_parser(value_parser!(i32))
                .default_value("75")
                .help("Minimum path score"),
        )
        .arg(
            Arg::new("query_pct")
                .long("query-pct")
                .value_parser(value_parser!(usize))
                .default_value("25")
                .help("Minimum percentage of the query a path must cover"),
        )
        .arg(
            Arg::new("max_paths")
                .long("max-paths")
                .value_parser(value_parser!(usize))
                .default_value("10")
                .help("Report at most this many paths per query"),
        )
        .arg(
            Arg::new("repeat")
                .long("repeat")
                .value_parser(["ignore", "masked", "unmasked"])
                .default_value("masked")
                .help("Which bases count as repeats"),
        )
        .arg(
            Arg::new("repeat_pct")
                .long("repeat-pct")
                .value_parser(value_parser!(u32))
                .default_value("80")
                .help("Skip seed hits with at least this percentage of repeat bases"),
        )
        .arg(
            Arg::new("parallel")
                .long("parallel")
                .short('p')
                .value_parser(value_parser!(usize))
                .num_args(1)
                .default_value("0")
                .help("Number of worker threads. 0 for all CPUs"),
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
    let config = align_config(args)?;
    let format: OutputFormat = arg::<String>(args, "format")?.parse()?;
    let queries = arg::<String>(args, "queries")?;

    let index = blitz::load_targets(arg::<String>(args, "targets")?)?;
    let writer = blitz::writer(arg::<String>(args, "outfile")?)?;
    let reporter = PathReporter::new(OutputSink::new(writer), format);

    let loader = |feeder: &mut QueryFeeder| {
        blitz::for_each_fasta(queries, |name, seq| Ok(feeder.push(name, nt::encode(seq))))
    };
    let summary = pipeline::run(&index, &config, &ShutdownFlag::new(), loader, &reporter)?;
    reporter.finish()?;

    log::info!(
        "{} of {} queries aligned",
        summary.queries_with_paths,
        summary.processed
    );

    Ok(())
}

fn align_config(args: &ArgMatches) -> anyhow::Result<AlignConfig> {
    let mismatches = *arg::<usize>(args, "mismatches")?;
    let masking: RepeatMasking = arg::<String>(args, "repeat")?.parse()?;

    let seeds = NearExactParams {
        min_core_len: *arg::<usize>(args, "core_len")?,
        left_max_mismatches: mismatches,
        right_max_mismatches: mismatches,
        min_hit_len: *arg::<usize>(args, "min_hit_len")?,
        repeats: RepeatFilter {
            masking,
            max_pct: *arg::<u32>(args, "repeat_pct")?,
        },
        ..Default::default()
    };
    if seeds.min_core_len == 0 || seeds.min_hit_len == 0 {
        anyhow::bail!("--core-len and --min-hit-len must be at least 1");
    }

    let scoring = ChainScoring {
        match_reward: *arg::<i32>(args, "match")?,
        mismatch_penalty: *arg::<i32>(args, "mismatch")?,
        gap_open: *arg::<i32>(args, "gap_open")?,
        min_path_score: *arg::<i32>(args, "min_score")?,
        min_query_aligned_pct: *arg::<usize>(args, "query_pct")?,
        max_paths: *arg::<usize>(args, "max_paths")?,
        ..Default::default()
    };

    let parallel = *arg::<usize>(args, "parallel")?;
    let strand: AlignStrand = arg::<String>(args, "strand")?.parse()?;

    Ok(AlignConfig {
        seeds,
        scoring,
        strand,
        threads: if parallel == 0 {
            pipeline::default_threads()
        } else {
            parallel
        },
        ..Default::default()
    })
}
