extern crate clap;
use clap::*;

mod cmd_blitz;

fn main() -> anyhow::Result<()> {
    let app = Command::new("blitz")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`blitz` - Seed-and-chain nucleotide aligner")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::Count)
                .global(true)
                .help("Increase logging verbosity (-v info, -vv debug, -vvv trace)"),
        )
        .subcommand(cmd_blitz::align::make_subcommand())
        .subcommand(cmd_blitz::locate::make_subcommand())
        .after_help(
            r###"Subcommands:

* align  - Align query sequences to targets, output PSL or BED
* locate - Report exact or near-exact seed hits of queries on targets

Set RUST_LOG to filter log messages by module.

"###,
        );

    let matches = app.get_matches();
    init_logger(matches.get_count("verbose"));

    // Check which subcomamnd the user ran...
    match matches.subcommand() {
        Some(("align", sub_matches)) => cmd_blitz::align::execute(sub_matches),
        Some(("locate", sub_matches)) => cmd_blitz::locate::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .init();
}
