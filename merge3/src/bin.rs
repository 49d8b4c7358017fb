use std::fs::File;
use std::io::{stdout, BufWriter};
use anyhow::Result;
use clap::{App, Arg};
use core::config::Config;
use merge3::error::MatcherError;
use merge3::Summary;

pub fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let _ = env_logger::try_init();

    let options = App::new("merge3")
        .version("1.0")
        .about("Three-way merges a common-ancestor CSV file against two descendant files, emitting conflict markers only where both sides genuinely disagree.")
        .arg(Arg::with_name("key")
            .long("key")
            .help("The column name shared by all three files that uniquely identifies a row")
            .required(true)
            .takes_value(true))
        .arg(Arg::with_name("quote")
            .long("quote")
            .help("Quoting policy for re-encoded rows: minimal, all, nonnumeric, none")
            .takes_value(true)
            .default_value("minimal"))
        .arg(Arg::with_name("lineterminator")
            .long("lineterminator")
            .help("Line terminator for re-encoded rows: unix, dos, native")
            .takes_value(true)
            .default_value("native"))
        .arg(Arg::with_name("reformat-all")
            .long("reformat-all")
            .help("Re-encode every output row, even rows that are unchanged from LCA"))
        .arg(Arg::with_name("output")
            .short("o")
            .long("output")
            .help("Path to write the merged output to (defaults to stdout)")
            .takes_value(true))
        .arg(Arg::with_name("lca")
            .help("The common ancestor CSV file")
            .required(true)
            .takes_value(true))
        .arg(Arg::with_name("a")
            .help("The first descendant CSV file")
            .required(true)
            .takes_value(true))
        .arg(Arg::with_name("b")
            .help("The second descendant CSV file")
            .required(true)
            .takes_value(true))
        .get_matches();

    let key = options.value_of("key").expect("key is required").to_string();
    let config = Config::new(key)
        .with_quote(options.value_of("quote").expect("has a default").parse()?)
        .with_line_terminator(options.value_of("lineterminator").expect("has a default").parse()?)
        .with_reformat_all(options.is_present("reformat-all"));

    let lca_path = options.value_of("lca").expect("lca is required");
    let a_path = options.value_of("a").expect("a is required");
    let b_path = options.value_of("b").expect("b is required");
    let output_path = options.value_of("output");

    let result = run_merge(lca_path, a_path, b_path, output_path, &config);

    match result {
        Ok(summary) => {
            log::info!(
                "wrote {} row(s), {} conflict(s), {} header reorder diagnostic(s)",
                summary.rows_written, summary.conflicts, summary.header_diagnostics
            );
            std::process::exit(merge3::exit_code_for_summary(&summary));
        },
        Err(err) => {
            log::error!("{}", err);
            std::process::exit(merge3::exit_code_for_error(&err));
        },
    }
}

///
/// Open the three inputs, open (or default to stdout) the output sink, and run the merge - all as
/// one `MatcherError` path, so a failure to open/create any of these files surfaces through
/// `exit_code_for_error` (design §6 "distinct codes") exactly like a failure inside the merge
/// itself, rather than bypassing it with a generic exit code.
///
fn run_merge(
    lca_path: &str,
    a_path: &str,
    b_path: &str,
    output_path: Option<&str>,
    config: &Config,
) -> Result<Summary, MatcherError> {
    let lca = File::open(lca_path)?;
    let a = File::open(a_path)?;
    let b = File::open(b_path)?;

    match output_path {
        Some(output_path) => {
            let sink = File::create(output_path)?;
            merge3::merge_files(lca_path, lca, a_path, a, b_path, b, BufWriter::new(sink), config)
        },
        None => merge3::merge_files(lca_path, lca, a_path, a, b_path, b, BufWriter::new(stdout()), config),
    }
}
