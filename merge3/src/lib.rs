pub mod error;
pub mod model;
pub mod io;
pub mod merge;

use std::io::{Read, Write};
use core::config::Config;
use error::MatcherError;
use io::{reader, writer::RowWriter};
use merge::driver::{self, OutputRow};

///
/// Counts surfaced to the CLI driver after a successful merge (no fatal error, possibly some
/// row-level conflicts).
///
pub struct Summary {
    pub rows_written: usize,
    pub bytes_written: usize,
    pub conflicts: usize,
    pub header_diagnostics: usize,
}

///
/// Run a complete three-way merge: load all three inputs, reconcile headers, drive the merge
/// state machine, and stream the result to `sink` (design §2 data flow, §6 external interface).
///
pub fn merge_files<LCA: Read, A: Read, B: Read, W: Write>(
    lca_path: &str, lca: LCA,
    a_path: &str, a: A,
    b_path: &str, b: B,
    sink: W,
    config: &Config,
) -> Result<Summary, MatcherError> {
    let fs_l = reader::load(lca_path, lca, config.key())?;
    let fs_a = reader::load(a_path, a, config.key())?;
    let fs_b = reader::load(b_path, b, config.key())?;

    log::info!("loaded {} LCA rows, {} A rows, {} B rows", fs_l.len(), fs_a.len(), fs_b.len());

    let outcome = driver::run(&fs_l, &fs_a, &fs_b)?;

    for diag in &outcome.header_diagnostics {
        log::warn!(
            "column '{}' was reordered differently by A ({:?}) and B ({:?}); A's order was kept",
            diag.column, diag.a_order, diag.b_order
        );
    }

    let mut writer = RowWriter::new(sink, config.clone());

    if outcome.header.columns() == fs_l.header().columns() && !config.reformat_all() {
        writer.write_raw(fs_l.header_raw())?;
    } else {
        writer.write_encoded(outcome.header.columns())?;
    }

    for row in &outcome.rows {
        match row {
            OutputRow::Row { fields, raw, unchanged } => {
                if *unchanged && !config.reformat_all() {
                    writer.write_raw(raw.as_ref().expect("row marked unchanged without raw text"))?;
                } else {
                    writer.write_encoded(fields)?;
                }
            },
            OutputRow::Conflict(block) => writer.write_conflict_block(block)?,
        }
    }

    writer.flush()?;

    if outcome.conflict_count > 0 {
        log::warn!("{} row-level conflict(s) written to output", outcome.conflict_count);
    }
    log::info!(
        "wrote {} row(s), {} byte(s)",
        core::blue(&format!("{}", writer.rows_written())),
        core::blue(&format!("{}", writer.bytes_written())),
    );

    Ok(Summary {
        rows_written: writer.rows_written(),
        bytes_written: writer.bytes_written(),
        conflicts: outcome.conflict_count,
        header_diagnostics: outcome.header_diagnostics.len(),
    })
}

///
/// Process exit codes for the CLI driver (design §6 "Exit contract"). Distinct nonzero codes per
/// failure kind so callers can script around specific failures.
///
pub fn exit_code_for_error(err: &MatcherError) -> i32 {
    match err {
        MatcherError::MalformedRow { .. } => 2,
        MatcherError::DuplicateKey { .. } => 3,
        MatcherError::MissingKeyColumn { .. } => 4,
        MatcherError::HeaderEmpty => 2,
        MatcherError::DuplicateColumn { .. } => 2,
        MatcherError::InternalInvariant { .. } => 6,
        MatcherError::ConfigError(_) => 2,
        MatcherError::CsvError(_) => 2,
        MatcherError::IOError(_) => 5,
    }
}

///
/// Exit code for a merge that completed without a fatal error (design §6): zero if no row-level
/// conflicts were emitted, one otherwise.
///
pub fn exit_code_for_summary(summary: &Summary) -> i32 {
    if summary.conflicts > 0 { 1 } else { 0 }
}
