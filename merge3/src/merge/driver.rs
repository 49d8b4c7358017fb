use bytes::Bytes;
use crate::error::MatcherError;
use crate::model::{
    filestate::FileState,
    header::{ColumnMap, Header, HeaderReorderConflict, merge_headers},
    row::Row,
};
use crate::merge::cursor::Cursor;
use crate::merge::relevance::{relevance, min_relevance};
use crate::merge::rowmerge::{self, Presence, RowMergeOutcome};

///
/// One row of the merged output, ready for the writer (design §4.1/§4.6): either a clean row
/// (with its original raw bytes attached when it's unchanged) or a pre-rendered conflict block.
///
pub enum OutputRow {
    Row { fields: Vec<String>, raw: Option<Bytes>, unchanged: bool },
    Conflict(Vec<u8>),
}

pub struct MergeOutcome {
    pub header: Header,
    pub rows: Vec<OutputRow>,
    pub header_diagnostics: Vec<HeaderReorderConflict>,
    pub conflict_count: usize,
}

///
/// Run the three-cursor state machine to completion (design §4.6, C6). Drives `Cursor`/`relevance`
/// (C4/C5) to decide, iteration by iteration, which key to resolve next, then resolves it by
/// pulling that key's row from every file it appears in (backlog or ahead) and handing them to
/// `rowmerge` (C7).
///
pub fn run(fs_l: &FileState, fs_a: &FileState, fs_b: &FileState) -> Result<MergeOutcome, MatcherError> {
    let (header, maps, header_diagnostics) = merge_headers(fs_l.header(), fs_a.header(), fs_b.header())?;

    let mut cur_l = Cursor::new(fs_l);
    let mut cur_a = Cursor::new(fs_a);
    let mut cur_b = Cursor::new(fs_b);

    let mut rows = Vec::new();
    let mut conflict_count = 0;

    loop {
        let k_l = cur_l.peek().map(|(_, r)| r.key().to_string());
        let k_a = cur_a.peek().map(|(_, r)| r.key().to_string());
        let k_b = cur_b.peek().map(|(_, r)| r.key().to_string());

        if k_l.is_none() && k_a.is_none() && k_b.is_none() {
            break
        }

        let key = match choose_key(&k_l, &k_a, &k_b, &mut cur_l, &mut cur_a, &mut cur_b)? {
            ChosenKey::Key(key) => key,
            ChosenKey::DeferLcaAndRetry => { cur_l.defer(); continue },
        };

        emit_for_key(&header, &maps, &key, &mut cur_l, &mut cur_a, &mut cur_b, &mut rows, &mut conflict_count)?;
    }

    Ok(MergeOutcome { header, rows, header_diagnostics, conflict_count })
}

enum ChosenKey {
    Key(String),
    DeferLcaAndRetry,
}

///
/// Decide which key the next iteration resolves, following the numbered rules of design §4.6.
/// Deferring LCA and retrying is reported rather than performed here so the caller's cursor
/// borrows stay simple.
///
fn choose_key(
    k_l: &Option<String>,
    k_a: &Option<String>,
    k_b: &Option<String>,
    cur_l: &mut Cursor<'_>,
    cur_a: &mut Cursor<'_>,
    cur_b: &mut Cursor<'_>,
) -> Result<ChosenKey, MatcherError> {
    // Rule 1: all three aligned.
    if k_l.is_some() && k_l == k_a && k_l == k_b {
        return Ok(ChosenKey::Key(k_l.clone().unwrap()))
    }

    // Rule 2: A and B aligned, LCA elsewhere (or drained).
    if k_a.is_some() && k_a == k_b && k_a != k_l {
        if let Some(kl) = k_l {
            if min_relevance(kl, cur_a, cur_b) != usize::MAX {
                return Ok(ChosenKey::DeferLcaAndRetry)
            }
        }
        return Ok(ChosenKey::Key(k_a.clone().unwrap()))
    }

    // Rule 3: LCA aligned with exactly one side - resolve the *other* side's key, which defers
    // LCA's and the aligned side's current rows as a side effect of `take` searching ahead.
    if k_l.is_some() && k_l == k_a && k_a != k_b {
        return Ok(ChosenKey::Key(k_b.clone().unwrap_or_else(|| k_l.clone().unwrap())))
    }
    if k_l.is_some() && k_l == k_b && k_b != k_a {
        return Ok(ChosenKey::Key(k_a.clone().unwrap_or_else(|| k_l.clone().unwrap())))
    }

    // Rule 4: resync, then the 3-way ordering rule.
    let r_l = match k_l {
        Some(kl) => min_relevance(kl, cur_a, cur_b),
        None => usize::MAX,
    };
    let r_a = match k_a {
        Some(ka) => relevance(ka, cur_l),
        None => usize::MAX,
    };
    let r_b = match k_b {
        Some(kb) => relevance(kb, cur_l),
        None => usize::MAX,
    };

    if k_l.is_some() && r_l != usize::MAX && r_l > r_a.max(r_b) {
        return Ok(ChosenKey::DeferLcaAndRetry)
    }

    match (k_a, k_b) {
        (Some(ka), Some(kb)) => {
            let rel_a_in_b = relevance(ka, cur_b);
            let rel_b_in_a = relevance(kb, cur_a);
            if rel_a_in_b < rel_b_in_a {
                Ok(ChosenKey::Key(ka.clone()))
            } else {
                Ok(ChosenKey::Key(kb.clone())) // Tie breaks to A above; here B is strictly closer.
            }
        },
        (Some(ka), None) => Ok(ChosenKey::Key(ka.clone())),
        (None, Some(kb)) => Ok(ChosenKey::Key(kb.clone())),
        // Every cursor must be drained by the time resync falls through to here (rule 1's guard
        // would otherwise have matched); k_l being absent too means all three are empty, which the
        // caller's loop already breaks on before ever calling choose_key.
        (None, None) => match k_l {
            Some(kl) => Ok(ChosenKey::Key(kl.clone())),
            None => Err(MatcherError::InternalInvariant {
                reason: "resync reached with every cursor exhausted".into(),
            }),
        },
    }
}

///
/// Pull `key`'s row out of every file it's present in (backlog or ahead) and resolve it into
/// zero or one output rows. This is the single emission path for all of rules 1-4: the only
/// thing that differs between them is which key gets chosen above.
///
fn emit_for_key(
    header: &Header,
    maps: &[ColumnMap; 3],
    key: &str,
    cur_l: &mut Cursor<'_>,
    cur_a: &mut Cursor<'_>,
    cur_b: &mut Cursor<'_>,
    rows: &mut Vec<OutputRow>,
    conflict_count: &mut usize,
) -> Result<(), MatcherError> {
    let row_l = cur_l.take(key);
    let row_a = cur_a.take(key);
    let row_b = cur_b.take(key);

    match (row_l, row_a, row_b) {
        (_, None, None) => {}, // Deleted on both sides (or never existed) - silent (design §4.6 Deletion).

        (None, Some(a), None) => rows.push(insertion(header, &maps[1], a)),
        (None, None, Some(b)) => rows.push(insertion(header, &maps[2], b)),

        (None, Some(a), Some(b)) => push_merge(header, maps, key, None, a, Some(b), rows, conflict_count),

        (Some(l), Some(a), None) => {
            if row_modified(header, &maps[0], &maps[1], l, a) {
                rows.push(OutputRow::Conflict(rowmerge::format_delete_modify_conflict(
                    key,
                    Presence::Present { line: a.line(), raw: a.raw().clone() },
                    Presence::Deleted { lca_line: l.line() },
                )));
                *conflict_count += 1;
            } // else: B deleted it, A left it untouched - plain deletion, drop silently.
        },

        (Some(l), None, Some(b)) => {
            if row_modified(header, &maps[0], &maps[2], l, b) {
                rows.push(OutputRow::Conflict(rowmerge::format_delete_modify_conflict(
                    key,
                    Presence::Deleted { lca_line: l.line() },
                    Presence::Present { line: b.line(), raw: b.raw().clone() },
                )));
                *conflict_count += 1;
            } // else: A deleted it, B left it untouched - plain deletion, drop silently.
        },

        (Some(l), Some(a), Some(b)) => push_merge(header, maps, key, Some(l), a, Some(b), rows, conflict_count),
    }

    Ok(())
}

fn push_merge(
    header: &Header,
    maps: &[ColumnMap; 3],
    key: &str,
    row_l: Option<&Row>,
    row_a: &Row,
    row_b: Option<&Row>,
    rows: &mut Vec<OutputRow>,
    conflict_count: &mut usize,
) {
    match rowmerge::merge_row(header, maps, key, row_l, row_a, row_b) {
        RowMergeOutcome::Merged { fields, unchanged } => {
            let raw = if unchanged { Some(row_a.raw().clone()) } else { None };
            rows.push(OutputRow::Row { fields, raw, unchanged });
        },
        RowMergeOutcome::Conflict(block) => {
            rows.push(OutputRow::Conflict(block));
            *conflict_count += 1;
        },
    }
}

///
/// A row present on only one side with no LCA or opposite-side counterpart: a pure insertion.
/// Re-map its fields into the output schema directly - there's nothing to merge.
///
fn insertion(header: &Header, map: &ColumnMap, row: &Row) -> OutputRow {
    let fields = (0..header.width())
        .map(|col| map.position(col).and_then(|p| row.field(p)).unwrap_or("").to_string())
        .collect();
    OutputRow::Row { fields, raw: None, unchanged: false }
}

///
/// Whether `side` changed any of `lca`'s values, comparing through each row's own column map into
/// the shared output schema (design §4.6 "modified").
///
fn row_modified(header: &Header, map_l: &ColumnMap, map_side: &ColumnMap, lca: &Row, side: &Row) -> bool {
    (0..header.width()).any(|col| {
        let v_l = map_l.position(col).and_then(|p| lca.field(p));
        let v_side = map_side.position(col).and_then(|p| side.field(p));
        v_l != v_side
    })
}
