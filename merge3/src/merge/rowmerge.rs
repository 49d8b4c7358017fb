use bytes::Bytes;
use crate::model::header::{ColumnMap, Header};
use crate::model::row::Row;

///
/// The result of merging one aligned row (design §4.7, C7): either a clean merged row, or a
/// conflict block ready to write verbatim.
///
pub enum RowMergeOutcome {
    Merged { fields: Vec<String>, unchanged: bool },
    Conflict(Vec<u8>),
}

fn value<'r>(row: Option<&'r Row>, map: &ColumnMap, col: usize) -> Option<&'r str> {
    let row = row?;
    let pos = map.position(col)?;
    row.field(pos)
}

///
/// Three-way resolution of one column's value (design §4.7). `v_l` doubles as "no ancestor
/// value" both when the LCA row doesn't exist (insertion) and when the column itself is new -
/// the resolution is identical either way: take whichever side has a value, conflict if both do
/// and disagree.
///
fn resolve_field(v_l: Option<&str>, v_a: Option<&str>, v_b: Option<&str>) -> Result<Option<String>, ()> {
    if v_a == v_b {
        return Ok(v_a.map(str::to_string))
    }

    match v_l {
        Some(l) if v_a == Some(l) => Ok(v_b.map(str::to_string)), // B changed it.
        Some(l) if v_b == Some(l) => Ok(v_a.map(str::to_string)), // A changed it.
        Some(_) => Err(()),                                       // Both changed it, differently.
        None => match (v_a, v_b) {
            (Some(a), None) => Ok(Some(a.to_string())),
            (None, Some(b)) => Ok(Some(b.to_string())),
            _ => Err(()),
        },
    }
}

///
/// Merge one row present (or absent, for an insertion) on up to three sides into a single output
/// row, or a conflict block if any column disagrees irreconcilably.
///
pub fn merge_row(
    output: &Header,
    maps: &[ColumnMap; 3],
    key: &str,
    row_l: Option<&Row>,
    row_a: &Row,
    row_b: Option<&Row>,
) -> RowMergeOutcome {
    let mut fields = Vec::with_capacity(output.width());
    let mut conflicts = Vec::new();

    for col in 0..output.width() {
        let v_l = value(row_l, &maps[0], col);
        let v_a = value(Some(row_a), &maps[1], col);
        let v_b = value(row_b, &maps[2], col);

        match resolve_field(v_l, v_a, v_b) {
            Ok(v) => fields.push(v.unwrap_or_default()),
            Err(()) => {
                conflicts.push((output.columns()[col].clone(), v_a.map(str::to_string), v_b.map(str::to_string)));
                fields.push(String::new());
            },
        }
    }

    if conflicts.is_empty() {
        let unchanged = row_l.is_some()
            && row_b.is_some()
            && row_a.raw() == row_l.unwrap().raw()
            && row_b.unwrap().raw() == row_l.unwrap().raw();

        RowMergeOutcome::Merged { fields, unchanged }
    } else {
        let block = format_conflict(
            key,
            &conflicts,
            Presence::Present { line: row_a.line(), raw: row_a.raw().clone() },
            match row_b {
                Some(b) => Presence::Present { line: b.line(), raw: b.raw().clone() },
                None => Presence::Deleted { lca_line: row_l.map(Row::line).unwrap_or(0) },
            },
        );
        RowMergeOutcome::Conflict(block)
    }
}

///
/// One side's presence for a conflict block: either a real row (with its source line and raw
/// text) or "deleted", carrying the LCA line the deletion was detected against.
///
pub enum Presence {
    Present { line: usize, raw: Bytes },
    Deleted { lca_line: usize },
}

///
/// Render a delete-vs-modify conflict: one side deleted the row present in LCA, the other
/// modified it (design §4.6 "Deletion", §8 scenario S6). No field-level conflicts are listed -
/// the whole row is in contention. `a` and `b` must already be in A/B order; exactly one of them
/// is `Deleted`.
///
pub fn format_delete_modify_conflict(key: &str, a: Presence, b: Presence) -> Vec<u8> {
    format_conflict(key, &[], a, b)
}

fn format_conflict(key: &str, conflicts: &[(String, Option<String>, Option<String>)], a: Presence, b: Presence) -> Vec<u8> {
    let a_fields: Vec<(String, Option<String>)> = conflicts.iter().map(|(c, av, _)| (c.clone(), av.clone())).collect();
    let b_fields: Vec<(String, Option<String>)> = conflicts.iter().map(|(c, _, bv)| (c.clone(), bv.clone())).collect();

    let mut out = Vec::new();
    write_side(&mut out, ">>>>>>", key, &a_fields, &a);
    write_side(&mut out, "======", key, &b_fields, &b);
    out.extend_from_slice(b"<<<<<<\n");
    out
}

fn write_side(out: &mut Vec<u8>, marker: &str, key: &str, fields: &[(String, Option<String>)], side: &Presence) {
    write_side_header(out, marker, key, side);
    for (col, v) in fields {
        out.extend_from_slice(format!("{} {} = {}\n", marker, col, display_value(v.as_deref())).as_bytes());
    }
    write_side_body(out, side);
}

fn write_side_header(out: &mut Vec<u8>, marker: &str, key: &str, side: &Presence) {
    match side {
        Presence::Present { line, .. } => out.extend_from_slice(format!("{} input @{} ({})\n", marker, line, key).as_bytes()),
        Presence::Deleted { lca_line } => out.extend_from_slice(format!("{} input Deleted @{}\n", marker, lca_line).as_bytes()),
    }
}

fn write_side_body(out: &mut Vec<u8>, side: &Presence) {
    if let Presence::Present { raw, .. } = side {
        out.extend_from_slice(raw);
    }
}

fn display_value(v: Option<&str>) -> String {
    match v {
        Some(v) => v.replace('\n', "\\n"),
        None => "None".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::header::merge_headers;

    fn row(line: usize, raw: &[u8], fields: &[&str], key_col: usize) -> Row {
        Row::new(line, Bytes::copy_from_slice(raw), fields.iter().map(|f| f.to_string()).collect(), fields[key_col].to_string())
    }

    fn headers() -> (Header, Header, Header) {
        (
            Header::new(vec!["k".into(), "v".into(), "w".into()]).unwrap(),
            Header::new(vec!["k".into(), "v".into(), "w".into()]).unwrap(),
            Header::new(vec!["k".into(), "v".into(), "w".into()]).unwrap(),
        )
    }

    #[test]
    fn test_disjoint_field_edits_merge_cleanly_s2() {
        let (h_l, h_a, h_b) = headers();
        let (out, maps, _) = merge_headers(&h_l, &h_a, &h_b).unwrap();

        let l = row(2, b"1,a,x\n", &["1", "a", "x"], 0);
        let a = row(2, b"1,A,x\n", &["1", "A", "x"], 0);
        let b = row(2, b"1,a,X\n", &["1", "a", "X"], 0);

        match merge_row(&out, &maps, "1", Some(&l), &a, Some(&b)) {
            RowMergeOutcome::Merged { fields, unchanged } => {
                assert_eq!(vec!["1", "A", "X"], fields);
                assert!(!unchanged);
            },
            RowMergeOutcome::Conflict(_) => panic!("expected a clean merge"),
        }
    }

    #[test]
    fn test_same_field_conflict_s3() {
        let h_l = Header::new(vec!["k".into(), "v".into()]).unwrap();
        let h_a = h_l.clone();
        let h_b = h_l.clone();
        let (out, maps, _) = merge_headers(&h_l, &h_a, &h_b).unwrap();

        let l = row(2, b"1,a\n", &["1", "a"], 0);
        let a = row(2, b"1,b\n", &["1", "b"], 0);
        let b = row(2, b"1,c\n", &["1", "c"], 0);

        match merge_row(&out, &maps, "1", Some(&l), &a, Some(&b)) {
            RowMergeOutcome::Conflict(block) => {
                let text = String::from_utf8(block).unwrap();
                assert!(text.contains(">>>>>> v = b"));
                assert!(text.contains("====== v = c"));
            },
            RowMergeOutcome::Merged { .. } => panic!("expected a conflict"),
        }
    }

    #[test]
    fn test_unchanged_row_detected_when_both_sides_byte_identical() {
        let h_l = Header::new(vec!["k".into(), "v".into()]).unwrap();
        let (out, maps, _) = merge_headers(&h_l, &h_l, &h_l).unwrap();

        let l = row(2, b"1,a\n", &["1", "a"], 0);
        let a = row(2, b"1,a\n", &["1", "a"], 0);
        let b = row(2, b"1,a\n", &["1", "a"], 0);

        match merge_row(&out, &maps, "1", Some(&l), &a, Some(&b)) {
            RowMergeOutcome::Merged { unchanged, .. } => assert!(unchanged),
            RowMergeOutcome::Conflict(_) => panic!("expected a clean merge"),
        }
    }

    #[test]
    fn test_delete_modify_conflict_block_s6() {
        let a_side = Presence::Deleted { lca_line: 2 };
        let b_side = Presence::Present { line: 2, raw: Bytes::from_static(b"1,b\n") };
        let text = String::from_utf8(format_delete_modify_conflict("1", a_side, b_side)).unwrap();
        assert!(text.starts_with(">>>>>> input Deleted @2\n"));
        assert!(text.contains("====== input @2 (1)\n"));
        assert!(text.ends_with("<<<<<<\n"));
    }
}
