use std::collections::HashSet;
use itertools::Itertools;
use crate::error::MatcherError;

///
/// An ordered, unique sequence of column names (design §3 "Header"). Used both for a single
/// file's header and for the merged output schema.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    columns: Vec<String>,
}

impl Header {
    pub fn new(columns: Vec<String>) -> Result<Self, MatcherError> {
        if columns.is_empty() {
            return Err(MatcherError::HeaderEmpty)
        }

        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(MatcherError::DuplicateColumn { header: column.clone() })
            }
        }

        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.position(column).is_some()
    }
}

///
/// Per-side mapping from an output column index to a position in that file's own header, or
/// `None` when the file has no such column ("absent", design §3 "Output schema").
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnMap {
    positions: Vec<Option<usize>>,
}

impl ColumnMap {
    pub fn position(&self, output_col: usize) -> Option<usize> {
        self.positions[output_col]
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }
}

///
/// Non-fatal diagnostic raised while reconciling headers (design §7 `HeaderReorderConflict`).
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderReorderConflict {
    pub column: String,
    pub a_order: Vec<String>,
    pub b_order: Vec<String>,
}

///
/// Reconcile three header schemas into one output schema and a column map per side (design §4.3,
/// C3). Returns the output header, one `ColumnMap` per file in `[LCA, A, B]` order, and any
/// non-fatal reorder diagnostics encountered.
///
pub fn merge_headers(h_l: &Header, h_a: &Header, h_b: &Header)
    -> Result<(Header, [ColumnMap; 3], Vec<HeaderReorderConflict>), MatcherError> {

    // Step 1: columns added on each side, in that side's order.
    let added_a: Vec<String> = h_a.columns().iter().filter(|c| !h_l.contains(c)).cloned().collect();
    let added_b: Vec<String> = h_b.columns().iter().filter(|c| !h_l.contains(c)).cloned().collect();

    // Step 2: surviving LCA columns - a column deleted on either side is dropped from the output.
    let surviving: Vec<String> = h_l.columns().iter()
        .filter(|c| h_a.contains(c) && h_b.contains(c))
        .cloned()
        .collect();

    // Step 3: order the surviving LCA columns, preferring an ordering both sides agree with,
    // falling back to "prefer A" (with a diagnostic) when they disagree.
    let order_in_a = subsequence_order(h_a.columns(), &surviving);
    let order_in_b = subsequence_order(h_b.columns(), &surviving);

    let mut diagnostics = Vec::new();
    let ordered_survivors = if order_in_a == order_in_b {
        order_in_a
    } else if order_in_a == surviving {
        order_in_b // Only B reordered.
    } else if order_in_b == surviving {
        order_in_a // Only A reordered.
    } else {
        // Both sides reordered differently - prefer A and record a diagnostic.
        if let Some(column) = ordered_survivors_first_divergence(&order_in_a, &order_in_b) {
            diagnostics.push(HeaderReorderConflict { column, a_order: order_in_a.clone(), b_order: order_in_b.clone() });
        }
        order_in_a
    };

    // Step 4: intersperse added columns at their nearest-surviving-neighbor position, A's
    // additions first, then B's.
    let mut output = ordered_survivors;
    splice_added(&mut output, &added_a, h_a.columns(), h_l.columns());
    splice_added(&mut output, &added_b, h_b.columns(), h_l.columns());

    let output_header = Header::new(output)?;

    // Step 5: build the per-file column maps by name lookup.
    let map_l = column_map(&output_header, h_l);
    let map_a = column_map(&output_header, h_a);
    let map_b = column_map(&output_header, h_b);

    Ok((output_header, [map_l, map_a, map_b], diagnostics))
}

///
/// The subsequence of `header` restricted to (and in the order found in) `keep`.
///
fn subsequence_order(header: &[String], keep: &[String]) -> Vec<String> {
    header.iter().filter(|c| keep.contains(c)).cloned().collect()
}

fn ordered_survivors_first_divergence(a_order: &[String], b_order: &[String]) -> Option<String> {
    a_order.iter().zip(b_order.iter()).find(|(a, b)| a != b).map(|(a, _)| a.clone())
}

///
/// Insert each column in `added` (in its own relative order) immediately after its true LCA
/// predecessor - the nearest earlier column in `source_header` that is also a member of `H_L` -
/// if that predecessor survived into `output`. Other added columns sitting between the two are
/// not valid anchors: the neighbor has to be a surviving *LCA* column (spec.md §4.3 step 4), not
/// just anything already spliced into `output`.
///
/// If the true LCA predecessor was itself deleted from the output (absent from `lca_columns`'
/// surviving set), the added column cascades away too rather than anchoring further back to an
/// unrelated survivor. A column with no LCA predecessor at all (added ahead of every LCA column)
/// is inserted at the front.
///
fn splice_added(output: &mut Vec<String>, added: &[String], source_header: &[String], lca_columns: &[String]) {
    for column in added {
        if output.contains(column) {
            continue; // Both sides added a column of the same name - keep the first insertion.
        }

        let idx = source_header.iter().position(|c| c == column).expect("added column missing from its own header");
        let lca_predecessor = source_header[..idx].iter().rev().find(|c| lca_columns.contains(c));

        match lca_predecessor {
            Some(predecessor) => {
                if let Some(pos) = output.iter().position(|c| c == predecessor) {
                    output.insert(pos + 1, column.clone());
                } // else: the predecessor was deleted from the output - drop this added column too.
            },
            None => output.insert(0, column.clone()),
        }
    }
}

fn column_map(output: &Header, file_header: &Header) -> ColumnMap {
    ColumnMap {
        positions: output.columns().iter().map(|c| file_header.position(c)).collect_vec(),
    }
}
