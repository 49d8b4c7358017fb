use bytes::Bytes;

///
/// One parsed line of a source CSV file (design §3 "Row").
///
/// `raw` is the exact byte span of the record as it appeared in the source file - it may span
/// several physical lines if a field embeds a quoted newline. It is what the writer re-emits
/// verbatim for an unchanged row, and what a conflict block prints below the `>>>>>>`/`======`
/// marker lines.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row {
    line: usize,
    raw: Bytes,
    fields: Vec<String>,
    key: String,
}

impl Row {
    pub fn new(line: usize, raw: Bytes, fields: Vec<String>, key: String) -> Self {
        Self { line, raw, fields, key }
    }

    ///
    /// 1-based source line number. The header occupies line 1, so the first data row is line 2.
    ///
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    ///
    /// The value at `col`, or `None` if the column is absent from this row's file (column map
    /// says "absent") or the cell itself is empty - callers distinguish the two via the column
    /// map, not via this method.
    ///
    pub fn field(&self, col: usize) -> Option<&str> {
        self.fields.get(col).map(String::as_str)
    }

    ///
    /// A row is well-formed iff its field count equals its file's header width (design §3).
    ///
    pub fn is_well_formed(&self, header_width: usize) -> bool {
        self.fields.len() == header_width
    }
}
