use std::collections::HashMap;
use crate::{error::MatcherError, model::{header::Header, row::Row}};

///
/// One loaded input file: its header, its rows in file order, and a key→position index (design
/// §3 "File state", §4.2 C2).
///
/// Keys must be unique - a repeated key (including a second empty-key row) fails the whole load,
/// as required by §4.2.
///
pub struct FileState {
    header: Header,
    header_raw: bytes::Bytes,
    rows: Vec<Row>,
    by_key: HashMap<String, usize>,
}

impl FileState {
    pub fn new(header: Header, header_raw: bytes::Bytes, rows: Vec<Row>) -> Result<Self, MatcherError> {
        let mut by_key = HashMap::with_capacity(rows.len());

        for (idx, row) in rows.iter().enumerate() {
            if by_key.insert(row.key().to_string(), idx).is_some() {
                return Err(MatcherError::DuplicateKey { key: row.key().to_string(), line: row.line() })
            }
        }

        Ok(Self { header, header_raw, rows, by_key })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    ///
    /// The header line's exact original bytes, used by the writer to reproduce a byte-identical
    /// no-op merge (design §8 invariant 1).
    ///
    pub fn header_raw(&self) -> &bytes::Bytes {
        &self.header_raw
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, idx: usize) -> &Row {
        &self.rows[idx]
    }

    ///
    /// The position of `key` in this file's row order, if present.
    ///
    pub fn position_of(&self, key: &str) -> Option<usize> {
        self.by_key.get(key).copied()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn row(line: usize, key: &str, fields: &[&str]) -> Row {
        Row::new(line, Bytes::new(), fields.iter().map(|f| f.to_string()).collect(), key.into())
    }

    #[test]
    fn test_duplicate_key_is_rejected() {
        let header = Header::new(vec!["k".into(), "v".into()]).unwrap();
        let rows = vec![row(2, "1", &["1", "a"]), row(3, "1", &["1", "b"])];

        match FileState::new(header, Bytes::new(), rows) {
            Err(MatcherError::DuplicateKey { key, line }) => {
                assert_eq!("1", key);
                assert_eq!(3, line);
            },
            other => panic!("expected DuplicateKey, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_empty_keys_must_still_be_unique() {
        let header = Header::new(vec!["k".into(), "v".into()]).unwrap();
        let rows = vec![row(2, "", &["", "a"]), row(3, "", &["", "b"])];

        assert!(matches!(FileState::new(header, Bytes::new(), rows), Err(MatcherError::DuplicateKey { .. })));
    }

    #[test]
    fn test_single_empty_key_is_permitted() {
        let header = Header::new(vec!["k".into(), "v".into()]).unwrap();
        let rows = vec![row(2, "", &["", "a"])];

        assert!(FileState::new(header, Bytes::new(), rows).is_ok());
    }
}
