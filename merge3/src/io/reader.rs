use std::io::{Cursor, Read};
use std::time::Instant;
use bytes::Bytes;
use crate::{
    error::MatcherError,
    model::{filestate::FileState, header::Header, row::Row},
};

///
/// Read an entire CSV file (with a header row) into a `FileState`, preserving each row's exact
/// original byte span (design §4.1 C1, §4.2 C2).
///
/// The whole file is buffered in memory first - the algorithm needs random access by key
/// (design §5), so there is no benefit to streaming the read.
///
pub fn load<R: Read>(path: &str, mut source: R, key: &str) -> Result<FileState, MatcherError> {
    let started = Instant::now();
    let mut buf = Vec::new();
    source.read_to_end(&mut buf)?;
    let fs = load_bytes(path, &buf, key)?;

    let (duration, rate) = core::formatted_duration_rate(fs.len(), started.elapsed());
    log::debug!("loaded {} row(s) from {} in {} ({}/row)", fs.len(), path, core::blue(&duration), rate);

    Ok(fs)
}

fn load_bytes(path: &str, buf: &[u8], key: &str) -> Result<FileState, MatcherError> {
    // has_headers(false) so we can capture the header row's own raw span and position, the same
    // way every data row's span is captured below. Disabling headers also means the reader
    // enforces every later record has the same field count as the first (ragged rows -> Error).
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(Cursor::new(buf));

    let mut record = csv::StringRecord::new();

    if !read_record(&mut rdr, &mut record, path)? {
        return Err(MatcherError::HeaderEmpty)
    }

    let header_end = rdr.position().byte() as usize;
    let header_raw = Bytes::copy_from_slice(&buf[..header_end]);
    let header = Header::new(record.iter().map(String::from).collect())?;

    let key_col = header.position(key)
        .ok_or_else(|| MatcherError::MissingKeyColumn { key: key.into(), path: path.into() })?;

    let mut rows = Vec::new();

    while read_record(&mut rdr, &mut record, path)? {
        let start = record.position().expect("csv record missing position").byte() as usize;
        let end = rdr.position().byte() as usize;
        let line = record.position().expect("csv record missing position").line() as usize;

        let fields: Vec<String> = record.iter().map(String::from).collect();
        let raw = Bytes::copy_from_slice(&buf[start..end]);
        // A ragged row may be shorter than the key column - fall back to an empty key rather
        // than indexing out of bounds; `is_well_formed` below is what actually rejects it.
        let key_value = fields.get(key_col).cloned().unwrap_or_default();
        let row = Row::new(line, raw, fields, key_value);

        if !row.is_well_formed(header.width()) {
            return Err(MatcherError::MalformedRow {
                path: path.into(),
                line,
                reason: format!("expected {} fields, found {}", header.width(), row.fields().len()),
            })
        }

        rows.push(row);
    }

    FileState::new(header, header_raw, rows)
}

///
/// `csv::Reader::read_record` reports unterminated quotes and ragged rows as plain `csv::Error`s
/// - we re-surface them as `MalformedRow` so every caller deals with one error shape.
///
fn read_record(rdr: &mut csv::Reader<Cursor<&[u8]>>, record: &mut csv::StringRecord, path: &str) -> Result<bool, MatcherError> {
    rdr.read_record(record).map_err(|source| MatcherError::MalformedRow {
        path: path.into(),
        line: record.position().map(|p| p.line()).unwrap_or(0) as usize,
        reason: source.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loads_header_and_rows() {
        let fs = load_bytes("t.csv", b"k,v\n1,a\n2,b\n", "k").unwrap();
        assert_eq!(vec!["k", "v"], fs.header().columns());
        assert_eq!(2, fs.len());
        assert_eq!("1", fs.row(0).key());
        assert_eq!(vec!["1", "a"], fs.row(0).fields());
        assert_eq!(2, fs.row(0).line());
        assert_eq!(3, fs.row(1).line());
    }

    #[test]
    fn test_raw_span_preserves_embedded_newline() {
        let data = b"k,v\n1,\"a\nb\"\n2,c\n";
        let fs = load_bytes("t.csv", data, "k").unwrap();
        assert_eq!(2, fs.len());
        assert_eq!(&b"1,\"a\nb\"\n"[..], fs.row(0).raw().as_ref());
    }

    #[test]
    fn test_missing_key_column_is_fatal() {
        match load_bytes("t.csv", b"k,v\n1,a\n", "missing") {
            Err(MatcherError::MissingKeyColumn { key, .. }) => assert_eq!("missing", key),
            other => panic!("expected MissingKeyColumn, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_ragged_row_is_malformed() {
        match load_bytes("t.csv", b"k,v\n1,a,b\n", "k") {
            Err(MatcherError::MalformedRow { .. }) => {},
            other => panic!("expected MalformedRow, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_empty_file_is_header_empty() {
        match load_bytes("t.csv", b"", "k") {
            Err(MatcherError::HeaderEmpty) => {},
            other => panic!("expected HeaderEmpty, got {:?}", other.map(|_| ())),
        }
    }
}
