use std::io::Write;
use core::config::{Config, QuoteStyle};
use crate::error::MatcherError;

fn csv_quote_style(style: QuoteStyle) -> csv::QuoteStyle {
    match style {
        QuoteStyle::Minimal    => csv::QuoteStyle::Necessary,
        QuoteStyle::All        => csv::QuoteStyle::Always,
        QuoteStyle::NonNumeric => csv::QuoteStyle::NonNumeric,
        QuoteStyle::None       => csv::QuoteStyle::Never,
    }
}

///
/// Writes merged rows to an output sink, following the policy in design §4.1: an unchanged row
/// (unless `reformat-all` is set) is emitted as its original raw bytes; everything else is
/// re-encoded with the configured quoting and line terminator.
///
pub struct RowWriter<W: Write> {
    sink: W,
    config: Config,
    rows_written: usize,
    bytes_written: usize,
}

impl<W: Write> RowWriter<W> {
    pub fn new(sink: W, config: Config) -> Self {
        Self { sink, config, rows_written: 0, bytes_written: 0 }
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    ///
    /// Write a header or data row whose raw, original bytes should be reproduced verbatim. The
    /// raw span already carries its own original line terminator; if (rarely - only possible for
    /// a final, terminator-less line of a source file) it doesn't, the configured terminator is
    /// appended so later rows don't get glued onto the same physical line.
    ///
    pub fn write_raw(&mut self, raw: &[u8]) -> Result<(), MatcherError> {
        self.sink.write_all(raw)?;
        self.bytes_written += raw.len();

        if !raw.ends_with(b"\n") {
            let terminator = self.config.line_terminator().as_bytes();
            self.sink.write_all(terminator)?;
            self.bytes_written += terminator.len();
        }

        self.rows_written += 1;
        Ok(())
    }

    ///
    /// Re-encode `fields` as one CSV row using the configured quote style and line terminator.
    ///
    pub fn write_encoded(&mut self, fields: &[String]) -> Result<(), MatcherError> {
        let mut inner = csv::WriterBuilder::new()
            .quote_style(csv_quote_style(self.config.quote()))
            .terminator(csv::Terminator::Any(self.config.line_terminator().as_bytes()[0]))
            .from_writer(Vec::new());

        // csv::Terminator::Any only carries one byte - for "dos" we write the record without a
        // terminator and append the full \r\n ourselves below.
        inner.write_record(fields.iter().map(String::as_str))?;
        let mut encoded = inner.into_inner().map_err(|e| MatcherError::IOError(e.into_error()))?;

        if let Some(pos) = strip_trailing_terminator(&encoded) {
            encoded.truncate(pos);
        }
        encoded.extend_from_slice(self.config.line_terminator().as_bytes());

        self.sink.write_all(&encoded)?;
        self.bytes_written += encoded.len();
        self.rows_written += 1;
        Ok(())
    }

    pub fn write_conflict_block(&mut self, block: &[u8]) -> Result<(), MatcherError> {
        self.sink.write_all(block)?;
        self.bytes_written += block.len();
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), MatcherError> {
        Ok(self.sink.flush()?)
    }
}

fn strip_trailing_terminator(encoded: &[u8]) -> Option<usize> {
    if encoded.ends_with(b"\r\n") {
        Some(encoded.len() - 2)
    } else if encoded.ends_with(b"\n") {
        Some(encoded.len() - 1)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::config::LineTerminator;

    #[test]
    fn test_write_raw_reproduces_bytes_exactly() {
        let mut w = RowWriter::new(Vec::new(), Config::new("k".into()));
        w.write_raw(b"1,a\n").unwrap();
        assert_eq!(b"1,a\n", w.sink.as_slice());
    }

    #[test]
    fn test_write_raw_appends_missing_terminator() {
        let mut w = RowWriter::new(Vec::new(), Config::new("k".into()));
        w.write_raw(b"1,a").unwrap();
        assert_eq!(b"1,a\n", w.sink.as_slice());
    }

    #[test]
    fn test_write_encoded_uses_configured_terminator() {
        let cfg = Config::new("k".into()).with_line_terminator(LineTerminator::Dos);
        let mut w = RowWriter::new(Vec::new(), cfg);
        w.write_encoded(&["1".into(), "a".into()]).unwrap();
        assert_eq!(b"1,a\r\n", w.sink.as_slice());
    }

    #[test]
    fn test_write_encoded_quotes_values_containing_delimiter() {
        let mut w = RowWriter::new(Vec::new(), Config::new("k".into()));
        w.write_encoded(&["1".into(), "a,b".into()]).unwrap();
        assert_eq!(b"1,\"a,b\"\n", w.sink.as_slice());
    }
}
