use std::str::FromStr;
use crate::error::Error;

///
/// Quoting policy used by the writer when a row can't be re-emitted verbatim (see §4.1 of the
/// design). Mirrors the four values the CLI driver accepts for `quote = ...`.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuoteStyle {
    Minimal,
    All,
    NonNumeric,
    None,
}

///
/// Line terminator policy for re-encoded rows. `Native` resolves to the host platform's
/// terminator at write time, the others are fixed.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineTerminator {
    Unix,
    Dos,
    Native,
}

impl LineTerminator {
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            LineTerminator::Unix => b"\n",
            LineTerminator::Dos => b"\r\n",
            LineTerminator::Native => if cfg!(windows) { b"\r\n" } else { b"\n" },
        }
    }
}

impl FromStr for QuoteStyle {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "minimal"    => Ok(QuoteStyle::Minimal),
            "all"        => Ok(QuoteStyle::All),
            "nonnumeric" => Ok(QuoteStyle::NonNumeric),
            "none"       => Ok(QuoteStyle::None),
            other        => Err(Error::InvalidQuoteStyle { value: other.into() }),
        }
    }
}

impl FromStr for LineTerminator {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "unix"   => Ok(LineTerminator::Unix),
            "dos"    => Ok(LineTerminator::Dos),
            "native" => Ok(LineTerminator::Native),
            other    => Err(Error::InvalidLineTerminator { value: other.into() }),
        }
    }
}

///
/// The explicit configuration record threaded through the reader, driver and writer (design
/// notes §9) - no ambient/global state. Built once by the CLI driver (or directly by a library
/// caller) and passed by reference everywhere.
///
#[derive(Clone, Debug)]
pub struct Config {
    key: String,
    quote: QuoteStyle,
    line_terminator: LineTerminator,
    reformat_all: bool,
}

impl Config {
    pub fn new(key: String) -> Self {
        Self {
            key,
            quote: QuoteStyle::Minimal,
            line_terminator: LineTerminator::Native,
            reformat_all: false,
        }
    }

    pub fn with_quote(mut self, quote: QuoteStyle) -> Self {
        self.quote = quote;
        self
    }

    pub fn with_line_terminator(mut self, line_terminator: LineTerminator) -> Self {
        self.line_terminator = line_terminator;
        self
    }

    pub fn with_reformat_all(mut self, reformat_all: bool) -> Self {
        self.reformat_all = reformat_all;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn quote(&self) -> QuoteStyle {
        self.quote
    }

    pub fn line_terminator(&self) -> LineTerminator {
        self.line_terminator
    }

    pub fn reformat_all(&self) -> bool {
        self.reformat_all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_style_parses_known_values() {
        assert_eq!(QuoteStyle::Minimal, "minimal".parse().unwrap());
        assert_eq!(QuoteStyle::All, "all".parse().unwrap());
        assert_eq!(QuoteStyle::NonNumeric, "nonnumeric".parse().unwrap());
        assert_eq!(QuoteStyle::None, "none".parse().unwrap());
    }

    #[test]
    fn test_quote_style_rejects_unknown_value() {
        match "loud".parse::<QuoteStyle>() {
            Err(Error::InvalidQuoteStyle { value }) => assert_eq!("loud", value),
            other => panic!("expected InvalidQuoteStyle, got {:?}", other),
        }
    }

    #[test]
    fn test_config_defaults() {
        let cfg = Config::new("id".into());
        assert_eq!("id", cfg.key());
        assert_eq!(QuoteStyle::Minimal, cfg.quote());
        assert_eq!(LineTerminator::Native, cfg.line_terminator());
        assert!(!cfg.reformat_all());
    }
}
