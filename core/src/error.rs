use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("'{value}' is not a valid quote style, expected one of minimal, all, nonnumeric, none")]
    InvalidQuoteStyle { value: String },

    #[error("'{value}' is not a valid line terminator, expected one of unix, dos, native")]
    InvalidLineTerminator { value: String },
}
