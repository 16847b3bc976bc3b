use ipnet::PrefixLenError;
use oneio::OneIoError;
use std::fmt::{Display, Formatter};
use std::{error::Error, fmt, io};

/// Errors surfaced while reading and decoding MRT data.
///
/// Only framing-level errors (`TruncatedRecord`, `IoError`) abort an input
/// stream; everything else fails a single record, which the caller skips.
#[derive(Debug)]
pub enum ParserError {
    IoError(io::Error),
    OneIoError(OneIoError),
    /// Clean end of stream at a record boundary.
    EofExpected,
    /// The stream ended inside a record header or payload.
    TruncatedRecord(String),
    /// A record payload was shorter than one of its fields requires.
    InsufficientData {
        name: &'static str,
        expected: usize,
        found: usize,
    },
    ParseError(String),
    InvalidPrefixLength(PrefixLenError),
}

impl Error for ParserError {}

impl Display for ParserError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ParserError::IoError(e) => write!(f, "Error: {}", e),
            ParserError::OneIoError(e) => write!(f, "Error: {}", e),
            ParserError::EofExpected => write!(f, "Error: reach end of file"),
            ParserError::TruncatedRecord(s) => write!(f, "Error: truncated record: {}", s),
            ParserError::InsufficientData {
                name,
                expected,
                found,
            } => write!(
                f,
                "Error: insufficient data for {}: expected {} bytes, found {}",
                name, expected, found
            ),
            ParserError::ParseError(s) => write!(f, "Error: {}", s),
            ParserError::InvalidPrefixLength(e) => write!(f, "Error: {}", e),
        }
    }
}

impl From<io::Error> for ParserError {
    fn from(io_error: io::Error) -> Self {
        ParserError::IoError(io_error)
    }
}

impl From<OneIoError> for ParserError {
    fn from(error: OneIoError) -> Self {
        ParserError::OneIoError(error)
    }
}

impl From<PrefixLenError> for ParserError {
    fn from(error: PrefixLenError) -> Self {
        ParserError::InvalidPrefixLength(error)
    }
}
