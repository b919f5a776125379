use thiserror::Error;

/// A syntax error, located by source name and 1-based line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{source_name}:{line}: {kind}")]
pub struct ParseError {
    /// Name the text was parsed under, usually its file path.
    pub source_name: String,
    pub line: usize,
    pub kind: ParseErrorKind,
}

/// What went wrong while parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("unterminated quoted string")]
    UnterminatedString,

    #[error("unexpected closing brace")]
    UnexpectedClose,

    #[error("block opened without a key")]
    UnexpectedOpen,

    #[error("block opened on line {0} is never closed")]
    UnclosedBlock(usize),

    #[error("key \"{0}\" has no value")]
    MissingValue(String),
}
