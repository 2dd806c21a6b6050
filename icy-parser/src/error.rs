//! Error types for ICY header and metadata parsing

use thiserror::Error;

/// Errors that can occur while parsing ICY header blocks and metadata blocks
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The first line of the header block was not `ICY 200 OK`
    #[error("Unexpected response status: {0:?}")]
    UnexpectedStatus(String),

    /// A header line did not contain a `:` separator
    #[error("Invalid header line: {0:?}")]
    InvalidHeaders(String),

    /// The `icy-metaint` header was missing or not a decimal integer
    #[error("Invalid chunk interval: {}", .0.as_deref().unwrap_or("<missing icy-metaint>"))]
    InvalidChunkInterval(Option<String>),

    /// A metadata segment did not contain a `='` separator
    #[error("Invalid metadata token: {0:?}")]
    InvalidMetadataToken(String),
}

impl ParseError {
    /// Whether this error only invalidates the current metadata event.
    ///
    /// Header errors end the session; metadata errors do not touch framing.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ParseError::InvalidMetadataToken(_))
    }
}

/// Result type alias for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;
