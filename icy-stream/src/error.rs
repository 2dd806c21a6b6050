//! Error types for the icy-stream crate.

use icy_parser::ParseError;

use crate::demuxer::DemuxState;

/// Errors that can occur while opening or decoding an ICY stream.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Header or metadata parsing failed
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// A chunk was requested before a positive `icy-metaint` was known
    #[error("Unknown chunk size: the server did not announce a usable icy-metaint")]
    UnknownChunkSize,

    /// The byte source ended in the middle of the protocol
    #[error("Unexpected end of stream while {state}")]
    UnexpectedEndOfStream {
        /// Demuxer state when the source ran dry
        state: DemuxState,
    },

    /// No header terminator within the configured limit
    #[error("Header block exceeds {limit} bytes without a terminator")]
    HeaderBlockTooLarge {
        /// Configured maximum header block size
        limit: usize,
    },

    /// The stream URL could not be used
    #[error("Invalid stream URL: {0}")]
    InvalidUrl(String),

    /// Failed to establish the TCP connection
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        /// Host and port that was dialed
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Connecting took longer than the configured timeout
    #[error("Timed out connecting to {0}")]
    ConnectTimeout(String),

    /// No bytes arrived within the configured read timeout
    #[error("Timed out waiting for stream data")]
    ReadTimeout,

    /// Transport read or write failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration provided
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The session was already opened
    #[error("Session already started")]
    AlreadyStarted,

    /// The decode task panicked or was aborted
    #[error("Decode task failed: {0}")]
    TaskFailed(String),
}

impl StreamError {
    /// Whether the error ends the session.
    ///
    /// Only a malformed metadata block is recoverable; it drops that one
    /// metadata event and leaves framing untouched.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, StreamError::Parse(e) if e.is_recoverable())
    }
}

/// Convenience type alias for Results using StreamError.
pub type Result<T> = std::result::Result<T, StreamError>;
