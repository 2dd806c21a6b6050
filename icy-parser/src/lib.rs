//! # icy-parser
//!
//! Parsing for the text parts of the ICY (SHOUTcast) streaming protocol: the
//! HTTP-like response header block and the in-band metadata blocks. This crate
//! does no I/O; framing the byte stream is left to `icy-stream`.
//!
//! ## Usage
//!
//! ```rust
//! use icy_parser::{parse_headers, parse_metadata};
//!
//! let headers = parse_headers(b"ICY 200 OK\r\nicy-metaint:8192\r\n\r\n")?;
//! assert_eq!(headers.chunk_size, 8192);
//!
//! let metadata = parse_metadata("StreamTitle='Artist - Song';")?.unwrap();
//! assert_eq!(metadata.stream_title.as_deref(), Some("Artist - Song"));
//! # Ok::<(), icy_parser::ParseError>(())
//! ```

pub mod error;
pub mod headers;
pub mod metadata;
mod text;

// Re-export error types for convenient top-level access
pub use error::{ParseError, ParseResult};

pub use headers::{parse_headers, Header, HeaderSet, IcyHeaders, METAINT_HEADER, STATUS_LINE};
pub use metadata::{parse_metadata, parse_metadata_block, Metadata};
