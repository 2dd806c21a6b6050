//! Stateful ICY protocol demultiplexer
//!
//! Turns an arbitrarily chunked byte stream into framed tokens: one header
//! block, then an endless cycle of a fixed-size audio chunk followed by a
//! length-prefixed metadata block.
//!
//! The demuxer never waits for input itself. Callers [`feed`](Demuxer::feed)
//! whatever bytes they have and pull frames with
//! [`next_frame`](Demuxer::next_frame) until it returns `Ok(None)`, which means
//! "need more bytes". Framing is purely positional, so the state machine can be
//! resumed at any byte boundary.

use std::fmt;

use bytes::{Bytes, BytesMut};
use icy_parser::{parse_headers, parse_metadata_block, HeaderSet, Metadata, ParseError};

use crate::error::{Result, StreamError};

/// End of the header block
const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Metadata lengths are announced in units of this many bytes
const METADATA_LENGTH_UNIT: usize = 16;

/// Default cap on the header block, terminator included
pub const DEFAULT_MAX_HEADER_SIZE: usize = 16 * 1024;

/// Position of the demuxer in the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DemuxState {
    /// Waiting for the `\r\n\r\n`-terminated header block
    AwaitingHeaders,
    /// Waiting for `chunk_size` bytes of audio
    AwaitingChunk,
    /// Waiting for a length byte and the metadata block it announces
    AwaitingMetadata,
}

impl fmt::Display for DemuxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemuxState::AwaitingHeaders => write!(f, "awaiting headers"),
            DemuxState::AwaitingChunk => write!(f, "awaiting audio chunk"),
            DemuxState::AwaitingMetadata => write!(f, "awaiting metadata"),
        }
    }
}

/// A single framed token.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// The response headers; produced exactly once, first
    Headers(HeaderSet),
    /// Exactly `chunk_size` bytes of opaque audio payload
    Chunk(Bytes),
    /// A non-empty, well-formed metadata block
    Metadata(Metadata),
    /// An empty metadata block
    Heartbeat,
    /// A metadata block that failed to parse. Framing is unaffected.
    MetadataRejected(ParseError),
}

/// The ICY framing state machine.
///
/// Owns the unconsumed input; every frame consumes a prefix of it. After
/// `next_frame` returns an error the demuxer must be discarded.
#[derive(Debug)]
pub struct Demuxer {
    state: DemuxState,
    /// Zero until the header block has been parsed
    chunk_size: usize,
    buffer: BytesMut,
    max_header_size: usize,
    /// Bytes of the buffer already searched for the header terminator
    header_scanned: usize,
    chunks_decoded: u64,
}

impl Demuxer {
    /// Create a demuxer positioned before the header block.
    pub fn new() -> Self {
        Self::with_max_header_size(DEFAULT_MAX_HEADER_SIZE)
    }

    /// Create a demuxer that gives up on header blocks longer than `limit`.
    pub fn with_max_header_size(limit: usize) -> Self {
        Self {
            state: DemuxState::AwaitingHeaders,
            chunk_size: 0,
            buffer: BytesMut::new(),
            max_header_size: limit,
            header_scanned: 0,
            chunks_decoded: 0,
        }
    }

    /// Append bytes read from the source.
    pub fn feed(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Mutable access to the input buffer, for reading straight into it.
    pub fn buffer_mut(&mut self) -> &mut BytesMut {
        &mut self.buffer
    }

    pub fn state(&self) -> DemuxState {
        self.state
    }

    /// Audio chunk size announced by `icy-metaint`, once known.
    pub fn chunk_size(&self) -> Option<usize> {
        (self.chunk_size > 0).then_some(self.chunk_size)
    }

    /// Number of bytes buffered but not yet framed.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Number of audio chunks produced so far.
    pub fn chunks_decoded(&self) -> u64 {
        self.chunks_decoded
    }

    /// Produce the next frame from the buffered bytes.
    ///
    /// `at_eof` tells the demuxer that the source is exhausted and no more
    /// bytes will be fed. Returns `Ok(None)` when more input is needed.
    ///
    /// # Errors
    ///
    /// All errors are fatal:
    /// * [`StreamError::Parse`] for a bad header block
    /// * [`StreamError::UnknownChunkSize`] if `icy-metaint` was zero
    /// * [`StreamError::UnexpectedEndOfStream`] if `at_eof` is set and the
    ///   buffer holds no complete token
    /// * [`StreamError::HeaderBlockTooLarge`] if no terminator shows up within
    ///   the header size limit
    pub fn next_frame(&mut self, at_eof: bool) -> Result<Option<Frame>> {
        match self.state {
            DemuxState::AwaitingHeaders => self.next_headers(at_eof),
            DemuxState::AwaitingChunk => self.next_chunk(at_eof),
            DemuxState::AwaitingMetadata => self.next_metadata(at_eof),
        }
    }

    fn next_headers(&mut self, at_eof: bool) -> Result<Option<Frame>> {
        // The terminator may straddle the previously scanned region
        let start = self.header_scanned.saturating_sub(HEADER_TERMINATOR.len() - 1);
        let found = self.buffer[start..]
            .windows(HEADER_TERMINATOR.len())
            .position(|window| window == HEADER_TERMINATOR);

        let Some(offset) = found else {
            self.header_scanned = self.buffer.len();
            if at_eof {
                return Err(self.end_of_stream());
            }
            if self.buffer.len() > self.max_header_size {
                return Err(StreamError::HeaderBlockTooLarge {
                    limit: self.max_header_size,
                });
            }
            return Ok(None);
        };

        let end = start + offset + HEADER_TERMINATOR.len();
        if end > self.max_header_size {
            return Err(StreamError::HeaderBlockTooLarge {
                limit: self.max_header_size,
            });
        }

        let token = self.buffer.split_to(end);
        let parsed = parse_headers(&token)?;

        self.chunk_size = parsed.chunk_size;
        self.header_scanned = 0;
        self.state = DemuxState::AwaitingChunk;
        Ok(Some(Frame::Headers(parsed.headers)))
    }

    fn next_chunk(&mut self, at_eof: bool) -> Result<Option<Frame>> {
        if self.chunk_size == 0 {
            return Err(StreamError::UnknownChunkSize);
        }
        if self.buffer.len() < self.chunk_size {
            return if at_eof {
                Err(self.end_of_stream())
            } else {
                Ok(None)
            };
        }

        let chunk = self.buffer.split_to(self.chunk_size).freeze();
        self.chunks_decoded += 1;
        self.state = DemuxState::AwaitingMetadata;
        Ok(Some(Frame::Chunk(chunk)))
    }

    fn next_metadata(&mut self, at_eof: bool) -> Result<Option<Frame>> {
        // The length byte counts itself
        let block_len = match self.buffer.first() {
            Some(&length) => usize::from(length) * METADATA_LENGTH_UNIT + 1,
            None => usize::MAX,
        };
        if self.buffer.len() < block_len {
            return if at_eof {
                Err(self.end_of_stream())
            } else {
                Ok(None)
            };
        }

        let token = self.buffer.split_to(block_len);
        self.state = DemuxState::AwaitingChunk;

        let frame = match parse_metadata_block(&token[1..]) {
            Ok(Some(metadata)) => Frame::Metadata(metadata),
            Ok(None) => Frame::Heartbeat,
            Err(e) => Frame::MetadataRejected(e),
        };
        Ok(Some(frame))
    }

    fn end_of_stream(&self) -> StreamError {
        StreamError::UnexpectedEndOfStream { state: self.state }
    }
}

impl Default for Demuxer {
    fn default() -> Self {
        Self::new()
    }
}
