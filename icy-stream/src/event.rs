//! Event types delivered by a session.

use bytes::Bytes;
use icy_parser::Metadata;

/// One audio chunk of exactly `icy-metaint` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    /// Position of this chunk in the stream, starting at 0
    pub sequence: u64,
    /// Raw audio payload
    pub data: Bytes,
}

impl AudioChunk {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A metadata change, positioned in the audio stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataUpdate {
    /// Sequence number of the audio chunk this block followed
    pub after_chunk: u64,
    pub metadata: Metadata,
}

impl MetadataUpdate {
    /// Shorthand for the parsed `StreamTitle`
    pub fn stream_title(&self) -> Option<&str> {
        self.metadata.stream_title.as_deref()
    }
}
