//! Configuration types for the icy-stream crate
//!
//! A [`SessionConfig`] declares up front which event categories the consumer
//! wants and how deep each queue is, plus the transport timeouts. Queues are
//! created when the session is constructed, never on demand.

use std::time::Duration;

use crate::demuxer::DEFAULT_MAX_HEADER_SIZE;
use crate::error::{Result, StreamError};

/// Configuration for an [`IcySession`](crate::IcySession)
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Capacity of the header queue, `None` to not receive headers
    /// Default: Some(1)
    pub header_queue: Option<usize>,

    /// Capacity of the audio chunk queue, `None` to not receive audio
    /// Default: Some(64)
    pub chunk_queue: Option<usize>,

    /// Capacity of the metadata queue, `None` to not receive metadata
    /// Default: Some(16)
    pub metadata_queue: Option<usize>,

    /// Deliver the fatal error, if any, through a dedicated receiver.
    /// When disabled the error is returned from `close()` instead.
    /// Default: true
    pub error_channel: bool,

    /// Timeout for establishing the TCP connection
    /// Default: 10 seconds
    pub connect_timeout: Duration,

    /// Maximum time to wait for the next bytes from the server, `None` to
    /// wait forever
    /// Default: Some(30 seconds)
    pub read_timeout: Option<Duration>,

    /// Bytes reserved for each read from the source
    /// Default: 8192
    pub read_buffer_size: usize,

    /// Largest accepted header block, terminator included
    /// Default: 16 KiB
    pub max_header_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            header_queue: Some(1),
            chunk_queue: Some(64),
            metadata_queue: Some(16),
            error_channel: true,
            connect_timeout: Duration::from_secs(10),
            read_timeout: Some(Duration::from_secs(30)),
            read_buffer_size: 8192,
            max_header_size: DEFAULT_MAX_HEADER_SIZE,
        }
    }
}

impl SessionConfig {
    /// Create a new SessionConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Config for "now playing" monitors: headers and metadata, no audio.
    /// Audio is still framed, just not queued.
    pub fn metadata_only() -> Self {
        Self {
            chunk_queue: None,
            ..Default::default()
        }
    }

    /// Config for players that ignore track information
    pub fn audio_only() -> Self {
        Self {
            metadata_queue: None,
            ..Default::default()
        }
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<()> {
        for (name, capacity) in [
            ("Header", self.header_queue),
            ("Chunk", self.chunk_queue),
            ("Metadata", self.metadata_queue),
        ] {
            if capacity == Some(0) {
                return Err(StreamError::Configuration(format!(
                    "{name} queue capacity must be greater than 0"
                )));
            }
        }

        if self.connect_timeout.is_zero() {
            return Err(StreamError::Configuration(
                "Connect timeout must be greater than 0".to_string(),
            ));
        }

        if self.read_timeout.is_some_and(|t| t.is_zero()) {
            return Err(StreamError::Configuration(
                "Read timeout must be greater than 0".to_string(),
            ));
        }

        if self.read_buffer_size == 0 {
            return Err(StreamError::Configuration(
                "Read buffer size must be greater than 0".to_string(),
            ));
        }

        // Status line plus the terminator
        if self.max_header_size < 16 {
            return Err(StreamError::Configuration(
                "Max header size must be at least 16 bytes".to_string(),
            ));
        }

        Ok(())
    }
}
