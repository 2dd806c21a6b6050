//! # icy-stream
//!
//! Client side of the ICY (SHOUTcast) streaming protocol.
//!
//! A server answers an ICY request with a header block and then interleaves
//! fixed-size audio chunks with length-prefixed metadata blocks. The
//! [`Demuxer`] splits that byte stream back into headers, audio and metadata;
//! [`IcySession`] drives it over a TCP connection and delivers each kind of
//! event on its own bounded queue.
//!
//! Header and metadata text parsing lives in `icy-parser` and is re-exported
//! here.

pub mod config;
pub mod demuxer;
mod error;
pub mod event;
pub mod logging;
pub mod request;
mod session;

pub use config::SessionConfig;
pub use demuxer::{DemuxState, Demuxer, Frame};
pub use error::{Result, StreamError};
pub use event::{AudioChunk, MetadataUpdate};
pub use request::StreamUrl;
pub use session::IcySession;

pub use icy_parser::{Header, HeaderSet, Metadata, ParseError};
