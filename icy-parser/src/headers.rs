//! ICY response header parsing
//!
//! An ICY response starts with an HTTP-like header block:
//!
//! ```text
//! ICY 200 OK\r\n
//! icy-name:Some Station\r\n
//! icy-metaint:8192\r\n
//! \r\n
//! ```
//!
//! The block is parsed into an ordered [`HeaderSet`] and the audio chunk
//! interval announced by `icy-metaint`.

use serde::{Deserialize, Serialize};

use crate::error::{ParseError, ParseResult};
use crate::text;

/// The only status line an ICY server may answer with
pub const STATUS_LINE: &str = "ICY 200 OK";

/// Header carrying the number of audio bytes between metadata blocks
pub const METAINT_HEADER: &str = "icy-metaint";

/// A single `key:value` header line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub key: String,
    pub value: String,
}

impl Header {
    /// Create a new header.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Ordered list of headers as received on the wire.
///
/// Duplicates are preserved and insertion order is kept. Lookups return the
/// first header whose key matches, compared ASCII case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeaderSet(Vec<Header>);

impl HeaderSet {
    /// Create an empty header set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header, keeping any existing header with the same key.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push(Header::new(key, value));
    }

    /// Value of the first header named `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|header| header.key.eq_ignore_ascii_case(key))
            .map(|header| header.value.as_str())
    }

    /// Values of every header named `key`, in wire order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |header| header.key.eq_ignore_ascii_case(key))
            .map(|header| header.value.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Header> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Station name (`icy-name`)
    pub fn station_name(&self) -> Option<&str> {
        self.get("icy-name")
    }

    /// Station genre (`icy-genre`)
    pub fn genre(&self) -> Option<&str> {
        self.get("icy-genre")
    }

    /// Station homepage (`icy-url`)
    pub fn station_url(&self) -> Option<&str> {
        self.get("icy-url")
    }

    /// Station description (`icy-description`)
    pub fn description(&self) -> Option<&str> {
        self.get("icy-description")
    }

    /// Nominal bitrate in kbit/s (`icy-br`). Servers sometimes send a list
    /// such as `128,128`; only the first entry is used.
    pub fn bitrate(&self) -> Option<u32> {
        self.get("icy-br")?.split(',').next()?.trim().parse().ok()
    }

    /// MIME type of the audio payload
    pub fn content_type(&self) -> Option<&str> {
        self.get("content-type")
    }

    /// Whether the station is listed publicly (`icy-pub`)
    pub fn is_public(&self) -> Option<bool> {
        match self.get("icy-pub")? {
            "1" => Some(true),
            "0" => Some(false),
            _ => None,
        }
    }
}

impl<'a> IntoIterator for &'a HeaderSet {
    type Item = &'a Header;
    type IntoIter = std::slice::Iter<'a, Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Header> for HeaderSet {
    fn from_iter<I: IntoIterator<Item = Header>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Result of parsing a complete header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcyHeaders {
    /// Every header after the status line, in wire order
    pub headers: HeaderSet,
    /// Audio bytes between two metadata blocks, from `icy-metaint`
    pub chunk_size: usize,
}

/// Parse a raw header block, including its trailing `\r\n\r\n`.
///
/// # Errors
///
/// * [`ParseError::UnexpectedStatus`] if the first line is not `ICY 200 OK`
/// * [`ParseError::InvalidHeaders`] if a header line has no `:`
/// * [`ParseError::InvalidChunkInterval`] if `icy-metaint` is missing or not a
///   non-negative decimal integer
pub fn parse_headers(raw: &[u8]) -> ParseResult<IcyHeaders> {
    let decoded = text::decode(raw);
    let mut lines = decoded.trim().split('\n').map(str::trim);

    let status = lines.next().unwrap_or_default();
    if status != STATUS_LINE {
        return Err(ParseError::UnexpectedStatus(status.to_string()));
    }

    let mut headers = HeaderSet::new();
    for line in lines.filter(|line| !line.is_empty()) {
        let (key, value) = line
            .split_once(':')
            .ok_or_else(|| ParseError::InvalidHeaders(line.to_string()))?;
        headers.push(key.trim(), value.trim());
    }

    let chunk_size = match headers.get(METAINT_HEADER) {
        Some(value) => value
            .parse::<usize>()
            .map_err(|_| ParseError::InvalidChunkInterval(Some(value.to_string())))?,
        None => return Err(ParseError::InvalidChunkInterval(None)),
    };

    Ok(IcyHeaders {
        headers,
        chunk_size,
    })
}
