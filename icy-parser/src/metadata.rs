//! ICY in-band metadata parsing
//!
//! Metadata blocks carry `Key='Value';` pairs, e.g.
//! `StreamTitle='Artist - Title';StreamUrl='';`, NUL-padded to a multiple of
//! 16 bytes. Values may themselves contain single quotes, so segments are
//! split on the two-character separators `';` and `='` rather than on quotes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ParseError, ParseResult};
use crate::text;

const FIELD_SEPARATOR: &str = "';";
const VALUE_SEPARATOR: &str = "='";

/// Parsed metadata from a single metadata block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Currently playing track (`StreamTitle`)
    pub stream_title: Option<String>,

    /// Track or station link (`StreamUrl`)
    pub stream_url: Option<String>,

    /// Every field in the block, in wire order, including the ones above
    pub fields: IndexMap<String, String>,
}

impl Metadata {
    /// Value of any field by its wire key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Split `StreamTitle` into `(artist, title)` on the first `" - "`.
    ///
    /// Returns `None` when there is no title or it does not follow the
    /// `Artist - Title` convention.
    pub fn artist_and_title(&self) -> Option<(&str, &str)> {
        let (artist, title) = self.stream_title.as_deref()?.split_once(" - ")?;
        Some((artist.trim(), title.trim()))
    }

    fn insert(&mut self, key: &str, value: &str) {
        match key {
            "StreamTitle" => self.stream_title = Some(value.to_string()),
            "StreamUrl" => self.stream_url = Some(value.to_string()),
            _ => {}
        }
        self.fields.insert(key.to_string(), value.to_string());
    }
}

/// Parse metadata text.
///
/// Returns `Ok(None)` for empty input; empty blocks are heartbeats, not
/// events. Parsing stops at the first empty segment, which is where the
/// mandatory trailing `';` lands, so trailing garbage is ignored.
///
/// # Errors
///
/// [`ParseError::InvalidMetadataToken`] if a segment has no `='`. The error
/// only concerns this block; the parser keeps no state between calls.
pub fn parse_metadata(raw: &str) -> ParseResult<Option<Metadata>> {
    if raw.is_empty() {
        return Ok(None);
    }

    let mut metadata = Metadata::default();
    for segment in raw.split(FIELD_SEPARATOR) {
        if segment.is_empty() {
            break;
        }

        let (key, value) = segment
            .split_once(VALUE_SEPARATOR)
            .ok_or_else(|| ParseError::InvalidMetadataToken(segment.to_string()))?;
        metadata.insert(key, value);
    }

    Ok(Some(metadata))
}

/// Parse the payload of a metadata block, length byte already removed.
///
/// Trailing NUL padding is stripped and the bytes are decoded as UTF-8 with a
/// Latin-1 fallback before being handed to [`parse_metadata`].
pub fn parse_metadata_block(payload: &[u8]) -> ParseResult<Option<Metadata>> {
    let end = payload
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |last| last + 1);
    parse_metadata(&text::decode(&payload[..end]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_title() {
        let metadata = parse_metadata("StreamTitle='A - B';").unwrap().unwrap();

        assert_eq!(metadata.stream_title.as_deref(), Some("A - B"));
        assert_eq!(metadata.stream_url, None);
        assert_eq!(metadata.fields.len(), 1);
    }

    #[test]
    fn test_title_with_quote() {
        let metadata = parse_metadata("StreamTitle='May'n - ViViD - ViViD';")
            .unwrap()
            .unwrap();

        assert_eq!(
            metadata.stream_title.as_deref(),
            Some("May'n - ViViD - ViViD")
        );
    }

    #[test]
    fn test_empty_is_heartbeat() {
        assert_eq!(parse_metadata(""), Ok(None));
    }

    #[test]
    fn test_segment_without_value_separator() {
        assert_eq!(
            parse_metadata("Foo';"),
            Err(ParseError::InvalidMetadataToken("Foo".to_string()))
        );

        // No state leaks into the next call
        let metadata = parse_metadata("StreamTitle='X';").unwrap().unwrap();
        assert_eq!(metadata.stream_title.as_deref(), Some("X"));
    }

    #[test]
    fn test_unknown_keys_are_retained() {
        let raw = "StreamTitle='Song';StreamUrl='http://x/';adw_ad='true';";
        let metadata = parse_metadata(raw).unwrap().unwrap();

        assert_eq!(metadata.stream_url.as_deref(), Some("http://x/"));
        assert_eq!(metadata.get("adw_ad"), Some("true"));
        let keys: Vec<_> = metadata.fields.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["StreamTitle", "StreamUrl", "adw_ad"]);
    }

    #[test]
    fn test_content_after_terminal_segment_is_ignored() {
        let metadata = parse_metadata("StreamTitle='X';';garbage")
            .unwrap()
            .unwrap();

        assert_eq!(metadata.stream_title.as_deref(), Some("X"));
        assert_eq!(metadata.fields.len(), 1);
    }

    #[test]
    fn test_empty_title_value() {
        let metadata = parse_metadata("StreamTitle='';").unwrap().unwrap();
        assert_eq!(metadata.stream_title.as_deref(), Some(""));
    }

    #[test]
    fn test_block_strips_padding() {
        let mut payload = b"StreamTitle='X';".to_vec();
        payload.resize(32, 0);

        let metadata = parse_metadata_block(&payload).unwrap().unwrap();
        assert_eq!(metadata.stream_title.as_deref(), Some("X"));
    }

    #[test]
    fn test_block_of_only_padding_is_heartbeat() {
        assert_eq!(parse_metadata_block(&[0u8; 16]), Ok(None));
        assert_eq!(parse_metadata_block(&[]), Ok(None));
    }

    #[test]
    fn test_artist_and_title() {
        let metadata = parse_metadata("StreamTitle='Daft Punk - One More Time';")
            .unwrap()
            .unwrap();
        assert_eq!(
            metadata.artist_and_title(),
            Some(("Daft Punk", "One More Time"))
        );

        let metadata = parse_metadata("StreamTitle='Station ID';").unwrap().unwrap();
        assert_eq!(metadata.artist_and_title(), None);
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let raw = "StreamTitle='Same';StreamUrl='';";
        assert_eq!(parse_metadata(raw), parse_metadata(raw));
    }
}
