//! Byte-to-text decoding shared by the header and metadata parsers.

use std::borrow::Cow;

/// Decode a block of protocol text.
///
/// ICY servers are not consistent about encodings: modern ones send UTF-8,
/// older ones send Latin-1. Valid UTF-8 is borrowed as-is, anything else is
/// decoded as Latin-1 so that no byte is lost or replaced.
pub(crate) fn decode(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(bytes.iter().map(|&b| b as char).collect()),
    }
}
