//! Table-driven cases for the header and metadata parsers

use icy_parser::{parse_headers, parse_metadata, HeaderSet, Metadata, ParseError};
use rstest::rstest;

#[rstest]
#[case::minimal("ICY 200 OK\r\nicy-metaint:8192\r\n\r\n", 8192)]
#[case::spaced_value("ICY 200 OK\r\nicy-metaint: 16000\r\n\r\n", 16000)]
#[case::mixed_case_key("ICY 200 OK\r\nIcy-MetaInt:4096\r\n\r\n", 4096)]
#[case::bare_newlines("ICY 200 OK\nicy-name:x\nicy-metaint:1024\n\n", 1024)]
#[case::first_metaint_wins("ICY 200 OK\r\nicy-metaint:10\r\nicy-metaint:20\r\n\r\n", 10)]
fn test_chunk_size(#[case] raw: &str, #[case] expected: usize) {
    let parsed = parse_headers(raw.as_bytes()).expect("header block should parse");
    assert_eq!(parsed.chunk_size, expected);
}

#[rstest]
#[case::empty("")]
#[case::plain_ok("OK\r\n\r\n")]
#[case::http_status("HTTP/1.1 200 OK\r\nicy-metaint:8192\r\n\r\n")]
#[case::icy_error("ICY 404 Resource Not Found\r\n\r\n")]
fn test_unexpected_status(#[case] raw: &str) {
    let result = parse_headers(raw.as_bytes());
    assert!(
        matches!(result, Err(ParseError::UnexpectedStatus(_))),
        "expected UnexpectedStatus, got {:?}",
        result
    );
}

#[rstest]
#[case::title_only("StreamTitle='A - B';", Some("A - B"), None)]
#[case::title_and_url("StreamTitle='A';StreamUrl='http://a/';", Some("A"), Some("http://a/"))]
#[case::url_first("StreamUrl='u';StreamTitle='t';", Some("t"), Some("u"))]
#[case::no_known_keys("Foo='bar';", None, None)]
#[case::equals_in_value("StreamTitle='1+1=2';", Some("1+1=2"), None)]
fn test_metadata_fields(
    #[case] raw: &str,
    #[case] title: Option<&str>,
    #[case] url: Option<&str>,
) {
    let metadata = parse_metadata(raw).unwrap().expect("non-empty block");
    assert_eq!(metadata.stream_title.as_deref(), title);
    assert_eq!(metadata.stream_url.as_deref(), url);
}

#[rstest]
#[case::missing_separator("Foo';")]
#[case::second_segment_bad("StreamTitle='A';Broken;")]
#[case::no_terminator_and_no_separator("junk")]
fn test_metadata_rejected(#[case] raw: &str) {
    assert!(matches!(
        parse_metadata(raw),
        Err(ParseError::InvalidMetadataToken(_))
    ));
}

#[test]
fn test_types_serialize() {
    let parsed = parse_headers(b"ICY 200 OK\r\nicy-name:Radio\r\nicy-metaint:8192\r\n\r\n").unwrap();
    let json = serde_json::to_value(&parsed.headers).unwrap();
    assert_eq!(json[0]["key"], "icy-name");
    assert_eq!(json[1]["value"], "8192");

    let back: HeaderSet = serde_json::from_value(json).unwrap();
    assert_eq!(back, parsed.headers);

    let metadata = parse_metadata("StreamTitle='X';").unwrap().unwrap();
    let json = serde_json::to_string(&metadata).unwrap();
    let back: Metadata = serde_json::from_str(&json).unwrap();
    assert_eq!(back, metadata);
}
