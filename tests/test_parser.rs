use toyhttpd::http::parser::{ParseError, ParseLimits, parse_http_request};
use toyhttpd::http::request::{Method, Version};
use toyhttpd::http::response::StatusCode;

fn parse(req: &[u8]) -> Result<(toyhttpd::Request, usize), ParseError> {
    parse_http_request(req, &ParseLimits::default())
}

fn limits(max_header_bytes: usize, max_body_bytes: usize) -> ParseLimits {
    ParseLimits {
        max_header_bytes,
        max_body_bytes,
    }
}

#[test]
fn test_parse_simple_get_request() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let (parsed, consumed) = parse(req).unwrap();

    assert_eq!(parsed.method(), "GET");
    assert_eq!(*parsed.method_kind(), Method::GET);
    assert_eq!(parsed.target(), "/");
    assert_eq!(parsed.version(), Version::HTTP_11);
    assert_eq!(parsed.header("Host"), Some("example.com"));
    assert_eq!(consumed, req.len());
}

#[test]
fn test_parse_post_request_with_body() {
    let req = b"POST /api HTTP/1.1\r\nHost: localhost\r\nContent-Length: 5\r\n\r\nhello";
    let (parsed, consumed) = parse(req).unwrap();

    assert_eq!(parsed.method(), "POST");
    assert_eq!(parsed.target(), "/api");
    assert_eq!(parsed.body(), b"hello");
    assert_eq!(consumed, req.len());
}

#[test]
fn test_parse_leaves_pipelined_bytes() {
    let req = b"POST /a HTTP/1.1\r\nContent-Length: 2\r\n\r\nokGET /b HTTP/1.1\r\n\r\n";
    let (first, consumed) = parse(req).unwrap();

    assert_eq!(first.body(), b"ok");
    let (second, rest) = parse(&req[consumed..]).unwrap();
    assert_eq!(second.target(), "/b");
    assert_eq!(consumed + rest, req.len());
}

#[test]
fn test_parse_multiple_headers_in_order() {
    let req = b"GET /path HTTP/1.1\r\nHost: example.com\r\nUser-Agent: test-client\r\nAccept: */*\r\n\r\n";
    let (parsed, _) = parse(req).unwrap();

    let names: Vec<&str> = parsed.headers().iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(names, ["Host", "User-Agent", "Accept"]);
    assert_eq!(parsed.header("user-agent"), Some("test-client"));
    assert_eq!(parsed.header("ACCEPT"), Some("*/*"));
}

#[test]
fn test_parse_duplicate_headers_preserved() {
    let req = b"GET / HTTP/1.1\r\nAccept: text/html\r\naccept: application/json\r\n\r\n";
    let (parsed, _) = parse(req).unwrap();

    let values: Vec<&str> = parsed.headers_all("Accept").collect();
    assert_eq!(values, ["text/html", "application/json"]);
    assert_eq!(parsed.header("Accept"), Some("text/html"));
}

#[test]
fn test_parse_header_value_whitespace_trimmed() {
    let req = b"GET / HTTP/1.1\r\nX-Pad: \t  padded value \t\r\nX-Empty:\r\n\r\n";
    let (parsed, _) = parse(req).unwrap();

    assert_eq!(parsed.header("X-Pad"), Some("padded value"));
    assert_eq!(parsed.header("X-Empty"), Some(""));
}

#[test]
fn test_parse_folded_header() {
    let req = b"GET / HTTP/1.1\r\nX-Long: first\r\n   second\r\n\tthird\r\nHost: h\r\n\r\n";
    let (parsed, _) = parse(req).unwrap();

    assert_eq!(parsed.header("X-Long"), Some("first second third"));
    assert_eq!(parsed.header("Host"), Some("h"));
}

#[test]
fn test_parse_fold_without_previous_header() {
    let req = b"GET / HTTP/1.1\r\n  orphan\r\n\r\n";
    assert_eq!(parse(req).unwrap_err(), ParseError::InvalidHeader);
}

#[test]
fn test_parse_request_with_path_and_query_string() {
    let req = b"GET /search?q=rust HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let (parsed, _) = parse(req).unwrap();

    assert_eq!(parsed.target(), "/search?q=rust");
    assert_eq!(parsed.path(), "/search");
    assert_eq!(parsed.query(), Some("q=rust"));
}

#[test]
fn test_parse_incomplete_request_missing_blank_line() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n";
    assert!(matches!(parse(req), Err(ParseError::Incomplete)));
}

#[test]
fn test_parse_incomplete_request_partial_body() {
    let req = b"POST /api HTTP/1.1\r\nContent-Length: 10\r\n\r\nhello";
    assert!(matches!(parse(req), Err(ParseError::Incomplete)));
}

#[test]
fn test_parse_extension_method_kept_verbatim() {
    let req = b"PROPFIND /dav HTTP/1.1\r\n\r\n";
    let (parsed, _) = parse(req).unwrap();

    assert_eq!(parsed.method(), "PROPFIND");
    assert_eq!(*parsed.method_kind(), Method::Extension("PROPFIND".into()));
}

#[test]
fn test_parse_method_is_case_sensitive() {
    let req = b"get / HTTP/1.1\r\n\r\n";
    let (parsed, _) = parse(req).unwrap();

    assert_eq!(parsed.method(), "get");
    assert_ne!(*parsed.method_kind(), Method::GET);
}

#[test]
fn test_parse_invalid_http_method() {
    let req = b"GE(T / HTTP/1.1\r\n\r\n";
    assert!(matches!(parse(req), Err(ParseError::InvalidMethod)));
}

#[test]
fn test_parse_malformed_request_line() {
    for req in [
        &b"GET /\r\n\r\n"[..],
        b"GET  / HTTP/1.1\r\n\r\n",
        b"GET / HTTP/1.1 extra\r\n\r\n",
        b"garbage\r\n\r\n",
    ] {
        assert_eq!(parse(req).unwrap_err(), ParseError::InvalidRequest);
    }
}

#[test]
fn test_parse_invalid_version() {
    for req in [
        &b"GET / HTTP/11\r\n\r\n"[..],
        b"GET / FTP/1.1\r\n\r\n",
        b"GET / HTTP/1.x\r\n\r\n",
    ] {
        assert_eq!(parse(req).unwrap_err(), ParseError::InvalidVersion);
    }
}

#[test]
fn test_parse_non_utf8_request_line() {
    let req = b"\x00\x01\x02\x03garbage\r\n\r\n";
    assert!(parse(req).is_err());
}

#[test]
fn test_parse_malformed_header() {
    let req = b"GET / HTTP/1.1\r\nBrokenHeader\r\n\r\n";
    assert!(matches!(parse(req), Err(ParseError::InvalidHeader)));
}

#[test]
fn test_parse_space_before_colon_rejected() {
    let req = b"GET / HTTP/1.1\r\nHost : example.com\r\n\r\n";
    assert!(matches!(parse(req), Err(ParseError::InvalidHeader)));
}

#[test]
fn test_parse_request_with_empty_body() {
    let req = b"POST /api HTTP/1.1\r\nContent-Length: 0\r\n\r\n";
    let (parsed, _) = parse(req).unwrap();

    assert!(parsed.body().is_empty());
}

#[test]
fn test_parse_request_with_binary_body() {
    let req = b"POST /upload HTTP/1.1\r\nContent-Length: 4\r\n\r\n\x00\x01\x02\x03";
    let (parsed, _) = parse(req).unwrap();

    assert_eq!(parsed.body(), &[0, 1, 2, 3]);
}

#[test]
fn test_parse_body_ignored_without_content_length() {
    let req = b"GET / HTTP/1.1\r\n\r\ntrailing";
    let (parsed, consumed) = parse(req).unwrap();

    assert!(parsed.body().is_empty());
    assert_eq!(consumed, req.len() - "trailing".len());
}

#[test]
fn test_parse_invalid_content_length() {
    for req in [
        &b"POST / HTTP/1.1\r\nContent-Length: abc\r\n\r\n"[..],
        b"POST / HTTP/1.1\r\nContent-Length: -1\r\n\r\n",
        b"POST / HTTP/1.1\r\nContent-Length: 3\r\nContent-Length: 4\r\n\r\nabcd",
    ] {
        assert_eq!(parse(req).unwrap_err(), ParseError::InvalidContentLength);
    }
}

#[test]
fn test_parse_matching_duplicate_content_length() {
    let req = b"POST / HTTP/1.1\r\nContent-Length: 2\r\ncontent-length: 2\r\n\r\nhi";
    let (parsed, _) = parse(req).unwrap();

    assert_eq!(parsed.body(), b"hi");
}

#[test]
fn test_parse_transfer_encoding_unsupported() {
    let req = b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n0\r\n\r\n";
    assert_eq!(
        parse(req).unwrap_err(),
        ParseError::UnsupportedTransferEncoding
    );
}

#[test]
fn test_parse_headers_too_large() {
    let mut req = b"GET / HTTP/1.1\r\n".to_vec();
    req.extend(std::iter::repeat_n(b'a', 200));

    assert_eq!(
        parse_http_request(&req, &limits(64, 1024)).unwrap_err(),
        ParseError::HeadersTooLarge
    );

    req.extend_from_slice(b": x\r\n\r\n");
    assert_eq!(
        parse_http_request(&req, &limits(64, 1024)).unwrap_err(),
        ParseError::HeadersTooLarge
    );
}

#[test]
fn test_parse_error_display() {
    assert_eq!(ParseError::InvalidRequest.to_string(), "malformed request line");
    assert!(ParseError::Incomplete.is_incomplete());
    assert!(!ParseError::InvalidHeader.is_incomplete());
}

#[test]
fn test_parse_error_status() {
    assert_eq!(ParseError::InvalidHeader.status(), StatusCode::BadRequest);
    assert_eq!(ParseError::PayloadTooLarge.status(), StatusCode::PayloadTooLarge);
    assert_eq!(
        ParseError::HeadersTooLarge.status(),
        StatusCode::RequestHeaderFieldsTooLarge
    );
    assert_eq!(
        ParseError::UnsupportedTransferEncoding.status(),
        StatusCode::NotImplemented
    );
}

#[test]
fn test_parse_lf_only_request() {
    let req = b"POST /lf HTTP/1.1\nHost: example.com\nContent-Length: 2\n\nhi";
    let (parsed, consumed) = parse(req).unwrap();

    assert_eq!(parsed.target(), "/lf");
    assert_eq!(parsed.version(), Version::HTTP_11);
    assert_eq!(parsed.header("Host"), Some("example.com"));
    assert_eq!(parsed.body(), b"hi");
    assert_eq!(consumed, req.len());
}

#[test]
fn test_parse_mixed_line_endings() {
    let req = b"\nGET / HTTP/1.1\r\nHost: h\nX-Long: a\n b\r\n\nrest";
    let (parsed, consumed) = parse(req).unwrap();

    assert_eq!(parsed.header("Host"), Some("h"));
    assert_eq!(parsed.header("X-Long"), Some("a b"));
    assert_eq!(consumed, req.len() - "rest".len());
}

#[test]
fn test_parse_lf_only_incomplete_until_blank_line() {
    assert_eq!(
        parse(b"GET / HTTP/1.1\nHost: h\n").unwrap_err(),
        ParseError::Incomplete
    );
}

#[test]
fn test_parse_obs_text_value_kept() {
    let req = b"GET / HTTP/1.1\r\nX-Name: caf\xe9\r\nX-Utf8: caf\xc3\xa9\r\n\r\n";
    let (parsed, _) = parse(req).unwrap();

    assert_eq!(parsed.header("X-Name"), Some("caf\u{e9}"));
    assert_eq!(parsed.header("X-Utf8"), Some("café"));
}

#[test]
fn test_parse_control_characters_in_value_rejected() {
    for req in [
        &b"GET / HTTP/1.1\r\nX-Name: a\x00b\r\n\r\n"[..],
        b"GET / HTTP/1.1\r\nX-Name: a\rb\r\n\r\n",
        b"GET / HTTP/1.1\r\nX-Name: a\nInjected: b\x00\r\n\r\n",
        b"GET / HTTP/1.1\r\nX-Name: a\x7f\r\n\r\n",
        b"GET / HTTP/1.1\r\nX-Name: a\r\n b\x01\r\n\r\n",
    ] {
        assert_eq!(parse(req).unwrap_err(), ParseError::InvalidHeader);
    }
}

#[test]
fn test_parse_body_too_large() {
    let req = b"POST / HTTP/1.1\r\nContent-Length: 1000000000000\r\n\r\n";
    assert_eq!(parse(req).unwrap_err(), ParseError::PayloadTooLarge);

    // Rejected before the body arrives
    let req = b"POST / HTTP/1.1\r\nContent-Length: 5\r\n\r\n";
    assert_eq!(
        parse_http_request(req, &limits(1024, 4)).unwrap_err(),
        ParseError::PayloadTooLarge
    );

    let req = b"POST / HTTP/1.1\r\nContent-Length: 4\r\n\r\nabcd";
    let (parsed, _) = parse_http_request(req, &limits(1024, 4)).unwrap();
    assert_eq!(parsed.body(), b"abcd");
}
