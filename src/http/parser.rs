use crate::http::request::{Method, Request, RequestBuilder, Version};
use crate::http::response::StatusCode;
use std::fmt;

/// Default cap on the request line plus headers.
pub const DEFAULT_MAX_HEADER_BYTES: usize = 64 * 1024;
/// Default cap on a declared Content-Length.
pub const DEFAULT_MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Size limits applied while parsing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseLimits {
    pub max_header_bytes: usize,
    pub max_body_bytes: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            max_header_bytes: DEFAULT_MAX_HEADER_BYTES,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Request line is not `METHOD SP target SP version`
    InvalidRequest,
    InvalidMethod,
    InvalidTarget,
    InvalidVersion,
    InvalidHeader,
    InvalidContentLength,
    /// Chunked or other transfer codings are not supported
    UnsupportedTransferEncoding,
    HeadersTooLarge,
    /// Declared Content-Length exceeds the body limit
    PayloadTooLarge,
    /// More bytes are needed
    Incomplete,
}

impl ParseError {
    /// Every variant except `Incomplete` is fatal for the connection.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, ParseError::Incomplete)
    }

    /// Status the server answers with when it rejects a request.
    pub fn status(&self) -> StatusCode {
        match self {
            ParseError::HeadersTooLarge => StatusCode::RequestHeaderFieldsTooLarge,
            ParseError::PayloadTooLarge => StatusCode::PayloadTooLarge,
            ParseError::UnsupportedTransferEncoding => StatusCode::NotImplemented,
            _ => StatusCode::BadRequest,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ParseError::InvalidRequest => "malformed request line",
            ParseError::InvalidMethod => "invalid method token",
            ParseError::InvalidTarget => "invalid request target",
            ParseError::InvalidVersion => "invalid protocol version",
            ParseError::InvalidHeader => "malformed header line",
            ParseError::InvalidContentLength => "invalid Content-Length",
            ParseError::UnsupportedTransferEncoding => "transfer encodings are not supported",
            ParseError::HeadersTooLarge => "request header block too large",
            ParseError::PayloadTooLarge => "request body too large",
            ParseError::Incomplete => "incomplete request",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for ParseError {}

/// Parse one request from the front of `buf`.
///
/// Lines may end in CRLF or a bare LF. On success returns the request and
/// the number of bytes it occupied, so the caller can drain them and keep
/// any pipelined bytes. Returns `ParseError::Incomplete` while the header
/// block or the declared body is still partial.
pub fn parse_http_request(
    buf: &[u8],
    limits: &ParseLimits,
) -> Result<(Request, usize), ParseError> {
    // Stray empty lines before a request line are allowed (RFC 7230 3.5)
    let mut start = 0;
    loop {
        let rest = &buf[start..];
        if rest.starts_with(b"\r\n") {
            start += 2;
        } else if rest.starts_with(b"\n") {
            start += 1;
        } else {
            break;
        }
    }
    let buf_rest = &buf[start..];

    let (headers_end, body_start) = match find_headers_end(buf_rest) {
        Some(bounds) => bounds,
        None if buf_rest.len() > limits.max_header_bytes => {
            return Err(ParseError::HeadersTooLarge);
        }
        None => return Err(ParseError::Incomplete),
    };
    if headers_end > limits.max_header_bytes {
        return Err(ParseError::HeadersTooLarge);
    }

    // Drop the terminator of the last header line before splitting
    let header_bytes = &buf_rest[..headers_end - 1];
    let body_bytes = &buf_rest[body_start..];
    let mut lines = header_bytes.split(|&b| b == b'\n').map(strip_cr);

    // Request line
    let request_line = lines.next().ok_or(ParseError::InvalidRequest)?;
    let request_line = std::str::from_utf8(request_line).map_err(|_| ParseError::InvalidRequest)?;
    let (method, target, version) = parse_request_line(request_line)?;

    // Headers
    let mut headers: Vec<(String, String)> = Vec::new();
    for line in lines {
        if matches!(line.first(), Some(b' ' | b'\t')) {
            // obs-fold: continuation of the previous value
            let (_, value) = headers.last_mut().ok_or(ParseError::InvalidHeader)?;
            let more = field_value(line)?;
            if !more.is_empty() {
                if !value.is_empty() {
                    value.push(' ');
                }
                value.push_str(&more);
            }
            continue;
        }

        let colon = line
            .iter()
            .position(|&b| b == b':')
            .ok_or(ParseError::InvalidHeader)?;
        let name = std::str::from_utf8(&line[..colon])
            .ok()
            .filter(|name| is_token(name))
            .ok_or(ParseError::InvalidHeader)?;
        headers.push((name.to_string(), field_value(&line[colon + 1..])?));
    }

    if headers
        .iter()
        .any(|(k, _)| k.eq_ignore_ascii_case("Transfer-Encoding"))
    {
        return Err(ParseError::UnsupportedTransferEncoding);
    }

    // Body
    let content_length = content_length(&headers)?;
    if content_length > limits.max_body_bytes {
        return Err(ParseError::PayloadTooLarge);
    }
    if body_bytes.len() < content_length {
        return Err(ParseError::Incomplete);
    }

    let mut builder = RequestBuilder::new()
        .method(method)
        .target(target)
        .version(version)
        .body(body_bytes[..content_length].to_vec());
    for (name, value) in headers {
        builder = builder.header(name, value);
    }
    let request = builder.build().map_err(|_| ParseError::InvalidRequest)?;

    let total_consumed = start + body_start + content_length;
    Ok((request, total_consumed))
}

fn parse_request_line(line: &str) -> Result<(Method, &str, Version), ParseError> {
    let mut parts = line.split(' ');
    let (Some(method), Some(target), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ParseError::InvalidRequest);
    };

    if !is_token(method) {
        return Err(ParseError::InvalidMethod);
    }
    if target.is_empty() || target.bytes().any(|b| b.is_ascii_control()) {
        return Err(ParseError::InvalidTarget);
    }
    let version = parse_version(version).ok_or(ParseError::InvalidVersion)?;

    Ok((Method::from_token(method), target, version))
}

fn parse_version(s: &str) -> Option<Version> {
    let digits = s.strip_prefix("HTTP/")?.as_bytes();
    match digits {
        [major, b'.', minor] if major.is_ascii_digit() && minor.is_ascii_digit() => Some(Version {
            major: major - b'0',
            minor: minor - b'0',
        }),
        _ => None,
    }
}

/// All Content-Length headers must agree; absent means no body.
fn content_length(headers: &[(String, String)]) -> Result<usize, ParseError> {
    let mut length = None;
    for (_, value) in headers
        .iter()
        .filter(|(k, _)| k.eq_ignore_ascii_case("Content-Length"))
    {
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::InvalidContentLength);
        }
        let parsed: usize = value
            .parse()
            .map_err(|_| ParseError::InvalidContentLength)?;
        match length {
            Some(prev) if prev != parsed => return Err(ParseError::InvalidContentLength),
            _ => length = Some(parsed),
        }
    }
    Ok(length.unwrap_or(0))
}

/// Finds the empty line closing the header block.
///
/// Returns where that line starts and where the body starts.
fn find_headers_end(buf: &[u8]) -> Option<(usize, usize)> {
    let mut line_start = 0;
    for (i, &b) in buf.iter().enumerate() {
        if b != b'\n' {
            continue;
        }
        if strip_cr(&buf[line_start..i]).is_empty() {
            return Some((line_start, i + 1));
        }
        line_start = i + 1;
    }
    None
}

fn strip_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn trim_ows(mut s: &[u8]) -> &[u8] {
    while let [b' ' | b'\t', rest @ ..] = s {
        s = rest;
    }
    while let [rest @ .., b' ' | b'\t'] = s {
        s = rest;
    }
    s
}

/// Validates a raw field value and decodes it.
///
/// obs-text bytes are kept: values that are not UTF-8 are read as Latin-1.
fn field_value(raw: &[u8]) -> Result<String, ParseError> {
    let value = trim_ows(raw);
    if !value.iter().all(|&b| is_field_value_byte(b)) {
        return Err(ParseError::InvalidHeader);
    }
    Ok(match std::str::from_utf8(value) {
        Ok(s) => s.to_string(),
        Err(_) => value.iter().map(|&b| b as char).collect(),
    })
}

/// RFC 7230 field-value byte: VCHAR, obs-text, SP or HTAB.
pub(crate) fn is_field_value_byte(b: u8) -> bool {
    matches!(b, b'\t' | b' ' | 0x21..=0x7e | 0x80..=0xff)
}

/// RFC 7230 `token`: one or more tchar.
pub(crate) fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_alphanumeric()
                || matches!(
                    b,
                    b'!' | b'#'
                        | b'$'
                        | b'%'
                        | b'&'
                        | b'\''
                        | b'*'
                        | b'+'
                        | b'-'
                        | b'.'
                        | b'^'
                        | b'_'
                        | b'`'
                        | b'|'
                        | b'~'
                )
        })
}
