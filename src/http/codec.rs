//! Wire codec seam.
//!
//! The connection only talks to the wire through [`Codec`], so a different
//! HTTP/1.x implementation can replace the built-in parser and writer.

use crate::http::parser::{self, ParseError, ParseLimits};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::writer::{self, WriteContext};

pub trait Codec: Send + Sync + 'static {
    /// Decode one request from the front of `buf`, returning it with the
    /// number of bytes consumed. `ParseError::Incomplete` asks for more input.
    fn decode(&self, buf: &[u8]) -> Result<(Request, usize), ParseError>;

    /// Serialize a sealed response, headers and body included.
    fn encode(&self, response: &Response, ctx: &WriteContext<'_>) -> Vec<u8>;
}

/// Built-in HTTP/1.1 codec.
#[derive(Debug, Clone, Default)]
pub struct Http11Codec {
    limits: ParseLimits,
}

impl Http11Codec {
    pub fn new(limits: ParseLimits) -> Self {
        Self { limits }
    }
}

impl Codec for Http11Codec {
    fn decode(&self, buf: &[u8]) -> Result<(Request, usize), ParseError> {
        parser::parse_http_request(buf, &self.limits)
    }

    fn encode(&self, response: &Response, ctx: &WriteContext<'_>) -> Vec<u8> {
        writer::serialize_response(response, ctx)
    }
}
