use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::http::response::Response;

const HTTP_VERSION: &str = "HTTP/1.1";

/// Headers the writer always emits itself; user values are dropped.
const FRAMING_HEADERS: [&str; 5] = [
    "Date",
    "Server",
    "Content-Length",
    "Connection",
    "Transfer-Encoding",
];

/// Per-exchange facts the writer needs besides the response itself.
#[derive(Debug, Clone)]
pub struct WriteContext<'a> {
    /// Value of the `Server` header
    pub origin_server: &'a str,
    /// Emit `Connection: keep-alive` instead of `Connection: close`
    pub keep_alive: bool,
    /// Request was HEAD: keep Content-Length, omit the body
    pub head: bool,
    pub date: DateTime<Utc>,
}

impl<'a> WriteContext<'a> {
    pub fn new(origin_server: &'a str) -> Self {
        Self {
            origin_server,
            keep_alive: false,
            head: false,
            date: Utc::now(),
        }
    }
}

/// IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn http_date(date: &DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

pub fn serialize_response(resp: &Response, ctx: &WriteContext<'_>) -> Vec<u8> {
    let body = resp.body();
    let mut buf = Vec::with_capacity(256 + body.len());

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status().as_u16(),
        resp.status().reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Framing headers, always in this order
    push_header(&mut buf, "Date", &http_date(&ctx.date));
    push_header(&mut buf, "Server", ctx.origin_server);
    push_header(&mut buf, "Content-Length", &body.len().to_string());
    push_header(
        &mut buf,
        "Connection",
        if ctx.keep_alive { "keep-alive" } else { "close" },
    );

    for (k, v) in resp.headers() {
        if FRAMING_HEADERS.iter().any(|h| h.eq_ignore_ascii_case(k)) {
            continue;
        }
        push_header(&mut buf, k, v);
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    if !ctx.head {
        buf.extend_from_slice(body);
    }

    buf
}

fn push_header(buf: &mut Vec<u8>, name: &str, value: &str) {
    buf.extend_from_slice(name.as_bytes());
    buf.extend_from_slice(b": ");
    buf.extend_from_slice(value.as_bytes());
    buf.extend_from_slice(b"\r\n");
}

/// A response serialized up front, written out in as many calls as the
/// socket needs.
pub struct ResponseWriter {
    buffer: Vec<u8>,
    written: usize,
}

impl ResponseWriter {
    pub fn from_bytes(buffer: Vec<u8>) -> Self {
        Self { buffer, written: 0 }
    }

    pub async fn write_to_stream(&mut self, stream: &mut TcpStream) -> anyhow::Result<()> {
        while self.written < self.buffer.len() {
            let n = stream.write(&self.buffer[self.written..]).await?;

            if n == 0 {
                return Err(anyhow::anyhow!("connection closed while writing"));
            }

            self.written += n;
        }

        stream.flush().await?;
        Ok(())
    }
}
