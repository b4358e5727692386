use std::net::SocketAddr;
use std::sync::Arc;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::config::Config;
use crate::http::codec::Codec;
use crate::http::handler::{self, Handler};
use crate::http::parser::ParseError;
use crate::http::request::{Method, Request};
use crate::http::response::Response;
use crate::http::writer::{ResponseWriter, WriteContext};

/// Everything a connection needs from the server, shared read-only.
pub struct ConnectionContext {
    pub config: Arc<Config>,
    pub codec: Arc<dyn Codec>,
    pub handler: Arc<dyn Handler>,
}

pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    buffer: BytesMut,
    state: ConnectionState,
    ctx: Arc<ConnectionContext>,
    served: usize,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(ResponseWriter, bool), // bool = keep_alive?
    Closed,
}

/// What a read attempt produced.
enum ReadOutcome {
    Request(Request),
    /// Peer closed before sending a complete request
    Closed,
    TimedOut,
    Malformed(ParseError),
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr, ctx: Arc<ConnectionContext>) -> Self {
        let capacity = ctx.config.read_chunk();
        Self {
            stream,
            peer,
            buffer: BytesMut::with_capacity(capacity),
            state: ConnectionState::Reading,
            ctx,
            served: 0,
        }
    }

    /// Serve the connection until it closes, then shut the socket down
    /// whether or not serving succeeded.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        if self.ctx.config.tcp_nodelay {
            if let Err(e) = self.stream.set_nodelay(true) {
                tracing::debug!(peer = %self.peer, error = %e, "failed to set TCP_NODELAY");
            }
        }

        let result = self.serve().await;

        if let Err(e) = self.stream.shutdown().await {
            tracing::trace!(peer = %self.peer, error = %e, "socket shutdown failed");
        }
        self.state = ConnectionState::Closed;

        result
    }

    async fn serve(&mut self) -> anyhow::Result<()> {
        loop {
            let state = std::mem::replace(&mut self.state, ConnectionState::Closed);

            self.state = match state {
                ConnectionState::Reading => match self.read_request().await? {
                    ReadOutcome::Request(req) => ConnectionState::Processing(req),
                    ReadOutcome::Closed => {
                        if self.served == 0 || !self.buffer.is_empty() {
                            tracing::info!(peer = %self.peer, "client closed connection");
                        }
                        ConnectionState::Closed
                    }
                    ReadOutcome::TimedOut => {
                        tracing::info!(
                            peer = %self.peer,
                            timeout_ms = self.ctx.config.so_timeout_ms,
                            "read timed out, closing connection"
                        );
                        ConnectionState::Closed
                    }
                    ReadOutcome::Malformed(e) => {
                        tracing::warn!(
                            peer = %self.peer,
                            error = %e,
                            "Unrecoverable HTTP protocol violation"
                        );
                        let status = e.status();
                        let response = Response::error(status, &format!("{status}\n"));
                        let ctx = WriteContext::new(&self.ctx.config.origin_server);
                        let writer = ResponseWriter::from_bytes(self.ctx.codec.encode(&response, &ctx));
                        ConnectionState::Writing(writer, false)
                    }
                },

                ConnectionState::Processing(req) => {
                    let keep_alive = self.ctx.config.keep_alive && req.keep_alive();
                    let head = *req.method_kind() == Method::HEAD;

                    tracing::debug!(
                        peer = %self.peer,
                        method = %req.method(),
                        target = %req.target(),
                        version = %req.version(),
                        "dispatching request"
                    );

                    let response = handler::dispatch(Arc::clone(&self.ctx.handler), req).await;

                    let mut ctx = WriteContext::new(&self.ctx.config.origin_server);
                    ctx.keep_alive = keep_alive;
                    ctx.head = head;

                    tracing::debug!(
                        peer = %self.peer,
                        status = response.status().as_u16(),
                        body_len = response.body().len(),
                        "response ready"
                    );

                    let writer = ResponseWriter::from_bytes(self.ctx.codec.encode(&response, &ctx));
                    self.served += 1;
                    ConnectionState::Writing(writer, keep_alive)
                }

                ConnectionState::Writing(mut writer, keep_alive) => {
                    writer.write_to_stream(&mut self.stream).await?;

                    if keep_alive {
                        ConnectionState::Reading // go back for next request
                    } else {
                        ConnectionState::Closed
                    }
                }

                ConnectionState::Closed => {
                    break;
                }
            };
        }

        Ok(())
    }

    async fn read_request(&mut self) -> anyhow::Result<ReadOutcome> {
        let chunk = self.ctx.config.read_chunk();
        let read_timeout = self.ctx.config.read_timeout();

        loop {
            // Try parsing whatever we already have
            if !self.buffer.is_empty() {
                match self.ctx.codec.decode(&self.buffer) {
                    Ok((request, consumed)) => {
                        self.buffer.advance(consumed);
                        return Ok(ReadOutcome::Request(request));
                    }
                    Err(e) if e.is_incomplete() => {
                        // Need more data → fall through to read
                    }
                    Err(e) => return Ok(ReadOutcome::Malformed(e)),
                }
            }

            self.buffer.reserve(chunk);
            let n = match timeout(read_timeout, self.stream.read_buf(&mut self.buffer)).await {
                Ok(res) => res?,
                Err(_) => return Ok(ReadOutcome::TimedOut),
            };

            if n == 0 {
                return Ok(ReadOutcome::Closed);
            }
        }
    }
}
