//! Server lifecycle: `Created → Listening → Stopped`.
//!
//! The server owns its own tokio runtime, so it is driven from plain
//! synchronous code. `listen`, `close` and dropping the server block the
//! calling thread and must not be used from inside an async context.

pub mod listener;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::runtime::Runtime;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::http::codec::{Codec, Http11Codec};
use crate::http::connection::ConnectionContext;
use crate::http::handler::Handler;
use crate::http::request::Request;
use crate::http::response::Response;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Created,
    Listening,
    Stopped,
}

pub struct Server {
    config: Arc<Config>,
    handler: Arc<dyn Handler>,
    codec: Arc<dyn Codec>,
    state: ServerState,
    local_addr: Option<SocketAddr>,
    // Kept after close() so in-flight connections can finish
    runtime: Option<Runtime>,
    shutdown: Option<watch::Sender<bool>>,
    acceptor: Option<JoinHandle<()>>,
}

impl Server {
    pub fn new(config: Config, handler: impl Handler) -> Self {
        let codec = Http11Codec::new(config.parse_limits());
        Self {
            config: Arc::new(config),
            handler: Arc::new(handler),
            codec: Arc::new(codec),
            state: ServerState::Created,
            local_addr: None,
            runtime: None,
            shutdown: None,
            acceptor: None,
        }
    }

    /// Same as [`Server::new`], typed for closures so their argument
    /// lifetimes are inferred.
    pub fn from_fn<F>(config: Config, f: F) -> Self
    where
        F: Fn(&Request, &mut Response) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::new(config, f)
    }

    /// Replace the wire codec. Only meaningful before `listen`.
    pub fn with_codec(mut self, codec: impl Codec) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    /// Address the listening socket is bound to, once listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Bind `config.host:port` and start accepting connections in the
    /// background. Port 0 picks a free port; the bound address is returned.
    pub fn listen(&mut self, port: u16) -> anyhow::Result<SocketAddr> {
        if self.state != ServerState::Created {
            anyhow::bail!("listen() called on a server that is {:?}", self.state);
        }

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("toyhttpd")
            .build()
            .context("failed to start runtime")?;

        let addr = format!("{}:{}", self.config.host, port);
        let listener = runtime
            .block_on(TcpListener::bind(&addr))
            .with_context(|| format!("failed to bind {}", addr))?;
        let local_addr = listener.local_addr()?;

        let ctx = Arc::new(ConnectionContext {
            config: Arc::clone(&self.config),
            codec: Arc::clone(&self.codec),
            handler: Arc::clone(&self.handler),
        });
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let acceptor = runtime.spawn(listener::run(listener, ctx, shutdown_rx));

        self.runtime = Some(runtime);
        self.shutdown = Some(shutdown_tx);
        self.acceptor = Some(acceptor);
        self.local_addr = Some(local_addr);
        self.state = ServerState::Listening;

        Ok(local_addr)
    }

    /// Stop accepting connections. Returns once the listening socket is
    /// closed; connections already accepted keep running.
    pub fn close(&mut self) -> anyhow::Result<()> {
        match self.state {
            ServerState::Created => {
                tracing::warn!("close() called before listen(), ignoring");
                Ok(())
            }
            ServerState::Stopped => Ok(()),
            ServerState::Listening => {
                self.state = ServerState::Stopped;

                if let Some(shutdown) = self.shutdown.take() {
                    // The acceptor may already be gone after an accept error
                    let _ = shutdown.send(true);
                }
                if let (Some(runtime), Some(acceptor)) = (&self.runtime, self.acceptor.take()) {
                    runtime
                        .block_on(acceptor)
                        .context("accept loop terminated abnormally")?;
                }
                Ok(())
            }
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        if self.state == ServerState::Listening {
            if let Err(e) = self.close() {
                tracing::warn!(error = %e, "error while closing server");
            }
        }
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_timeout(self.config.shutdown_grace());
        }
    }
}
