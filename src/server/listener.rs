use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use crate::http::connection::{Connection, ConnectionContext};

/// Accept loop. Returns (dropping the listening socket) once `shutdown`
/// flips to `true`, or on the first unexpected accept error.
pub async fn run(
    listener: TcpListener,
    ctx: Arc<ConnectionContext>,
    mut shutdown: watch::Receiver<bool>,
) {
    let local = listener
        .local_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    info!("Listening on {}", local);

    loop {
        tokio::select! {
            biased;

            // Err means the controller is gone; stop either way
            _ = shutdown.changed() => break,

            accepted = listener.accept() => match accepted {
                Ok((socket, peer)) => {
                    info!("Accepted connection from {}", peer);

                    let ctx = Arc::clone(&ctx);
                    tokio::spawn(async move {
                        let mut conn = Connection::new(socket, peer, ctx);
                        if let Err(e) = conn.run().await {
                            tracing::warn!(peer = %peer, error = %e, "I/O error");
                        }
                    });
                }
                Err(e) => {
                    if *shutdown.borrow() {
                        break;
                    }
                    tracing::error!(addr = %local, error = %e, "accept failed, stopping listener");
                    break;
                }
            }
        }
    }

    info!("Shut down {}", local);
}
