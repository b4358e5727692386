use std::sync::Arc;

use crate::http::request::Request;
use crate::http::response::{Response, StatusCode};

/// Application callback invoked once per request.
///
/// Runs on a blocking thread, so it may do synchronous I/O. Returning an
/// error (or panicking) makes the server answer `500 Internal Server Error`.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, request: &Request, response: &mut Response) -> anyhow::Result<()>;
}

impl<F> Handler for F
where
    F: Fn(&Request, &mut Response) -> anyhow::Result<()> + Send + Sync + 'static,
{
    fn handle(&self, request: &Request, response: &mut Response) -> anyhow::Result<()> {
        self(request, response)
    }
}

/// Run the handler for `request` and return the sealed response.
///
/// Never fails: handler errors and panics are logged and turned into a
/// 500. A response the handler left open is sealed as-is.
pub async fn dispatch(handler: Arc<dyn Handler>, request: Request) -> Response {
    let method = request.method().to_string();
    let target = request.target().to_string();

    let outcome = tokio::task::spawn_blocking(move || {
        let mut response = Response::new();
        let result = handler.handle(&request, &mut response);
        (response, result)
    })
    .await;

    match outcome {
        Ok((mut response, Ok(()))) => {
            if !response.is_ended() {
                tracing::debug!(%method, %target, "handler returned without end(), sealing response");
            }
            response.seal();
            response
        }
        Ok((_, Err(e))) => {
            tracing::error!(%method, %target, error = %e, "handler failed");
            internal_error()
        }
        Err(e) => {
            tracing::error!(%method, %target, error = %e, "handler panicked");
            internal_error()
        }
    }
}

fn internal_error() -> Response {
    Response::error(StatusCode::InternalServerError, "500 Internal Server Error\n")
}
