//! Request/response logging stage.

use std::time::Instant;

use tracing::{error, info, warn};

use crate::fault::{Fault, Outcome};
use crate::method::Method;
use crate::request::{PeerAddr, Request};
use crate::response::Response;

use super::Next;

/// Logs the request line and body, runs the rest of the pipeline, then
/// logs the status and body of whatever came back.
///
/// The closing log line is owned by an [`Exchange`] guard, so it is written
/// on every exit path: a response, a fault propagating upward, a panic
/// unwinding through this stage, or the future being dropped when the
/// client goes away.
pub async fn log_exchange(req: Request, next: Next) -> Outcome {
    let method = req.method();
    let path = req.path().to_owned();

    let peer = req.extensions().get::<PeerAddr>().map(|p| p.0);
    info!(%method, %path, ?peer, "request started");
    if !req.body().is_empty() {
        info!(%method, %path, body = %String::from_utf8_lossy(req.body()), "request body");
    }

    let mut exchange = Exchange::new(method, path);
    let outcome = next.run(req).await;
    match &outcome {
        Ok(res) => exchange.responded(res),
        Err(fault) => exchange.failed(fault),
    }
    outcome
}

/// Closes out one logged exchange exactly once.
struct Exchange {
    method: Method,
    path: String,
    started: Instant,
    closed: bool,
}

impl Exchange {
    fn new(method: Method, path: String) -> Self {
        Self { method, path, started: Instant::now(), closed: false }
    }

    fn responded(&mut self, res: &Response) {
        self.closed = true;
        let status = res.status_code();
        let latency_ms = self.started.elapsed().as_millis() as u64;
        let body = String::from_utf8_lossy(res.body());
        let (method, path) = (self.method, self.path.as_str());

        match status {
            500..=599 => error!(%method, %path, status, latency_ms, body = %body, "request completed"),
            400..=499 => warn!(%method, %path, status, latency_ms, body = %body, "request completed"),
            _ => info!(%method, %path, status, latency_ms, body = %body, "request completed"),
        }
    }

    fn failed(&mut self, fault: &Fault) {
        self.closed = true;
        let latency_ms = self.started.elapsed().as_millis() as u64;
        error!(method = %self.method, path = %self.path, latency_ms, "request failed: {fault}");
    }
}

impl Drop for Exchange {
    fn drop(&mut self) {
        if !self.closed {
            let latency_ms = self.started.elapsed().as_millis() as u64;
            warn!(method = %self.method, path = %self.path, latency_ms, "request aborted before a response");
        }
    }
}
