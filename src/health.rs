//! Health-check routes.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? Failure → restart. |
//! | **Readiness** | `/readyz` | Can it serve traffic? Failure → pulled from the load balancer. |
//!
//! Probes carry no credentials, so the app exempts both paths from
//! authentication.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::method::Method;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::status::Status;

pub const LIVENESS_PATH: &str = "/healthz";
pub const READINESS_PATH: &str = "/readyz";

/// Shared readiness flag. Starts not ready; flip it once the listener is
/// bound, and back off when draining.
#[derive(Clone, Debug, Default)]
pub struct Readiness(Arc<AtomicBool>);

impl Readiness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, ready: bool) {
        self.0.store(ready, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Registers `/healthz` and `/readyz`.
pub fn routes(router: Router, readiness: &Readiness) -> Router {
    let readiness = readiness.clone();
    router
        .on(Method::Get, LIVENESS_PATH, liveness)
        .on(Method::Get, READINESS_PATH, move |_req: Request| {
            let ready = readiness.is_ready();
            async move { readiness_response(ready) }
        })
}

/// Always `200 ok`: answering at all means the process is alive.
pub async fn liveness(_req: Request) -> Response {
    Response::text("ok")
}

fn readiness_response(ready: bool) -> Response {
    if ready {
        Response::text("ready")
    } else {
        Response::builder().status(Status::ServiceUnavailable).text("not ready")
    }
}
