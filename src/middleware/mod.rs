//! Middleware pipeline.
//!
//! A [`Pipeline`] is an ordered list of stages in front of a [`Router`].
//! Each stage receives the request and a [`Next`] continuation standing for
//! "the rest of the stages, then the router". A stage may inspect or
//! rewrite the request, answer it itself without calling `next`, or call
//! `next.run(req)` and look at what comes back.
//!
//! ```text
//!            ┌──────────────┐ ┌──────┐ ┌─────────┐ ┌────────┐
//! request ──▶│ catch_errors │▶│ auth │▶│ logging │▶│ router │──▶ handler
//!            └──────────────┘ └──────┘ └─────────┘ └────────┘
//! response ◀─────── same stages, innermost first ◀──────────────
//! ```
//!
//! Stages are plain async functions or [`Middleware`] implementors:
//!
//! ```rust
//! use roster::middleware::{Next, Pipeline};
//! use roster::{Outcome, Request, Response, Router, Status};
//!
//! async fn require_json(req: Request, next: Next) -> Outcome {
//!     if !req.body().is_empty() && req.header("content-type") != Some("application/json") {
//!         return Ok(Response::error(Status::BadRequest, "Expected a JSON body."));
//!     }
//!     next.run(req).await
//! }
//!
//! let pipeline = Pipeline::new(Router::new()).stage(require_json);
//! ```

mod auth;
mod catch;
mod log;

pub use auth::{Authenticate, BearerToken, TokenVerifier};
pub use catch::catch_errors;
pub use log::log_exchange;

use std::future::Future;
use std::sync::Arc;

use tracing::error;

use crate::fault::{guarded, CapturedFault, Fault, Outcome};
use crate::handler::BoxFuture;
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::status::Status;

// ── Middleware ────────────────────────────────────────────────────────────────

/// One stage of the pipeline.
///
/// Implemented for every `Fn(Request, Next) -> impl Future<Output = Outcome>`,
/// so an `async fn` is a stage. Implement it by hand when the stage carries
/// configuration (see [`Authenticate`]).
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, req: Request, next: Next) -> BoxFuture<Outcome>;
}

impl<F, Fut> Middleware for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Outcome> + Send + 'static,
{
    fn handle(&self, req: Request, next: Next) -> BoxFuture<Outcome> {
        Box::pin(self(req, next))
    }
}

type Stages = Arc<Vec<Arc<dyn Middleware>>>;

// ── Next ──────────────────────────────────────────────────────────────────────

/// The remainder of the pipeline, from the stage after the current one
/// through to the router.
///
/// Consumed by [`Next::run`], so a stage can delegate at most once.
pub struct Next {
    stages: Stages,
    router: Arc<Router>,
    index: usize,
}

impl Next {
    pub async fn run(self, req: Request) -> Outcome {
        let stage = self.stages.get(self.index).cloned();
        match stage {
            Some(stage) => {
                let next = Next { index: self.index + 1, ..self };
                stage.handle(req, next).await
            }
            None => self.router.dispatch(req).await,
        }
    }
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

/// Stages plus router, assembled once at startup and shared by every
/// connection.
///
/// # Failures that escape
///
/// A [`catch_errors`] stage is the authority for failures raised inside the
/// pipeline: it answers them with the JSON 500 envelope and nothing reaches
/// the pipeline boundary. Only when a failure gets past every stage (no
/// catching stage installed, or it sits after the stage that failed) does
/// the pipeline fall back to its [error route](Pipeline::error_route): the
/// failed attempt is discarded and the route is run directly on the router
/// with a [`CapturedFault`] extension. Either way the client gets exactly
/// one response.
pub struct Pipeline {
    stages: Stages,
    router: Arc<Router>,
    error_route: Option<String>,
}

impl Pipeline {
    pub fn new(router: Router) -> Self {
        Self { stages: Arc::new(Vec::new()), router: Arc::new(router), error_route: None }
    }

    /// Appends a stage. The first stage added is the outermost.
    pub fn stage(mut self, stage: impl Middleware) -> Self {
        Arc::make_mut(&mut self.stages).push(Arc::new(stage));
        self
    }

    /// Route re-executed (as `GET`) for failures that escape every stage.
    pub fn error_route(mut self, path: impl Into<String>) -> Self {
        self.error_route = Some(path.into());
        self
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Runs `req` through every stage and the router. Never fails: an
    /// escaped failure is rendered by the error route, or as a bare 500.
    pub async fn handle(&self, req: Request) -> Response {
        let method = req.method();
        let path = req.path().to_owned();
        let next = Next { stages: Arc::clone(&self.stages), router: Arc::clone(&self.router), index: 0 };

        let fault = match guarded(next.run(req)).await {
            Ok(res) => return res,
            Err(fault) => fault,
        };
        error!(%method, %path, "failure escaped the pipeline: {fault:#}");
        self.render_escaped(path, fault).await
    }

    async fn render_escaped(&self, path: String, fault: Fault) -> Response {
        let Some(route) = &self.error_route else {
            return Response::status(Status::InternalServerError);
        };

        let mut req = Request::new(Method::Get, route.clone());
        req.extensions_mut().insert(CapturedFault { path, message: fault.message() });

        match guarded(self.router.dispatch(req)).await {
            Ok(res) => res,
            Err(e) => {
                error!(route = %route, "error route failed: {e:#}");
                Response::status(Status::InternalServerError)
            }
        }
    }
}
