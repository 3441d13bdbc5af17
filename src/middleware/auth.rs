//! Authentication stage.

use std::sync::Arc;

use http::header::AUTHORIZATION;
use tracing::warn;

use crate::fault::Outcome;
use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

use super::{Middleware, Next};

/// Decides whether an `Authorization` header value is acceptable.
///
/// Closures work too: `Authenticate::new(|v: &str| v == "Bearer t")`.
pub trait TokenVerifier: Send + Sync + 'static {
    fn verify(&self, authorization: &str) -> bool;
}

impl<F> TokenVerifier for F
where
    F: Fn(&str) -> bool + Send + Sync + 'static,
{
    fn verify(&self, authorization: &str) -> bool {
        self(authorization)
    }
}

/// Accepts exactly `Bearer <secret>`.
pub struct BearerToken {
    expected: String,
}

impl BearerToken {
    pub fn new(secret: impl AsRef<str>) -> Self {
        Self { expected: format!("Bearer {}", secret.as_ref()) }
    }
}

impl TokenVerifier for BearerToken {
    fn verify(&self, authorization: &str) -> bool {
        authorization == self.expected
    }
}

/// Rejects requests without an acceptable `Authorization` header.
///
/// - header missing → `401 {"error": "Authorization token is missing."}`
/// - header present but rejected → `403 {"error": "Invalid or expired token."}`.
///   A value that is not visible ASCII never reaches the verifier and is
///   rejected the same way.
///
/// In both cases the rest of the pipeline never runs. Paths registered with
/// [`exempt`](Authenticate::exempt) skip the check.
pub struct Authenticate {
    verifier: Arc<dyn TokenVerifier>,
    exempt: Vec<String>,
}

impl Authenticate {
    pub fn new(verifier: impl TokenVerifier) -> Self {
        Self { verifier: Arc::new(verifier), exempt: Vec::new() }
    }

    pub fn exempt(mut self, path: impl Into<String>) -> Self {
        self.exempt.push(path.into());
        self
    }

    fn check(&self, req: &Request) -> Option<Response> {
        if self.exempt.iter().any(|p| p == req.path()) {
            return None;
        }
        let Some(value) = req.headers().get(AUTHORIZATION) else {
            warn!(method = %req.method(), path = %req.path(), "missing authorization header");
            return Some(Response::error(Status::Unauthorized, "Authorization token is missing."));
        };
        let accepted = value.to_str().is_ok_and(|v| self.verifier.verify(v));
        if accepted {
            return None;
        }
        warn!(method = %req.method(), path = %req.path(), "rejected authorization header");
        Some(Response::error(Status::Forbidden, "Invalid or expired token."))
    }
}

impl Middleware for Authenticate {
    fn handle(&self, req: Request, next: Next) -> BoxFuture<Outcome> {
        let rejection = self.check(&req);
        Box::pin(async move {
            match rejection {
                Some(res) => Ok(res),
                None => next.run(req).await,
            }
        })
    }
}
