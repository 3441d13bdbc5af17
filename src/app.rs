//! Assembles the service: routes, stages, and their order.

use std::sync::Arc;

use crate::health::{self, Readiness, LIVENESS_PATH, READINESS_PATH};
use crate::method::Method;
use crate::middleware::{catch_errors, log_exchange, Authenticate, Pipeline, TokenVerifier};
use crate::problem;
use crate::router::Router;
use crate::users::{self, UserStore};

/// Problem-details route for failures that escape the pipeline.
pub const ERROR_PATH: &str = "/error";

/// Diagnostic route that always fails.
pub const EXCEPTION_PATH: &str = "/exception";

/// Builds the full pipeline:
///
/// ```text
/// catch_errors → Authenticate → log_exchange → router
/// ```
///
/// The catching stage is outermost so authentication and logging failures
/// are caught too. `/error` stays reachable directly (behind auth) and is
/// the fallback for anything that escapes all three stages.
pub fn pipeline(store: &Arc<UserStore>, readiness: &Readiness, verifier: impl TokenVerifier) -> Pipeline {
    let router = users::routes(Router::new(), store)
        .on(Method::Get, EXCEPTION_PATH, problem::exception);
    let router = [Method::Get, Method::Post, Method::Put, Method::Patch, Method::Delete]
        .into_iter()
        .fold(router, |router, method| router.on(method, ERROR_PATH, problem::error_page));
    let router = health::routes(router, readiness);

    let auth = Authenticate::new(verifier)
        .exempt(LIVENESS_PATH)
        .exempt(READINESS_PATH);

    Pipeline::new(router)
        .stage(catch_errors)
        .stage(auth)
        .stage(log_exchange)
        .error_route(ERROR_PATH)
}
