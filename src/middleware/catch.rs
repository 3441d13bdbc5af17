//! Error-catching stage.

use tracing::error;

use crate::fault::{guarded, Outcome};
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

use super::Next;

/// Turns any failure from the rest of the pipeline into a JSON 500.
///
/// Both `Err(Fault)` and panics are caught. Whatever the inner stages had
/// built is dropped; the client sees only
/// `{"error": "Internal server error: <message>."}`. Register it first so
/// it also covers authentication and logging.
pub async fn catch_errors(req: Request, next: Next) -> Outcome {
    let method = req.method();
    let path = req.path().to_owned();

    match guarded(next.run(req)).await {
        Ok(res) => Ok(res),
        Err(fault) => {
            error!(%method, %path, "unhandled failure: {fault:#}");
            Ok(Response::error(
                Status::InternalServerError,
                format!("Internal server error: {fault}."),
            ))
        }
    }
}
