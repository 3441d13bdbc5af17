//! Unhandled failures and the [`Outcome`] every stage and handler yields.
//!
//! Expected conditions (validation, missing records, bad credentials) are
//! ordinary [`Response`]s. A [`Fault`] is everything else: a failure nobody
//! on the way down knew how to answer. It travels up the pipeline until
//! the error-catching stage turns it into a 500.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use serde::Serialize;

use crate::response::{IntoResponse, Json, Response};
use crate::status::Status;

/// What a stage or handler produces.
pub type Outcome = Result<Response, Fault>;

/// An unhandled failure.
///
/// Anything convertible into [`anyhow::Error`] converts into a `Fault`, so
/// handlers can use `?` on I/O, serde, or their own error types.
pub struct Fault(anyhow::Error);

impl Fault {
    pub fn msg(message: impl fmt::Display + fmt::Debug + Send + Sync + 'static) -> Self {
        Self(anyhow::Error::msg(message))
    }

    /// Builds a fault from a caught panic payload.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_owned()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "handler panicked".to_owned()
        };
        Self::msg(message)
    }

    /// The message shown to clients. Causes are not included.
    pub fn message(&self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl<E> From<E> for Fault
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// The failure that escaped the pipeline, attached to the re-executed
/// error-route request so its handler can describe it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFault {
    /// Path of the request that failed.
    pub path: String,
    pub message: String,
}

/// Runs `fut` inside a failure boundary: an `Err` and a panic both come
/// back as a [`Fault`].
pub(crate) async fn guarded<F>(fut: F) -> Outcome
where
    F: Future<Output = Outcome>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(panic) => Err(Fault::from_panic(panic)),
    }
}

// ── IntoOutcome ───────────────────────────────────────────────────────────────

/// Conversion of a handler's return value into an [`Outcome`].
///
/// Every [`IntoResponse`] type below succeeds; `Result<R, E>` fails with
/// `E` as a [`Fault`].
pub trait IntoOutcome {
    fn into_outcome(self) -> Outcome;
}

impl IntoOutcome for Response {
    fn into_outcome(self) -> Outcome { Ok(self) }
}

impl IntoOutcome for Status {
    fn into_outcome(self) -> Outcome { Ok(self.into_response()) }
}

impl IntoOutcome for String {
    fn into_outcome(self) -> Outcome { Ok(self.into_response()) }
}

impl IntoOutcome for &'static str {
    fn into_outcome(self) -> Outcome { Ok(self.into_response()) }
}

impl<T: Serialize> IntoOutcome for Json<T> {
    fn into_outcome(self) -> Outcome { Ok(self.into_response()) }
}

impl<R, E> IntoOutcome for Result<R, E>
where
    R: IntoResponse,
    E: Into<Fault>,
{
    fn into_outcome(self) -> Outcome {
        self.map(IntoResponse::into_response).map_err(Into::into)
    }
}
