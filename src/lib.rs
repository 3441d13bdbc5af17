//! # roster
//!
//! In-memory user records over HTTP, behind a small middleware pipeline.
//!
//! ## Layout
//!
//! The crate is a tiny HTTP framework plus the one service built on it.
//!
//! Framework:
//!
//! - [`Router`] — radix-tree routing via [`matchit`], one tree per method
//! - [`middleware`] — ordered stages around the router, each handed a
//!   [`Next`](middleware::Next) continuation
//! - [`Server`] — hyper 1 on tokio, graceful shutdown on SIGTERM / Ctrl-C
//!
//! Service:
//!
//! - [`users`] — the record store and `/users` CRUD handlers
//! - [`problem`] — `/error` problem details and the `/exception` diagnostic
//! - [`app::pipeline`] — `catch_errors → Authenticate → log_exchange → router`
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use roster::health::Readiness;
//! use roster::middleware::BearerToken;
//! use roster::users::UserStore;
//! use roster::{app, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(UserStore::seeded());
//!     let readiness = Readiness::new();
//!     let pipeline = app::pipeline(&store, &readiness, BearerToken::new("s3cret"));
//!
//!     let server = Server::bind(([0, 0, 0, 0], 3000).into()).await.unwrap();
//!     readiness.set(true);
//!     server.serve(pipeline).await.unwrap();
//! }
//! ```

mod error;
mod fault;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod status;

pub mod app;
pub mod config;
pub mod health;
pub mod logging;
pub mod middleware;
pub mod problem;
pub mod server;
pub mod users;

pub use config::Config;
pub use error::Error;
pub use fault::{CapturedFault, Fault, IntoOutcome, Outcome};
pub use handler::{BoxFuture, Handler};
pub use method::{Method, UnknownMethod};
pub use request::{PeerAddr, Request};
pub use response::{ContentType, IntoResponse, Json, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use status::Status;
