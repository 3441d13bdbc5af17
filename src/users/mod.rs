//! `/users` CRUD endpoints.
//!
//! Handlers are thin: parse the id and body, call the [`UserStore`], map
//! the result to a status. Validation and missing records are answered
//! here; anything unexpected is returned as a [`Fault`] for the
//! error-catching stage.

mod store;

pub use store::{NewUser, StoreError, User, UserStore, UserUpdate};

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::fault::Fault;
use crate::method::Method;
use crate::request::Request;
use crate::response::{IntoResponse, Json, Response};
use crate::router::Router;
use crate::status::Status;

/// Registers the five user routes on `router`, each holding a handle to
/// `store`.
pub fn routes(router: Router, store: &Arc<UserStore>) -> Router {
    router
        .on(Method::Get,    "/users",      with_store(Arc::clone(store), list))
        .on(Method::Get,    "/users/{id}", with_store(Arc::clone(store), get))
        .on(Method::Post,   "/users",      with_store(Arc::clone(store), create))
        .on(Method::Put,    "/users/{id}", with_store(Arc::clone(store), update))
        .on(Method::Delete, "/users/{id}", with_store(Arc::clone(store), delete))
}

/// Adapts `f(store, req)` into a plain `Fn(Request)` handler.
fn with_store<F, Fut>(store: Arc<UserStore>, f: F) -> impl Fn(Request) -> Fut + Send + Sync + 'static
where
    F: Fn(Arc<UserStore>, Request) -> Fut + Send + Sync + 'static,
{
    move |req| f(Arc::clone(&store), req)
}

// GET /users
async fn list(store: Arc<UserStore>, _req: Request) -> Json<Vec<User>> {
    Json(store.list())
}

// GET /users/{id}
async fn get(store: Arc<UserStore>, req: Request) -> Response {
    let id = match user_id(&req) {
        Ok(id) => id,
        Err(res) => return res,
    };
    match store.get(id) {
        Some(user) => Json(user).into_response(),
        None => Response::status(Status::NotFound),
    }
}

// POST /users → 201 + Location
async fn create(store: Arc<UserStore>, req: Request) -> Result<Response, Fault> {
    let new: NewUser = match json_body(&req) {
        Ok(body) => body,
        Err(res) => return Ok(res),
    };
    let user = match store.create(new) {
        Ok(user) => user,
        Err(e) => return Ok(e.into_response()),
    };

    let location = format!("/users/{}", user.id);
    Ok(Response::builder()
        .status(Status::Created)
        .header("location", &location)
        .json(serde_json::to_vec(&user)?))
}

// PUT /users/{id}
async fn update(store: Arc<UserStore>, req: Request) -> Response {
    let id = match user_id(&req) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let body: UserUpdate = match json_body(&req) {
        Ok(body) => body,
        Err(res) => return res,
    };
    match store.update(id, body) {
        Ok(user) => Json(user).into_response(),
        Err(e) => e.into_response(),
    }
}

// DELETE /users/{id} → 204
async fn delete(store: Arc<UserStore>, req: Request) -> Response {
    let id = match user_id(&req) {
        Ok(id) => id,
        Err(res) => return res,
    };
    match store.delete(id) {
        Ok(()) => Response::status(Status::NoContent),
        Err(e) => e.into_response(),
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        match self {
            StoreError::Validation(msg) => Response::error(Status::BadRequest, msg),
            StoreError::NotFound(_) => Response::status(Status::NotFound),
        }
    }
}

fn user_id(req: &Request) -> Result<u64, Response> {
    let raw = req.param("id").unwrap_or_default();
    raw.parse().map_err(|_| {
        Response::error(Status::BadRequest, format!("Invalid user id `{raw}`."))
    })
}

fn json_body<T: DeserializeOwned>(req: &Request) -> Result<T, Response> {
    serde_json::from_slice(req.body()).map_err(|e| {
        Response::error(Status::BadRequest, format!("Invalid request body: {e}."))
    })
}
