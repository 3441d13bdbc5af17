//! End-to-end behaviour of the assembled pipeline, driven in-process.

use std::sync::Arc;

use roster::health::Readiness;
use roster::middleware::BearerToken;
use roster::problem::ProblemDetails;
use roster::users::{User, UserStore};
use roster::{app, Method, Request, Response};

const TOKEN: &str = "test-token";

struct TestApp {
    store: Arc<UserStore>,
    pipeline: roster::middleware::Pipeline,
}

impl TestApp {
    fn new() -> Self {
        let store = Arc::new(UserStore::seeded());
        let readiness = Readiness::new();
        readiness.set(true);
        let pipeline = app::pipeline(&store, &readiness, BearerToken::new(TOKEN));
        Self { store, pipeline }
    }

    async fn send(&self, req: Request) -> Response {
        self.pipeline.handle(req).await
    }

    async fn authed(&self, method: Method, path: &str, body: Option<&str>) -> Response {
        let mut req = Request::new(method, path).with_header("authorization", &format!("Bearer {TOKEN}"));
        if let Some(body) = body {
            req = req.with_body(body.to_owned());
        }
        self.send(req).await
    }
}

fn json(res: &Response) -> serde_json::Value {
    serde_json::from_slice(res.body()).expect("response body is JSON")
}

#[tokio::test]
async fn create_assigns_next_id_and_location() {
    let app = TestApp::new();
    let res = app.authed(Method::Post, "/users", Some(r#"{"name":"A","email":"a@x.com"}"#)).await;

    assert_eq!(res.status_code(), 201);
    assert_eq!(res.header("location"), Some("/users/3"));
    assert_eq!(json(&res), serde_json::json!({"id": 3, "name": "A", "email": "a@x.com"}));
}

#[tokio::test]
async fn invalid_update_leaves_record_unchanged() {
    let app = TestApp::new();
    let before = app.store.get(1);

    let res = app.authed(Method::Put, "/users/1", Some(r#"{"id":1,"name":"","email":"a@x.com"}"#)).await;

    assert_eq!(res.status_code(), 400);
    assert_eq!(json(&res)["error"], "Name and email are required.");
    assert_eq!(app.store.get(1), before);
}

#[tokio::test]
async fn id_mismatch_is_400_whether_or_not_the_record_exists() {
    let app = TestApp::new();
    for path in ["/users/1", "/users/404"] {
        let res = app.authed(Method::Put, path, Some(r#"{"id":2,"name":"A","email":"a@x.com"}"#)).await;
        assert_eq!(res.status_code(), 400, "{path}");
    }
    assert_eq!(app.store.get(2).unwrap().name, "Bob");
}

#[tokio::test]
async fn exception_route_is_caught_as_json_500() {
    let app = TestApp::new();
    let res = app.authed(Method::Get, "/exception", None).await;

    assert_eq!(res.status_code(), 500);
    assert_eq!(res.header("content-type"), Some("application/json"));
    assert_eq!(res.body(), br#"{"error":"Internal server error: This is a test exception.."}"#);
}

#[tokio::test]
async fn deleting_a_missing_user_is_idempotent() {
    let app = TestApp::new();
    for _ in 0..2 {
        let res = app.authed(Method::Delete, "/users/99", None).await;
        assert_eq!(res.status_code(), 404);
    }
    assert_eq!(app.store.len(), 2);
}

#[tokio::test]
async fn delete_then_get_is_404() {
    let app = TestApp::new();
    assert_eq!(app.authed(Method::Delete, "/users/1", None).await.status_code(), 204);
    assert_eq!(app.authed(Method::Get, "/users/1", None).await.status_code(), 404);
}

#[tokio::test]
async fn missing_token_is_401_and_store_untouched() {
    let app = TestApp::new();
    let requests = [
        Request::new(Method::Get, "/users"),
        Request::new(Method::Post, "/users").with_body(r#"{"name":"A","email":"a@x.com"}"#),
        Request::new(Method::Delete, "/users/1"),
        Request::new(Method::Get, "/exception"),
        Request::new(Method::Get, "/error"),
    ];
    for req in requests {
        let res = app.send(req).await;
        assert_eq!(res.status_code(), 401);
        assert_eq!(json(&res)["error"], "Authorization token is missing.");
    }
    assert_eq!(app.store.list().len(), 2);
    assert!(app.store.get(1).is_some());
}

#[tokio::test]
async fn wrong_token_is_403_and_store_untouched() {
    let app = TestApp::new();
    let req = Request::new(Method::Delete, "/users/1").with_header("authorization", "Bearer nope");
    let res = app.send(req).await;

    assert_eq!(res.status_code(), 403);
    assert_eq!(json(&res)["error"], "Invalid or expired token.");
    assert!(app.store.get(1).is_some());
}

#[tokio::test]
async fn undecodable_token_is_403_not_401() {
    let app = TestApp::new();
    let req = Request::new(Method::Get, "/users").with_header("authorization", "Bearer é");
    let res = app.send(req).await;

    assert_eq!(res.status_code(), 403);
    assert_eq!(json(&res)["error"], "Invalid or expired token.");
}

#[tokio::test]
async fn health_probes_need_no_token() {
    let app = TestApp::new();
    assert_eq!(app.send(Request::new(Method::Get, "/healthz")).await.status_code(), 200);
    assert_eq!(app.send(Request::new(Method::Get, "/readyz")).await.status_code(), 200);
}

#[tokio::test]
async fn error_route_answers_problem_details_directly() {
    let app = TestApp::new();
    let res = app.authed(Method::Post, "/error", None).await;

    assert_eq!(res.status_code(), 500);
    assert_eq!(res.header("content-type"), Some("application/problem+json"));
    let problem: ProblemDetails = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(problem.status, 500);
    assert_eq!(problem.detail, None);
}

#[tokio::test]
async fn unknown_route_and_wrong_method() {
    let app = TestApp::new();
    assert_eq!(app.authed(Method::Get, "/nothing", None).await.status_code(), 404);

    let res = app.authed(Method::Patch, "/users/1", None).await;
    assert_eq!(res.status_code(), 405);
    assert_eq!(res.header("allow"), Some("DELETE, GET, PUT"));
}

#[tokio::test]
async fn concurrent_creates_get_unique_increasing_ids() {
    let app = Arc::new(TestApp::new());
    let tasks: Vec<_> = (0..32)
        .map(|i| {
            let app = Arc::clone(&app);
            tokio::spawn(async move {
                let body = format!(r#"{{"name":"user{i}","email":"u{i}@x.com"}}"#);
                let res = app.authed(Method::Post, "/users", Some(&body)).await;
                assert_eq!(res.status_code(), 201);
                serde_json::from_slice::<User>(res.body()).unwrap().id
            })
        })
        .collect();

    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap());
    }
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 32);
    assert!(ids.iter().all(|&id| id > 2));
    assert_eq!(app.store.len(), 34);
}
