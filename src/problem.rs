//! Error surface: the `/error` problem-details route and the `/exception`
//! diagnostic route that exercises the error-catching stage.

use serde::{Deserialize, Serialize};

use crate::fault::{CapturedFault, Fault};
use crate::request::Request;
use crate::response::{ContentType, Response};
use crate::status::Status;

const INTERNAL_ERROR_TYPE: &str = "https://tools.ietf.org/html/rfc9110#section-15.6.1";
const INTERNAL_ERROR_TITLE: &str = "An error occurred while processing your request.";

/// RFC 9457 problem details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl ProblemDetails {
    fn internal(captured: Option<&CapturedFault>) -> Self {
        Self {
            kind: INTERNAL_ERROR_TYPE.to_owned(),
            title: INTERNAL_ERROR_TITLE.to_owned(),
            status: Status::InternalServerError.code(),
            detail: captured.map(|c| c.message.clone()),
            instance: captured.map(|c| c.path.clone()),
        }
    }
}

/// Renders the failure captured for this request as
/// `application/problem+json`.
///
/// The pipeline runs this route only for failures that escaped every
/// stage. Requested directly there is nothing captured, so the body
/// carries no `detail`.
pub async fn error_page(req: Request) -> Result<Response, Fault> {
    let problem = ProblemDetails::internal(req.extensions().get::<CapturedFault>());
    Ok(Response::builder()
        .status(Status::InternalServerError)
        .bytes(ContentType::ProblemJson, serde_json::to_vec(&problem)?))
}

/// Always fails. Used to check that unhandled failures come back as a
/// JSON 500.
pub async fn exception(_req: Request) -> Result<Response, Fault> {
    Err(Fault::msg("This is a test exception."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Method;

    #[tokio::test]
    async fn renders_captured_failure() {
        let mut req = Request::new(Method::Get, "/error");
        req.extensions_mut().insert(CapturedFault {
            path: "/users".into(),
            message: "store exploded".into(),
        });

        let res = error_page(req).await.unwrap();
        assert_eq!(res.status_code(), 500);
        assert_eq!(res.header("content-type"), Some("application/problem+json"));

        let problem: ProblemDetails = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(problem.detail.as_deref(), Some("store exploded"));
        assert_eq!(problem.instance.as_deref(), Some("/users"));
        assert_eq!(problem.status, 500);
    }

    #[tokio::test]
    async fn direct_request_has_no_detail() {
        let res = error_page(Request::new(Method::Get, "/error")).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["title"], INTERNAL_ERROR_TITLE);
        assert!(body.get("detail").is_none());
    }

    #[tokio::test]
    async fn exception_always_fails() {
        let fault = exception(Request::new(Method::Get, "/exception")).await.unwrap_err();
        assert_eq!(fault.to_string(), "This is a test exception.");
    }
}
