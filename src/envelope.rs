//! Response envelope.
//!
//! Every response leaves the server as `{"version": "...", "data": ...}`. The
//! interceptor captures whatever the inner handler produced (status, headers,
//! body), parses the body as JSON and replays it wrapped, keeping the original
//! status code.

use axum::{
    Json,
    body::{Body, Bytes, to_bytes},
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

/// Upper bound on a captured handler body.
pub const MAX_CAPTURED_BODY_BYTES: usize = 16 * 1024 * 1024;

const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("failed to read handler body: {0}")]
    Capture(String),
    #[error("handler body is not valid JSON: {0}")]
    InvalidBody(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub version: String,
    pub data: Value,
}

impl Envelope {
    /// Wrap a raw handler body. An empty (or whitespace-only) body becomes `null`.
    pub fn wrap(version: &str, body: &[u8]) -> Result<Self, EnvelopeError> {
        let data = if body.iter().all(u8::is_ascii_whitespace) {
            Value::Null
        } else {
            serde_json::from_slice(body)?
        };

        Ok(Self {
            version: version.to_string(),
            data,
        })
    }

    /// Inverse of [`Envelope::wrap`] as seen by a client: the payload of a
    /// serialized envelope.
    #[cfg(test)]
    pub fn unwrap(bytes: &[u8]) -> Result<Value, EnvelopeError> {
        let envelope: Envelope = serde_json::from_slice(bytes)?;
        Ok(envelope.data)
    }
}

/// What the inner handler produced, held back from the client.
#[derive(Debug)]
pub struct CapturedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl CapturedResponse {
    pub async fn capture(response: Response) -> Result<Self, EnvelopeError> {
        let (parts, body) = response.into_parts();
        let body = to_bytes(body, MAX_CAPTURED_BODY_BYTES)
            .await
            .map_err(|e| EnvelopeError::Capture(e.to_string()))?;

        Ok(Self {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }

    /// Emit `body` with the captured status and headers. Content headers are
    /// replaced to describe the new body.
    pub fn replay(self, body: Vec<u8>) -> Response {
        let mut headers = self.headers;
        headers.remove(header::CONTENT_LENGTH);
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(JSON_CONTENT_TYPE),
        );

        let body = if status_allows_body(self.status) {
            Body::from(body)
        } else {
            headers.remove(header::CONTENT_TYPE);
            Body::empty()
        };

        let mut response = Response::new(body);
        *response.status_mut() = self.status;
        *response.headers_mut() = headers;
        response
    }
}

fn status_allows_body(status: StatusCode) -> bool {
    !(status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED)
}

/// Envelope settings shared by every request.
#[derive(Debug, Clone)]
pub struct EnvelopeConfig {
    pub version: String,
}

/// Middleware wrapping every handler response in an [`Envelope`].
pub async fn intercept(
    State(config): State<EnvelopeConfig>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let response = next.run(req).await;

    let captured = match CapturedResponse::capture(response).await {
        Ok(captured) => captured,
        Err(e) => {
            tracing::error!("[Envelope] {} {}: {}", method, path, e);
            return internal_error(&config.version);
        }
    };

    let envelope = match Envelope::wrap(&config.version, &captured.body) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::error!(
                "[Envelope] {} {} returned {} with unparseable body: {}",
                method,
                path,
                captured.status,
                e
            );
            return internal_error(&config.version);
        }
    };

    match serde_json::to_vec(&envelope) {
        Ok(body) => captured.replay(body),
        Err(e) => {
            tracing::error!(
                "[Envelope] {} {}: failed to serialize envelope: {}",
                method,
                path,
                e
            );
            internal_error(&config.version)
        }
    }
}

fn internal_error(version: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "version": version,
            "data": { "message": "internal server error" },
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, middleware, routing::get};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/ok", get(|| async { Json(json!({ "hello": "world" })) }))
            .route(
                "/missing",
                get(|| async {
                    (
                        StatusCode::NOT_FOUND,
                        Json(json!({ "message": "user not found" })),
                    )
                }),
            )
            .route("/empty", get(|| async { StatusCode::OK }))
            .route("/created", get(|| async { (StatusCode::CREATED, Json(json!([1, 2, 3]))) }))
            .route("/text", get(|| async { "plain text" }))
            .route("/nocontent", get(|| async { StatusCode::NO_CONTENT }))
            .route(
                "/header",
                get(|| async { ([("x-request-tag", "abc")], Json(json!("tagged"))) }),
            )
            .layer(middleware::from_fn_with_state(
                EnvelopeConfig {
                    version: "1.0.0".to_string(),
                },
                intercept,
            ))
    }

    async fn call(uri: &str) -> (StatusCode, HeaderMap, Bytes) {
        let response = app()
            .oneshot(
                axum::http::Request::builder()
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, body)
    }

    #[test]
    fn wrap_then_unwrap_returns_payload() {
        let values = [
            json!({ "token": "abc" }),
            json!([1, "two", null]),
            json!("text"),
            json!(42),
            json!(true),
            Value::Null,
        ];

        for value in values {
            let raw = serde_json::to_vec(&value).unwrap();
            let wrapped = serde_json::to_vec(&Envelope::wrap("1.0.0", &raw).unwrap()).unwrap();
            assert_eq!(Envelope::unwrap(&wrapped).unwrap(), value);
        }
    }

    #[test]
    fn empty_body_is_null() {
        assert_eq!(Envelope::wrap("1.0.0", b"").unwrap().data, Value::Null);
        assert_eq!(Envelope::wrap("1.0.0", b"  \n").unwrap().data, Value::Null);
    }

    #[test]
    fn invalid_body_is_rejected() {
        assert!(matches!(
            Envelope::wrap("1.0.0", b"{not json"),
            Err(EnvelopeError::InvalidBody(_))
        ));
    }

    #[tokio::test]
    async fn success_is_wrapped() {
        let (status, headers, body) = call("/ok").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), JSON_CONTENT_TYPE);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({ "version": "1.0.0", "data": { "hello": "world" } }));
    }

    #[tokio::test]
    async fn error_status_is_preserved() {
        let (status, _, body) = call("/missing").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            body,
            json!({ "version": "1.0.0", "data": { "message": "user not found" } })
        );
    }

    #[tokio::test]
    async fn non_200_success_status_is_preserved() {
        let (status, _, body) = call("/created").await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(Envelope::unwrap(&body).unwrap(), json!([1, 2, 3]));
    }

    #[tokio::test]
    async fn empty_body_becomes_null_data() {
        let (status, headers, body) = call("/empty").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), JSON_CONTENT_TYPE);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({ "version": "1.0.0", "data": null }));
    }

    #[tokio::test]
    async fn unparseable_body_is_internal_error() {
        let (status, _, body) = call("/text").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["version"], "1.0.0");
        assert_eq!(body["data"]["message"], "internal server error");
    }

    #[tokio::test]
    async fn no_content_stays_bodiless() {
        let (status, headers, body) = call("/nocontent").await;

        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());
        assert!(headers.get(header::CONTENT_TYPE).is_none());
    }

    #[tokio::test]
    async fn handler_headers_survive() {
        let (status, headers, body) = call("/header").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers.get("x-request-tag").unwrap(), "abc");
        assert_eq!(Envelope::unwrap(&body).unwrap(), json!("tagged"));
    }

    #[tokio::test]
    async fn unknown_route_is_wrapped_404() {
        let (status, _, body) = call("/nope").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(Envelope::unwrap(&body).unwrap(), Value::Null);
    }
}
