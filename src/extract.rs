//! An extractor for request bodies sent either as JSON or as an HTML form.

use axum::{
    Form, Json,
    extract::{FromRequest, Request},
    http::{HeaderMap, header::CONTENT_TYPE},
};
use serde::de::DeserializeOwned;

use crate::Error;

/// A request body deserialized from JSON or from `application/x-www-form-urlencoded` data.
///
/// The `Content-Type` header picks the format. Anything that is not a form is
/// parsed as JSON, so a missing or unsupported content type is rejected the way
/// [Json] rejects it.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonOrForm<T>(pub T);

impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = Error;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_form(request.headers()) {
            let Form(value) = Form::<T>::from_request(request, state).await?;
            Ok(Self(value))
        } else {
            let Json(value) = Json::<T>::from_request(request, state).await?;
            Ok(Self(value))
        }
    }
}

pub(crate) fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"))
}

#[cfg(test)]
mod json_or_form_tests {
    use axum::{Json, Router, routing::post};
    use axum_test::TestServer;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    use super::JsonOrForm;

    #[derive(Debug, Serialize, Deserialize)]
    struct Greeting {
        name: Option<String>,
    }

    async fn echo(JsonOrForm(greeting): JsonOrForm<Greeting>) -> Json<Greeting> {
        Json(greeting)
    }

    fn get_test_server() -> TestServer {
        let app = Router::new().route("/echo", post(echo));

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn accepts_json() {
        let server = get_test_server();

        let response = server.post("/echo").json(&json!({ "name": "A" })).await;

        response.assert_status_ok();
        response.assert_json(&json!({ "name": "A" }));
    }

    #[tokio::test]
    async fn accepts_form() {
        let server = get_test_server();

        let response = server.post("/echo").form(&[("name", "A")]).await;

        response.assert_status_ok();
        response.assert_json(&json!({ "name": "A" }));
    }

    #[tokio::test]
    async fn missing_form_field_is_none() {
        let server = get_test_server();

        let response = server.post("/echo").form(&[("other", "B")]).await;

        response.assert_status_ok();
        response.assert_json(&json!({ "name": null }));
    }

    #[tokio::test]
    async fn rejects_plain_text_with_json_error() {
        let server = get_test_server();

        let response = server.post("/echo").text("name=A").await;

        response.assert_status_bad_request();
        let body: serde_json::Value = response.json();
        assert!(body["error"].is_string(), "want an error message, got {body}");
    }
}
