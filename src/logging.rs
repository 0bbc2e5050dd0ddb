//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{
        HeaderMap,
        header::{CONTENT_LENGTH, CONTENT_TYPE},
        request, response,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::{Error, extract::is_form};

/// The number of bytes of a body to log at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// The largest request body the server will buffer, in bytes.
pub const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

const REDACTED: &str = "********";

/// Request fields whose values must never reach the logs.
const REQUEST_SECRETS: &[&str] = &["password"];

/// Response fields whose values must never reach the logs.
const RESPONSE_SECRETS: &[&str] = &["token"];

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
/// Passwords in JSON or form request bodies and tokens in JSON response bodies
/// are masked before logging; the bodies passed on are left untouched.
///
/// Requests with bodies over [MAX_REQUEST_BODY_BYTES] are rejected with 413.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body_bytes) = match split_request(request).await {
        Ok(split) => split,
        Err(error) => return error.into_response(),
    };
    log_request(
        &parts,
        &redact(&parts.headers, &body_bytes, REQUEST_SECRETS),
    );

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body_bytes) = match split_response(response).await {
        Ok(split) => split,
        Err(error) => return error.into_response(),
    };
    log_response(
        &parts,
        &redact(&parts.headers, &body_bytes, RESPONSE_SECRETS),
    );

    Response::from_parts(parts, Body::from(body_bytes))
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

/// Return `body` as text with the values of `fields` masked.
fn redact(headers: &HeaderMap, body: &[u8], fields: &[&str]) -> String {
    if is_json(headers) {
        redact_json(body, fields)
    } else if is_form(headers) {
        redact_form(body, fields)
    } else {
        String::from_utf8_lossy(body).into_owned()
    }
}

/// Mask the top-level `fields` of a JSON object.
fn redact_json(body: &[u8], fields: &[&str]) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(mut object)) => {
            for field in fields {
                if let Some(value) = object.get_mut(*field) {
                    *value = Value::String(REDACTED.to_owned());
                }
            }

            Value::Object(object).to_string()
        }
        Ok(_) => String::from_utf8_lossy(body).into_owned(),
        Err(_) => redact_unparsed(body, fields),
    }
}

/// Mask the `fields` of `application/x-www-form-urlencoded` data.
fn redact_form(body: &[u8], fields: &[&str]) -> String {
    let Ok(pairs) = serde_urlencoded::from_bytes::<Vec<(String, String)>>(body) else {
        return redact_unparsed(body, fields);
    };

    let pairs: Vec<(String, String)> = pairs
        .into_iter()
        .map(|(key, value)| {
            if fields.contains(&key.as_str()) {
                (key, REDACTED.to_owned())
            } else {
                (key, value)
            }
        })
        .collect();

    serde_urlencoded::to_string(&pairs).unwrap_or_else(|_| REDACTED.to_owned())
}

/// A body that failed to parse is only logged if it cannot hold a secret field.
fn redact_unparsed(body: &[u8], fields: &[&str]) -> String {
    let text = String::from_utf8_lossy(body);

    if fields.iter().any(|field| text.contains(field)) {
        REDACTED.to_owned()
    } else {
        text.into_owned()
    }
}

async fn split_request(request: Request) -> Result<(request::Parts, Bytes), Error> {
    let (parts, body) = request.into_parts();

    let declared_length = parts
        .headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<usize>().ok());
    if declared_length.is_some_and(|length| length > MAX_REQUEST_BODY_BYTES) {
        return Err(Error::PayloadTooLarge);
    }

    // Bodies without a trustworthy length fail here once they pass the limit.
    let body_bytes = axum::body::to_bytes(body, MAX_REQUEST_BODY_BYTES)
        .await
        .map_err(|error| {
            tracing::debug!("Could not buffer request body: {error}");
            Error::PayloadTooLarge
        })?;

    Ok((parts, body_bytes))
}

async fn split_response(response: Response) -> Result<(response::Parts, Bytes), Error> {
    let (parts, body) = response.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|error| Error::ResponseBodyError(error.to_string()))?;

    Ok((parts, body_bytes))
}

/// Cut `text` to at most `limit` bytes without splitting a character.
fn truncate(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }

    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    &text[..end]
}

fn log_request(parts: &request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {} {}\nbody: {}...",
            parts.method,
            parts.uri,
            truncate(body, LOG_BODY_LENGTH_LIMIT)
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!(
            "Received request: {} {}\nbody: {body:?}",
            parts.method,
            parts.uri
        );
    }
}

fn log_response(parts: &response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {}\nbody: {}...",
            parts.status,
            truncate(body, LOG_BODY_LENGTH_LIMIT)
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {}\nbody: {body:?}", parts.status);
    }
}
