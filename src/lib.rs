//! A small web backend for user registration, log-in and a course catalog.
//!
//! Users register with an email and password, log in to receive a signed bearer
//! token, and browse or add courses. All endpoints speak JSON and state is kept
//! in a SQLite database.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    extract::rejection::{FormRejection, JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod auth;
mod config;
mod course;
mod db;
mod endpoints;
mod extract;
mod logging;
mod routing;
mod user;

pub use app_state::AppState;
pub use auth::{
    BcryptHasher, Claims, CredentialHasher, DEFAULT_TOKEN_TTL, PasswordHash, TokenError,
    TokenIssuer,
};
pub use config::{ConfigError, ServerConfig};
pub use course::{Course, CourseID, NewCourse, create_course, get_all_courses};
pub use db::initialize as initialize_db;
pub use extract::JsonOrForm;
pub use logging::{LOG_BODY_LENGTH_LIMIT, MAX_REQUEST_BODY_BYTES, logging_middleware};
pub use routing::build_router;
pub use user::{DEFAULT_ROLE, NewUser, User, UserID, count_users, create_user, get_user_by_email};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur while handling a request.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The email used to register a user is already on file.
    #[error("the email is already in use")]
    DuplicateEmail,

    /// No user is registered with the given email.
    #[error("no user found with the given email")]
    UserNotFound,

    /// The password did not match the stored password hash.
    #[error("invalid password")]
    InvalidCredentials,

    /// A course was submitted without a link to its content.
    #[error("a course requires a link")]
    MissingCourseLink,

    /// A required field was missing from the request body.
    #[error("missing required field \"{0}\"")]
    MissingField(&'static str),

    /// The request body could not be parsed as the expected JSON or form data.
    #[error("invalid request body: {0}")]
    InvalidRequestBody(String),

    /// The request body was larger than [MAX_REQUEST_BODY_BYTES].
    #[error("the request body is too large")]
    PayloadTooLarge,

    /// The bearer token was missing, malformed, expired or had a bad signature.
    #[error("invalid token: {0}")]
    InvalidToken(TokenError),

    /// The courses could not be read from the database.
    #[error("could not fetch courses")]
    FetchCoursesFailed,

    /// A course could not be written to the database.
    #[error("could not add course")]
    AddCourseFailed,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A token could not be signed.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// A response body could not be buffered for logging.
    #[error("could not read the response body: {0}")]
    ResponseBodyError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::UserNotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidRequestBody(rejection.body_text())
    }
}

impl From<FormRejection> for Error {
    fn from(rejection: FormRejection) -> Self {
        Error::InvalidRequestBody(rejection.body_text())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Error::DuplicateEmail => (StatusCode::BAD_REQUEST, "Email already exists".to_owned()),
            Error::UserNotFound => (StatusCode::NOT_FOUND, "User not found".to_owned()),
            Error::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid password".to_owned()),
            Error::MissingCourseLink => (
                StatusCode::BAD_REQUEST,
                "A course link is required".to_owned(),
            ),
            Error::MissingField(field) => (
                StatusCode::BAD_REQUEST,
                format!("Missing required field \"{field}\""),
            ),
            Error::InvalidRequestBody(reason) => (StatusCode::BAD_REQUEST, reason),
            Error::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "Request body too large".to_owned(),
            ),
            Error::InvalidToken(_) => (StatusCode::UNAUTHORIZED, "Invalid token".to_owned()),
            Error::FetchCoursesFailed => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error fetching courses".to_owned(),
            ),
            Error::AddCourseFailed => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error adding course".to_owned(),
            ),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_owned(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
