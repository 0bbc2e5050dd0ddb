//! The endpoint for registering a new user.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{AppState, CredentialHasher, Error, JsonOrForm, NewUser, create_user};

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState<H>
where
    H: CredentialHasher,
{
    /// Hashes the password before it is stored.
    pub password_hasher: H,
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl<H> FromRef<AppState<H>> for RegistrationState<H>
where
    H: CredentialHasher,
{
    fn from_ref(state: &AppState<H>) -> Self {
        Self {
            password_hasher: state.password_hasher.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The body of a registration request, sent as JSON or form data.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterData {
    /// The name to display for the user.
    pub name: Option<String>,
    /// The email to register. Required.
    pub email: Option<String>,
    /// The plaintext password. Required.
    pub password: Option<String>,
}

/// Handler for registering a user via the POST method.
///
/// The password is hashed on the blocking thread pool before the user is
/// inserted, so the hashing cost is paid even when the email turns out to be
/// taken. The email format is not checked.
///
/// # Errors
///
/// - [Error::DuplicateEmail] (400) if the email is already registered.
/// - [Error::MissingField] (400) if the email or password is missing.
/// - [Error::InvalidRequestBody] (400) if the body is neither a JSON object nor form data.
/// - [Error::HashingError] or [Error::SqlError] (500) for internal failures.
pub async fn register_user<H>(
    State(state): State<RegistrationState<H>>,
    JsonOrForm(user_data): JsonOrForm<RegisterData>,
) -> Result<(StatusCode, Json<Value>), Error>
where
    H: CredentialHasher,
{
    let email = user_data.email.ok_or(Error::MissingField("email"))?;
    let password = user_data.password.ok_or(Error::MissingField("password"))?;

    let hasher = state.password_hasher.clone();
    let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|error| Error::HashingError(error.to_string()))?
        .inspect_err(|error| {
            tracing::error!("an error occurred while hashing a password: {error}");
        })?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let user = create_user(
        NewUser {
            name: user_data.name,
            email,
            password_hash,
            role: None,
        },
        &connection,
    )
    .inspect_err(|error| {
        if *error == Error::DuplicateEmail {
            tracing::debug!("Rejected registration for an email already on file");
        }
    })?;

    tracing::info!("Registered user {}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully" })),
    ))
}
