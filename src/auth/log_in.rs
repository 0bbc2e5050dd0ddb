//! The endpoint for logging in and receiving a bearer token.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{AppState, CredentialHasher, Error, JsonOrForm, TokenIssuer, get_user_by_email};

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LoginState<H>
where
    H: CredentialHasher,
{
    /// Checks the submitted password against the stored hash.
    pub password_hasher: H,
    /// Signs the token handed back on success.
    pub token_issuer: TokenIssuer,
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl<H> FromRef<AppState<H>> for LoginState<H>
where
    H: CredentialHasher,
{
    fn from_ref(state: &AppState<H>) -> Self {
        Self {
            password_hasher: state.password_hasher.clone(),
            token_issuer: state.token_issuer.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The body of a log-in request, sent as JSON or form data.
#[derive(Debug, Serialize, Deserialize)]
pub struct LogInData {
    /// Email entered during log-in. Required.
    pub email: Option<String>,
    /// Password entered during log-in. Required.
    pub password: Option<String>,
}

/// Handler for log-in requests via the POST method.
///
/// The user is looked up first and the password is only checked once a user is
/// found. On success the response carries a token for the user's ID and role.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The email does not belong to a registered user (404).
/// - The password is not correct (401).
/// - The email or password is missing, or the body is neither JSON nor form data (400).
/// - An internal error occurred when verifying the password or signing the token (500).
pub async fn log_in<H>(
    State(state): State<LoginState<H>>,
    JsonOrForm(user_data): JsonOrForm<LogInData>,
) -> Result<Json<Value>, Error>
where
    H: CredentialHasher,
{
    let email = user_data.email.ok_or(Error::MissingField("email"))?;
    let password = user_data.password.ok_or(Error::MissingField("password"))?;

    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        get_user_by_email(&email, &connection)?
    };

    let hasher = state.password_hasher.clone();
    let password_hash = user.password_hash.clone();
    let password_is_correct =
        tokio::task::spawn_blocking(move || hasher.verify(&password, &password_hash))
            .await
            .map_err(|error| Error::HashingError(error.to_string()))?
            .inspect_err(|error| tracing::error!("Error verifying password: {error}"))?;

    if !password_is_correct {
        return Err(Error::InvalidCredentials);
    }

    let token = state.token_issuer.issue(user.id, &user.role)?;

    tracing::info!("User {} logged in", user.id);

    Ok(Json(json!({
        "message": "Login successful",
        "token": token,
    })))
}
