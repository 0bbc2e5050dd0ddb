//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::{BcryptHasher, CredentialHasher, TokenIssuer};

/// The state of the REST server.
///
/// Handlers do not take the whole state; each extracts the part it needs via
/// [FromRef].
#[derive(Debug, Clone)]
pub struct AppState<H = BcryptHasher>
where
    H: CredentialHasher,
{
    /// The database connection, shared by every request.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Issues and verifies bearer tokens.
    pub token_issuer: TokenIssuer,
    /// Hashes and verifies user passwords.
    pub password_hasher: H,
}

impl<H> AppState<H>
where
    H: CredentialHasher,
{
    /// Create a new [AppState].
    ///
    /// The caller should ensure the database has been initialized with
    /// [initialize_db](crate::initialize_db).
    pub fn new(db_connection: Connection, token_issuer: TokenIssuer, password_hasher: H) -> Self {
        Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            token_issuer,
            password_hasher,
        }
    }
}

// this impl lets the `Claims` extractor find the token keys in our state
impl<H> FromRef<AppState<H>> for TokenIssuer
where
    H: CredentialHasher,
{
    fn from_ref(state: &AppState<H>) -> Self {
        state.token_issuer.clone()
    }
}
