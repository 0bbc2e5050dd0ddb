//! Loads the server's secrets and database location from the environment.

use std::env::{self, VarError};

/// Errors that stop the server from starting.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable was not set, or was set to an empty string.
    #[error("the environment variable '{0}' must be set")]
    MissingVar(&'static str),

    /// An environment variable was set but is not valid unicode.
    #[error("the environment variable '{0}' is not valid unicode")]
    InvalidVar(&'static str),

    /// The token signing secret was empty.
    #[error("the token signing secret must not be empty")]
    EmptySecret,
}

/// Settings read from the environment at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Where the SQLite database lives, e.g. "catalog.db" or ":memory:".
    pub database_url: String,
    /// The secret used to sign bearer tokens.
    pub jwt_secret: String,
}

impl ServerConfig {
    /// The environment variable holding the database location.
    pub const DATABASE_URL_KEY: &'static str = "DATABASE_URL";
    /// The environment variable holding the token signing secret.
    pub const JWT_SECRET_KEY: &'static str = "JWT_SECRET";

    /// Read the config from the process environment, loading a `.env` file first if one exists.
    ///
    /// # Errors
    ///
    /// Returns a [ConfigError] if a variable is missing, empty or not unicode.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(error) = dotenv::dotenv() {
            tracing::debug!("No .env file loaded: {error}");
        }

        Self::from_lookup(|key| env::var(key))
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Result<String, VarError>,
    {
        let get_required = |key: &'static str| match lookup(key) {
            Ok(value) if !value.is_empty() => Ok(value),
            Ok(_) | Err(VarError::NotPresent) => Err(ConfigError::MissingVar(key)),
            Err(VarError::NotUnicode(_)) => Err(ConfigError::InvalidVar(key)),
        };

        Ok(Self {
            database_url: get_required(Self::DATABASE_URL_KEY)?,
            jwt_secret: get_required(Self::JWT_SECRET_KEY)?,
        })
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("database_url", &self.database_url)
            .field("jwt_secret", &"********")
            .finish()
    }
}
