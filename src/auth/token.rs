//! Signed, time-limited bearer tokens (JWTs) that identify a user and their role.

use std::fmt::Debug;

use axum::{
    RequestPartsExt,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{ConfigError, Error, UserID};

/// How long an issued token stays valid.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::hours(1);

/// The contents of a JSON Web Token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The ID of the user the token was issued to.
    pub id: UserID,
    /// The role of the user the token was issued to.
    pub role: String,
    /// The time the token was issued, as seconds since the Unix epoch.
    pub iat: i64,
    /// The expiry time of the token, as seconds since the Unix epoch.
    pub exp: i64,
}

/// The reasons a token can fail verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// The request did not carry an `Authorization: Bearer` header.
    #[error("missing bearer token")]
    Missing,

    /// The token's expiry time has passed.
    #[error("the token has expired")]
    Expired,

    /// The token was not signed with this server's secret.
    #[error("the token signature is invalid")]
    InvalidSignature,

    /// The token could not be decoded or is missing required claims.
    #[error("the token is malformed")]
    Malformed,
}

/// Issues and verifies HS256 signed tokens with a shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    /// Create a token issuer that signs with `secret` and issues tokens valid for `ttl`.
    ///
    /// # Errors
    ///
    /// Returns [ConfigError::EmptySecret] if `secret` is empty.
    pub fn new(secret: &str, ttl: Duration) -> Result<Self, ConfigError> {
        if secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        })
    }

    /// How long tokens from this issuer stay valid.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for the user `id` with `role` that expires one TTL from now.
    ///
    /// # Errors
    ///
    /// Returns [Error::TokenCreation] if the token could not be signed.
    pub fn issue(&self, id: UserID, role: &str) -> Result<String, Error> {
        self.issue_at(id, role, OffsetDateTime::now_utc())
    }

    pub(crate) fn issue_at(
        &self,
        id: UserID,
        role: &str,
        issued_at: OffsetDateTime,
    ) -> Result<String, Error> {
        let claims = Claims {
            id,
            role: role.to_owned(),
            iat: issued_at.unix_timestamp(),
            exp: (issued_at + self.ttl).unix_timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|error| Error::TokenCreation(error.to_string()))
    }

    /// Check the signature and expiry of `token` and return its claims.
    ///
    /// # Errors
    ///
    /// Returns a [TokenError] describing why the token was rejected.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(
            token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )
        .map(|token_data| token_data.claims)
        .map_err(|error| match error.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            _ => TokenError::Malformed,
        })
    }
}

impl Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl<S> FromRequestParts<S> for Claims
where
    TokenIssuer: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| Error::InvalidToken(TokenError::Missing))?;

        TokenIssuer::from_ref(state)
            .verify(bearer.token())
            .map_err(|error| {
                tracing::debug!("Rejected bearer token: {error}");
                Error::InvalidToken(error)
            })
    }
}
