//! Registration, log-in and the credential primitives they are built on.

mod log_in;
mod password;
mod register;
mod token;

pub use log_in::{LogInData, LoginState, log_in};
pub use password::{BcryptHasher, CredentialHasher, PasswordHash};
pub use register::{RegisterData, RegistrationState, register_user};
pub use token::{Claims, DEFAULT_TOKEN_TTL, TokenError, TokenIssuer};
