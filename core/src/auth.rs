//! Credentials and how they decorate an outgoing request.
//!
//! # Design
//! A `Credential` is a plain value chosen by the caller and passed to each
//! operation. Applying it only rewrites the `HttpRequest` descriptor:
//! tokens ride on the query string for every method, username/password
//! pairs become a Basic `Authorization` header.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::http::HttpRequest;

/// Query parameter carrying an access token.
pub const TOKEN_PARAM: &str = "token";

/// Authentication attached to a single API call.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Anonymous access; the request is sent unchanged.
    None,
    /// An access token, sent as `?token=<token>`.
    Token(String),
    /// HTTP Basic authentication.
    UsernamePassword { username: String, password: String },
}

impl Credential {
    pub fn token(token: impl Into<String>) -> Self {
        Credential::Token(token.into())
    }

    pub fn username_password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credential::UsernamePassword {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Return `request` carrying this credential.
    pub fn apply(&self, mut request: HttpRequest) -> HttpRequest {
        match self {
            Credential::None => {}
            Credential::Token(token) => {
                request.query.push((TOKEN_PARAM.to_string(), token.clone()));
            }
            Credential::UsernamePassword { username, password } => {
                let encoded = STANDARD.encode(format!("{username}:{password}"));
                request
                    .headers
                    .push(("Authorization".to_string(), format!("Basic {encoded}")));
            }
        }
        request
    }
}

// Secrets stay out of logs and panic messages.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::None => f.write_str("None"),
            Credential::Token(_) => f.write_str("Token(<redacted>)"),
            Credential::UsernamePassword { username, .. } => f
                .debug_struct("UsernamePassword")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}
