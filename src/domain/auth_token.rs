use secrecy::{ExposeSecret, Secret};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum AuthTokenError {
    #[error("The access token is empty.")]
    Empty,
}

/// Bearer token handed out by `/login`. Opaque, never printed.
#[derive(Clone, Debug)]
pub struct AuthToken(Secret<String>);

impl AuthToken {
    pub fn parse(s: String) -> Result<AuthToken, AuthTokenError> {
        if s.trim().is_empty() {
            Err(AuthTokenError::Empty)
        } else {
            Ok(Self(Secret::new(s)))
        }
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

/// Body of a successful `/login` response.
#[derive(serde::Deserialize, Debug)]
pub struct LoginResponse {
    pub access_token: Option<String>,
}

impl LoginResponse {
    pub fn into_token(self) -> Option<AuthToken> {
        self.access_token.and_then(|t| AuthToken::parse(t).ok())
    }
}
