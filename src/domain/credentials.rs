use secrecy::{ExposeSecret, Secret};

#[derive(Clone, Debug)]
pub struct Credentials {
    pub username: String,
    pub password: Secret<String>,
}

impl Credentials {
    /// JSON body sent to `/register` and `/login`.
    pub fn to_body(&self) -> serde_json::Value {
        serde_json::json!({
            "username": self.username,
            "password": self.password.expose_secret(),
        })
    }

    /// Same shape as [`Credentials::to_body`] with the password masked,
    /// for echoing in failure reports.
    pub fn redacted(&self) -> serde_json::Value {
        serde_json::json!({
            "username": self.username,
            "password": "[REDACTED]",
        })
    }
}
