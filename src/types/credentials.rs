// ABOUTME: Container registry credentials loaded from the environment.
// ABOUTME: Passwords are registered for console redaction as soon as they exist.

use crate::error::{Error, Result};
use crate::output;
use std::fmt;

pub const USERNAME_VAR: &str = "CONTAINMINT_USERNAME";
pub const PASSWORD_VAR: &str = "CONTAINMINT_PASSWORD";

/// Username and password for a container registry.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryCredentials {
    username: String,
    password: String,
}

impl RegistryCredentials {
    /// Create credentials, registering the password as a sensitive value.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        let password = password.into();
        output::register_sensitive(&password);

        Self {
            username: username.into(),
            password,
        }
    }

    /// Load credentials from `CONTAINMINT_USERNAME` and `CONTAINMINT_PASSWORD`.
    ///
    /// Fails with the name of the first variable that is not set.
    pub fn from_env() -> Result<Self> {
        let username = require_var(USERNAME_VAR)?;
        let password = require_var(PASSWORD_VAR)?;

        Ok(Self::new(username, password))
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn require_var(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| Error::MissingEnvVar(name.to_string()))
}
