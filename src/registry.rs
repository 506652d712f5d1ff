// ABOUTME: Scoped container registry login and logout.
// ABOUTME: Logs in on open and logs out on every exit path when credentials are supplied.

use crate::engine::{ContainerEngine, Invocation};
use crate::error::Result;
use crate::output;
use crate::types::RegistryCredentials;

/// An open registry session.
///
/// Without credentials the session is a no-op.
pub struct RegistrySession<'a> {
    engine: &'a ContainerEngine,
    server: String,
    logged_in: bool,
}

impl<'a> RegistrySession<'a> {
    /// Log in to `server` when credentials are supplied.
    ///
    /// The password is piped on stdin so it never appears in the process list.
    pub async fn open(
        engine: &'a ContainerEngine,
        server: &str,
        credentials: Option<&RegistryCredentials>,
    ) -> Result<Self> {
        if let Some(credentials) = credentials {
            tracing::debug!(server, username = credentials.username(), "registry login");
            engine
                .invoke(
                    Invocation::new([
                        "login",
                        "--username",
                        credentials.username(),
                        "--password-stdin",
                        server,
                    ])
                    .data(credentials.password())
                    .capture(),
                )
                .await?;
        }

        Ok(Self {
            engine,
            server: server.to_string(),
            logged_in: credentials.is_some(),
        })
    }

    /// Log out if a login happened.
    pub async fn close(self) -> Result<()> {
        if self.logged_in {
            tracing::debug!(server = %self.server, "registry logout");
            self.engine
                .invoke(Invocation::new(["logout", self.server.as_str()]).capture())
                .await?;
        }
        Ok(())
    }

    /// Close the session after `result` was produced inside it.
    ///
    /// An error from the body wins over a logout failure, which is only reported.
    pub async fn finish<T>(self, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                self.close().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(logout) = self.close().await {
                    output::warning(&format!("Registry logout failed: {logout}"));
                }
                Err(err)
            }
        }
    }
}
