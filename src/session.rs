//! Per-user connection state.
//!
//! Credentials are held in memory only. The access token is wrapped in
//! [`SecretToken`], whose `Debug` output is masked, and every message that
//! leaves a session goes through [`Session::redact`].

use crate::error::{Error, MissingCredentialsSnafu, NotConnectedSnafu, Result, ValidationSnafu};
use crate::storage::{Connector, StorageClient};
use crate::wrap_err;
use snafu::{OptionExt, ensure};
use std::fmt;

const SIGNATURE_MARKER: &str = "sig=";

/// Access token that never prints itself.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretToken(String);

impl SecretToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// First and last four characters, or nothing at all for short tokens.
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 12 {
            return "****".to_string();
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}****{tail}")
    }
}

impl fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretToken({})", self.masked())
    }
}

/// Replace the value of every `sig=` query parameter with `***`.
pub fn redact_signatures(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find(SIGNATURE_MARKER) {
        let (head, tail) = rest.split_at(idx + SIGNATURE_MARKER.len());
        out.push_str(head);
        out.push_str("***");
        let end = tail
            .find(|c: char| c == '&' || c == '"' || c == '\'' || c.is_whitespace())
            .unwrap_or(tail.len());
        rest = &tail[end..];
    }
    out.push_str(rest);
    out
}

fn is_valid_container_name(name: &str) -> bool {
    let len_ok = (3..=63).contains(&name.len());
    let chars_ok = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    let edges_ok = !name.starts_with('-') && !name.ends_with('-');
    len_ok && chars_ok && edges_ok && !name.contains("--")
}

fn is_valid_account_name(name: &str) -> bool {
    (3..=24).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

/// What the user typed into the connect form.
#[derive(Debug, Clone)]
pub struct Credentials {
    account: String,
    container: String,
    token: SecretToken,
}

impl Credentials {
    /// Validate and normalize connection inputs.
    ///
    /// `account` is either a storage account name or the account URL
    /// (`https://<name>.blob.core.windows.net`). A leading `?` on the token,
    /// as copied from a SAS URL, is dropped.
    pub fn new(account: &str, container: &str, token: &str) -> Result<Self> {
        let account = account.trim().trim_end_matches('/');
        let container = container.trim();
        let token = token.trim().trim_start_matches('?');

        ensure!(
            !account.is_empty(),
            ValidationSnafu {
                message: "account name is required".to_string()
            }
        );
        ensure!(
            !container.is_empty(),
            ValidationSnafu {
                message: "container name is required".to_string()
            }
        );
        ensure!(
            !token.is_empty(),
            ValidationSnafu {
                message: "access token is required".to_string()
            }
        );

        let credentials = Self {
            account: account.to_string(),
            container: container.to_string(),
            token: SecretToken::new(token),
        };

        match credentials.account_endpoint() {
            Some((name, _)) => ensure!(
                !name.is_empty(),
                ValidationSnafu {
                    message: format!("'{account}' is not a valid account URL")
                }
            ),
            None => ensure!(
                is_valid_account_name(account),
                ValidationSnafu {
                    message: format!(
                        "'{account}' is not a valid account name (3-24 lowercase letters or digits)"
                    )
                }
            ),
        }
        ensure!(
            is_valid_container_name(container),
            ValidationSnafu {
                message: format!(
                    "'{container}' is not a valid container name (3-63 lowercase letters, digits or single hyphens)"
                )
            }
        );

        Ok(credentials)
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn token(&self) -> &SecretToken {
        &self.token
    }

    /// Account name and endpoint when the account was given as a URL.
    pub fn account_endpoint(&self) -> Option<(String, String)> {
        let rest = self
            .account
            .strip_prefix("https://")
            .or_else(|| self.account.strip_prefix("http://"))?;
        let host = rest.split('/').next().unwrap_or_default();
        let name = host.split('.').next().unwrap_or_default();
        Some((name.to_string(), self.account.clone()))
    }

    /// Scrub the token and any SAS signature out of a message.
    pub fn redact(&self, text: &str) -> String {
        let token = self.token.expose();
        let scrubbed = if token.is_empty() {
            text.to_string()
        } else {
            text.replace(token, &self.token.masked())
        };
        redact_signatures(&scrubbed)
    }
}

/// `Disconnected → Connecting → Connected → Disconnected`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Default)]
pub struct Session {
    state: SessionState,
    credentials: Option<Credentials>,
    client: Option<StorageClient>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Gateway for the connected container.
    pub fn client(&self) -> Result<&StorageClient> {
        self.client.as_ref().context(NotConnectedSnafu)
    }

    /// Open a gateway for `credentials` and verify it with one listing call.
    ///
    /// On any failure the session falls back to `Disconnected` with every
    /// credential field cleared, and the returned error is already scrubbed
    /// of the token.
    pub async fn connect(
        &mut self,
        connector: &dyn Connector,
        credentials: Credentials,
    ) -> Result<()> {
        self.disconnect();
        self.state = SessionState::Connecting;
        log::info!(
            "connecting account={} container={} token={}",
            credentials.account(),
            credentials.container(),
            credentials.token().masked()
        );

        let attempt = match connector.open(&credentials) {
            Ok(client) => client.verify().await.map(|()| client),
            Err(e) => Err(e),
        };

        match attempt {
            Ok(client) => {
                log::info!("connected container={}", credentials.container());
                self.client = Some(client);
                self.credentials = Some(credentials);
                self.state = SessionState::Connected;
                Ok(())
            }
            Err(e) => {
                self.disconnect();
                let scrubbed = Error::Scrubbed {
                    kind: e.kind(),
                    message: credentials.redact(&e.to_string()),
                };
                log::warn!("connect failed: {scrubbed}");
                wrap_err!(
                    Err::<(), Error>(scrubbed),
                    ConnectFailed {
                        container: credentials.container().to_string()
                    }
                )
            }
        }
    }

    /// Connect again with the credentials this session already holds.
    pub async fn reconnect(&mut self, connector: &dyn Connector) -> Result<()> {
        let credentials = self.credentials.clone().context(MissingCredentialsSnafu)?;
        self.connect(connector, credentials).await
    }

    /// Forget the gateway and every credential field. Idempotent.
    pub fn disconnect(&mut self) {
        if let Some(credentials) = self.credentials.take() {
            log::info!("disconnected container={}", credentials.container());
        }
        self.client = None;
        self.state = SessionState::Disconnected;
    }

    /// Scrub secrets known to this session out of a message.
    pub fn redact(&self, text: &str) -> String {
        match &self.credentials {
            Some(credentials) => credentials.redact(text),
            None => redact_signatures(text),
        }
    }
}
