use crate::core_auth::helper::{load_passwd_file, verify_password};
use crate::core_auth::{Authenticator, ClientInfo, PassVerdict, UserVerdict};
use anyhow::Result;
use async_trait::async_trait;
use log::{info, warn};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct PasswdEntry {
    username: String,
    hashed_password: String,
}

impl PasswdEntry {
    pub fn from_line(line: &str) -> Option<Self> {
        let (username, hashed_password) = line.split_once(':')?;
        if username.is_empty() || hashed_password.is_empty() || hashed_password.contains(':') {
            return None;
        }

        Some(PasswdEntry {
            username: username.to_string(),
            hashed_password: hashed_password.to_string(),
        })
    }

    pub fn get_hashed_password(&self) -> &str {
        &self.hashed_password
    }

    pub fn get_username(&self) -> &str {
        &self.username
    }
}

/// Policy backed by a bcrypt passwd file, used by the standalone daemon.
#[derive(Debug, Clone, Default)]
pub struct PasswdAuthenticator {
    entries: HashMap<String, PasswdEntry>,
}

impl PasswdAuthenticator {
    pub fn new(entries: HashMap<String, PasswdEntry>) -> Self {
        Self { entries }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let entries = load_passwd_file(path)?;
        info!("Loaded {} account(s) from {}", entries.len(), path.display());
        Ok(Self::new(entries))
    }
}

#[async_trait]
impl Authenticator for PasswdAuthenticator {
    async fn check_user(&self, client: &ClientInfo, username: &str) -> UserVerdict {
        if self.entries.contains_key(username) {
            UserVerdict::Accept
        } else {
            warn!("{}: unknown user {:?}", client.peer, username);
            UserVerdict::Reject
        }
    }

    async fn check_pass(
        &self,
        client: &ClientInfo,
        username: Option<&str>,
        password: &str,
    ) -> PassVerdict {
        let Some(entry) = username.and_then(|name| self.entries.get(name)) else {
            return PassVerdict::Reject;
        };

        // bcrypt is CPU bound; keep it off the reactor threads.
        let hashed = entry.get_hashed_password().to_string();
        let password = password.to_string();
        let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hashed))
            .await
            .unwrap_or(false);

        if valid {
            info!("{}: user {} logged in", client.peer, entry.get_username());
            PassVerdict::accept(entry.get_username())
        } else {
            warn!("{}: bad password for {}", client.peer, entry.get_username());
            PassVerdict::Reject
        }
    }
}
