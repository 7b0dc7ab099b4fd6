//! Authentication port.
//!
//! USER and PASS never decide anything themselves: they ask the embedding
//! application's [`Authenticator`] and act on its verdict.

pub mod core_auth;
pub mod helper;

pub use core_auth::PasswdAuthenticator;

use crate::core_fs::FileSystem;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;

/// What the policy knows about the client asking to log in.
#[derive(Debug, Clone, Copy)]
pub struct ClientInfo {
    pub peer: SocketAddr,
    pub secure: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserVerdict {
    Accept,
    Reject,
}

pub enum PassVerdict {
    /// Log the client in as `username`, optionally with a dedicated filesystem.
    Accept {
        username: String,
        fs: Option<Arc<dyn FileSystem>>,
    },
    Reject,
}

impl PassVerdict {
    pub fn accept(username: impl Into<String>) -> Self {
        PassVerdict::Accept {
            username: username.into(),
            fs: None,
        }
    }
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn check_user(&self, client: &ClientInfo, username: &str) -> UserVerdict;

    /// `username` is the name from the last accepted USER, if any.
    async fn check_pass(
        &self,
        client: &ClientInfo,
        username: Option<&str>,
        password: &str,
    ) -> PassVerdict;
}
