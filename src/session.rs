//! Per-connection protocol state.
//!
//! A `Session` is created when a control connection is accepted, is mutated
//! only by the handler of the command currently being processed on that
//! connection, and is dropped with the connection.

use crate::core_fs::FileSystem;
use crate::core_ftpcommand::utils::{normalize_path, with_cwd};
use crate::core_network::data_channel::DataChannel;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferType {
    Ascii,
    Binary,
}

impl TransferType {
    pub fn label(&self) -> &'static str {
        match self {
            TransferType::Ascii => "ASCII",
            TransferType::Binary => "BINARY",
        }
    }
}

pub struct Session {
    /// Set once PASS is accepted; `None` means unauthenticated.
    pub username: Option<String>,
    /// Name from the last accepted USER, handed to the PASS check.
    pub pending_user: Option<String>,
    /// Client-visible working directory, always absolute and normalized.
    pub cwd: String,
    /// Host path that the virtual `/` maps to.
    pub root: PathBuf,
    pub fs: Arc<dyn FileSystem>,
    pub secure: bool,
    pub pbsz_received: bool,
    pub data: DataChannel,
    /// Virtual path recorded by RNFR.
    pub rename_from: Option<String>,
    pub auth_failures: u32,
    pub transfer_type: TransferType,
    /// QUIT was processed; nothing else is read from the client.
    pub has_quit: bool,
    /// The server decided to drop the connection (auth strikes, refused TLS).
    pub closing: bool,
}

impl Session {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            username: None,
            pending_user: None,
            cwd: String::from("/"),
            root: PathBuf::from("/"),
            fs,
            secure: false,
            pbsz_received: false,
            data: DataChannel::new(),
            rename_from: None,
            auth_failures: 0,
            transfer_type: TransferType::Ascii,
            has_quit: false,
            closing: false,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.username.is_some()
    }

    pub fn is_terminated(&self) -> bool {
        self.has_quit || self.closing
    }

    /// Resolves a client argument against the working directory.
    pub fn virtual_path(&self, arg: &str) -> String {
        normalize_path(&with_cwd(&self.cwd, arg))
    }

    /// Maps a normalized virtual path onto the host filesystem under `root`.
    pub fn fs_path(&self, virtual_path: &str) -> PathBuf {
        self.root.join(virtual_path.trim_start_matches('/'))
    }

    /// Shorthand for `fs_path(virtual_path(arg))`.
    pub fn resolve(&self, arg: &str) -> (String, PathBuf) {
        let virtual_path = self.virtual_path(arg);
        let fs_path = self.fs_path(&virtual_path);
        (virtual_path, fs_path)
    }
}
