//! Embeddable FTP server with explicit TLS (RFC 959, RFC 4217, RFC 2389).
//!
//! Authentication is delegated to an [`core_auth::Authenticator`] and file
//! access to a [`core_fs::FileSystem`]; [`server::FtpServer`] wires both to
//! the protocol core.

pub mod config;
pub mod constants;
pub mod core_auth;
pub mod core_cli;
pub mod core_fs;
pub mod core_ftpcommand;
pub mod core_log;
pub mod core_network;
pub mod core_tls;
pub mod error;
pub mod helpers;
pub mod server;
pub mod session;

pub use config::Config;
pub use error::FtpError;
pub use server::{FtpServer, ServerContext, ServerEvents, ServerOptions};
