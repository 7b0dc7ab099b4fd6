//! Filesystem access used by every file command.
//!
//! The connection never touches the host filesystem directly: it goes through
//! a [`FileSystem`] object, which an authenticator may swap per user.

pub mod glob;
pub mod local;

pub use glob::{glob, DirEntry};
pub use local::LocalFileSystem;

use async_trait::async_trait;
use std::io;
use std::path::Path;
use std::time::SystemTime;
use tokio::io::{AsyncRead, AsyncWrite, AsyncReadExt};

pub type FileReader = Box<dyn AsyncRead + Send + Unpin>;
pub type FileWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Stat metadata consumed by listings and SIZE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    pub size: u64,
    /// Unix permission bits (`0o777` mask is all that listings read)
    pub mode: u32,
    pub modified: SystemTime,
    pub is_dir: bool,
    pub uid: u32,
    pub gid: u32,
}

/// The operation set a storage backend must provide.
#[async_trait]
pub trait FileSystem: Send + Sync {
    async fn stat(&self, path: &Path) -> io::Result<FileStat>;

    /// Names of the entries of a directory, without `.` and `..`.
    async fn read_dir(&self, path: &Path) -> io::Result<Vec<String>>;

    async fn open_read(&self, path: &Path) -> io::Result<FileReader>;

    /// Creates or truncates `path` and opens it for writing with `mode` permissions.
    async fn create_write(&self, path: &Path, mode: u32) -> io::Result<FileWriter>;

    async fn unlink(&self, path: &Path) -> io::Result<()>;

    async fn mkdir(&self, path: &Path, mode: u32) -> io::Result<()>;

    async fn rmdir(&self, path: &Path) -> io::Result<()>;

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        let mut reader = self.open_read(path).await?;
        let mut contents = Vec::new();
        reader.read_to_end(&mut contents).await?;
        Ok(contents)
    }

    async fn exists(&self, path: &Path) -> bool {
        self.stat(path).await.is_ok()
    }
}

/// Resolves owner and group ids to display names for detailed listings.
#[async_trait]
pub trait IdentityLookup: Send + Sync {
    async fn user_name(&self, uid: u32) -> io::Result<String>;

    async fn group_name(&self, gid: u32) -> io::Result<String>;
}

/// Reports every owner and group as `ftp`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnonymousIdentity;

#[async_trait]
impl IdentityLookup for AnonymousIdentity {
    async fn user_name(&self, _uid: u32) -> io::Result<String> {
        Ok("ftp".to_string())
    }

    async fn group_name(&self, _gid: u32) -> io::Result<String> {
        Ok("ftp".to_string())
    }
}
