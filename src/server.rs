use crate::config::Config;
use crate::constants::{DEFAULT_DATA_TIMEOUT_SECS, DEFAULT_GREETING, DEFAULT_MAX_STATS_AT_ONCE};
use crate::core_auth::Authenticator;
use crate::core_fs::{AnonymousIdentity, FileSystem, IdentityLookup, LocalFileSystem};
use crate::core_network::network;
use crate::core_tls::TlsConnection;
use anyhow::{Context, Result};
use log::{error, info};
use std::cmp::Ordering;
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, ToSocketAddrs};

pub type CwdProvider = Arc<dyn Fn(&str) -> String + Send + Sync>;
pub type RootProvider = Arc<dyn Fn(&str) -> PathBuf + Send + Sync>;
pub type SortKeyMapper = Arc<dyn Fn(&str) -> String + Send + Sync>;
pub type SortComparator = Arc<dyn Fn(&str, &str) -> Ordering + Send + Sync>;

/// Key applied to file names before listings are sorted.
#[derive(Clone, Default)]
pub enum FilenameSortMap {
    /// Case-insensitive ordering.
    #[default]
    Uppercase,
    /// Names are compared as-is.
    Disabled,
    Custom(SortKeyMapper),
}

impl FilenameSortMap {
    pub fn key(&self, name: &str) -> String {
        match self {
            FilenameSortMap::Uppercase => name.to_uppercase(),
            FilenameSortMap::Disabled => name.to_string(),
            FilenameSortMap::Custom(map) => map(name),
        }
    }
}

/// Everything an embedding application can tune on the protocol core.
#[derive(Clone)]
pub struct ServerOptions {
    /// Text of the `220` greeting.
    pub greeting: String,
    /// Working directory a user starts in, keyed by username.
    pub get_initial_cwd: CwdProvider,
    /// Host directory a user's `/` maps to, keyed by username.
    pub get_root: RootProvider,
    pub identity: Arc<dyn IdentityLookup>,
    /// Cap on concurrent stat and owner lookups while listing.
    pub max_stats_at_once: usize,
    /// RETR reads the whole file into memory instead of streaming it.
    pub slurp_files: bool,
    /// Files larger than this are streamed even when `slurp_files` is set.
    pub max_slurp_size: Option<u64>,
    pub tls: Option<Arc<TlsConnection>>,
    pub tls_only: bool,
    pub allow_unauthorized_tls: bool,
    pub pasv_port_range: Option<(u16, u16)>,
    /// Host advertised in `227` replies; the control socket's local address otherwise.
    pub pasv_address: Option<Ipv4Addr>,
    pub no_wildcards: bool,
    pub dont_sort_filenames: bool,
    pub filename_sort_map: FilenameSortMap,
    pub filename_sort_func: Option<SortComparator>,
    /// Bound on waiting for a data connection.
    pub data_timeout: Duration,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            greeting: DEFAULT_GREETING.to_string(),
            get_initial_cwd: Arc::new(|_: &str| "/".to_string()),
            get_root: Arc::new(|_: &str| PathBuf::from("/")),
            identity: Arc::new(AnonymousIdentity),
            max_stats_at_once: DEFAULT_MAX_STATS_AT_ONCE,
            slurp_files: false,
            max_slurp_size: None,
            tls: None,
            tls_only: false,
            allow_unauthorized_tls: false,
            pasv_port_range: None,
            pasv_address: None,
            no_wildcards: false,
            dont_sort_filenames: false,
            filename_sort_map: FilenameSortMap::default(),
            filename_sort_func: None,
            data_timeout: Duration::from_secs(DEFAULT_DATA_TIMEOUT_SECS),
        }
    }
}

impl fmt::Debug for ServerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerOptions")
            .field("greeting", &self.greeting)
            .field("max_stats_at_once", &self.max_stats_at_once)
            .field("slurp_files", &self.slurp_files)
            .field("max_slurp_size", &self.max_slurp_size)
            .field("tls", &self.tls.is_some())
            .field("tls_only", &self.tls_only)
            .field("allow_unauthorized_tls", &self.allow_unauthorized_tls)
            .field("pasv_port_range", &self.pasv_port_range)
            .field("pasv_address", &self.pasv_address)
            .field("no_wildcards", &self.no_wildcards)
            .field("dont_sort_filenames", &self.dont_sort_filenames)
            .field("data_timeout", &self.data_timeout)
            .finish_non_exhaustive()
    }
}

impl ServerOptions {
    /// Builds the options of the standalone daemon from its configuration file.
    pub fn from_config(config: &Config) -> Result<Self> {
        let server = &config.server;

        let chroot_dir = server.chroot_dir.clone();
        let get_root: RootProvider = if server.home_per_user {
            Arc::new(move |username: &str| chroot_dir.join(username))
        } else {
            Arc::new(move |_: &str| chroot_dir.clone())
        };
        let initial_cwd = server.initial_cwd.clone();

        let pasv_address = server
            .pasv_address
            .as_deref()
            .map(str::parse::<Ipv4Addr>)
            .transpose()
            .with_context(|| format!("Invalid pasv_address: {:?}", server.pasv_address))?;

        let pasv_port_range = match (server.pasv_port_range_start, server.pasv_port_range_end) {
            (Some(start), Some(end)) if start <= end => Some((start, end)),
            (Some(start), Some(end)) => {
                anyhow::bail!("Invalid passive port range {}-{}", start, end)
            }
            _ => None,
        };

        let tls = if config.tls.enabled {
            let connection = TlsConnection::new(&config.tls).context("Failed to set up TLS")?;
            Some(Arc::new(connection))
        } else {
            None
        };

        Ok(Self {
            greeting: server.greeting.clone(),
            get_initial_cwd: Arc::new(move |_: &str| initial_cwd.clone()),
            get_root,
            identity: Arc::new(AnonymousIdentity),
            max_stats_at_once: server.max_stats_at_once,
            slurp_files: server.slurp_files,
            max_slurp_size: server.max_slurp_size,
            tls,
            tls_only: config.tls.tls_only,
            allow_unauthorized_tls: config.tls.allow_unauthorized,
            pasv_port_range,
            pasv_address,
            no_wildcards: server.no_wildcards,
            dont_sort_filenames: server.dont_sort_filenames,
            filename_sort_map: if server.sort_case_insensitive {
                FilenameSortMap::Uppercase
            } else {
                FilenameSortMap::Disabled
            },
            filename_sort_func: None,
            data_timeout: Duration::from_secs(server.data_timeout_secs),
        })
    }
}

/// Lifecycle hooks for the embedding application. Every method defaults to a no-op.
pub trait ServerEvents: Send + Sync {
    fn client_connected(&self, _peer: SocketAddr) {}

    fn client_disconnected(&self, _peer: SocketAddr) {}

    /// A STOR completed; `path` is the host path that was written.
    fn file_received(&self, _username: &str, _path: &Path) {}

    /// A RETR completed after sending `bytes` bytes.
    fn file_sent(&self, _username: &str, _path: &Path, _bytes: u64) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoEvents;

impl ServerEvents for NoEvents {}

/// State shared read-only by every connection of a server.
pub struct ServerContext {
    pub options: ServerOptions,
    pub authenticator: Arc<dyn Authenticator>,
    pub events: Arc<dyn ServerEvents>,
    /// Bound to a session at login unless the authenticator supplies its own.
    pub default_fs: Arc<dyn FileSystem>,
}

pub struct FtpServer {
    options: ServerOptions,
    authenticator: Arc<dyn Authenticator>,
    events: Arc<dyn ServerEvents>,
    default_fs: Arc<dyn FileSystem>,
}

impl FtpServer {
    pub fn new(options: ServerOptions, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            options,
            authenticator,
            events: Arc::new(NoEvents),
            default_fs: Arc::new(LocalFileSystem::new()),
        }
    }

    pub fn with_events(mut self, events: Arc<dyn ServerEvents>) -> Self {
        self.events = events;
        self
    }

    pub fn with_filesystem(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.default_fs = fs;
        self
    }

    fn into_context(self) -> Arc<ServerContext> {
        Arc::new(ServerContext {
            options: self.options,
            authenticator: self.authenticator,
            events: self.events,
            default_fs: self.default_fs,
        })
    }

    /// Serves control connections accepted on an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        network::start_server(listener, self.into_context()).await
    }

    /// Binds `addr` and serves it.
    ///
    /// # Returns
    ///
    /// Only returns on a bind or accept failure.
    pub async fn listen<A: ToSocketAddrs>(self, addr: A) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .context("Failed to bind the control listener")?;
        info!("Server listening on {}", listener.local_addr()?);

        match self.serve(listener).await {
            Ok(()) => Ok(()),
            Err(e) => {
                error!("Server stopped: {:#}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::path::Path;

    #[test]
    fn test_sort_map_keys() {
        assert_eq!(FilenameSortMap::Uppercase.key("Data.txt"), "DATA.TXT");
        assert_eq!(FilenameSortMap::Disabled.key("Data.txt"), "Data.txt");
        let custom =
            FilenameSortMap::Custom(Arc::new(|name: &str| name.chars().rev().collect::<String>()));
        assert_eq!(custom.key("abc"), "cba");
    }

    #[test]
    fn test_from_config_providers() {
        let mut config = Config::default();
        config.server.chroot_dir = PathBuf::from("/srv/ftp");
        config.server.home_per_user = true;
        config.server.initial_cwd = "/incoming".to_string();
        config.server.pasv_port_range_start = Some(50_000);
        config.server.pasv_port_range_end = Some(50_010);
        config.server.pasv_address = Some("10.0.0.1".to_string());

        let options = ServerOptions::from_config(&config).unwrap();
        assert_eq!((options.get_root)("jose"), Path::new("/srv/ftp/jose"));
        assert_eq!((options.get_initial_cwd)("jose"), "/incoming");
        assert_eq!(options.pasv_port_range, Some((50_000, 50_010)));
        assert_eq!(options.pasv_address, Some(Ipv4Addr::new(10, 0, 0, 1)));
        assert!(options.tls.is_none());
    }

    #[test]
    fn test_from_config_shared_root() {
        let mut config = Config::default();
        config.server.chroot_dir = PathBuf::from("/srv/ftp");
        config.server.home_per_user = false;
        let options = ServerOptions::from_config(&config).unwrap();
        assert_eq!((options.get_root)("jose"), Path::new("/srv/ftp"));
    }

    #[test]
    fn test_from_config_rejects_bad_values() {
        let mut config = Config::default();
        config.server.pasv_address = Some("not-an-ip".to_string());
        assert!(ServerOptions::from_config(&config).is_err());

        let mut config = Config::default();
        config.server.pasv_port_range_start = Some(60_000);
        config.server.pasv_port_range_end = Some(50_000);
        assert!(ServerOptions::from_config(&config).is_err());
    }
}
