use crate::constants::{DEFAULT_DATA_TIMEOUT_SECS, DEFAULT_GREETING, DEFAULT_MAX_STATS_AT_ONCE};
use crate::core_tls::TlsConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_address: String,
    pub listen_port: u16,
    /// Address written into PASV replies, defaults to the control socket's local address.
    pub pasv_address: Option<String>,
    pub chroot_dir: PathBuf,
    /// Root every user in `chroot_dir/<username>` instead of `chroot_dir`.
    pub home_per_user: bool,
    pub initial_cwd: String,
    pub max_stats_at_once: usize,
    pub slurp_files: bool,
    pub max_slurp_size: Option<u64>,
    pub pasv_port_range_start: Option<u16>,
    pub pasv_port_range_end: Option<u16>,
    pub no_wildcards: bool,
    pub dont_sort_filenames: bool,
    pub sort_case_insensitive: bool,
    pub data_timeout_secs: u64,
    /// 0 = warn, 1 = info, 2 = debug, 3 = trace
    pub log_level: u8,
    pub passwd_file: PathBuf,
    pub greeting: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: String::from("0.0.0.0"),
            listen_port: 21,
            pasv_address: None,
            chroot_dir: PathBuf::from("/var/ftp"),
            home_per_user: false,
            initial_cwd: String::from("/"),
            max_stats_at_once: DEFAULT_MAX_STATS_AT_ONCE,
            slurp_files: false,
            max_slurp_size: None,
            pasv_port_range_start: None,
            pasv_port_range_end: None,
            no_wildcards: false,
            dont_sort_filenames: false,
            sort_case_insensitive: true,
            data_timeout_secs: DEFAULT_DATA_TIMEOUT_SECS,
            log_level: 1,
            passwd_file: PathBuf::from("/etc/oxiftpd.passwd"),
            greeting: String::from(DEFAULT_GREETING),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub tls: TlsConfig,
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
        Self::from_toml(&config_str)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))
    }

    pub fn from_toml(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str)?;
        if config.tls.enabled {
            config.tls.validate()?;
        }
        Ok(config)
    }
}
