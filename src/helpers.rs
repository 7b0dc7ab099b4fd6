use crate::config::Config;
use log::info;
use std::path::PathBuf;

/// Configuration path used when `--config` is not given.
pub fn default_config_path() -> PathBuf {
    if cfg!(target_os = "windows") {
        PathBuf::from("C:\\oxiftpd\\etc\\oxiftpd.toml")
    } else {
        PathBuf::from("/etc/oxiftpd.toml")
    }
}

// Helper function to log configuration options
pub fn log_config(config: &Config) {
    let server = &config.server;
    info!("  Listen Address: {}:{}", server.listen_address, server.listen_port);
    info!(
        "  PASV Address: {}",
        server.pasv_address.as_deref().unwrap_or("(control socket address)")
    );
    if let (Some(start), Some(end)) = (server.pasv_port_range_start, server.pasv_port_range_end) {
        info!("  PASV Port Range: {}-{}", start, end);
    }
    info!("  Chroot Directory: {}", server.chroot_dir.display());
    info!("  Home Per User: {}", server.home_per_user);
    info!("  Passwd File: {}", server.passwd_file.display());
    info!(
        "  RETR Strategy: {}",
        if server.slurp_files { "slurp" } else { "stream" }
    );
    info!("  Data Timeout: {}s", server.data_timeout_secs);
    info!(
        "  TLS: {}{}",
        if config.tls.enabled { "enabled" } else { "disabled" },
        if config.tls.tls_only { " (required)" } else { "" }
    );
}
