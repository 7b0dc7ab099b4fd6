use anyhow::{Context, Result};
use clap::Parser;
use oxiftpd::config::Config;
use oxiftpd::core_auth::helper::hash_password;
use oxiftpd::core_auth::PasswdAuthenticator;
use oxiftpd::core_cli::Cli;
use oxiftpd::core_log::logger::init_logger;
use oxiftpd::helpers::{default_config_path, log_config};
use oxiftpd::server::{FtpServer, ServerOptions};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Cli::parse();

    if let Some(password) = &args.hash_password {
        println!("{}", hash_password(password)?);
        return Ok(());
    }

    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let mut config = Config::load_from_file(&config_path)?;
    if let Some(port) = args.port {
        config.server.listen_port = port;
    }

    init_logger(config.server.log_level, args.verbose);
    log_config(&config);

    let options = ServerOptions::from_config(&config)?;
    let authenticator = PasswdAuthenticator::from_file(&config.server.passwd_file)
        .context("Failed to load accounts")?;

    FtpServer::new(options, Arc::new(authenticator))
        .listen((config.server.listen_address.as_str(), config.server.listen_port))
        .await
}
