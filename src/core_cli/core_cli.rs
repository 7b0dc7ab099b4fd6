use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "oxiftpd", about = "An FTP server with explicit TLS, written in Rust.")]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the control port from the configuration file
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Enable verbose mode
    #[arg(short, long)]
    pub verbose: bool,

    /// Print a bcrypt hash for a passwd file entry and exit
    #[arg(long, value_name = "PASSWORD")]
    pub hash_password: Option<String>,
}
