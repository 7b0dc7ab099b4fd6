// Command dispatcher and one handler module per FTP command
pub mod ftpcommand;
pub mod handlers;

pub mod auth;
pub mod cwd;
pub mod dele;
pub mod feat;
pub mod list;
pub mod mkd;
pub mod noop;
pub mod pass;
pub mod pwd;
pub mod quit;
pub mod retr;
pub mod rmd;
pub mod rnfr;
pub mod rnto;
pub mod size;
pub mod stor;
pub mod type_;
pub mod user;

// Shared by the transfer commands
pub mod transfer;
pub mod utils;
