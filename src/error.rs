// Errors that end a control connection
use crate::core_tls::TlsError;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FtpError {
    #[error("Control connection I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error("Control connection closed")]
    ConnectionClosed,

    #[error("Command line longer than {0} bytes")]
    LineTooLong(usize),
}
