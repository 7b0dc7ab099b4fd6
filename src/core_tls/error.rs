// Errors raised while loading TLS materials or upgrading a socket
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TlsError {
    #[error("Failed to load SSL certificate: {0}")]
    CertificateLoadError(String),

    #[error("Failed to load SSL private key: {0}")]
    PrivateKeyLoadError(String),

    #[error("Failed to load client CA bundle: {0}")]
    ClientCaLoadError(String),

    #[error("TLS handshake failed: {0}")]
    TlsHandshakeError(String),

    #[error("TLS configuration error: {0}")]
    TlsConfigError(String),

    #[error("TLS not configured")]
    TlsNotConfigured,

    #[error("Socket is already secure")]
    AlreadySecure,
}

impl TlsError {
    pub fn to_ftp_response(&self) -> String {
        match self {
            TlsError::TlsNotConfigured => "202 Not supported".to_string(),
            TlsError::AlreadySecure => "503 Secure connection already established".to_string(),
            _ => "421 Service not available, closing control connection".to_string(),
        }
    }
}
