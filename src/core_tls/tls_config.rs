// TLS section of the daemon configuration
use crate::core_tls::error::TlsError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Offer AUTH TLS to clients
    pub enabled: bool,

    /// PEM certificate chain presented to clients
    pub cert_file: PathBuf,

    /// PEM private key matching `cert_file`
    pub key_file: PathBuf,

    /// Optional PEM bundle used to verify client certificates.
    /// Without it clients are never asked for a certificate.
    pub client_ca_file: Option<PathBuf>,

    /// Refuse every command that needs a login until the control channel is secure
    pub tls_only: bool,

    /// Keep sessions whose peer certificate could not be authorized
    pub allow_unauthorized: bool,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cert_file: PathBuf::from("etc/ssl/cert.pem"),
            key_file: PathBuf::from("etc/ssl/key.pem"),
            client_ca_file: None,
            tls_only: false,
            allow_unauthorized: false,
        }
    }
}

impl TlsConfig {
    /// Checks that the configured files exist before the acceptor is built
    pub fn validate(&self) -> Result<(), TlsError> {
        if self.enabled {
            if !self.cert_file.exists() {
                return Err(TlsError::CertificateLoadError(format!(
                    "Certificate file not found: {:?}",
                    self.cert_file
                )));
            }

            if !self.key_file.exists() {
                return Err(TlsError::PrivateKeyLoadError(format!(
                    "Private key file not found: {:?}",
                    self.key_file
                )));
            }

            if let Some(ca) = &self.client_ca_file {
                if !ca.exists() {
                    return Err(TlsError::ClientCaLoadError(format!(
                        "Client CA file not found: {:?}",
                        ca
                    )));
                }
            }
        }

        Ok(())
    }
}
