// Transport upgrade adapter: turns a plain socket into a TLS server stream
use crate::core_tls::error::TlsError;
use crate::core_tls::tls_config::TlsConfig;
use log::debug;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::rustls::server::WebPkiClientVerifier;
use tokio_rustls::rustls::{RootCertStore, ServerConfig};
use tokio_rustls::server::TlsStream;
use tokio_rustls::TlsAcceptor;

/// Outcome of a successful handshake.
///
/// `authorized` is false when client certificates were requested but the peer
/// did not present one; the caller decides whether to keep such a session.
pub struct TlsUpgrade {
    pub stream: TlsStream<TcpStream>,
    pub authorized: bool,
}

pub struct TlsConnection {
    tls_acceptor: TlsAcceptor,
    verifies_clients: bool,
}

impl TlsConnection {
    /// Builds the acceptor from the PEM files named in `config`.
    pub fn new(config: &TlsConfig) -> Result<Self, TlsError> {
        config.validate()?;

        let cert_chain = load_certs(&config.cert_file)
            .map_err(TlsError::CertificateLoadError)?;
        if cert_chain.is_empty() {
            return Err(TlsError::CertificateLoadError(format!(
                "No certificate found in {:?}",
                config.cert_file
            )));
        }

        let private_key = load_private_key(&config.key_file)?;

        let builder = ServerConfig::builder();
        let (server_config, verifies_clients) = match &config.client_ca_file {
            Some(ca_file) => {
                let mut roots = RootCertStore::empty();
                for cert in load_certs(ca_file).map_err(TlsError::ClientCaLoadError)? {
                    roots
                        .add(cert)
                        .map_err(|e| TlsError::ClientCaLoadError(e.to_string()))?;
                }
                let verifier = WebPkiClientVerifier::builder(Arc::new(roots))
                    .allow_unauthenticated()
                    .build()
                    .map_err(|e| TlsError::TlsConfigError(e.to_string()))?;
                let server_config = builder
                    .with_client_cert_verifier(verifier)
                    .with_single_cert(cert_chain, private_key)
                    .map_err(|e| TlsError::TlsConfigError(e.to_string()))?;
                (server_config, true)
            }
            None => {
                let server_config = builder
                    .with_no_client_auth()
                    .with_single_cert(cert_chain, private_key)
                    .map_err(|e| TlsError::TlsConfigError(e.to_string()))?;
                (server_config, false)
            }
        };

        Ok(Self {
            tls_acceptor: TlsAcceptor::from(Arc::new(server_config)),
            verifies_clients,
        })
    }

    /// Runs the server side of the handshake on `stream`.
    ///
    /// Every later read and write must go through the returned stream.
    pub async fn upgrade(&self, stream: TcpStream) -> Result<TlsUpgrade, TlsError> {
        let stream = self
            .tls_acceptor
            .accept(stream)
            .await
            .map_err(|e| TlsError::TlsHandshakeError(e.to_string()))?;

        let authorized = if self.verifies_clients {
            stream.get_ref().1.peer_certificates().is_some()
        } else {
            true
        };
        debug!("TLS handshake complete (authorized: {})", authorized);

        Ok(TlsUpgrade { stream, authorized })
    }
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, String> {
    let file = File::open(path).map_err(|e| format!("{:?}: {}", path, e))?;
    let mut reader = BufReader::new(file);
    rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("{:?}: {}", path, e))
}

fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, TlsError> {
    let file = File::open(path)
        .map_err(|e| TlsError::PrivateKeyLoadError(format!("{:?}: {}", path, e)))?;
    let mut reader = BufReader::new(file);
    rustls_pemfile::private_key(&mut reader)
        .map_err(|e| TlsError::PrivateKeyLoadError(e.to_string()))?
        .ok_or_else(|| TlsError::PrivateKeyLoadError("No private key found".to_string()))
}
