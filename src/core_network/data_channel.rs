//! Data channel manager.
//!
//! Tracks how the next data connection is obtained (PORT/EPRT target or PASV
//! listener) and produces the connected, possibly TLS-upgraded socket when a
//! transfer asks for it. A data socket belongs to the transfer that awaited
//! it, so at most one exists per connection at any time.

use crate::core_network::pasv::PassiveListener;
use crate::core_network::stream::FtpStream;
use crate::core_tls::{TlsConnection, TlsError};
use log::{debug, info, warn};
use std::io;
use std::net::{IpAddr, SocketAddr, SocketAddrV4};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time;

#[derive(Error, Debug)]
pub enum DataChannelError {
    #[error("Data connection not configured")]
    NotConfigured,

    #[error("Timed out waiting for the data connection")]
    Timeout,

    #[error("Data connection I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error("Data connection peer not authorized")]
    Unauthorized,
}

impl DataChannelError {
    pub fn to_ftp_response(&self) -> String {
        match self {
            DataChannelError::NotConfigured => {
                "425 Data connection not configured; send PASV or PORT".to_string()
            }
            _ => "425 Can't open data connection".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataMode {
    Unconfigured,
    /// Dial this address when a transfer needs the socket.
    Active(SocketAddrV4),
    /// Accept on the session's passive listener.
    Passive,
}

/// TLS policy applied to every new data socket once the control channel is secure.
#[derive(Clone, Copy)]
pub struct DataSecurity<'a> {
    pub tls: &'a TlsConnection,
    pub allow_unauthorized: bool,
}

pub struct DataChannel {
    mode: DataMode,
    listener: Option<PassiveListener>,
}

impl Default for DataChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl DataChannel {
    pub fn new() -> Self {
        Self {
            mode: DataMode::Unconfigured,
            listener: None,
        }
    }

    pub fn mode(&self) -> DataMode {
        self.mode
    }

    pub fn is_configured(&self) -> bool {
        self.mode != DataMode::Unconfigured
    }

    /// Clears the configured flag; a passive listener survives for reuse.
    pub fn unconfigure(&mut self) {
        self.mode = DataMode::Unconfigured;
    }

    /// Switches to active mode. A passive listener is superseded and closed.
    pub fn configure_active(&mut self, target: SocketAddrV4) {
        if let Some(listener) = self.listener.take() {
            debug!("Closing passive listener on port {} for active mode", listener.port());
        }
        self.mode = DataMode::Active(target);
    }

    /// Port of the live passive listener, if any.
    pub fn passive_port(&self) -> Option<u16> {
        self.listener.as_ref().map(PassiveListener::port)
    }

    /// Switches to passive mode on the existing listener, or on `listener` if given.
    ///
    /// A reused listener first drops connections left queued by earlier
    /// transfers, so the next accept yields the client's fresh socket.
    pub fn configure_passive(&mut self, listener: Option<PassiveListener>) {
        match listener {
            Some(listener) => self.listener = Some(listener),
            None => {
                if let Some(listener) = &self.listener {
                    let dropped = listener.drain_pending();
                    if dropped > 0 {
                        info!("Dropped {} stale data connection(s)", dropped);
                    }
                }
            }
        }
        if self.listener.is_some() {
            self.mode = DataMode::Passive;
        }
    }

    /// Drops the passive listener and forgets the configuration.
    pub fn close(&mut self) {
        if let Some(listener) = self.listener.take() {
            debug!("Closing passive listener on port {}", listener.port());
        }
        self.mode = DataMode::Unconfigured;
    }

    /// Yields the data socket for a transfer.
    ///
    /// Passive mode waits for the client to connect to the listener, active
    /// mode dials the recorded address (the control peer's address when the
    /// client announced `0.0.0.0`). Any failure resets the channel.
    pub async fn await_data_ready(
        &mut self,
        peer_ip: IpAddr,
        security: Option<DataSecurity<'_>>,
        timeout: Duration,
    ) -> Result<FtpStream, DataChannelError> {
        let result = self.connect(peer_ip, security, timeout).await;
        if let Err(e) = &result {
            warn!("Data connection failed: {}", e);
            self.close();
        }
        result
    }

    async fn connect(
        &mut self,
        peer_ip: IpAddr,
        security: Option<DataSecurity<'_>>,
        timeout: Duration,
    ) -> Result<FtpStream, DataChannelError> {
        let socket = match self.mode {
            DataMode::Unconfigured => return Err(DataChannelError::NotConfigured),
            DataMode::Passive => {
                let listener = self
                    .listener
                    .as_ref()
                    .ok_or(DataChannelError::NotConfigured)?;
                debug!("Waiting for client to connect to passive port {}", listener.port());
                let (socket, addr) = time::timeout(timeout, listener.accept())
                    .await
                    .map_err(|_| DataChannelError::Timeout)??;
                debug!("Passive data connection from {}", addr);
                socket
            }
            DataMode::Active(target) => {
                let target = if target.ip().is_unspecified() {
                    SocketAddr::new(peer_ip, target.port())
                } else {
                    SocketAddr::V4(target)
                };
                debug!("Dialing active data connection to {}", target);
                time::timeout(timeout, TcpStream::connect(target))
                    .await
                    .map_err(|_| DataChannelError::Timeout)??
            }
        };
        socket.set_nodelay(true)?;

        let Some(security) = security else {
            return Ok(FtpStream::Plain(socket));
        };

        debug!("Upgrading data connection to TLS");
        let upgraded = time::timeout(timeout, security.tls.upgrade(socket))
            .await
            .map_err(|_| DataChannelError::Timeout)??;
        if !upgraded.authorized {
            if !security.allow_unauthorized {
                info!("Closing unauthorized data connection");
                return Err(DataChannelError::Unauthorized);
            }
            info!("Allowing unauthorized data connection");
        }
        Ok(FtpStream::Secure(Box::new(upgraded.stream)))
    }
}
