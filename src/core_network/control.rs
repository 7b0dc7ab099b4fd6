// Control connection: line reader, reply writer and in-place TLS upgrade
use crate::constants::MAX_COMMAND_LINE;
use crate::core_network::stream::FtpStream;
use crate::core_tls::{TlsConnection, TlsError};
use crate::error::FtpError;
use log::{trace, warn};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time;

pub struct ControlChannel {
    // `None` only while (or after a failed) TLS handshake owns the socket.
    stream: Option<FtpStream>,
    buffer: Vec<u8>,
    peer: SocketAddr,
    local: SocketAddr,
}

impl ControlChannel {
    pub fn new(socket: TcpStream) -> Result<Self, FtpError> {
        socket.set_nodelay(true)?;
        let peer = socket.peer_addr()?;
        let local = socket.local_addr()?;
        Ok(Self {
            stream: Some(FtpStream::Plain(socket)),
            buffer: Vec::new(),
            peer,
            local,
        })
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local
    }

    fn stream_mut(&mut self) -> Result<&mut FtpStream, FtpError> {
        self.stream.as_mut().ok_or(FtpError::ConnectionClosed)
    }

    /// Reads the next line with its CR/LF stripped; `None` at end of stream.
    pub async fn read_line(&mut self) -> Result<Option<String>, FtpError> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = self.buffer.drain(..=pos).collect();
                let line = String::from_utf8_lossy(&line);
                return Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()));
            }
            if self.buffer.len() > MAX_COMMAND_LINE {
                return Err(FtpError::LineTooLong(MAX_COMMAND_LINE));
            }

            let mut chunk = [0u8; 1024];
            let n = self.stream_mut()?.read(&mut chunk).await?;
            if n == 0 {
                return Ok(None);
            }
            self.buffer.extend_from_slice(&chunk[..n]);
        }
    }

    /// Writes one reply; `message` must not carry the trailing CRLF.
    pub async fn send_response(&mut self, message: &str) -> Result<(), FtpError> {
        trace!("{} <- {}", self.peer, message);
        let stream = self.stream_mut()?;
        stream.write_all(message.as_bytes()).await?;
        stream.write_all(b"\r\n").await?;
        stream.flush().await?;
        Ok(())
    }

    /// Swaps the plain socket for a TLS stream.
    ///
    /// Returns whether the peer is authorized. If the handshake fails the
    /// socket is gone and the connection can only be dropped.
    pub async fn upgrade(
        &mut self,
        tls: &TlsConnection,
        timeout: Duration,
    ) -> Result<bool, FtpError> {
        let socket = match self.stream.take() {
            Some(FtpStream::Plain(socket)) => socket,
            Some(secure) => {
                self.stream = Some(secure);
                return Err(TlsError::AlreadySecure.into());
            }
            None => return Err(FtpError::ConnectionClosed),
        };

        if !self.buffer.is_empty() {
            // Clients must wait for 234 before starting the handshake.
            warn!(
                "{}: discarding {} byte(s) received ahead of the TLS handshake",
                self.peer,
                self.buffer.len()
            );
            self.buffer.clear();
        }

        let upgraded = time::timeout(timeout, tls.upgrade(socket))
            .await
            .map_err(|_| TlsError::TlsHandshakeError("handshake timed out".to_string()))??;
        self.stream = Some(FtpStream::Secure(Box::new(upgraded.stream)));
        Ok(upgraded.authorized)
    }

    pub async fn shutdown(&mut self) {
        if let Some(stream) = self.stream.as_mut() {
            let _ = stream.shutdown().await;
        }
    }
}
