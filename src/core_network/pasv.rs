use crate::core_network::control::ControlChannel;
use crate::error::FtpError;
use crate::server::ServerContext;
use crate::session::Session;
use futures::FutureExt;
use log::{debug, error, info, warn};
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tokio::net::{TcpListener, TcpStream};

/// Listener a client dials for passive-mode data connections.
///
/// It lives as long as the session keeps it, serving one connection per
/// transfer, until the data channel is closed.
pub struct PassiveListener {
    listener: TcpListener,
    port: u16,
}

impl PassiveListener {
    /// Binds on all interfaces, walking `range` on `AddrInUse` when one is given.
    pub async fn bind(range: Option<(u16, u16)>) -> io::Result<Self> {
        let Some((start, end)) = range else {
            return Self::bind_port(0).await;
        };

        for port in start..=end {
            match Self::bind_port(port).await {
                Ok(listener) => return Ok(listener),
                Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                    debug!("Passive port {} in use, trying the next one", port);
                }
                Err(e) => return Err(e),
            }
        }

        Err(io::Error::new(
            io::ErrorKind::AddrInUse,
            format!("no free passive port in {}-{}", start, end),
        ))
    }

    async fn bind_port(port: u16) -> io::Result<Self> {
        let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await?;
        let port = listener.local_addr()?.port();
        Ok(Self { listener, port })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        self.listener.accept().await
    }

    /// Closes every connection already waiting in the accept queue.
    pub fn drain_pending(&self) -> usize {
        let mut dropped = 0;
        while let Some(Ok((_, addr))) = self.listener.accept().now_or_never() {
            debug!("Closing stale data connection from {}", addr);
            dropped += 1;
        }
        dropped
    }
}

/// Formats the 227 reply: `port = p1 * 256 + p2`.
pub fn format_pasv_reply(host: Ipv4Addr, port: u16) -> String {
    let [h1, h2, h3, h4] = host.octets();
    format!(
        "227 Entering Passive Mode ({},{},{},{},{},{})",
        h1,
        h2,
        h3,
        h4,
        port >> 8,
        port & 0xff
    )
}

pub fn format_epsv_reply(port: u16) -> String {
    format!("229 Entering Extended Passive Mode (|||{}|)", port)
}

/// Host written into the 227 reply.
fn advertised_host(control: &ControlChannel, configured: Option<Ipv4Addr>) -> Ipv4Addr {
    if let Some(host) = configured {
        return host;
    }
    match control.local_addr().ip() {
        IpAddr::V4(ip) if !ip.is_unspecified() => ip,
        IpAddr::V6(ip) => match ip.to_ipv4_mapped() {
            Some(ip) => ip,
            None => {
                warn!(
                    "Control connection is IPv6 and no pasv_address is set, advertising 127.0.0.1"
                );
                Ipv4Addr::LOCALHOST
            }
        },
        _ => Ipv4Addr::LOCALHOST,
    }
}

/// Handles the PASV and EPSV commands.
///
/// An existing passive listener is reused; otherwise a new one is bound,
/// honouring the configured port range.
///
/// # Arguments
///
/// * `extended` - `true` for EPSV, which answers with a 229 reply.
/// * `arg` - EPSV accepts no argument or `1`.
pub async fn handle_pasv_command(
    control: &mut ControlChannel,
    server: &ServerContext,
    session: &mut Session,
    extended: bool,
    arg: &str,
) -> Result<(), FtpError> {
    session.data.unconfigure();

    if extended && !arg.is_empty() && arg != "1" {
        let reply = if arg == "2" {
            "522 Network protocol not supported, use (1)"
        } else {
            "202 Not supported"
        };
        return control.send_response(reply).await;
    }

    if session.data.passive_port().is_some() {
        debug!("Reusing passive listener");
        session.data.configure_passive(None);
    } else {
        match PassiveListener::bind(server.options.pasv_port_range).await {
            Ok(listener) => {
                info!("Passive listener bound on port {}", listener.port());
                session.data.configure_passive(Some(listener));
            }
            Err(e) => {
                error!("Unable to open passive listener: {}", e);
                session.data.close();
                return control
                    .send_response("421 Server was unable to open passive connection listener")
                    .await;
            }
        }
    }

    let Some(port) = session.data.passive_port() else {
        return control
            .send_response("421 Server was unable to open passive connection listener")
            .await;
    };

    let reply = if extended {
        format_epsv_reply(port)
    } else {
        format_pasv_reply(advertised_host(control, server.options.pasv_address), port)
    };
    control.send_response(&reply).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;

    #[test]
    fn test_format_pasv_reply() {
        assert_eq!(
            format_pasv_reply(Ipv4Addr::new(192, 168, 1, 10), 50_000),
            "227 Entering Passive Mode (192,168,1,10,195,80)"
        );
        assert_eq!(
            format_pasv_reply(Ipv4Addr::LOCALHOST, 255),
            "227 Entering Passive Mode (127,0,0,1,0,255)"
        );
    }

    #[test]
    fn test_format_epsv_reply() {
        assert_eq!(format_epsv_reply(2121), "229 Entering Extended Passive Mode (|||2121|)");
    }

    #[tokio::test]
    async fn test_bind_ephemeral() {
        let listener = PassiveListener::bind(None).await.unwrap();
        assert_ne!(listener.port(), 0);
    }

    #[tokio::test]
    async fn test_bind_walks_port_range() {
        // Find two free adjacent ports, then occupy the first.
        let (blocker, start) = loop {
            let blocker = TcpListener::bind((Ipv4Addr::UNSPECIFIED, 0)).await.unwrap();
            let start = blocker.local_addr().unwrap().port();
            if start == u16::MAX {
                continue;
            }
            if TcpListener::bind((Ipv4Addr::UNSPECIFIED, start + 1)).await.is_ok() {
                break (blocker, start);
            }
        };

        let listener = PassiveListener::bind(Some((start, start + 1))).await.unwrap();
        assert_eq!(listener.port(), start + 1);
        drop(blocker);
    }

    #[tokio::test]
    async fn test_bind_exhausted_range() {
        let blocker = TcpListener::bind((Ipv4Addr::UNSPECIFIED, 0)).await.unwrap();
        let port = blocker.local_addr().unwrap().port();
        let err = PassiveListener::bind(Some((port, port))).await.err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::AddrInUse);
    }

    #[tokio::test]
    async fn test_drain_pending_closes_queued_connections() {
        let listener = PassiveListener::bind(None).await.unwrap();
        let port = listener.port();
        let mut stale = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        // Let the reactor observe the queued connection.
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(listener.drain_pending(), 1);
        assert_eq!(listener.drain_pending(), 0);

        let mut buf = [0u8; 1];
        assert!(matches!(stale.read(&mut buf).await, Ok(0) | Err(_)));
    }
}
