use crate::core_network::control::ControlChannel;
use crate::error::FtpError;
use crate::session::Session;
use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;
use std::net::{Ipv4Addr, SocketAddrV4};

#[derive(Debug, PartialEq, Eq)]
pub enum PortArgError {
    /// Malformed argument, answered with 501.
    Syntax(&'static str),
    /// EPRT asked for an IPv6 data connection.
    Ipv6,
}

impl PortArgError {
    pub fn to_ftp_response(&self) -> String {
        match self {
            PortArgError::Syntax(message) => format!("501 {}", message),
            PortArgError::Ipv6 => {
                "522 Server cannot handle IPv6 EPRT commands, use (1)".to_string()
            }
        }
    }
}

lazy_static! {
    static ref PORT_RE: Regex =
        Regex::new(r"^(\d{1,3}),(\d{1,3}),(\d{1,3}),(\d{1,3}),(\d{1,3}),(\d{1,3})$").unwrap();

    static ref EPRT_RE: Regex =
        Regex::new(r"^\|1\|(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})\|(\d{1,5})\|?$").unwrap();
}

/// Parses `h1,h2,h3,h4,p1,p2`.
pub fn parse_port(arg: &str) -> Result<SocketAddrV4, PortArgError> {
    const BAD: PortArgError = PortArgError::Syntax("Bad argument to PORT");

    let caps = PORT_RE.captures(arg.trim()).ok_or(BAD)?;
    let mut fields = [0u8; 6];
    for (i, field) in fields.iter_mut().enumerate() {
        *field = caps[i + 1].parse().map_err(|_| BAD)?;
    }

    let [h1, h2, h3, h4, p1, p2] = fields;
    let port = u16::from(p1) * 256 + u16::from(p2);
    Ok(SocketAddrV4::new(Ipv4Addr::new(h1, h2, h3, h4), port))
}

/// Parses `|1|a.b.c.d|port|`.
pub fn parse_eprt(arg: &str) -> Result<SocketAddrV4, PortArgError> {
    let arg = arg.trim();
    if arg.starts_with("|2|") {
        return Err(PortArgError::Ipv6);
    }

    let caps = EPRT_RE
        .captures(arg)
        .ok_or(PortArgError::Syntax("Bad Argument to EPRT"))?;
    let host: Ipv4Addr = caps[1]
        .parse()
        .map_err(|_| PortArgError::Syntax("Bad Argument to EPRT"))?;
    let port = caps[2]
        .parse::<u16>()
        .ok()
        .filter(|port| *port != 0)
        .ok_or(PortArgError::Syntax("Bad argument to EPRT (invalid port number)"))?;

    Ok(SocketAddrV4::new(host, port))
}

/// Handles the PORT and EPRT commands.
///
/// Only records the target: the connection is dialed when a transfer
/// needs it.
pub async fn handle_port_command(
    control: &mut ControlChannel,
    session: &mut Session,
    extended: bool,
    arg: &str,
) -> Result<(), FtpError> {
    session.data.unconfigure();

    let parsed = if extended { parse_eprt(arg) } else { parse_port(arg) };
    match parsed {
        Ok(target) => {
            debug!("Active data target set to {}", target);
            session.data.configure_active(target);
            control.send_response("200 OK").await
        }
        Err(e) => {
            warn!("Rejected {} argument {:?}", if extended { "EPRT" } else { "PORT" }, arg);
            control.send_response(&e.to_ftp_response()).await
        }
    }
}
