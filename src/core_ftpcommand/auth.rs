// AUTH TLS, PBSZ and PROT (RFC 2228 / RFC 4217)
use crate::core_network::control::ControlChannel;
use crate::core_tls::TlsError;
use crate::error::FtpError;
use crate::server::ServerContext;
use crate::session::Session;
use log::{error, info, warn};

/// Handles the AUTH command by upgrading the control connection in place.
///
/// `234` is written on the plain socket, then the handshake runs. A failed
/// handshake, or an unauthorized peer when the server does not allow those,
/// ends the connection.
pub async fn handle_auth_command(
    control: &mut ControlChannel,
    server: &ServerContext,
    session: &mut Session,
    arg: &str,
) -> Result<(), FtpError> {
    let Some(tls) = server.options.tls.as_deref() else {
        return control
            .send_response(&TlsError::TlsNotConfigured.to_ftp_response())
            .await;
    };
    if !arg.eq_ignore_ascii_case("TLS") {
        return control.send_response("500 Not recognized").await;
    }
    if session.secure {
        return control
            .send_response(&TlsError::AlreadySecure.to_ftp_response())
            .await;
    }

    control.send_response("234 Honored").await?;
    info!("{}: establishing secure connection", control.peer());

    let authorized = match control.upgrade(tls, server.options.data_timeout).await {
        Ok(authorized) => authorized,
        Err(FtpError::Tls(e)) => {
            error!("{}: error upgrading connection to TLS: {}", control.peer(), e);
            session.closing = true;
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    if !authorized {
        if !server.options.allow_unauthorized_tls {
            warn!("{}: closing unauthorized secure connection", control.peer());
            session.closing = true;
            return Ok(());
        }
        info!("{}: allowing unauthorized secure connection", control.peer());
    }

    info!("{}: secure connection started", control.peer());
    session.secure = true;
    Ok(())
}

/// Handles PBSZ. Only a zero-sized protection buffer makes sense over TLS.
pub async fn handle_pbsz_command(
    control: &mut ControlChannel,
    server: &ServerContext,
    session: &mut Session,
    arg: &str,
) -> Result<(), FtpError> {
    if server.options.tls.is_none() {
        return control.send_response("202 Not supported").await;
    }
    if !session.secure {
        return control
            .send_response("503 Secure connection not established")
            .await;
    }

    session.pbsz_received = true;
    if arg.parse::<u64>().map_or(true, |size| size != 0) {
        control.send_response("200 buffer too big, PBSZ=0").await
    } else {
        control.send_response("200 OK").await
    }
}

/// Handles PROT. Only `P` (private) is supported.
pub async fn handle_prot_command(
    control: &mut ControlChannel,
    server: &ServerContext,
    session: &mut Session,
    arg: &str,
) -> Result<(), FtpError> {
    if server.options.tls.is_none() {
        return control.send_response("202 Not supported").await;
    }
    if !session.pbsz_received {
        return control.send_response("503 No PBSZ command received").await;
    }

    let reply = match arg {
        "S" | "E" | "C" => "536 Not supported",
        "P" => "200 OK",
        _ => "504 Not recognized",
    };
    control.send_response(reply).await
}
