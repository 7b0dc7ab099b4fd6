use crate::constants::TLS_ONLY_AUTH_ERROR;
use crate::core_auth::{ClientInfo, UserVerdict};
use crate::core_network::control::ControlChannel;
use crate::error::FtpError;
use crate::server::ServerContext;
use crate::session::Session;
use log::{info, warn};

/// Handles the USER FTP command.
///
/// The username is handed to the server's authenticator, which alone decides
/// whether a password is requested.
///
/// # Arguments
///
/// * `control` - The control connection replies are written to.
/// * `server` - Shared server state holding the authenticator.
/// * `session` - The connection state; remembers the name for PASS.
/// * `username` - The username provided by the client.
///
/// # Returns
///
/// Result<(), FtpError> indicating whether the reply could be written.
pub async fn handle_user_command(
    control: &mut ControlChannel,
    server: &ServerContext,
    session: &mut Session,
    username: &str,
) -> Result<(), FtpError> {
    if server.options.tls_only && !session.secure {
        warn!("{}: USER refused on an insecure connection", control.peer());
        return control.send_response(TLS_ONLY_AUTH_ERROR).await;
    }

    info!("Received USER command with username: {}", username);
    let client = ClientInfo {
        peer: control.peer(),
        secure: session.secure,
    };

    match server.authenticator.check_user(&client, username).await {
        UserVerdict::Accept => {
            session.pending_user = Some(username.to_string());
            control
                .send_response(&format!("331 Password required for {}", username))
                .await
        }
        UserVerdict::Reject => {
            session.pending_user = None;
            control
                .send_response(&format!("530 Invalid username: {}", username))
                .await
        }
    }
}
