use crate::constants::{MAX_AUTH_FAILURES, TLS_ONLY_AUTH_ERROR};
use crate::core_auth::{ClientInfo, PassVerdict};
use crate::core_network::control::ControlChannel;
use crate::error::FtpError;
use crate::server::ServerContext;
use crate::session::Session;
use log::{info, warn};

/// Handles the PASS FTP command.
///
/// On acceptance the session is bound to the user: filesystem, root and
/// initial working directory come from the authenticator and the server's
/// providers. The control connection is closed after the third consecutive
/// rejection.
pub async fn handle_pass_command(
    control: &mut ControlChannel,
    server: &ServerContext,
    session: &mut Session,
    password: &str,
) -> Result<(), FtpError> {
    if server.options.tls_only && !session.secure {
        warn!("{}: PASS refused on an insecure connection", control.peer());
        return control.send_response(TLS_ONLY_AUTH_ERROR).await;
    }

    let client = ClientInfo {
        peer: control.peer(),
        secure: session.secure,
    };
    let verdict = server
        .authenticator
        .check_pass(&client, session.pending_user.as_deref(), password)
        .await;

    match verdict {
        PassVerdict::Accept { username, fs } => {
            session.fs = fs.unwrap_or_else(|| server.default_fs.clone());
            session.cwd = (server.options.get_initial_cwd)(&username);
            session.root = (server.options.get_root)(&username);
            session.auth_failures = 0;
            info!(
                "{}: {} logged in, root {:?}, cwd {}",
                control.peer(),
                username,
                session.root,
                session.cwd
            );
            session.username = Some(username);
            control.send_response("230 Logged on").await
        }
        PassVerdict::Reject => {
            session.username = None;
            session.auth_failures += 1;
            warn!(
                "{}: login failed ({} of {})",
                control.peer(),
                session.auth_failures,
                MAX_AUTH_FAILURES
            );
            control.send_response("530 Invalid password").await?;

            if session.auth_failures >= MAX_AUTH_FAILURES {
                warn!("{}: too many failed logins, closing connection", control.peer());
                session.closing = true;
            }
            Ok(())
        }
    }
}
