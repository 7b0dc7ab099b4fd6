// Data connection setup shared by LIST, NLST, RETR and STOR
use crate::core_network::control::ControlChannel;
use crate::core_network::data_channel::DataSecurity;
use crate::core_network::stream::FtpStream;
use crate::error::FtpError;
use crate::server::ServerContext;
use crate::session::Session;

/// Awaits the data socket for a transfer.
///
/// Data sockets are TLS-upgraded whenever the control channel is secure.
/// On failure the error reply has already been sent and `None` is returned.
pub async fn open_data_connection(
    control: &mut ControlChannel,
    server: &ServerContext,
    session: &mut Session,
) -> Result<Option<FtpStream>, FtpError> {
    let security = match (&server.options.tls, session.secure) {
        (Some(tls), true) => Some(DataSecurity {
            tls,
            allow_unauthorized: server.options.allow_unauthorized_tls,
        }),
        _ => None,
    };

    let peer_ip = control.peer().ip();
    match session
        .data
        .await_data_ready(peer_ip, security, server.options.data_timeout)
        .await
    {
        Ok(stream) => Ok(Some(stream)),
        Err(e) => {
            control.send_response(&e.to_ftp_response()).await?;
            Ok(None)
        }
    }
}
