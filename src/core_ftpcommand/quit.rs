use crate::core_network::control::ControlChannel;
use crate::error::FtpError;
use crate::session::Session;
use log::info;

/// Handles the QUIT FTP command.
///
/// After the reply the connection stops reading input; the caller tears down
/// the data channel and the control socket.
pub async fn handle_quit_command(
    control: &mut ControlChannel,
    session: &mut Session,
) -> Result<(), FtpError> {
    info!("Received QUIT command from {}. Closing connection.", control.peer());
    session.has_quit = true;
    session.data.close();
    control.send_response("221 Goodbye").await
}
