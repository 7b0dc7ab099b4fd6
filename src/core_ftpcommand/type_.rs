use crate::core_network::control::ControlChannel;
use crate::error::FtpError;
use crate::session::{Session, TransferType};
use log::debug;

/// Handles the TYPE FTP command.
///
/// Only `A` (ASCII) and `I` (image/binary) are accepted. Both are sent as-is:
/// the type only names the mode in the RETR `150` reply.
///
/// # Arguments
///
/// * `control` - The control connection replies are written to.
/// * `session` - The connection state recording the chosen type.
/// * `arg` - The argument specifying the transfer type.
pub async fn handle_type_command(
    control: &mut ControlChannel,
    session: &mut Session,
    arg: &str,
) -> Result<(), FtpError> {
    let transfer_type = match arg {
        "A" => TransferType::Ascii,
        "I" => TransferType::Binary,
        _ => {
            debug!("Unsupported transfer type {:?}", arg);
            return control.send_response("202 Not supported").await;
        }
    };

    session.transfer_type = transfer_type;
    control.send_response("200 OK").await
}
