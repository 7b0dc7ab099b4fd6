use crate::core_network::control::ControlChannel;
use crate::error::FtpError;
use crate::session::Session;
use log::{error, info};

/// Handles the RNTO (Rename To) FTP command.
///
/// Consumes the source recorded by the preceding RNFR.
pub async fn handle_rnto_command(
    control: &mut ControlChannel,
    session: &mut Session,
    arg: &str,
) -> Result<(), FtpError> {
    let Some(from) = session.rename_from.take() else {
        return control.send_response("503 RNFR required first").await;
    };

    let from_path = session.fs_path(&from);
    let (to, to_path) = session.resolve(arg);

    match session.fs.rename(&from_path, &to_path).await {
        Ok(()) => {
            info!("Renamed {} to {}", from, to);
            control.send_response("250 File renamed successfully").await
        }
        Err(e) => {
            error!("Error renaming file from {} to {}: {}", from, to, e);
            control.send_response("550 Rename failed").await
        }
    }
}
