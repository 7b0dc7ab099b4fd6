use crate::core_network::control::ControlChannel;
use crate::error::FtpError;
use crate::session::Session;
use log::{debug, warn};

/// Handles the RNFR (Rename From) FTP command.
///
/// The source is only remembered when it exists, so a following RNTO
/// without a valid RNFR is answered with `503`.
pub async fn handle_rnfr_command(
    control: &mut ControlChannel,
    session: &mut Session,
    arg: &str,
) -> Result<(), FtpError> {
    let (path, fs_path) = session.resolve(arg);

    if session.fs.exists(&fs_path).await {
        debug!("Rename from {}", path);
        session.rename_from = Some(path);
        control
            .send_response("350 File exists, ready for destination name")
            .await
    } else {
        warn!("RNFR of missing file {}", path);
        session.rename_from = None;
        control.send_response("550 File does not exist").await
    }
}
