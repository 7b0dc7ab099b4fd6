use crate::core_network::control::ControlChannel;
use crate::error::FtpError;
use crate::session::Session;
use log::{error, info};

/// Handles the RMD (Remove Directory) FTP command. Only empty directories can be removed.
pub async fn handle_rmd_command(
    control: &mut ControlChannel,
    session: &mut Session,
    arg: &str,
) -> Result<(), FtpError> {
    let (path, fs_path) = session.resolve(arg);

    match session.fs.rmdir(&fs_path).await {
        Ok(()) => {
            info!("Directory removed: {:?}", fs_path);
            control
                .send_response(&format!("250 \"{}\" directory removed", path))
                .await
        }
        Err(e) => {
            error!("Error removing directory {}: {}", path, e);
            control.send_response("550 Delete operation failed").await
        }
    }
}
