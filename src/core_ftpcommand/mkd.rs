use crate::constants::MKD_DIR_MODE;
use crate::core_network::control::ControlChannel;
use crate::error::FtpError;
use crate::session::Session;
use log::{error, info};

/// Handles the MKD (Make Directory) FTP command.
///
/// # Arguments
///
/// * `control` - The control connection replies are written to.
/// * `session` - The connection state used to resolve the path.
/// * `arg` - The directory to create, relative to the working directory or absolute.
///
/// # Returns
///
/// Result<(), FtpError> indicating whether the reply could be written.
pub async fn handle_mkd_command(
    control: &mut ControlChannel,
    session: &mut Session,
    arg: &str,
) -> Result<(), FtpError> {
    let (path, fs_path) = session.resolve(arg);

    match session.fs.mkdir(&fs_path, MKD_DIR_MODE).await {
        Ok(()) => {
            info!("Directory created: {:?}", fs_path);
            control
                .send_response(&format!("257 \"{}\" directory created", path))
                .await
        }
        Err(e) => {
            error!("Error making directory {} because {}", path, e);
            control
                .send_response(&format!("550 \"{}\" directory NOT created", path))
                .await
        }
    }
}
