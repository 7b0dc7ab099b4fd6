use crate::core_network::control::ControlChannel;
use crate::error::FtpError;
use crate::session::Session;
use log::{error, info, warn};
use std::io::ErrorKind;

pub async fn handle_dele_command(
    control: &mut ControlChannel,
    session: &mut Session,
    arg: &str,
) -> Result<(), FtpError> {
    let (path, fs_path) = session.resolve(arg);

    match session.fs.unlink(&fs_path).await {
        Ok(()) => {
            info!("File deleted: {:?}", fs_path);
            control.send_response("250 File deleted").await
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("DELE of missing file {}", path);
            control.send_response("550 File not found").await
        }
        Err(e) => {
            error!("Error deleting file {}: {}", path, e);
            control.send_response("550 Permission denied").await
        }
    }
}
