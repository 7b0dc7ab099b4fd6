use crate::core_network::control::ControlChannel;
use crate::error::FtpError;
use crate::session::Session;
use log::warn;

pub async fn handle_size_command(
    control: &mut ControlChannel,
    session: &mut Session,
    arg: &str,
) -> Result<(), FtpError> {
    let (path, fs_path) = session.resolve(arg);

    match session.fs.stat(&fs_path).await {
        Ok(stat) => control.send_response(&format!("213 {}", stat.size)).await,
        Err(e) => {
            warn!("Error getting size of file '{}': {}", path, e);
            control.send_response("450 Failed to get size of file").await
        }
    }
}
