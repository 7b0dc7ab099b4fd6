use crate::core_ftpcommand::utils::parent_path;
use crate::core_network::control::ControlChannel;
use crate::error::FtpError;
use crate::session::Session;
use log::{debug, error};
use std::io::ErrorKind;

/// Handles the CWD FTP command.
///
/// The target must exist and be a directory; the working directory is only
/// updated on success.
pub async fn handle_cwd_command(
    control: &mut ControlChannel,
    session: &mut Session,
    arg: &str,
) -> Result<(), FtpError> {
    let (path, fs_path) = session.resolve(arg);

    match session.fs.stat(&fs_path).await {
        Err(e) => {
            if e.kind() != ErrorKind::NotFound {
                error!("Error other than ENOENT in stat of {:?}: {}", fs_path, e);
            }
            control.send_response("550 Folder not found.").await
        }
        Ok(stat) if !stat.is_dir => {
            debug!("Attempt to CWD to non-directory {}", path);
            control.send_response("550 Not a directory").await
        }
        Ok(_) => {
            session.cwd = path;
            let response = format!("250 CWD successful. \"{}\" is current directory", session.cwd);
            control.send_response(&response).await
        }
    }
}

/// Handles the CDUP FTP command. `/` is its own parent.
pub async fn handle_cdup_command(
    control: &mut ControlChannel,
    session: &mut Session,
) -> Result<(), FtpError> {
    session.cwd = parent_path(&session.cwd);
    let response = format!("250 Directory changed to {}", session.cwd);
    control.send_response(&response).await
}
