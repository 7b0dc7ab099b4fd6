use crate::core_network::control::ControlChannel;
use crate::error::FtpError;
use crate::session::Session;

pub async fn handle_pwd_command(
    control: &mut ControlChannel,
    session: &mut Session,
) -> Result<(), FtpError> {
    let response = format!("257 \"{}\" is current directory", session.cwd);
    control.send_response(&response).await
}
