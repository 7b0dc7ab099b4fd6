use crate::core_network::control::ControlChannel;
use crate::error::FtpError;

pub async fn handle_noop_command(control: &mut ControlChannel) -> Result<(), FtpError> {
    control.send_response("200 OK").await
}
