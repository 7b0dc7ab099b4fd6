use crate::core_network::control::ControlChannel;
use crate::error::FtpError;
use crate::server::ServerContext;
use log::info;

/// Multi-line FEAT reply (RFC 2389).
pub fn feature_reply(tls_available: bool) -> String {
    let mut features = vec!["211-Features", " SIZE"];
    if tls_available {
        features.extend([" AUTH TLS", " PBSZ", " PROT"]);
    }
    features.push("211 end");
    features.join("\r\n")
}

/// Handles the FEAT (Feature) FTP command.
///
/// The security extensions are only advertised when TLS materials are configured.
pub async fn handle_feat_command(
    control: &mut ControlChannel,
    server: &ServerContext,
) -> Result<(), FtpError> {
    info!("Responding to FEAT command with supported features.");
    control
        .send_response(&feature_reply(server.options.tls.is_some()))
        .await
}
