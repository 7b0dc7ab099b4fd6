use crate::constants::NOT_SUPPORTED;
use crate::core_ftpcommand::ftpcommand::FtpCommand;
use crate::core_ftpcommand::{
    auth, cwd, dele, feat, list, mkd, noop, pass, pwd, quit, retr, rmd, rnfr, rnto, size, stor,
    type_, user,
};
use crate::core_log::logger::redact_command;
use crate::core_network::control::ControlChannel;
use crate::core_network::{pasv, port};
use crate::error::FtpError;
use crate::server::ServerContext;
use crate::session::Session;
use log::debug;

/// Splits a control line into its upper-cased verb and trimmed argument.
pub fn parse_command_line(line: &str) -> (String, String) {
    let line = line.trim();
    match line.split_once(char::is_whitespace) {
        Some((verb, arg)) => (verb.to_ascii_uppercase(), arg.trim().to_string()),
        None => (line.to_ascii_uppercase(), String::new()),
    }
}

/// Reply for a command that passed no handler lookup, or `None` when gating lets it through.
fn gate(command: FtpCommand, server: &ServerContext, session: &Session) -> Option<&'static str> {
    if command.is_auth_exempt() {
        return None;
    }
    if server.options.tls_only && !session.secure {
        return Some("522 Protection level not sufficient; send AUTH TLS");
    }
    if !session.is_authenticated() {
        return Some("530 User not logged in");
    }
    if command.requires_data_channel() && !session.data.is_configured() {
        return Some("425 Data connection not configured; send PASV or PORT");
    }
    None
}

/// Parses one control line, applies gating and runs the matching handler.
///
/// Every reply is written before this returns, so the next line is only
/// read once the previous command is fully answered.
///
/// # Returns
///
/// `Err` only for control-channel failures, which end the connection.
pub async fn dispatch_command(
    control: &mut ControlChannel,
    server: &ServerContext,
    session: &mut Session,
    line: &str,
) -> Result<(), FtpError> {
    let (verb, arg) = parse_command_line(line);
    debug!("{} -> {}", control.peer(), redact_command(&verb, &arg));

    let Some(command) = FtpCommand::from_str(&verb) else {
        let reply = if NOT_SUPPORTED.contains(&verb.as_str()) {
            "202 Not supported"
        } else {
            "202 Not recognized"
        };
        return control.send_response(reply).await;
    };

    if let Some(reply) = gate(command, server, session) {
        debug!("{} refused: {}", verb, reply);
        return control.send_response(reply).await;
    }

    let arg = arg.as_str();
    match command {
        FtpCommand::USER => user::handle_user_command(control, server, session, arg).await,
        FtpCommand::PASS => pass::handle_pass_command(control, server, session, arg).await,
        FtpCommand::QUIT => quit::handle_quit_command(control, session).await,
        FtpCommand::NOOP => noop::handle_noop_command(control).await,
        FtpCommand::FEAT => feat::handle_feat_command(control, server).await,
        FtpCommand::TYPE => type_::handle_type_command(control, session, arg).await,
        FtpCommand::AUTH => auth::handle_auth_command(control, server, session, arg).await,
        FtpCommand::PBSZ => auth::handle_pbsz_command(control, server, session, arg).await,
        FtpCommand::PROT => auth::handle_prot_command(control, server, session, arg).await,
        FtpCommand::PWD => pwd::handle_pwd_command(control, session).await,
        FtpCommand::CWD => cwd::handle_cwd_command(control, session, arg).await,
        FtpCommand::CDUP => cwd::handle_cdup_command(control, session).await,
        FtpCommand::MKD => mkd::handle_mkd_command(control, session, arg).await,
        FtpCommand::RMD => rmd::handle_rmd_command(control, session, arg).await,
        FtpCommand::DELE => dele::handle_dele_command(control, session, arg).await,
        FtpCommand::RNFR => rnfr::handle_rnfr_command(control, session, arg).await,
        FtpCommand::RNTO => rnto::handle_rnto_command(control, session, arg).await,
        FtpCommand::SIZE => size::handle_size_command(control, session, arg).await,
        FtpCommand::LIST => list::handle_list_command(control, server, session, arg, true).await,
        FtpCommand::NLST => list::handle_list_command(control, server, session, arg, false).await,
        FtpCommand::RETR => retr::handle_retr_command(control, server, session, arg).await,
        FtpCommand::STOR => stor::handle_stor_command(control, server, session, arg).await,
        FtpCommand::PORT => port::handle_port_command(control, session, false, arg).await,
        FtpCommand::EPRT => port::handle_port_command(control, session, true, arg).await,
        FtpCommand::PASV => pasv::handle_pasv_command(control, server, session, false, arg).await,
        FtpCommand::EPSV => pasv::handle_pasv_command(control, server, session, true, arg).await,
    }
}
