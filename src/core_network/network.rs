use crate::core_ftpcommand::handlers::dispatch_command;
use crate::core_network::control::ControlChannel;
use crate::error::FtpError;
use crate::server::ServerContext;
use crate::session::Session;
use anyhow::Result;
use log::{error, info, warn};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};

/// Accepts control connections forever, one task per client.
pub async fn start_server(listener: TcpListener, context: Arc<ServerContext>) -> Result<()> {
    loop {
        let (socket, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("Failed to accept connection: {}", e);
                continue;
            }
        };
        info!("New connection from {}", addr);

        let context = Arc::clone(&context);
        tokio::spawn(async move {
            context.events.client_connected(addr);
            if let Err(e) = handle_connection(socket, &context).await {
                warn!("Connection error for {}: {}", addr, e);
            }
            context.events.client_disconnected(addr);
            info!("Connection closed for {}", addr);
        });
    }
}

/// Runs one client from greeting to disconnect.
///
/// Lines are dispatched strictly in order, each one fully answered before
/// the next is read. The loop ends on QUIT, on a server-side close
/// decision, at end of stream or on a control-socket error.
pub async fn handle_connection(socket: TcpStream, context: &ServerContext) -> Result<(), FtpError> {
    let mut control = ControlChannel::new(socket)?;
    let mut session = Session::new(Arc::clone(&context.default_fs));

    let result = async {
        control
            .send_response(&format!("220 {}", context.options.greeting))
            .await?;

        while let Some(line) = control.read_line().await? {
            dispatch_command(&mut control, context, &mut session, &line).await?;
            if session.is_terminated() {
                break;
            }
        }
        Ok::<(), FtpError>(())
    }
    .await;

    session.data.close();
    control.shutdown().await;
    result
}
