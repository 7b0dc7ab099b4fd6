use crate::constants::{STOR_FILE_MODE, TRANSFER_CHUNK_SIZE};
use crate::core_fs::FileWriter;
use crate::core_ftpcommand::transfer::open_data_connection;
use crate::core_network::control::ControlChannel;
use crate::core_network::stream::FtpStream;
use crate::error::FtpError;
use crate::server::ServerContext;
use crate::session::Session;
use log::{debug, error, info};
use std::io::{self, ErrorKind};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Pipes the data connection into `file` until the client closes it.
async fn receive_file(data: &mut FtpStream, file: &mut FileWriter) -> io::Result<u64> {
    let mut buffer = vec![0u8; TRANSFER_CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        let n = match data.read(&mut buffer).await {
            Ok(n) => n,
            // TLS peers that drop the socket without close_notify.
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                debug!("Data connection ended without TLS close_notify");
                0
            }
            Err(e) => return Err(e),
        };
        if n == 0 {
            break;
        }
        file.write_all(&buffer[..n]).await?;
        total += n as u64;
    }
    file.flush().await?;
    file.shutdown().await?;
    Ok(total)
}

/// Handles the STOR (Store) FTP command.
///
/// The destination is created (or truncated) before `150` is sent; the
/// upload is complete when the client closes the data connection.
pub async fn handle_stor_command(
    control: &mut ControlChannel,
    server: &ServerContext,
    session: &mut Session,
    arg: &str,
) -> Result<(), FtpError> {
    let (path, fs_path) = session.resolve(arg);

    let mut file = match session.fs.create_write(&fs_path, STOR_FILE_MODE).await {
        Ok(file) => file,
        Err(e) => {
            error!("Error opening {} for writing: {}", path, e);
            return control
                .send_response("426 Connection closed; transfer aborted")
                .await;
        }
    };
    debug!("File opened/created: {}", path);

    control.send_response("150 Ok to send data").await?;
    let Some(mut data) = open_data_connection(control, server, session).await? else {
        return Ok(());
    };

    match receive_file(&mut data, &mut file).await {
        Ok(total) => {
            info!("Received {} bytes into {:?}", total, fs_path);
            control.send_response("226 Closing data connection").await?;
            let username = session.username.as_deref().unwrap_or_default();
            server.events.file_received(username, &fs_path);
            Ok(())
        }
        Err(e) => {
            error!("Upload of {} aborted: {}", path, e);
            control
                .send_response("426 Connection closed; transfer aborted")
                .await
        }
    }
}
