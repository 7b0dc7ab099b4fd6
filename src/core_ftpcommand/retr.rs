use crate::constants::RETR_CHUNK_SIZE;
use crate::core_fs::FileReader;
use crate::core_ftpcommand::transfer::open_data_connection;
use crate::core_network::control::ControlChannel;
use crate::core_network::stream::FtpStream;
use crate::error::FtpError;
use crate::server::ServerContext;
use crate::session::Session;
use log::{debug, error, info};
use std::io::{self, ErrorKind};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

enum Source {
    Slurped(Vec<u8>),
    Streamed(FileReader),
}

enum SendError {
    /// Reading the file failed.
    File(io::Error),
    /// Writing to the data connection failed.
    Data(io::Error),
}

async fn stream_file(reader: &mut FileReader, data: &mut FtpStream) -> Result<u64, SendError> {
    let mut buffer = vec![0u8; RETR_CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buffer).await.map_err(SendError::File)?;
        if n == 0 {
            return Ok(total);
        }
        data.write_all(&buffer[..n]).await.map_err(SendError::Data)?;
        total += n as u64;
    }
}

async fn send_source(source: Source, data: &mut FtpStream) -> Result<u64, SendError> {
    let total = match source {
        Source::Slurped(contents) => {
            data.write_all(&contents).await.map_err(SendError::Data)?;
            contents.len() as u64
        }
        Source::Streamed(mut reader) => stream_file(&mut reader, data).await?,
    };
    data.shutdown().await.map_err(SendError::Data)?;
    Ok(total)
}

fn open_error_reply(path: &str, e: &io::Error) -> &'static str {
    if e.kind() == ErrorKind::NotFound {
        debug!("RETR of missing file {}", path);
        "550 Not Found"
    } else {
        error!("Error at read of '{}' other than ENOENT: {}", path, e);
        "550 Not Accessible"
    }
}

/// Handles the RETR (Retrieve) FTP command.
///
/// With `slurp_files` the whole file is read before the data connection is
/// used (files over `max_slurp_size` are still streamed); otherwise it is
/// sent in fixed-size chunks.
///
/// # Arguments
///
/// * `control` - The control connection replies are written to.
/// * `server` - Shared server state with the RETR strategy and event hooks.
/// * `session` - The connection state; owns the data channel.
/// * `arg` - The name of the file to retrieve.
///
/// # Returns
///
/// Result<(), FtpError> indicating whether the control connection is still usable.
pub async fn handle_retr_command(
    control: &mut ControlChannel,
    server: &ServerContext,
    session: &mut Session,
    arg: &str,
) -> Result<(), FtpError> {
    let options = &server.options;
    let (path, fs_path) = session.resolve(arg);

    let slurp = options.slurp_files
        && match options.max_slurp_size {
            None => true,
            Some(limit) => session
                .fs
                .stat(&fs_path)
                .await
                .map_or(false, |stat| stat.size <= limit),
        };

    let source = if slurp {
        session.fs.read_file(&fs_path).await.map(Source::Slurped)
    } else {
        session.fs.open_read(&fs_path).await.map(Source::Streamed)
    };
    let source = match source {
        Ok(source) => source,
        Err(e) => return control.send_response(open_error_reply(&path, &e)).await,
    };
    info!("DATA file {:?} opened", fs_path);

    control
        .send_response(&format!(
            "150 Opening {} mode data connection",
            session.transfer_type.label()
        ))
        .await?;
    let Some(mut data) = open_data_connection(control, server, session).await? else {
        return Ok(());
    };

    match send_source(source, &mut data).await {
        Ok(total) => {
            info!("DATA file {:?} closed, sent {} bytes", fs_path, total);
            control
                .send_response(&format!("226 Closing data connection, sent {} bytes", total))
                .await?;
            let username = session.username.as_deref().unwrap_or_default();
            server.events.file_sent(username, &fs_path, total);
            Ok(())
        }
        Err(SendError::File(e)) => {
            error!("Error reading chunk of {:?}: {}", fs_path, e);
            control.send_response("550 Not Accessible").await
        }
        Err(SendError::Data(e)) => {
            error!("Error sending {:?} to client: {}", fs_path, e);
            control
                .send_response("426 Connection closed; transfer aborted")
                .await
        }
    }
}
