use crate::core_fs::glob::has_wildcard;
use crate::core_fs::{glob, DirEntry, IdentityLookup};
use crate::core_ftpcommand::transfer::open_data_connection;
use crate::core_ftpcommand::utils::strip_options;
use crate::core_network::control::ControlChannel;
use crate::error::FtpError;
use crate::server::{ServerContext, ServerOptions};
use crate::session::Session;
use chrono::{DateTime, Local};
use futures::stream::{self, StreamExt};
use log::{debug, error, info};
use tokio::io::AsyncWriteExt;

/// A directory entry with its owner and group display names.
///
/// `None` means the lookup failed and the listing shows `ftp`.
#[derive(Debug, Clone)]
pub struct ListedEntry {
    pub entry: DirEntry,
    pub owner: Option<String>,
    pub group: Option<String>,
}

/// Unix-style `drwxr-xr-x` string.
pub fn permission_string(is_dir: bool, mode: u32) -> String {
    let mut perms = String::with_capacity(10);
    perms.push(if is_dir { 'd' } else { '-' });
    for shift in [6, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        perms.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        perms.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        perms.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    perms
}

/// One CRLF-terminated line of a detailed (LIST) listing.
pub fn format_list_line(listed: &ListedEntry) -> String {
    let stat = &listed.entry.stat;
    let modified: DateTime<Local> = DateTime::from(stat.modified);
    format!(
        "{} 1 {} {} {:>12} {:>12} {}\r\n",
        permission_string(stat.is_dir, stat.mode),
        listed.owner.as_deref().unwrap_or("ftp"),
        listed.group.as_deref().unwrap_or("ftp"),
        stat.size,
        modified.format("%b %d %H:%M").to_string(),
        listed.entry.name
    )
}

/// Orders listing items by file name with the server's key mapper and comparator.
pub fn sort_by_name<T>(
    items: Vec<T>,
    name: impl Fn(&T) -> &str,
    options: &ServerOptions,
) -> Vec<T> {
    if options.dont_sort_filenames {
        return items;
    }

    let mut keyed: Vec<(String, T)> = items
        .into_iter()
        .map(|item| (options.filename_sort_map.key(name(&item)), item))
        .collect();
    match &options.filename_sort_func {
        Some(compare) => keyed.sort_by(|a, b| compare(&a.0, &b.0)),
        None => keyed.sort_by(|a, b| a.0.cmp(&b.0)),
    }
    keyed.into_iter().map(|(_, item)| item).collect()
}

/// Resolves owner and group names, at most `max_lookups` entries at a time.
async fn resolve_owners(
    identity: &dyn IdentityLookup,
    entries: Vec<DirEntry>,
    max_lookups: usize,
) -> Vec<ListedEntry> {
    stream::iter(entries)
        .map(|entry| async move {
            let owner = identity.user_name(entry.stat.uid).await;
            let group = identity.group_name(entry.stat.gid).await;
            if let Err(e) = owner.as_ref().and(group.as_ref()) {
                debug!("Error getting user/group name for {}: {}", entry.name, e);
            }
            ListedEntry {
                entry,
                owner: owner.ok(),
                group: group.ok(),
            }
        })
        .buffered(max_lookups.max(1))
        .collect()
        .await
}

/// Handles LIST (`detailed`) and NLST.
///
/// Leading `-x` options are ignored. The path is enumerated before anything
/// is sent, so an unreadable path is refused without touching the data
/// connection.
pub async fn handle_list_command(
    control: &mut ControlChannel,
    server: &ServerContext,
    session: &mut Session,
    arg: &str,
    detailed: bool,
) -> Result<(), FtpError> {
    let options = &server.options;
    let target = strip_options(arg);
    let (path, fs_path) = session.resolve(target);
    let expand_wildcards =
        !options.no_wildcards && target.rsplit('/').next().map_or(false, has_wildcard);

    let entries = match glob(
        session.fs.as_ref(),
        &fs_path,
        options.max_stats_at_once,
        expand_wildcards,
    )
    .await
    {
        Ok(entries) => entries,
        Err(e) => {
            error!("While sending file list, reading directory {}: {}", path, e);
            return control.send_response("550 Not a directory").await;
        }
    };
    debug!("Directory {} has {} entries", path, entries.len());

    let listing: String = if detailed {
        let listed =
            resolve_owners(options.identity.as_ref(), entries, options.max_stats_at_once).await;
        sort_by_name(listed, |listed| listed.entry.name.as_str(), options)
            .iter()
            .map(format_list_line)
            .collect()
    } else {
        sort_by_name(entries, |entry| entry.name.as_str(), options)
            .into_iter()
            .map(|entry| format!("{}\r\n", entry.name))
            .collect()
    };

    control
        .send_response("150 Here comes the directory listing")
        .await?;
    let Some(mut data) = open_data_connection(control, server, session).await? else {
        return Ok(());
    };

    let sent = async {
        data.write_all(listing.as_bytes()).await?;
        data.shutdown().await
    }
    .await;

    match sent {
        Ok(()) => {
            info!("Directory listing of {} sent", path);
            control.send_response("226 Transfer OK").await
        }
        Err(e) => {
            error!("Error sending directory listing: {}", e);
            control
                .send_response("426 Connection closed; transfer aborted")
                .await
        }
    }
}
