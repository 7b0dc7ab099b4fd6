//! Directory enumeration for LIST and NLST.
//!
//! A path naming a directory yields its children, a path naming a file yields
//! that file. With `expand_wildcards`, a final component containing `*` or
//! `?` is matched against the entries of its parent directory.

use crate::core_fs::{FileStat, FileSystem};
use futures::stream::{self, StreamExt};
use log::{debug, warn};
use regex::Regex;
use std::io;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub stat: FileStat,
}

/// Enumerates `path`, running at most `max_stats` stat calls at once.
///
/// Callers only set `expand_wildcards` when the final component was typed
/// by the client; host directory names are always taken literally.
pub async fn glob(
    fs: &dyn FileSystem,
    path: &Path,
    max_stats: usize,
    expand_wildcards: bool,
) -> io::Result<Vec<DirEntry>> {
    let max_stats = max_stats.max(1);
    let pattern = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| expand_wildcards && has_wildcard(name));

    if let Some(pattern) = pattern {
        let parent = path.parent().unwrap_or_else(|| Path::new("/"));
        let matcher = wildcard_regex(&pattern)?;
        let names: Vec<String> = fs
            .read_dir(parent)
            .await?
            .into_iter()
            .filter(|name| matcher.is_match(name))
            .collect();
        debug!("Pattern {:?} matched {} entries in {:?}", pattern, names.len(), parent);
        return Ok(stat_all(fs, parent, names, max_stats).await);
    }

    let stat = fs.stat(path).await?;
    if !stat.is_dir {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Ok(vec![DirEntry { name, stat }]);
    }

    let names = fs.read_dir(path).await?;
    Ok(stat_all(fs, path, names, max_stats).await)
}

async fn stat_all(
    fs: &dyn FileSystem,
    dir: &Path,
    names: Vec<String>,
    max_stats: usize,
) -> Vec<DirEntry> {
    stream::iter(names)
        .map(|name| async move {
            match fs.stat(&dir.join(&name)).await {
                Ok(stat) => Some(DirEntry { name, stat }),
                Err(e) => {
                    // The entry vanished between readdir and stat.
                    warn!("Skipping {:?} in {:?}: {}", name, dir, e);
                    None
                }
            }
        })
        .buffered(max_stats)
        .filter_map(|entry| async move { entry })
        .collect()
        .await
}

pub fn has_wildcard(name: &str) -> bool {
    name.contains('*') || name.contains('?')
}

fn wildcard_regex(pattern: &str) -> io::Result<Regex> {
    let mut expr = String::from("^");
    let mut literal = String::new();
    for c in pattern.chars() {
        match c {
            '*' | '?' => {
                expr.push_str(&regex::escape(&literal));
                literal.clear();
                expr.push_str(if c == '*' { ".*" } else { "." });
            }
            _ => literal.push(c),
        }
    }
    expr.push_str(&regex::escape(&literal));
    expr.push('$');
    Regex::new(&expr).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
}
